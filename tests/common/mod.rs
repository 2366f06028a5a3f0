//! Shared host-side simulations of the adapter hardware
//!
//! Every sim is a cheap handle around shared state, so a test can hand one
//! clone to the code under test and inspect the other.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation};

use hp4261a_usb::bus::{fields, DirectPins, InstrumentBus, PortExpander};
use hp4261a_usb::config::{DispatcherConfig, U3_I2C_ADDR, U3_IDLE_WORD, U3_OUTPUT_MASK};
use hp4261a_usb::dispatcher::Dispatcher;
use hp4261a_usb::error::TransportError;
use hp4261a_usb::hal::expander::I2cAddress;

/// Pin word with WTGT and FLAG released and no digit
pub const PINS_IDLE: u8 = 0b11;

/// U2 word of a C reading on range 5 with D shown
pub const U2_C_RANGE5: u16 = (1 << 5) | (5 << 8);

/// Enable log output for a test binary; safe to call more than once
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// =============================================================================
// Expanders
// =============================================================================

#[derive(Default)]
struct ExpanderState {
    u2: u16,
    u3_latch: u16,
    u3_writes: Vec<u16>,
    inhibit_reads: u32,
    fail_reads: bool,
    fail_writes: bool,
}

/// Both TCA9555 expanders, modelled at the word level
#[derive(Clone, Default)]
pub struct SimExpanders(Rc<RefCell<ExpanderState>>);

impl SimExpanders {
    /// Expanders at power-up with the meter idle
    pub fn new() -> Self {
        let sim = Self::default();
        {
            let mut state = sim.0.borrow_mut();
            state.u3_latch = U3_IDLE_WORD;
            state.u2 = U2_C_RANGE5;
        }
        sim
    }

    /// Status word the meter drives onto U2
    pub fn set_u2(&self, word: u16) {
        self.0.borrow_mut().u2 = word;
    }

    /// Keep INHIBIT asserted for the next `reads` reads of U3 (`u32::MAX` = forever)
    pub fn hold_inhibit(&self, reads: u32) {
        self.0.borrow_mut().inhibit_reads = reads;
    }

    /// Make every expander read fail
    pub fn fail_reads(&self, fail: bool) {
        self.0.borrow_mut().fail_reads = fail;
    }

    /// Make every expander write fail
    pub fn fail_writes(&self, fail: bool) {
        self.0.borrow_mut().fail_writes = fail;
    }

    /// U3 output latch
    pub fn u3(&self) -> u16 {
        self.0.borrow().u3_latch
    }

    /// Every word written to U3, oldest first
    pub fn u3_writes(&self) -> Vec<u16> {
        self.0.borrow().u3_writes.clone()
    }

    /// Forget the write log
    pub fn clear_writes(&self) {
        self.0.borrow_mut().u3_writes.clear();
    }

    /// Number of EXE pulses seen in the write log
    pub fn exe_strobes(&self) -> usize {
        self.0
            .borrow()
            .u3_writes
            .iter()
            .filter(|&&w| fields::EXE_N.extract(w) == 0)
            .count()
    }
}

impl PortExpander for SimExpanders {
    fn read16(&mut self, addr: I2cAddress) -> Result<u16, TransportError> {
        let mut state = self.0.borrow_mut();
        if state.fail_reads {
            return Err(TransportError::Nack);
        }
        if addr.addr() != U3_I2C_ADDR {
            return Ok(state.u2);
        }
        let inhibited = state.inhibit_reads > 0;
        if inhibited && state.inhibit_reads != u32::MAX {
            state.inhibit_reads -= 1;
        }
        let inputs = if inhibited { 0 } else { fields::INHIBIT_N.mask() };
        Ok((state.u3_latch & U3_OUTPUT_MASK) | inputs)
    }

    fn write16(&mut self, addr: I2cAddress, bits: u16) -> Result<(), TransportError> {
        let mut state = self.0.borrow_mut();
        if state.fail_writes {
            return Err(TransportError::Bus);
        }
        // input pins ignore the output register
        if addr.addr() == U3_I2C_ADDR {
            let outputs = bits & U3_OUTPUT_MASK;
            state.u3_latch = outputs;
            state.u3_writes.push(outputs);
        }
        Ok(())
    }
}

// =============================================================================
// Direct pins
// =============================================================================

#[derive(Default)]
struct PinState {
    states: VecDeque<u8>,
    last: u8,
    reads: usize,
    led: Vec<bool>,
}

/// Direct pins replaying a script of pin words; the last word repeats
#[derive(Clone, Default)]
pub struct ScriptedPins(Rc<RefCell<PinState>>);

impl ScriptedPins {
    /// Idle pins
    pub fn new() -> Self {
        let pins = Self::default();
        pins.0.borrow_mut().last = PINS_IDLE;
        pins
    }

    /// Queue pin words
    pub fn push(&self, states: impl IntoIterator<Item = u8>) {
        self.0.borrow_mut().states.extend(states);
    }

    /// Number of pin reads so far
    pub fn reads(&self) -> usize {
        self.0.borrow().reads
    }

    /// LED levels written, oldest first
    pub fn led_writes(&self) -> Vec<bool> {
        self.0.borrow().led.clone()
    }
}

impl DirectPins for ScriptedPins {
    fn read_pins(&mut self) -> Result<u8, TransportError> {
        let mut state = self.0.borrow_mut();
        state.reads += 1;
        if let Some(next) = state.states.pop_front() {
            state.last = next;
        }
        Ok(state.last)
    }

    fn write_pins(&mut self, mask: u8, bits: u8) -> Result<(), TransportError> {
        let led = fields::LED_GATE.mask() as u8;
        if mask & led != 0 {
            self.0.borrow_mut().led.push(bits & led != 0);
        }
        Ok(())
    }
}

/// Pin word presenting `digit` with FLAG active
pub fn digit_word(digit: u8) -> u8 {
    digit << 2
}

/// Pin word between digits: FLAG released, window still open
pub fn gap_word(digit: u8) -> u8 {
    (digit << 2) | 0b10
}

/// Pin words of the eight digits, ending idle
pub fn digits(primary: [u8; 4], secondary: [u8; 4]) -> Vec<u8> {
    let digits: Vec<u8> = primary.into_iter().chain(secondary).collect();
    let mut words = Vec::new();
    for (i, &d) in digits.iter().enumerate() {
        words.push(digit_word(d));
        if i + 1 < digits.len() {
            words.push(gap_word(d));
        }
    }
    words.push(PINS_IDLE);
    words
}

/// One complete transfer: window closed, then [`digits`]
pub fn transfer(primary: [u8; 4], secondary: [u8; 4]) -> Vec<u8> {
    let mut words = vec![PINS_IDLE];
    words.extend(digits(primary, secondary));
    words
}

/// A transfer as two `poll()` calls see it: the first sees the window
/// closed, the second samples the first digit before acquiring
pub fn ready_transfer(primary: [u8; 4], secondary: [u8; 4]) -> Vec<u8> {
    let mut words = vec![PINS_IDLE, digit_word(primary[0])];
    words.extend(digits(primary, secondary));
    words
}

// =============================================================================
// Delay
// =============================================================================

/// Delay that only counts
#[derive(Clone, Default)]
pub struct CountingDelay {
    total_ns: Rc<Cell<u64>>,
    calls: Rc<Cell<usize>>,
}

impl CountingDelay {
    /// Total requested delay in microseconds
    pub fn total_us(&self) -> u64 {
        self.total_ns.get() / 1_000
    }

    /// Number of delay calls
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Forget everything counted so far
    pub fn reset(&self) {
        self.total_ns.set(0);
        self.calls.set(0);
    }
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.set(self.total_ns.get() + u64::from(ns));
        self.calls.set(self.calls.get() + 1);
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_ns(us.saturating_mul(1_000));
    }
}

// =============================================================================
// I2C
// =============================================================================

/// I2C bus mock answering reads from fixed two-byte port values
#[derive(Default)]
pub struct MockI2c {
    /// Every write operation as (address, bytes)
    pub writes: Vec<(u8, Vec<u8>)>,
    /// Bytes returned for reads, per address
    pub inputs: HashMap<u8, [u8; 2]>,
    /// Address that does not acknowledge
    pub absent: Option<u8>,
    /// Fail every transaction with a bus error
    pub broken: bool,
}

impl i2c::ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl i2c::I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.broken {
            return Err(ErrorKind::Bus);
        }
        if self.absent == Some(address) {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        for op in operations {
            match op {
                Operation::Write(bytes) => self.writes.push((address, bytes.to_vec())),
                Operation::Read(buf) => {
                    let data = self.inputs.get(&address).copied().unwrap_or([0, 0]);
                    for (i, b) in buf.iter_mut().enumerate() {
                        *b = data.get(i).copied().unwrap_or(0);
                    }
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Rig
// =============================================================================

/// A dispatcher wired to simulated hardware
pub type SimDispatcher = Dispatcher<SimExpanders, ScriptedPins, CountingDelay>;

/// Simulated adapter with handles for inspection
pub struct Rig {
    pub expanders: SimExpanders,
    pub pins: ScriptedPins,
    pub delay: CountingDelay,
    pub dispatcher: SimDispatcher,
}

impl Rig {
    /// Initialized dispatcher with the default configuration
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    /// Initialized dispatcher with `config`
    pub fn with_config(config: DispatcherConfig) -> Self {
        init_logging();
        let expanders = SimExpanders::new();
        let pins = ScriptedPins::new();
        let delay = CountingDelay::default();
        let bus = InstrumentBus::new(expanders.clone(), pins.clone());
        let mut dispatcher = Dispatcher::new(bus, delay.clone(), config);
        dispatcher.init().expect("init on healthy sim");
        expanders.clear_writes();
        delay.reset();
        Self {
            expanders,
            pins,
            delay,
            dispatcher,
        }
    }

    /// Poll once and return the reply text, if any
    pub fn poll(&mut self) -> Option<String> {
        self.dispatcher.poll().as_str().map(str::to_owned)
    }

    /// Execute a line and return the reply text, if any
    pub fn send(&mut self, line: &str) -> Option<String> {
        self.dispatcher
            .execute(line)
            .as_str()
            .map(str::to_owned)
    }
}
