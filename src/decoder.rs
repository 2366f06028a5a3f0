//! Measurement Decoder
//!
//! The 4261A presents its reading one BCD digit at a time on DTB1..DTB8.
//! While WTGT is low the data window is open; FLAG goes low when a digit is
//! valid and returns high before the next one. A full transfer is the
//! primary group followed by the dissipation (D) group, and both are always
//! read before a measurement is reported.
//!
//! The decoder is a two-state machine:
//!
//! ```text
//!       first FLAG of a window
//!   ┌──────┐ ───────────► ┌──────────┐
//!   │ Idle │              │ Sampling │
//!   └──────┘ ◄─────────── └──────────┘
//!      all digits read / WTGT released / timeout
//! ```
//!
//! A FLAG only starts a transfer once the decoder has seen WTGT released
//! since the previous one. Joining a transfer halfway, or seeing FLAG still
//! held on the last digit of the previous transfer, would shift every
//! digit, so those FLAGs are ignored until the window closes.
//!
//! Every wait is bounded by the trigger timeout. A stalled meter produces a
//! measurement with both groups flagged instead of blocking the command loop.

use embedded_hal::delay::DelayNs;

use crate::bus::{fields, DirectPins, InstrumentBus, PortExpander, Resource};
use crate::config::GROUP_DIGITS;
use crate::error::Result;
use crate::ranges::{self, RangeEntry};
use crate::types::{CircuitMode, Function, TestFrequency};

/// Decode one BCD nibble; 10..15 are not digits
#[must_use]
pub const fn decode_bcd(nibble: u8) -> Option<u8> {
    if nibble <= 9 {
        Some(nibble)
    } else {
        None
    }
}

/// One group of BCD digits, most significant first
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DigitGroup {
    digits: [u8; GROUP_DIGITS],
    valid: bool,
}

impl DigitGroup {
    /// Build from raw nibbles; any non-BCD nibble invalidates the group
    #[must_use]
    pub fn from_nibbles(nibbles: [u8; GROUP_DIGITS]) -> Self {
        let mut digits = [0u8; GROUP_DIGITS];
        let mut valid = true;
        for (digit, &nibble) in digits.iter_mut().zip(nibbles.iter()) {
            match decode_bcd(nibble) {
                Some(d) => *digit = d,
                None => valid = false,
            }
        }
        Self { digits, valid }
    }

    /// A group that was never (completely) transferred
    #[must_use]
    pub const fn invalid() -> Self {
        Self {
            digits: [0; GROUP_DIGITS],
            valid: false,
        }
    }

    /// Decoded digits; meaningless if the group is invalid
    #[must_use]
    pub const fn digits(&self) -> &[u8; GROUP_DIGITS] {
        &self.digits
    }

    /// Whether every nibble was a BCD digit
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Integer count, if valid
    #[must_use]
    pub fn count(&self) -> Option<u32> {
        self.valid.then(|| {
            self.digits
                .iter()
                .fold(0u32, |acc, &d| acc * 10 + u32::from(d))
        })
    }
}

/// Status lines as read from U2
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstrumentStatus {
    /// Function in use
    pub function: Function,
    /// Equivalent circuit in use
    pub mode: CircuitMode,
    /// Test frequency in use
    pub frequency: TestFrequency,
    /// Range index in use, paired with `function`
    pub range_index: u8,
    /// OR line
    pub over_range: bool,
    /// DBLANK line
    pub d_blanked: bool,
}

impl InstrumentStatus {
    /// Decode the U2 input word
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_word(word: u16) -> Self {
        Self {
            function: Function::from_code(fields::FNC.extract(word)),
            mode: CircuitMode::from_status(fields::CMS.extract(word)),
            frequency: TestFrequency::from_code(fields::FREQ1K_N.extract(word)),
            range_index: fields::RNG.extract(word) as u8,
            over_range: fields::OR.extract(word) != 0,
            d_blanked: fields::DBLANK_N.extract(word) == 0,
        }
    }

    /// Fresh read of the status lines
    pub fn read<X: PortExpander, P: DirectPins>(bus: &mut InstrumentBus<X, P>) -> Result<Self> {
        Ok(Self::from_word(bus.read_word(Resource::U2)?))
    }

    /// Range table entry the meter is on
    #[must_use]
    pub fn range(&self) -> RangeEntry {
        ranges::lookup(self.function, self.range_index)
    }
}

/// One assembled reading
///
/// Built once per transfer and never modified afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Measurement {
    status: InstrumentStatus,
    primary: DigitGroup,
    secondary: DigitGroup,
}

impl Measurement {
    /// Assemble from the status word and both digit groups
    #[must_use]
    pub const fn new(status: InstrumentStatus, primary: DigitGroup, secondary: DigitGroup) -> Self {
        Self {
            status,
            primary,
            secondary,
        }
    }

    /// Status lines sampled after the transfer
    #[must_use]
    pub const fn status(&self) -> &InstrumentStatus {
        &self.status
    }

    /// Function the meter measured with
    #[must_use]
    pub const fn function(&self) -> Function {
        self.status.function
    }

    /// Range index (only meaningful with [`Self::function`])
    #[must_use]
    pub const fn range_index(&self) -> u8 {
        self.status.range_index
    }

    /// Range table entry for this reading
    #[must_use]
    pub fn range(&self) -> RangeEntry {
        self.status.range()
    }

    /// OR line, or a non-BCD primary digit
    #[must_use]
    pub const fn primary_out_of_range(&self) -> bool {
        self.status.over_range || !self.primary.is_valid()
    }

    /// Non-BCD or missing D digit
    #[must_use]
    pub const fn secondary_out_of_range(&self) -> bool {
        !self.secondary.is_valid()
    }

    /// D display blanked by the meter
    #[must_use]
    pub const fn secondary_blanked(&self) -> bool {
        self.status.d_blanked
    }

    /// Primary digits
    #[must_use]
    pub const fn primary(&self) -> &DigitGroup {
        &self.primary
    }

    /// Dissipation digits
    #[must_use]
    pub const fn secondary(&self) -> &DigitGroup {
        &self.secondary
    }
}

/// Decoder state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DecoderState {
    /// Waiting for FLAG
    #[default]
    Idle,
    /// Digit lines are being read
    Sampling,
}

#[cfg(feature = "embedded")]
impl defmt::Format for DecoderState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Idle => defmt::write!(f, "Idle"),
            Self::Sampling => defmt::write!(f, "Sampling"),
        }
    }
}

/// Result of a bounded wait on FLAG
enum Wait {
    Ready(u16),
    WindowClosed,
    TimedOut,
}

/// How a transfer ended
#[derive(Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Complete,
    WindowClosed(usize),
    TimedOut,
}

/// BCD transfer state machine
#[derive(Debug)]
pub struct MeasurementDecoder {
    state: DecoderState,
    // WTGT seen released since the last transfer
    armed: bool,
    timeout_us: u32,
    poll_interval_us: u32,
}

impl MeasurementDecoder {
    /// Create an idle decoder
    #[must_use]
    pub const fn new(timeout_us: u32, poll_interval_us: u32) -> Self {
        Self {
            state: DecoderState::Idle,
            armed: false,
            timeout_us,
            // A zero interval would never consume the budget
            poll_interval_us: if poll_interval_us == 0 { 1 } else { poll_interval_us },
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> DecoderState {
        self.state
    }

    /// Whether the next FLAG will be taken as the first digit
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }

    /// Accept the next FLAG as the first digit without waiting for WTGT
    ///
    /// Only valid right after EXE started a fresh measurement.
    pub fn arm(&mut self) {
        self.armed = true;
    }

    /// Whether the meter is presenting the first digit of a transfer
    ///
    /// A FLAG seen before the window was released is not data ready.
    pub fn data_ready<X: PortExpander, P: DirectPins>(
        &mut self,
        bus: &mut InstrumentBus<X, P>,
    ) -> Result<bool> {
        let pins = bus.read_word(Resource::Mcu)?;
        Ok(self.first_digit(pins))
    }

    /// Track WTGT and report whether `pins` start a transfer
    fn first_digit(&mut self, pins: u16) -> bool {
        if fields::WTGT_N.extract(pins) != 0 {
            self.armed = true;
            return false;
        }
        let flag = fields::FLAG_N.extract(pins) == 0;
        if flag && !self.armed {
            trace!("FLAG inside a window already open, ignored");
        }
        flag && self.armed
    }

    /// Read one complete transfer and the status lines
    ///
    /// Transport failures are returned as errors; a stalled or truncated
    /// transfer is reported through the measurement's out-of-range flags.
    pub fn acquire<X: PortExpander, P: DirectPins, D: DelayNs>(
        &mut self,
        bus: &mut InstrumentBus<X, P>,
        delay: &mut D,
    ) -> Result<Measurement> {
        let mut nibbles = [0u8; 2 * GROUP_DIGITS];
        let transfer = self.transfer(bus, delay, &mut nibbles);
        let was_sampling = self.state == DecoderState::Sampling;
        self.state = DecoderState::Idle;
        self.armed = false;
        if was_sampling {
            bus.write_field(fields::LED_GATE, 0)?;
        }
        let transfer = transfer?;

        let status = InstrumentStatus::read(bus)?;
        let (primary, secondary) = match transfer {
            Transfer::Complete => (group(&nibbles, 0), group(&nibbles, 1)),
            Transfer::WindowClosed(read) => {
                warn!("data window closed after {} digits", read);
                let primary = if read >= GROUP_DIGITS {
                    group(&nibbles, 0)
                } else {
                    DigitGroup::invalid()
                };
                (primary, DigitGroup::invalid())
            }
            Transfer::TimedOut => {
                warn!("trigger timed out");
                (DigitGroup::invalid(), DigitGroup::invalid())
            }
        };
        let measurement = Measurement::new(status, primary, secondary);
        debug!(
            "measurement: {} range {} primary ok {} D ok {}",
            measurement.function(),
            measurement.range_index(),
            !measurement.primary_out_of_range(),
            !measurement.secondary_out_of_range()
        );
        Ok(measurement)
    }

    fn transfer<X: PortExpander, P: DirectPins, D: DelayNs>(
        &mut self,
        bus: &mut InstrumentBus<X, P>,
        delay: &mut D,
        nibbles: &mut [u8; 2 * GROUP_DIGITS],
    ) -> Result<Transfer> {
        let mut budget = self.timeout_us;
        let last = nibbles.len() - 1;
        for (position, nibble) in nibbles.iter_mut().enumerate() {
            let pins = match self.wait_flag(bus, delay, &mut budget, true)? {
                Wait::Ready(pins) => pins,
                Wait::WindowClosed => return Ok(Transfer::WindowClosed(position)),
                Wait::TimedOut => return Ok(Transfer::TimedOut),
            };
            if self.state == DecoderState::Idle {
                self.state = DecoderState::Sampling;
                bus.write_field(fields::LED_GATE, 1)?;
            }
            #[allow(clippy::cast_possible_truncation)]
            let value = fields::DIGIT.extract(pins) as u8;
            *nibble = value;
            trace!("digit {} = {}", position, value);

            if position < last {
                match self.wait_flag(bus, delay, &mut budget, false)? {
                    Wait::Ready(_) => {}
                    Wait::WindowClosed => return Ok(Transfer::WindowClosed(position + 1)),
                    Wait::TimedOut => return Ok(Transfer::TimedOut),
                }
            }
        }
        Ok(Transfer::Complete)
    }

    /// Poll until FLAG reaches the wanted level, WTGT closes the window
    /// (only while sampling) or the budget runs out
    ///
    /// While idle only the first FLAG of a window counts.
    fn wait_flag<X: PortExpander, P: DirectPins, D: DelayNs>(
        &mut self,
        bus: &mut InstrumentBus<X, P>,
        delay: &mut D,
        budget: &mut u32,
        active: bool,
    ) -> Result<Wait> {
        loop {
            let pins = bus.read_word(Resource::Mcu)?;
            if self.state == DecoderState::Idle {
                if self.first_digit(pins) {
                    return Ok(Wait::Ready(pins));
                }
            } else if fields::WTGT_N.extract(pins) != 0 {
                return Ok(Wait::WindowClosed);
            } else if (fields::FLAG_N.extract(pins) == 0) == active {
                return Ok(Wait::Ready(pins));
            }
            if *budget < self.poll_interval_us {
                return Ok(Wait::TimedOut);
            }
            delay.delay_us(self.poll_interval_us);
            *budget -= self.poll_interval_us;
        }
    }
}

fn group(nibbles: &[u8; 2 * GROUP_DIGITS], index: usize) -> DigitGroup {
    let mut raw = [0u8; GROUP_DIGITS];
    raw.copy_from_slice(&nibbles[index * GROUP_DIGITS..(index + 1) * GROUP_DIGITS]);
    DigitGroup::from_nibbles(raw)
}
