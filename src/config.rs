//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the adapter hardware and
//! the runtime configuration of the command dispatcher. Pin mappings,
//! expander addresses, timing bounds and protocol strings are centralized
//! here.

use crate::types::{CircuitMode, Function, MeasurementRegime, Remote, TestFrequency, TestLevel};

/// I2C bus frequency for the TCA9555 expanders
pub const I2C_FREQUENCY_HZ: u32 = 100_000;

/// U3 expander (control outputs, INHIBIT input)
pub const U3_I2C_ADDR: u8 = 0x20;

/// U2 expander (status inputs)
pub const U2_I2C_ADDR: u8 = 0x21;

/// U3 direction mask: every control line is an output except INHIBIT (bit 12)
/// and the unused bits 13..15. A set bit is an output.
pub const U3_OUTPUT_MASK: u16 = 0x0FFF;

/// U2 is input only
pub const U2_OUTPUT_MASK: u16 = 0x0000;

/// U3 output word at power-up: strobe released, local control, everything else low
pub const U3_IDLE_WORD: u16 = (1 << 8) | (1 << 11);

/// BCD digits per reported group
pub const GROUP_DIGITS: usize = 4;

/// Decimal places of the dissipation factor (`D d.ddd`)
pub const D_DECIMALS: u8 = 3;

/// Maximum time to wait for a complete digit transfer after a trigger
pub const TRIGGER_TIMEOUT_MS: u32 = 300;

/// Interval between data-ready polls
pub const POLL_INTERVAL_US: u32 = 100;

/// Retries while the meter asserts INHIBIT before a strobe
pub const INHIBIT_RETRIES: u32 = 50;

/// Delay between INHIBIT checks
pub const INHIBIT_RETRY_DELAY_US: u32 = 1_000;

/// Width of the EXE strobe pulse
pub const EXE_PULSE_US: u32 = 10;

/// Command line buffer size
pub const CMD_BUFFER_SIZE: usize = 64;

/// Longest single response line
pub const MAX_RESPONSE_LEN: usize = 96;

/// USB CDC ACM packet size
pub const USB_CDC_PACKET_SIZE: u16 = 64;

/// Host read timeout; bounds the latency of continuous-mode polling
pub const HOST_READ_TIMEOUT_MS: u64 = 20;

/// USB VID (use test VID for development)
pub const USB_VID: u16 = 0x1209;

/// USB PID (get from pid.codes for production)
pub const USB_PID: u16 = 0x0001;

/// `*IDN?` reply
pub const IDN: &str = "HEWLETT PACKARD 4261A LCR METER";

/// Power-up function
pub const DEFAULT_FUNCTION: Function = Function::Capacitance;

/// Power-up circuit mode
pub const DEFAULT_MODE: CircuitMode = CircuitMode::Auto;

/// Power-up test frequency
pub const DEFAULT_FREQUENCY: TestFrequency = TestFrequency::Hz1000;

/// Power-up test level
pub const DEFAULT_LEVEL: TestLevel = TestLevel::Mv1000;

/// Power-up control state
pub const DEFAULT_REMOTE: Remote = Remote::Off;

/// Power-up measurement regime
pub const DEFAULT_REGIME: MeasurementRegime = MeasurementRegime::Continuous;

/// Banner printed when a host opens the port
pub const BANNER: &str = "\
************ HP4261A USB ADAPTER ************\r\n\
*            Firmware ver: 1.0.0            *\r\n\
*      Read HELP for list of commands       *\r\n\
*********************************************";

/// `HELP` reply
pub const HELP: &str = "\
*** Commands set ***\r\n\
*IDN? | returns instrument identification\r\n\
*TRG  | Triggers a measurement in remote control single cycle operation\r\n\
SET   | Sets instrument controls:\r\n\
    FUNC <L/C/R>         | Measurement function (inductance, capacitance, resistance)\r\n\
    MODE <PAR/SER/AUTO>  | Circuit mode (parallel, series, auto)\r\n\
    FREQ <120/1000>      | Measurement frequency (120 Hz, 1000 Hz)\r\n\
    RNG <1 ... N>        | Measurement range (L, R: 9 = Auto; C: 10 = Auto)\r\n\
    LEV <50/1000>        | Test level (50 mV, 1 V)\r\n\
    REM <ON/OFF>         | Instrument control (on = remote, off = local)\r\n\
    MEAS <CONT/SGL/ABORT>| Measurement cycle (continuous, single, stop)\r\n\
                           (CONT also prints LCR data in local control operation)\r\n\
SET?  | Returns instrument controls\r\n\
STAT? | Returns function/mode, frequency and range reported by the meter";

/// Response verbosity for successful `SET` commands
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// No output on success
    Quiet,
    /// `OK` on success
    #[default]
    Echo,
}

/// Runtime configuration of the command dispatcher
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Success echo
    pub verbosity: Verbosity,
    /// Bound on a full digit transfer
    pub trigger_timeout_us: u32,
    /// Data-ready poll interval
    pub poll_interval_us: u32,
    /// INHIBIT retries before giving up on a strobe
    pub inhibit_retries: u32,
    /// Delay between INHIBIT retries
    pub inhibit_retry_delay_us: u32,
    /// EXE pulse width
    pub exe_pulse_us: u32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::default(),
            trigger_timeout_us: TRIGGER_TIMEOUT_MS * 1_000,
            poll_interval_us: POLL_INTERVAL_US,
            inhibit_retries: INHIBIT_RETRIES,
            inhibit_retry_delay_us: INHIBIT_RETRY_DELAY_US,
            exe_pulse_us: EXE_PULSE_US,
        }
    }
}

impl DispatcherConfig {
    /// Same configuration with a different verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }
}

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the adapter schematic

    /// WTGT (wait trigger), active low
    pub const WTGT_N: &str = "PA0";

    /// FLAG (digit data valid), active low
    pub const FLAG_N: &str = "PA1";

    /// BCD data bit 1
    pub const DTB1: &str = "PA4";

    /// BCD data bit 2
    pub const DTB2: &str = "PA5";

    /// BCD data bit 4
    pub const DTB4: &str = "PA6";

    /// BCD data bit 8
    pub const DTB8: &str = "PA7";

    /// Gate indicator LED
    pub const LED_GATE: &str = "PB0";

    /// I2C1 SCL (U2, U3)
    pub const I2C1_SCL: &str = "PB8";

    /// I2C1 SDA (U2, U3)
    pub const I2C1_SDA: &str = "PB9";

    /// USB D+ (handled by USB peripheral)
    pub const USB_DP: &str = "PA12";

    /// USB D- (handled by USB peripheral)
    pub const USB_DM: &str = "PA11";
}
