//! Settings Registry
//!
//! The adapter's view of how the meter is configured. Values only change
//! through [`Settings::validate`] followed by [`Settings::commit`]; the
//! dispatcher commits a [`SettingChange`] only after its bus writes
//! succeeded, so the registry never claims a setting the meter did not
//! accept.

use core::fmt::{self, Write};

use crate::config::{
    DEFAULT_FREQUENCY, DEFAULT_FUNCTION, DEFAULT_LEVEL, DEFAULT_MODE, DEFAULT_REGIME,
    DEFAULT_REMOTE,
};
use crate::error::{Error, Result};
use crate::types::{
    Attribute, CircuitMode, Function, MeasurementRegime, Range, Remote, TestFrequency, TestLevel,
};

/// A validated change to one attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingChange {
    /// New function; the range moves to the new function's Auto slot
    Function(Function),
    /// New circuit mode
    Mode(CircuitMode),
    /// New test frequency
    Frequency(TestFrequency),
    /// New range, valid for the current function
    Range(Range),
    /// New test level
    Level(TestLevel),
    /// Remote/local
    Remote(Remote),
    /// Measurement regime
    Regime(MeasurementRegime),
}

impl SettingChange {
    /// Attribute this change targets
    #[must_use]
    pub const fn attribute(self) -> Attribute {
        match self {
            Self::Function(_) => Attribute::Func,
            Self::Mode(_) => Attribute::Mode,
            Self::Frequency(_) => Attribute::Freq,
            Self::Range(_) => Attribute::Rng,
            Self::Level(_) => Attribute::Lev,
            Self::Remote(_) => Attribute::Rem,
            Self::Regime(_) => Attribute::Meas,
        }
    }
}

/// Live instrument configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    function: Function,
    mode: CircuitMode,
    frequency: TestFrequency,
    range: Range,
    level: TestLevel,
    remote: Remote,
    regime: MeasurementRegime,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            function: DEFAULT_FUNCTION,
            mode: DEFAULT_MODE,
            frequency: DEFAULT_FREQUENCY,
            range: Range::auto(DEFAULT_FUNCTION),
            level: DEFAULT_LEVEL,
            remote: DEFAULT_REMOTE,
            regime: DEFAULT_REGIME,
        }
    }
}

impl Settings {
    /// Power-up configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selected function
    #[must_use]
    pub const fn function(&self) -> Function {
        self.function
    }

    /// Selected circuit mode
    #[must_use]
    pub const fn mode(&self) -> CircuitMode {
        self.mode
    }

    /// Selected test frequency
    #[must_use]
    pub const fn frequency(&self) -> TestFrequency {
        self.frequency
    }

    /// Selected range (always valid for [`Self::function`])
    #[must_use]
    pub const fn range(&self) -> Range {
        self.range
    }

    /// Selected test level
    #[must_use]
    pub const fn level(&self) -> TestLevel {
        self.level
    }

    /// Remote/local state
    #[must_use]
    pub const fn remote(&self) -> Remote {
        self.remote
    }

    /// Whether remote control is enabled
    #[must_use]
    pub const fn remote_enabled(&self) -> bool {
        self.remote.is_enabled()
    }

    /// Measurement regime
    #[must_use]
    pub const fn regime(&self) -> MeasurementRegime {
        self.regime
    }

    /// Check a host value against the attribute's domain
    ///
    /// Ranges are checked against the *current* function. Nothing is
    /// modified.
    pub fn validate(&self, attr: Attribute, value: &str) -> Result<SettingChange> {
        let change = match attr {
            Attribute::Func => Function::from_token(value).map(SettingChange::Function),
            Attribute::Mode => CircuitMode::from_token(value).map(SettingChange::Mode),
            Attribute::Freq => TestFrequency::from_token(value).map(SettingChange::Frequency),
            Attribute::Rng => Range::from_token(self.function, value).map(SettingChange::Range),
            Attribute::Lev => TestLevel::from_token(value).map(SettingChange::Level),
            Attribute::Rem => Remote::from_token(value).map(SettingChange::Remote),
            Attribute::Meas => MeasurementRegime::from_token(value).map(SettingChange::Regime),
        };
        change.ok_or(Error::InvalidValue(attr))
    }

    /// Apply a validated change
    ///
    /// A function change also resets the range to the new function's Auto
    /// slot, so the stored range never exceeds the function's table.
    pub fn commit(&mut self, change: SettingChange) {
        match change {
            SettingChange::Function(function) => {
                self.function = function;
                self.range = Range::auto(function);
            }
            SettingChange::Mode(mode) => self.mode = mode,
            SettingChange::Frequency(frequency) => self.frequency = frequency,
            SettingChange::Range(range) => {
                debug_assert!(Range::new(self.function, range.index()).is_some());
                self.range = range;
            }
            SettingChange::Level(level) => self.level = level,
            SettingChange::Remote(remote) => self.remote = remote,
            SettingChange::Regime(regime) => self.regime = regime,
        }
    }

    /// Write one attribute's value as it appears on the wire
    pub fn write_value<W: Write>(&self, w: &mut W, attr: Attribute) -> fmt::Result {
        match attr {
            Attribute::Func => w.write_str(self.function.as_str()),
            Attribute::Mode => w.write_str(self.mode.as_str()),
            Attribute::Freq => w.write_str(self.frequency.as_str()),
            Attribute::Rng => write!(w, "{}", self.range),
            Attribute::Lev => w.write_str(self.level.as_str()),
            Attribute::Rem => w.write_str(self.remote.as_str()),
            Attribute::Meas => w.write_str(self.regime.as_str()),
        }
    }
}
