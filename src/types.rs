//! Shared types used across the adapter firmware
//!
//! This module defines the enumerated domains of the instrument controls.
//! Each type knows its protocol token and the bit code the HP 4261A uses for
//! it on the control and status buses.

use core::fmt;

/// Measurement function
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Function {
    /// Capacitance (C)
    Capacitance,
    /// Resistance (R)
    Resistance,
    /// Status lines report a combination the meter never drives
    Undefined,
    /// Inductance (L)
    Inductance,
}

impl Function {
    /// Functions selectable from the host
    pub const SELECTABLE: [Self; 3] = [Self::Inductance, Self::Capacitance, Self::Resistance];

    /// Two-bit code used on both the FNC status and FNC_R control fields
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Capacitance => 0,
            Self::Resistance => 1,
            Self::Undefined => 2,
            Self::Inductance => 3,
        }
    }

    /// Decode the two-bit function code
    #[must_use]
    pub const fn from_code(code: u16) -> Self {
        match code & 0b11 {
            0 => Self::Capacitance,
            1 => Self::Resistance,
            3 => Self::Inductance,
            _ => Self::Undefined,
        }
    }

    /// Parse a host token (`L`, `C`, `R`)
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "L" => Some(Self::Inductance),
            "C" => Some(Self::Capacitance),
            "R" => Some(Self::Resistance),
            _ => None,
        }
    }

    /// Protocol token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Capacitance => "C",
            Self::Resistance => "R",
            Self::Undefined => "UNDEFINED",
            Self::Inductance => "L",
        }
    }

    /// Number of selectable ranges, the last of which is the Auto slot
    ///
    /// L and R have 8 fixed ranges plus Auto, C has 9 plus Auto.
    #[must_use]
    pub const fn range_count(self) -> u8 {
        match self {
            Self::Inductance | Self::Resistance => 9,
            Self::Capacitance => 10,
            Self::Undefined => 0,
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Function {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str());
    }
}

/// Equivalent circuit mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CircuitMode {
    /// Parallel equivalent circuit
    Parallel,
    /// Series equivalent circuit
    Series,
    /// Meter chooses (control side only)
    Auto,
}

impl CircuitMode {
    /// Code on the CM_R control field
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Parallel => 0,
            Self::Series => 1,
            Self::Auto => 2,
        }
    }

    /// Decode the one-bit CMS status line
    #[must_use]
    pub const fn from_status(cms: u16) -> Self {
        if cms & 1 == 0 {
            Self::Parallel
        } else {
            Self::Series
        }
    }

    /// Parse a host token
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "PAR" => Some(Self::Parallel),
            "SER" => Some(Self::Series),
            "AUTO" => Some(Self::Auto),
            _ => None,
        }
    }

    /// Protocol token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Parallel => "PAR",
            Self::Series => "SER",
            Self::Auto => "AUTO",
        }
    }
}

impl fmt::Display for CircuitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for CircuitMode {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str());
    }
}

/// Test signal frequency
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TestFrequency {
    /// 1 kHz
    Hz1000,
    /// 120 Hz
    Hz120,
}

impl TestFrequency {
    /// Code on FREQ1K_R (control) and FREQ1K_N (status)
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Hz1000 => 0,
            Self::Hz120 => 1,
        }
    }

    /// Decode the one-bit frequency line
    #[must_use]
    pub const fn from_code(code: u16) -> Self {
        if code & 1 == 0 {
            Self::Hz1000
        } else {
            Self::Hz120
        }
    }

    /// Parse a host token
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "1000" => Some(Self::Hz1000),
            "120" => Some(Self::Hz120),
            _ => None,
        }
    }

    /// Protocol token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hz1000 => "1000",
            Self::Hz120 => "120",
        }
    }
}

impl fmt::Display for TestFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TestFrequency {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str} Hz", self.as_str());
    }
}

/// Test signal level
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TestLevel {
    /// 1 V
    Mv1000,
    /// 50 mV
    Mv50,
}

impl TestLevel {
    /// Code on TL_R_N
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Mv1000 => 0,
            Self::Mv50 => 1,
        }
    }

    /// Parse a host token
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "1000" => Some(Self::Mv1000),
            "50" => Some(Self::Mv50),
            _ => None,
        }
    }

    /// Protocol token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mv1000 => "1000",
            Self::Mv50 => "50",
        }
    }
}

impl fmt::Display for TestLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TestLevel {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str} mV", self.as_str());
    }
}

/// Remote/local control state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Remote {
    /// Bus-driven settings are accepted
    On,
    /// Front panel only
    Off,
}

impl Remote {
    /// Code on REM_N (active low)
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::On => 0,
            Self::Off => 1,
        }
    }

    /// Whether the meter follows the control bus
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::On)
    }

    /// Parse a host token
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ON" => Some(Self::On),
            "OFF" => Some(Self::Off),
            _ => None,
        }
    }

    /// Protocol token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

impl fmt::Display for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Remote {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str());
    }
}

/// Measurement regime
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeasurementRegime {
    /// Free-running, every result is reported unsolicited
    Continuous,
    /// One measurement per `*TRG`
    Single,
    /// No further triggering or reporting
    Abort,
}

impl MeasurementRegime {
    /// Parse a host token
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "CONT" => Some(Self::Continuous),
            "SGL" => Some(Self::Single),
            "ABORT" => Some(Self::Abort),
            _ => None,
        }
    }

    /// Protocol token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Continuous => "CONT",
            Self::Single => "SGL",
            Self::Abort => "ABORT",
        }
    }
}

impl fmt::Display for MeasurementRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for MeasurementRegime {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str());
    }
}

/// Measurement range, as the 1-based index into the function's table
///
/// The highest index of each function is its Auto slot. A `Range` is only
/// meaningful together with the function it was validated against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Range(u8);

impl Range {
    /// Validate `index` against the function's range table
    #[must_use]
    pub const fn new(function: Function, index: u8) -> Option<Self> {
        if index >= 1 && index <= function.range_count() {
            Some(Self(index))
        } else {
            None
        }
    }

    /// The function's Auto slot
    #[must_use]
    pub const fn auto(function: Function) -> Self {
        Self(function.range_count())
    }

    /// Parse a host token for the given function
    ///
    /// Only the canonical decimal `1`..`N` is accepted, so the token reads
    /// back unchanged; no sign, no leading zero.
    #[must_use]
    pub fn from_token(function: Function, token: &str) -> Option<Self> {
        let canonical = !token.is_empty()
            && token.bytes().all(|b| b.is_ascii_digit())
            && !token.starts_with('0');
        if !canonical {
            return None;
        }
        let index: u8 = token.parse().ok()?;
        Self::new(function, index)
    }

    /// Table index
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Four-bit code driven onto DRN_LO_R / DRN_HI_R
    #[must_use]
    pub const fn code(self) -> u16 {
        self.0 as u16
    }

    /// Whether this is the function's Auto slot
    #[must_use]
    pub const fn is_auto(self, function: Function) -> bool {
        self.0 == function.range_count()
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Range {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "RNG {}", self.0);
    }
}

/// Settable attribute names
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Circuit mode
    Mode,
    /// Test frequency
    Freq,
    /// Measurement function
    Func,
    /// Range
    Rng,
    /// Test level
    Lev,
    /// Remote/local
    Rem,
    /// Measurement regime
    Meas,
}

impl Attribute {
    /// Order used by the bare `SET?` report
    pub const ALL: [Self; 7] = [
        Self::Mode,
        Self::Freq,
        Self::Func,
        Self::Rng,
        Self::Lev,
        Self::Rem,
        Self::Meas,
    ];

    /// Parse a host token
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|attr| attr.as_str() == token)
    }

    /// Protocol token
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mode => "MODE",
            Self::Freq => "FREQ",
            Self::Func => "FUNC",
            Self::Rng => "RNG",
            Self::Lev => "LEV",
            Self::Rem => "REM",
            Self::Meas => "MEAS",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Attribute {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str());
    }
}
