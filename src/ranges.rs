//! Range and unit tables
//!
//! Every function has its own ladder of ranges. Each range is a 1000-count
//! full scale with a fixed decimal point and unit, so a reading is scaled by
//! looking up its `(function, range index)` pair. Index 0 is undefined for
//! every function and the top slots are Auto.

use core::fmt::{self, Write};

use crate::types::Function;

/// Full-scale count of every fixed range
pub const FULL_SCALE_DIGITS: [u8; 4] = [1, 0, 0, 0];

/// Engineering unit of a range
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Unit {
    /// µH
    MicroHenry,
    /// mH
    MilliHenry,
    /// H
    Henry,
    /// pF
    PicoFarad,
    /// nF
    NanoFarad,
    /// µF
    MicroFarad,
    /// mF
    MilliFarad,
    /// mΩ
    MilliOhm,
    /// Ω
    Ohm,
    /// kΩ
    KiloOhm,
    /// MΩ
    MegaOhm,
}

impl Unit {
    /// ASCII symbol used on the wire
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::MicroHenry => "uH",
            Self::MilliHenry => "mH",
            Self::Henry => "H",
            Self::PicoFarad => "pF",
            Self::NanoFarad => "nF",
            Self::MicroFarad => "uF",
            Self::MilliFarad => "mF",
            Self::MilliOhm => "mOhm",
            Self::Ohm => "Ohm",
            Self::KiloOhm => "kOhm",
            Self::MegaOhm => "MOhm",
        }
    }

    /// Function whose quantity this unit measures
    #[must_use]
    pub const fn function(self) -> Function {
        match self {
            Self::MicroHenry | Self::MilliHenry | Self::Henry => Function::Inductance,
            Self::PicoFarad | Self::NanoFarad | Self::MicroFarad | Self::MilliFarad => {
                Function::Capacitance
            }
            Self::MilliOhm | Self::Ohm | Self::KiloOhm | Self::MegaOhm => Function::Resistance,
        }
    }
}

/// Scaling of one fixed range
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RangeUnit {
    /// Digits after the decimal point
    pub decimals: u8,
    /// Unit of the reading
    pub unit: Unit,
}

impl RangeUnit {
    const fn new(decimals: u8, unit: Unit) -> Self {
        Self { decimals, unit }
    }
}

/// One slot of a function's range table
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RangeEntry {
    /// No range is defined at this index
    Undefined,
    /// Fixed range
    Fixed(RangeUnit),
    /// Autoranging
    Auto,
}

impl fmt::Display for RangeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("UNDEFINED"),
            Self::Auto => f.write_str("AUTO"),
            Self::Fixed(range) => {
                write_fixed_point(f, &FULL_SCALE_DIGITS, range.decimals)?;
                write!(f, " {}", range.unit.symbol())
            }
        }
    }
}

use RangeEntry::{Auto, Fixed, Undefined};
use Unit::{
    Henry, KiloOhm, MegaOhm, MicroFarad, MicroHenry, MilliFarad, MilliHenry, MilliOhm, NanoFarad,
    Ohm, PicoFarad,
};

const INDUCTANCE: [RangeEntry; 11] = [
    Undefined,
    Fixed(RangeUnit::new(1, MicroHenry)),
    Fixed(RangeUnit::new(0, MicroHenry)),
    Fixed(RangeUnit::new(2, MilliHenry)),
    Fixed(RangeUnit::new(1, MilliHenry)),
    Fixed(RangeUnit::new(0, MilliHenry)),
    Fixed(RangeUnit::new(2, Henry)),
    Fixed(RangeUnit::new(1, Henry)),
    Fixed(RangeUnit::new(0, Henry)),
    Auto,
    Auto,
];

const CAPACITANCE: [RangeEntry; 11] = [
    Undefined,
    Fixed(RangeUnit::new(1, PicoFarad)),
    Fixed(RangeUnit::new(0, PicoFarad)),
    Fixed(RangeUnit::new(2, NanoFarad)),
    Fixed(RangeUnit::new(1, NanoFarad)),
    Fixed(RangeUnit::new(0, NanoFarad)),
    Fixed(RangeUnit::new(2, MicroFarad)),
    Fixed(RangeUnit::new(1, MicroFarad)),
    Fixed(RangeUnit::new(0, MicroFarad)),
    Fixed(RangeUnit::new(2, MilliFarad)),
    Auto,
];

const RESISTANCE: [RangeEntry; 10] = [
    Undefined,
    Fixed(RangeUnit::new(0, MilliOhm)),
    Fixed(RangeUnit::new(2, Ohm)),
    Fixed(RangeUnit::new(1, Ohm)),
    Fixed(RangeUnit::new(0, Ohm)),
    Fixed(RangeUnit::new(2, KiloOhm)),
    Fixed(RangeUnit::new(1, KiloOhm)),
    Fixed(RangeUnit::new(0, KiloOhm)),
    Fixed(RangeUnit::new(2, MegaOhm)),
    Auto,
];

/// The function's whole range table, index 0 included
#[must_use]
pub fn table(function: Function) -> &'static [RangeEntry] {
    match function {
        Function::Inductance => &INDUCTANCE,
        Function::Capacitance => &CAPACITANCE,
        Function::Resistance => &RESISTANCE,
        Function::Undefined => &[],
    }
}

/// Look up a `(function, index)` pair; anything outside the table is `Undefined`
#[must_use]
pub fn lookup(function: Function, index: u8) -> RangeEntry {
    table(function)
        .get(usize::from(index))
        .copied()
        .unwrap_or(Undefined)
}

/// Write BCD digits with a fixed decimal point
///
/// Leading zeros of the integer part are dropped, keeping at least one
/// digit. `decimals` larger than the digit count is clamped.
pub fn write_fixed_point<W: Write>(w: &mut W, digits: &[u8], decimals: u8) -> fmt::Result {
    let split = digits.len().saturating_sub(usize::from(decimals));
    let (int, frac) = digits.split_at(split);
    let first = int
        .iter()
        .position(|&d| d != 0)
        .unwrap_or(int.len().saturating_sub(1));
    if int.is_empty() {
        w.write_char('0')?;
    }
    for &d in &int[first..] {
        w.write_char(char::from(b'0' + d))?;
    }
    if !frac.is_empty() {
        w.write_char('.')?;
        for &d in frac {
            w.write_char(char::from(b'0' + d))?;
        }
    }
    Ok(())
}
