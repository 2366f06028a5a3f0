//! Bus Register Abstraction
//!
//! The HP 4261A is wired to the adapter through three resources: the U2
//! expander (status lines in), the U3 expander (control lines out, INHIBIT
//! in) and a handful of direct MCU pins (BCD digit lines, FLAG, WTGT and the
//! gate LED). This module names every line as a [`BusField`] and gives typed
//! read/write access to them through [`InstrumentBus`], the single owner of
//! all instrument I/O.
//!
//! Nothing is cached. Every read is a fresh transaction because the meter
//! changes its lines between polls, and every expander field write is a
//! read-modify-write of the current port word.

use core::fmt;

use crate::config::{U2_I2C_ADDR, U3_I2C_ADDR, U3_IDLE_WORD};
use crate::error::{Result, TransportError};
use crate::hal::expander::I2cAddress;

/// 16-bit port expander pair, as seen by the bus layer
///
/// `read16` returns the input port (the actual pin levels, outputs
/// included); `write16` sets the output port.
pub trait PortExpander {
    /// Read both input ports of the expander at `addr`
    fn read16(&mut self, addr: I2cAddress) -> core::result::Result<u16, TransportError>;

    /// Write both output ports of the expander at `addr`
    fn write16(&mut self, addr: I2cAddress, bits: u16) -> core::result::Result<(), TransportError>;
}

impl<T: PortExpander + ?Sized> PortExpander for &mut T {
    fn read16(&mut self, addr: I2cAddress) -> core::result::Result<u16, TransportError> {
        (**self).read16(addr)
    }

    fn write16(&mut self, addr: I2cAddress, bits: u16) -> core::result::Result<(), TransportError> {
        (**self).write16(addr, bits)
    }
}

/// Direct MCU pins, packed as bits in the order of [`fields`]
pub trait DirectPins {
    /// Sample every pin
    fn read_pins(&mut self) -> core::result::Result<u8, TransportError>;

    /// Drive the output pins selected by `mask` to the levels in `bits`
    fn write_pins(&mut self, mask: u8, bits: u8) -> core::result::Result<(), TransportError>;
}

impl<T: DirectPins + ?Sized> DirectPins for &mut T {
    fn read_pins(&mut self) -> core::result::Result<u8, TransportError> {
        (**self).read_pins()
    }

    fn write_pins(&mut self, mask: u8, bits: u8) -> core::result::Result<(), TransportError> {
        (**self).write_pins(mask, bits)
    }
}

/// Addressable resource a field lives on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Status expander
    U2,
    /// Control expander
    U3,
    /// Direct MCU pins
    Mcu,
}

impl Resource {
    /// Number of addressable bits
    #[must_use]
    pub const fn width(self) -> u8 {
        match self {
            Self::U2 | Self::U3 => 16,
            Self::Mcu => 7,
        }
    }

    /// I2C address, for expander resources
    #[must_use]
    pub const fn address(self) -> Option<I2cAddress> {
        match self {
            Self::U2 => Some(I2cAddress::new(U2_I2C_ADDR)),
            Self::U3 => Some(I2cAddress::new(U3_I2C_ADDR)),
            Self::Mcu => None,
        }
    }

    /// Schematic name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::U2 => "U2",
            Self::U3 => "U3",
            Self::Mcu => "MCU",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Resource {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=str}", self.as_str());
    }
}

/// A named bit or bit-group at a fixed place on one resource
///
/// Definitions are validated when they are built, so a field that does not
/// fit its resource fails const evaluation instead of misbehaving at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BusField {
    name: &'static str,
    resource: Resource,
    offset: u8,
    width: u8,
}

impl BusField {
    /// Define a field
    ///
    /// # Panics
    ///
    /// If the field is empty or extends past the resource width. In a
    /// `const` item this is a compile error.
    #[must_use]
    pub const fn new(name: &'static str, resource: Resource, offset: u8, width: u8) -> Self {
        assert!(width > 0, "bus field must be at least one bit wide");
        assert!(
            offset as u16 + width as u16 <= resource.width() as u16,
            "bus field does not fit its resource"
        );
        Self {
            name,
            resource,
            offset,
            width,
        }
    }

    /// Schematic name
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// Resource the field lives on
    #[must_use]
    pub const fn resource(self) -> Resource {
        self.resource
    }

    /// Bit offset of the least significant bit
    #[must_use]
    pub const fn offset(self) -> u8 {
        self.offset
    }

    /// Width in bits
    #[must_use]
    pub const fn width(self) -> u8 {
        self.width
    }

    /// Largest value the field can hold
    #[must_use]
    pub const fn max_value(self) -> u16 {
        ((1u32 << self.width) - 1) as u16
    }

    /// Field mask within the resource word
    #[must_use]
    pub const fn mask(self) -> u16 {
        self.max_value() << self.offset
    }

    /// Extract the field from a resource word
    #[must_use]
    pub const fn extract(self, word: u16) -> u16 {
        (word & self.mask()) >> self.offset
    }

    /// Replace the field within a resource word
    #[must_use]
    pub const fn insert(self, word: u16, value: u16) -> u16 {
        (word & !self.mask()) | ((value << self.offset) & self.mask())
    }
}

/// Field map of the adapter
pub mod fields {
    use super::{BusField, Resource};

    // Direct MCU pins
    /// Wait trigger, low while the meter's data window is open
    pub const WTGT_N: BusField = BusField::new("WTGT_N", Resource::Mcu, 0, 1);
    /// Digit data valid, active low
    pub const FLAG_N: BusField = BusField::new("FLAG_N", Resource::Mcu, 1, 1);
    /// BCD nibble DTB1/DTB2/DTB4/DTB8
    pub const DIGIT: BusField = BusField::new("DTB", Resource::Mcu, 2, 4);
    /// Gate indicator LED
    pub const LED_GATE: BusField = BusField::new("LED_GATE", Resource::Mcu, 6, 1);

    // U3: control outputs
    /// Function select
    pub const FNC_R: BusField = BusField::new("FNC_R", Resource::U3, 0, 2);
    /// Circuit mode select
    pub const CM_R: BusField = BusField::new("CM_R", Resource::U3, 2, 2);
    /// Range select, bits 0..1
    pub const DRN_LO_R: BusField = BusField::new("DRN_LO_R", Resource::U3, 4, 2);
    /// Test level select
    pub const TL_R_N: BusField = BusField::new("TL_R_N", Resource::U3, 6, 1);
    /// Test frequency select
    pub const FREQ1K_R: BusField = BusField::new("FREQ1K_R", Resource::U3, 7, 1);
    /// Execute strobe, active low
    pub const EXE_N: BusField = BusField::new("EXE_N", Resource::U3, 8, 1);
    /// Range select, bits 2..3
    pub const DRN_HI_R: BusField = BusField::new("DRN_HI_R", Resource::U3, 9, 2);
    /// Remote enable, active low
    pub const REM_N: BusField = BusField::new("REM_N", Resource::U3, 11, 1);
    /// Meter busy, active low (input)
    pub const INHIBIT_N: BusField = BusField::new("INHIBIT_N", Resource::U3, 12, 1);

    // U2: status inputs
    /// Circuit mode in use
    pub const CMS: BusField = BusField::new("CMS", Resource::U2, 0, 1);
    /// Primary display out of range
    pub const OR: BusField = BusField::new("OR", Resource::U2, 1, 1);
    /// Test frequency in use
    pub const FREQ1K_N: BusField = BusField::new("FREQ1K_N", Resource::U2, 2, 1);
    /// Function in use
    pub const FNC: BusField = BusField::new("FNC", Resource::U2, 3, 2);
    /// Dissipation display blanked, active low
    pub const DBLANK_N: BusField = BusField::new("DBLANK_N", Resource::U2, 5, 1);
    /// Range in use
    pub const RNG: BusField = BusField::new("RNG", Resource::U2, 8, 4);
}

/// Single owner of every line between the adapter and the meter
pub struct InstrumentBus<X, P> {
    expanders: X,
    pins: P,
}

impl<X: PortExpander, P: DirectPins> InstrumentBus<X, P> {
    /// Take ownership of the expander transport and the MCU pins
    pub const fn new(expanders: X, pins: P) -> Self {
        Self { expanders, pins }
    }

    /// Drive the control bus to its idle state
    ///
    /// Strobe released, local control, all selectors zero, gate LED off.
    pub fn init(&mut self) -> Result<()> {
        self.write_word(Resource::U3, U3_IDLE_WORD)?;
        self.write_field(fields::LED_GATE, 0)?;
        debug!("control bus idle");
        Ok(())
    }

    /// Read a whole resource word
    pub fn read_word(&mut self, resource: Resource) -> Result<u16> {
        let word = match resource.address() {
            Some(addr) => self.expanders.read16(addr).map_err(|e| {
                warn!("{} read failed: {:?}", resource, e);
                e
            })?,
            None => u16::from(self.pins.read_pins()?),
        };
        trace!("{} -> {:#x}", resource, word);
        Ok(word)
    }

    /// Write a whole resource word
    ///
    /// For the MCU resource every pin bit is driven; input pins ignore it.
    pub fn write_word(&mut self, resource: Resource, word: u16) -> Result<()> {
        trace!("{} <- {:#x}", resource, word);
        match resource.address() {
            Some(addr) => self.expanders.write16(addr, word).map_err(|e| {
                warn!("{} write failed: {:?}", resource, e);
                e.into()
            }),
            None => {
                #[allow(clippy::cast_possible_truncation)]
                let bits = word as u8;
                self.pins.write_pins(u8::MAX >> 1, bits)?;
                Ok(())
            }
        }
    }

    /// Read one field
    pub fn read_field(&mut self, field: BusField) -> Result<u16> {
        let word = self.read_word(field.resource())?;
        Ok(field.extract(word))
    }

    /// Write one field, leaving the rest of the resource untouched
    pub fn write_field(&mut self, field: BusField, value: u16) -> Result<()> {
        debug_assert!(
            value <= field.max_value(),
            "value does not fit bus field"
        );
        match field.resource().address() {
            Some(_) => {
                let word = self.read_word(field.resource())?;
                self.write_word(field.resource(), field.insert(word, value))
            }
            None => {
                #[allow(clippy::cast_possible_truncation)]
                let (mask, bits) = (field.mask() as u8, field.insert(0, value) as u8);
                self.pins.write_pins(mask, bits)?;
                Ok(())
            }
        }
    }

    /// Give the transports back
    pub fn release(self) -> (X, P) {
        (self.expanders, self.pins)
    }
}
