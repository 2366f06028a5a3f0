//! TCA9555 Port Expander Driver
//!
//! Both expanders (U2 status, U3 control) share one I2C bus. The driver is
//! generic over the blocking embedded-hal I2C trait so the same code runs on
//! the STM32 and against host-side mocks.

use embedded_hal::i2c::{Error as I2cError, ErrorKind, I2c};

use crate::bus::PortExpander;
use crate::config::{U2_I2C_ADDR, U3_I2C_ADDR};
use crate::error::TransportError;

/// TCA9555 register addresses
pub mod reg {
    /// Input port 0; port 1 follows
    pub const INPUT_PORT0: u8 = 0x00;
    /// Output port 0
    pub const OUTPUT_PORT0: u8 = 0x02;
    /// Polarity inversion port 0
    pub const POLARITY_PORT0: u8 = 0x04;
    /// Configuration (direction) port 0
    pub const CONFIG_PORT0: u8 = 0x06;
}

/// I2C device address wrapper
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct I2cAddress(u8);

impl I2cAddress {
    /// U2 status expander
    pub const U2: Self = Self(U2_I2C_ADDR);

    /// U3 control expander
    pub const U3: Self = Self(U3_I2C_ADDR);

    /// Create from 7-bit address
    #[must_use]
    pub const fn new(addr: u8) -> Self {
        Self(addr & 0x7F)
    }

    /// Get the 7-bit address
    #[must_use]
    pub const fn addr(self) -> u8 {
        self.0
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for I2cAddress {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "0x{:02X}", self.0);
    }
}

/// Map an embedded-hal I2C error onto the adapter's transport error
fn classify<E: I2cError>(err: &E) -> TransportError {
    match err.kind() {
        ErrorKind::NoAcknowledge(_) => TransportError::Nack,
        _ => TransportError::Bus,
    }
}

/// The pair of TCA9555 expanders on one I2C bus
pub struct Tca9555Bus<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Tca9555Bus<I2C> {
    /// Wrap an I2C bus
    #[must_use]
    pub const fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    /// Set pin directions and clear polarity inversion
    ///
    /// A set bit in `output_mask` makes that pin an output. The output port
    /// is loaded with `initial` first so outputs come up at a known level.
    pub fn configure(
        &mut self,
        addr: I2cAddress,
        output_mask: u16,
        initial: u16,
    ) -> Result<(), TransportError> {
        self.write_pair(addr, reg::OUTPUT_PORT0, initial)?;
        self.write_pair(addr, reg::POLARITY_PORT0, 0)?;
        // Direction register: 1 = input
        self.write_pair(addr, reg::CONFIG_PORT0, !output_mask)?;
        debug!("TCA9555 {:#x} outputs {:#x}", addr.addr(), output_mask);
        Ok(())
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_pair(&mut self, addr: I2cAddress, reg: u8, value: u16) -> Result<(), TransportError> {
        let [lo, hi] = value.to_le_bytes();
        self.i2c
            .write(addr.addr(), &[reg, lo, hi])
            .map_err(|e| classify(&e))
    }
}

impl<I2C: I2c> PortExpander for Tca9555Bus<I2C> {
    fn read16(&mut self, addr: I2cAddress) -> Result<u16, TransportError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(addr.addr(), &[reg::INPUT_PORT0], &mut buf)
            .map_err(|e| classify(&e))?;
        Ok(u16::from_le_bytes(buf))
    }

    fn write16(&mut self, addr: I2cAddress, bits: u16) -> Result<(), TransportError> {
        self.write_pair(addr, reg::OUTPUT_PORT0, bits)
    }
}
