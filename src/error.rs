//! Error kinds reported to the host
//!
//! Every error is recoverable: the dispatcher turns it into a single
//! `ERROR ...` line and keeps accepting commands. `Display` is the text that
//! follows `ERROR` on the wire.

use heapless::String;

use crate::types::Attribute;

/// Longest attribute token echoed back in an `InvalidAttribute` error
pub const MAX_ATTR_TOKEN: usize = 8;

/// Failure of a single expander or pin transaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// Expander did not acknowledge its address or data
    Nack,
    /// Arbitration loss, bus error or overrun on the I2C bus
    Bus,
    /// A direct MCU pin could not be read or driven
    Pin,
}

#[cfg(feature = "embedded")]
impl defmt::Format for TransportError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Nack => defmt::write!(f, "NACK"),
            Self::Bus => defmt::write!(f, "bus error"),
            Self::Pin => defmt::write!(f, "pin error"),
        }
    }
}

/// Adapter error
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// `SET`/`SET?` named an attribute that does not exist
    #[error("InvalidAttribute {0}")]
    InvalidAttribute(String<MAX_ATTR_TOKEN>),
    /// Value outside the attribute's domain (for the current function)
    #[error("InvalidValue {0}")]
    InvalidValue(Attribute),
    /// Command requires remote mode
    #[error("NotRemote")]
    NotRemote,
    /// Command requires a different measurement regime
    #[error("WrongRegime")]
    WrongRegime,
    /// An expander I2C transaction failed
    #[error("BusTransportFailure")]
    BusTransportFailure,
    /// The meter kept INHIBIT asserted past the retry bound
    #[error("InhibitTimeout")]
    InhibitTimeout,
    /// Unrecognized command verb
    #[error("UnknownCommand")]
    UnknownCommand,
}

impl Error {
    /// Build an `InvalidAttribute` error, truncating long tokens
    #[must_use]
    pub fn invalid_attribute(token: &str) -> Self {
        let mut name = String::new();
        for c in token.chars() {
            if name.push(c).is_err() {
                break;
            }
        }
        Self::InvalidAttribute(name)
    }

    /// Whether the error was caught before any bus write
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::BusTransportFailure | Self::InhibitTimeout)
    }
}

impl From<TransportError> for Error {
    fn from(_: TransportError) -> Self {
        Self::BusTransportFailure
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::InvalidAttribute(name) => defmt::write!(f, "InvalidAttribute {=str}", name.as_str()),
            Self::InvalidValue(attr) => defmt::write!(f, "InvalidValue {}", attr),
            Self::NotRemote => defmt::write!(f, "NotRemote"),
            Self::WrongRegime => defmt::write!(f, "WrongRegime"),
            Self::BusTransportFailure => defmt::write!(f, "BusTransportFailure"),
            Self::InhibitTimeout => defmt::write!(f, "InhibitTimeout"),
            Self::UnknownCommand => defmt::write!(f, "UnknownCommand"),
        }
    }
}

/// Adapter result
pub type Result<T> = core::result::Result<T, Error>;
