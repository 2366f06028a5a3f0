//! HP 4261A USB Adapter Firmware Library
//!
//! This library bridges the HP 4261A LCR meter's parallel instrument bus
//! (BCD digit lines, status lines and an expander-driven control bus) to a
//! line-oriented serial command interface, so a host can read measurements
//! and remote-control the meter as if it spoke SCPI.
//!
//! # Architecture
//!
//! The firmware is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │  Command Dispatcher  │  Settings Registry  │  Responses      │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    INSTRUMENT LAYER                          │
//! │  Measurement Decoder  │  Range/Unit Tables                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │                 BUS REGISTER ABSTRACTION                     │
//! │  Named fields on U2 / U3 (TCA9555)  │  Direct MCU pins       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / TRANSPORT LAYER                      │
//! │  I2C  │  GPIO  │  USB CDC ACM  │  embassy-rs executor        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Single owner of instrument state**: only the bus layer touches the
//!   meter; nothing shadows its registers
//! - **Type-driven design**: enumerated domains instead of magic numbers
//! - **No unsafe in application code**
//! - **Functional core, imperative shell**: decoding, validation and
//!   formatting are pure; the embassy binary only moves bytes
//! - **Explicit error handling**: all fallible operations return `Result`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by the application (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;
#[cfg(feature = "embedded")]
pub use embassy_usb;

#[macro_use]
mod fmt;

/// Hardware Abstraction Layer
///
/// embedded-hal adapters for the TCA9555 expanders and the MCU pins.
pub mod hal;

/// Bus Register Abstraction
///
/// Named fields on the two expanders and the direct pins.
pub mod bus;

/// Measurement Decoder
///
/// BCD sampling state machine and the `Measurement` record.
pub mod decoder;

/// Range and unit tables, per function.
pub mod ranges;

/// Settings Registry
///
/// Live configuration with validated domains.
pub mod settings;

/// Command Dispatcher
///
/// Executes host commands against the registry and the bus.
pub mod dispatcher;

/// Response Formatter
pub mod response;

/// Line assembly and command tokenizing.
pub mod protocol;

/// USB Subsystem
///
/// CDC ACM for the host command channel.
#[cfg(feature = "embedded")]
pub mod usb;

/// Error kinds reported to the host
pub mod error;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    // Common traits
    pub use embedded_hal::delay::DelayNs;
    pub use embedded_hal::i2c::I2c;

    // Embassy
    pub use embassy_time::{Duration, Instant, Timer};

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
