//! Hardware Abstraction Layer
//!
//! Adapts embedded-hal peripherals to the transports the bus layer expects.
//! Everything here is generic over the embedded-hal traits, so it builds and
//! is tested on the host as well as on the STM32.

pub mod expander;
pub mod pins;
