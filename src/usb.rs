//! USB Subsystem
//!
//! CDC ACM virtual serial port for the host command channel.

pub mod cdc;
