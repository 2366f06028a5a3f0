//! USB CDC ACM (Serial) Implementation
//!
//! Virtual serial port carrying the host command channel. Responses are
//! terminated with CRLF and split into packets of the endpoint size.

use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::driver::{Driver, EndpointError};
use heapless::Vec;

use crate::config::USB_CDC_PACKET_SIZE;
use crate::response::Response;

const PACKET_CAPACITY: usize = USB_CDC_PACKET_SIZE as usize;

/// CDC ACM state
pub struct CdcState<'d> {
    state: State<'d>,
}

impl<'d> Default for CdcState<'d> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'d> CdcState<'d> {
    /// Create new CDC state
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::new(),
        }
    }

    /// Get reference to state for class creation
    pub fn state_mut(&mut self) -> &mut State<'d> {
        &mut self.state
    }
}

/// Send `text` followed by CRLF
///
/// A transfer that ends on a full packet is closed with a zero-length
/// packet so the host does not wait for more data.
pub async fn write_line<'d, D: Driver<'d>>(
    class: &mut CdcAcmClass<'d, D>,
    text: &str,
) -> Result<(), EndpointError> {
    let packet_size = usize::from(class.max_packet_size()).min(PACKET_CAPACITY);
    let mut packet: Vec<u8, PACKET_CAPACITY> = Vec::new();
    for &byte in text.as_bytes().iter().chain(b"\r\n") {
        // never full: flushed below at packet_size
        let _ = packet.push(byte);
        if packet.len() == packet_size {
            class.write_packet(&packet).await?;
            packet.clear();
        }
    }
    class.write_packet(&packet).await
}

/// Send a dispatcher response; silent responses send nothing
pub async fn write_response<'d, D: Driver<'d>>(
    class: &mut CdcAcmClass<'d, D>,
    response: &Response,
) -> Result<(), EndpointError> {
    match response.as_str() {
        Some(text) => write_line(class, text).await,
        None => Ok(()),
    }
}

/// USB device descriptor strings
pub struct UsbStrings {
    /// Manufacturer name
    pub manufacturer: &'static str,
    /// Product name
    pub product: &'static str,
    /// Serial number
    pub serial: &'static str,
}

impl Default for UsbStrings {
    fn default() -> Self {
        Self {
            manufacturer: "HP4261A Adapter",
            product: "HP4261A USB Adapter",
            serial: "0001",
        }
    }
}

/// USB device info for descriptor
#[derive(Clone, Copy, Debug)]
pub struct UsbDeviceInfo {
    /// Vendor ID
    pub vid: u16,
    /// Product ID
    pub pid: u16,
    /// Device release number
    pub device_release: u16,
    /// Bus current draw in mA
    pub max_power_ma: u16,
}

impl Default for UsbDeviceInfo {
    fn default() -> Self {
        Self {
            vid: crate::config::USB_VID,
            pid: crate::config::USB_PID,
            device_release: 0x0100,
            max_power_ma: 100,
        }
    }
}

impl UsbDeviceInfo {
    /// Device configuration for the embassy-usb builder
    #[must_use]
    pub fn usb_config(&self, strings: &UsbStrings) -> embassy_usb::Config<'static> {
        let mut config = embassy_usb::Config::new(self.vid, self.pid);
        config.manufacturer = Some(strings.manufacturer);
        config.product = Some(strings.product);
        config.serial_number = Some(strings.serial);
        config.device_release = self.device_release;
        config.max_power = self.max_power_ma;
        config.max_packet_size_0 = 64;
        config
    }
}

impl defmt::Format for UsbDeviceInfo {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "USB({:04X}:{:04X})", self.vid, self.pid);
    }
}
