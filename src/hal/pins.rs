//! Direct MCU Pins
//!
//! The BCD digit lines, FLAG and WTGT come straight into the MCU; the gate
//! LED is the only direct output. [`McuPins`] packs them into the bit layout
//! of the MCU resource in [`crate::bus::fields`]. No debouncing: the meter
//! drives clean TTL levels.

use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::bus::{fields, DirectPins};
use crate::error::TransportError;

/// Input pins in bit order: WTGT, FLAG, DTB1, DTB2, DTB4, DTB8
pub const INPUT_COUNT: usize = 6;

/// Direct pin bundle
pub struct McuPins<I, O> {
    inputs: [I; INPUT_COUNT],
    led: O,
}

impl<I: InputPin, O: OutputPin> McuPins<I, O> {
    /// Bundle the pins; `inputs` must be in bit order
    #[must_use]
    pub const fn new(inputs: [I; INPUT_COUNT], led: O) -> Self {
        Self { inputs, led }
    }

    /// Give the pins back
    pub fn release(self) -> ([I; INPUT_COUNT], O) {
        (self.inputs, self.led)
    }
}

impl<I: InputPin, O: OutputPin> DirectPins for McuPins<I, O> {
    fn read_pins(&mut self) -> Result<u8, TransportError> {
        let mut bits = 0u8;
        for (i, pin) in self.inputs.iter_mut().enumerate() {
            if pin.is_high().map_err(|_| TransportError::Pin)? {
                bits |= 1 << i;
            }
        }
        Ok(bits)
    }

    fn write_pins(&mut self, mask: u8, bits: u8) -> Result<(), TransportError> {
        #[allow(clippy::cast_possible_truncation)]
        let led_bit = fields::LED_GATE.mask() as u8;
        if mask & led_bit != 0 {
            self.led
                .set_state(PinState::from(bits & led_bit != 0))
                .map_err(|_| TransportError::Pin)?;
        }
        Ok(())
    }
}
