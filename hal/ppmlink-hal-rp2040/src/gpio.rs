//! Codec pins over embedded-hal digital drivers
//!
//! The wrappers are generic over `embedded_hal::digital`, so they take
//! embassy-rp's `Input` and `Output` directly. Both drivers are infallible
//! on the RP2040; a pin error reads as low.

use embedded_hal::digital::{InputPin as HalInput, OutputPin as HalOutput, StatefulOutputPin};
use ppmlink_hal::{InputPin, OutputPin};

/// Decoder input
pub struct CodecInput<P>(P);

impl<P: HalInput> CodecInput<P> {
    pub fn new(pin: P) -> Self {
        Self(pin)
    }

    pub fn into_inner(self) -> P {
        self.0
    }
}

impl<P: HalInput> InputPin for CodecInput<P> {
    fn is_high(&mut self) -> bool {
        self.0.is_high().unwrap_or(false)
    }
}

/// Encoder output
///
/// Tracks the commanded level itself so `is_set_high` stays a plain read.
pub struct CodecOutput<P> {
    pin: P,
    high: bool,
}

impl<P: HalOutput + StatefulOutputPin> CodecOutput<P> {
    pub fn new(mut pin: P) -> Self {
        let high = pin.is_set_high().unwrap_or(false);
        Self { pin, high }
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: HalOutput + StatefulOutputPin> OutputPin for CodecOutput<P> {
    fn set_high(&mut self) {
        let _ = self.pin.set_high();
        self.high = true;
    }

    fn set_low(&mut self) {
        let _ = self.pin.set_low();
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}
