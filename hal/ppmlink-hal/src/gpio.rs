//! GPIO pin abstractions
//!
//! Pins are polled, never interrupt driven: the timing loops sample the
//! input once per iteration and write the output exactly when a deadline
//! expires.

/// Digital output pin
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently driven high
    fn is_set_high(&self) -> bool;

    /// Invert the pin and return the new state
    fn toggle(&mut self) -> bool {
        let high = !self.is_set_high();
        self.set_state(high);
        high
    }
}

/// Digital input pin
pub trait InputPin {
    /// Sample the pin; `true` is logic 1
    fn is_high(&mut self) -> bool;

    /// Sample the pin; `true` is logic 0
    fn is_low(&mut self) -> bool {
        !self.is_high()
    }
}
