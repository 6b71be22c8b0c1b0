//! GPIO pin abstractions
//!
//! Only outputs are needed here: the status LED blinks while the
//! magnetometer is being calibrated.

/// Digital output pin
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Toggle the pin state
    fn toggle(&mut self) {
        if self.is_set_high() {
            self.set_low();
        } else {
            self.set_high();
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;
}
