//! Motor output hooks used at boot

/// Motor outputs as needed when switching ESC protocols
pub trait MotorOutputs {
    /// Drive every motor output to its stop value
    fn stop_all(&mut self);

    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}
