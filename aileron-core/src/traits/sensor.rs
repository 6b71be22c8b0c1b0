//! Sensor source trait

/// A three-axis sensor as seen by the calibration pipelines
///
/// Implementations hand out raw, unaligned ADC counts.
pub trait SensorDevice {
    /// Probe and configure the device
    ///
    /// Returns `false` if the device did not answer.
    fn init(&mut self) -> bool;

    /// Read one sample into `raw`
    ///
    /// Returns `false` when no fresh sample was available; `raw` is then
    /// left untouched.
    fn read(&mut self, raw: &mut [i16; 3]) -> bool;
}

impl<T: SensorDevice + ?Sized> SensorDevice for &mut T {
    fn init(&mut self) -> bool {
        (**self).init()
    }

    fn read(&mut self, raw: &mut [i16; 3]) -> bool {
        (**self).read(raw)
    }
}
