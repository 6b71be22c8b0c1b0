//! Synthetic sensor for bench runs without hardware

use aileron_core::traits::SensorDevice;

/// Always-ready source returning whatever sample was last set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FakeSensor {
    sample: [i16; 3],
}

impl FakeSensor {
    pub const fn new(sample: [i16; 3]) -> Self {
        Self { sample }
    }

    pub fn set(&mut self, sample: [i16; 3]) {
        self.sample = sample;
    }
}

impl SensorDevice for FakeSensor {
    fn init(&mut self) -> bool {
        true
    }

    fn read(&mut self, raw: &mut [i16; 3]) -> bool {
        *raw = self.sample;
        true
    }
}
