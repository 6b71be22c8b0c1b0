//! Transient state bits

use bitflags::bitflags;

bitflags! {
    /// Volatile flags raised by the flight loop and consumed elsewhere
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct StateFlags: u8 {
        const GPS_FIX_HOME = 1 << 0;
        const GPS_FIX = 1 << 1;
        /// Start magnetometer calibration on the next compass tick
        const CALIBRATE_MAG = 1 << 2;
        const SMALL_ANGLE = 1 << 3;
        const FIXED_WING = 1 << 4;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StateFlags {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "StateFlags({=u8:#x})", self.bits())
    }
}
