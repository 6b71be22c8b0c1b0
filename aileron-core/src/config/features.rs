//! Feature and flag registry
//!
//! Features are user-configured capabilities persisted in the master
//! record. The flight loop never reads that mask directly: it reads the
//! [`ActiveFeatures`] latch, refreshed only when the configuration is
//! activated, so toggling a feature mid-flight has no effect until the
//! next activation.

use core::sync::atomic::{AtomicU32, Ordering};

use bitflags::bitflags;
use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Independent capability bits
    ///
    /// Bit positions are part of the persisted format.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Features: u32 {
        /// PPM receiver on a single input
        const RX_PPM = 1 << 0;
        /// Battery voltage monitoring
        const VBAT = 1 << 1;
        /// In-flight accelerometer trim
        const INFLIGHT_ACC_CAL = 1 << 2;
        /// Serial receiver (SBUS, Spektrum, ...)
        const RX_SERIAL = 1 << 3;
        /// Stop motors at idle instead of spinning at minthrottle
        const MOTOR_STOP = 1 << 4;
        /// Camera tilt servos
        const SERVO_TILT = 1 << 5;
        /// Bit-banged serial ports
        const SOFTSERIAL = 1 << 6;
        /// GPS receiver
        const GPS = 1 << 7;
        /// Receiver loss failsafe
        const FAILSAFE = 1 << 8;
        /// Sonar rangefinder
        const SONAR = 1 << 9;
        /// Telemetry output
        const TELEMETRY = 1 << 10;
        /// Current sensor
        const CURRENT_METER = 1 << 11;
        /// Reversible motors
        const MODE_3D = 1 << 12;
        /// One PWM input per channel
        const RX_PARALLEL_PWM = 1 << 13;
        /// Receiver data over MSP
        const RX_MSP = 1 << 14;
        /// RSSI on an analog input
        const RSSI_ADC = 1 << 15;
        /// Addressable LED strip
        const LED_STRIP = 1 << 16;
        /// OLED display
        const DISPLAY = 1 << 17;
        /// OneShot125 ESC protocol
        const ONESHOT125 = 1 << 18;
        /// Onboard flight recorder
        const BLACKBOX = 1 << 19;
        /// Forward aux channels to servo outputs
        const CHANNEL_FORWARDING = 1 << 20;

        /// All receiver variants, exactly one of which may be set
        const RX_VARIANTS = Self::RX_PPM.bits()
            | Self::RX_SERIAL.bits()
            | Self::RX_PARALLEL_PWM.bits()
            | Self::RX_MSP.bits();
    }
}

bitflags! {
    /// Conditions remembered across reboots
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct PersistentFlags: u8 {
        /// Magnetometer hard-iron offset has been measured
        const MAG_CALIBRATION_DONE = 1 << 0;
    }
}

// Flags are stored as their raw bits
impl MaxSize for Features {
    const POSTCARD_MAX_SIZE: usize = u32::POSTCARD_MAX_SIZE;
}

impl MaxSize for PersistentFlags {
    const POSTCARD_MAX_SIZE: usize = u8::POSTCARD_MAX_SIZE;
}

#[cfg(feature = "defmt")]
impl defmt::Format for Features {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Features({=u32:#x})", self.bits())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for PersistentFlags {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "PersistentFlags({=u8:#x})", self.bits())
    }
}

/// Snapshot of the configured features read by the flight loop
///
/// Loads and stores only, so it works on cores without compare-and-swap.
#[derive(Debug, Default)]
pub struct ActiveFeatures(AtomicU32);

impl ActiveFeatures {
    /// Create an empty latch
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    /// Replace the snapshot
    pub fn latch(&self, configured: Features) {
        self.0.store(configured.bits(), Ordering::Release);
    }

    /// Current snapshot
    pub fn get(&self) -> Features {
        Features::from_bits_retain(self.0.load(Ordering::Acquire))
    }

    /// True when every bit of `mask` is active
    pub fn contains(&self, mask: Features) -> bool {
        self.get().contains(mask)
    }
}

/// Beeper conditions in mask-bit order
///
/// Bit `n` of a suppression mask silences the mode whose index is `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BeeperMode {
    /// Gyro bias has been measured
    GyroCalibrated = 1,
    /// Receiver signal lost
    RxLost = 2,
    /// Receiver lost while landing
    RxLostLanding = 3,
    /// Disarm confirmation
    Disarming = 4,
    /// Arm confirmation
    Arming = 5,
    /// Arm confirmation with GPS fix
    ArmingGpsFix = 6,
    /// Battery critical
    BatCritLow = 7,
    /// Battery low
    BatLow = 8,
    /// Armed without throttle input
    ArmedNoThrottle = 9,
    /// Auxiliary switch beeper
    RxSet = 10,
    /// Aircraft not level at arm
    AccCalibration = 11,
    /// Accelerometer calibration failed
    AccCalibrationFail = 12,
    /// Ready to arm
    ReadyBeep = 13,
    /// Multi-purpose confirmation
    MultiBeeps = 14,
    /// Disarmed for a long time
    DisarmRepeat = 15,
    /// Armed reminder
    Armed = 16,
    /// Firmware boot
    SystemInit = 17,
}

/// Number of beeper modes that can be suppressed
pub const BEEPER_MODE_COUNT: u8 = 17;

impl BeeperMode {
    /// Suppression mask bit for this mode
    pub const fn mask(self) -> u32 {
        1 << (self as u8 - 1)
    }
}

/// Mask with the first `count` beeper modes suppressed
pub const fn beeper_mask_all(count: u8) -> u32 {
    if count >= 32 {
        u32::MAX
    } else {
        (1u32 << count) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rx_variants_mask() {
        assert_eq!(Features::RX_VARIANTS.bits().count_ones(), 4);
        assert!(Features::RX_VARIANTS.contains(Features::RX_MSP));
        assert!(!Features::RX_VARIANTS.contains(Features::VBAT));
    }

    #[test]
    fn test_latch_isolated_from_configured() {
        let latch = ActiveFeatures::new();
        let mut configured = Features::FAILSAFE;
        latch.latch(configured);

        configured.insert(Features::GPS);
        assert!(!latch.contains(Features::GPS));

        latch.latch(configured);
        assert!(latch.contains(Features::GPS | Features::FAILSAFE));
    }

    #[test]
    fn test_unknown_bits_survive_latch() {
        let latch = ActiveFeatures::new();
        latch.latch(Features::from_bits_retain(1 << 31));
        assert_eq!(latch.get().bits(), 1 << 31);
    }

    #[test]
    fn test_beeper_masks() {
        assert_eq!(BeeperMode::GyroCalibrated.mask(), 1);
        assert_eq!(BeeperMode::SystemInit.mask(), 1 << 16);
        assert_eq!(beeper_mask_all(BEEPER_MODE_COUNT), 0x1FFFF);
        assert_eq!(beeper_mask_all(0), 0);
        assert_eq!(beeper_mask_all(32), u32::MAX);
    }
}
