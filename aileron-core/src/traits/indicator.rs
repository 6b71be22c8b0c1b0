//! Beeper and calibration event traits

use crate::config::features::BeeperMode;

/// Audible indicator
pub trait Beeper {
    /// Play the tune for `mode`
    fn beep(&mut self, mode: BeeperMode);

    /// Play `count` short confirmation beeps
    fn confirmation_beeps(&mut self, count: u8);
}

impl<T: Beeper + ?Sized> Beeper for &mut T {
    fn beep(&mut self, mode: BeeperMode) {
        (**self).beep(mode)
    }

    fn confirmation_beeps(&mut self, count: u8) {
        (**self).confirmation_beeps(count)
    }
}

/// Notifications raised by the calibration engines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationEvent {
    /// Gyro bias captured
    GyroCalibrated,
    /// One accelerometer orientation collected; carries the bin index
    AccPositionDone(u8),
    /// All six orientations solved
    AccCalibrated,
    /// Six orientations collected but the fit was singular
    AccCalibrationFailed,
    /// Magnetometer sample passed the rotation gate
    MagSampleAccepted,
    /// Hard-iron offset solved
    MagCalibrated,
    /// Calibration window ended without enough rotation
    MagCalibrationFailed,
    /// Blink the calibration LED
    IndicatorToggle,
}

/// Receiver of calibration events
///
/// Keeps beeper and LED side effects out of the engines.
pub trait CalibrationObserver {
    fn on_event(&mut self, event: CalibrationEvent);
}

/// Discards every event
impl CalibrationObserver for () {
    fn on_event(&mut self, _event: CalibrationEvent) {}
}

impl<T: CalibrationObserver + ?Sized> CalibrationObserver for &mut T {
    fn on_event(&mut self, event: CalibrationEvent) {
        (**self).on_event(event)
    }
}
