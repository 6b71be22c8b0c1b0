//! Beeper and LED feedback for calibration

use aileron_hal::gpio::OutputPin;

use crate::config::features::BeeperMode;
use crate::traits::{Beeper, CalibrationEvent, CalibrationObserver};

/// Confirmation beeps after each accelerometer orientation
pub const ACC_POSITION_BEEPS: u8 = 2;

/// Turns calibration events into beeps and LED blinks
pub struct CalibrationIndicator<B, P> {
    beeper: B,
    led: P,
}

impl<B: Beeper, P: OutputPin> CalibrationIndicator<B, P> {
    pub fn new(beeper: B, led: P) -> Self {
        Self { beeper, led }
    }

    pub fn led(&self) -> &P {
        &self.led
    }

    pub fn release(self) -> (B, P) {
        (self.beeper, self.led)
    }
}

impl<B: Beeper, P: OutputPin> CalibrationObserver for CalibrationIndicator<B, P> {
    fn on_event(&mut self, event: CalibrationEvent) {
        match event {
            CalibrationEvent::GyroCalibrated => self.beeper.beep(BeeperMode::GyroCalibrated),
            CalibrationEvent::AccPositionDone(_) => {
                self.beeper.confirmation_beeps(ACC_POSITION_BEEPS)
            }
            CalibrationEvent::AccCalibrationFailed => {
                self.beeper.beep(BeeperMode::AccCalibrationFail)
            }
            CalibrationEvent::IndicatorToggle => self.led.toggle(),
            CalibrationEvent::MagCalibrationFailed => self.led.set_low(),
            CalibrationEvent::AccCalibrated
            | CalibrationEvent::MagSampleAccepted
            | CalibrationEvent::MagCalibrated => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aileron_hal::mock::MockPin;

    #[derive(Default)]
    struct Tunes {
        last: Option<BeeperMode>,
        confirmations: u8,
    }

    impl Beeper for Tunes {
        fn beep(&mut self, mode: BeeperMode) {
            self.last = Some(mode);
        }

        fn confirmation_beeps(&mut self, count: u8) {
            self.confirmations += count;
        }
    }

    #[test]
    fn test_event_mapping() {
        let mut indicator = CalibrationIndicator::new(Tunes::default(), MockPin::new());

        indicator.on_event(CalibrationEvent::GyroCalibrated);
        indicator.on_event(CalibrationEvent::AccPositionDone(3));
        indicator.on_event(CalibrationEvent::IndicatorToggle);
        assert!(indicator.led().is_set_high());

        indicator.on_event(CalibrationEvent::AccCalibrationFailed);
        let (tunes, led) = indicator.release();
        assert_eq!(tunes.last, Some(BeeperMode::AccCalibrationFail));
        assert_eq!(tunes.confirmations, 2);
        assert_eq!(led.transitions, 1);
    }

    #[test]
    fn test_failed_mag_run_turns_led_off() {
        let mut indicator = CalibrationIndicator::new(Tunes::default(), MockPin::new());
        indicator.on_event(CalibrationEvent::IndicatorToggle);
        indicator.on_event(CalibrationEvent::MagCalibrationFailed);
        assert!(!indicator.led().is_set_high());
    }
}
