//! Gyro bias calibration
//!
//! Averages a fixed number of samples while the aircraft sits still. If
//! any axis shows more spread than the movement threshold the run starts
//! over.

use super::stdev::StdDev;
use crate::traits::indicator::{CalibrationEvent, CalibrationObserver};

/// Samples averaged per run
pub const CALIBRATING_GYRO_CYCLES: u16 = 1000;

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GyroCalibrationState {
    Idle,
    /// Collecting; `remaining` counts down to the solving cycle
    Sampling { remaining: u16 },
}

/// Outcome of one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GyroCalibrationStep {
    /// Not calibrating
    Idle,
    /// Sample consumed
    Sampling,
    /// Motion detected, the run was re-armed
    Restarted,
    /// Bias per axis
    Calibrated([i32; 3]),
}

#[derive(Debug, Clone)]
pub struct GyroCalibration {
    state: GyroCalibrationState,
    cycles: u16,
    sum: [i32; 3],
    deviation: [StdDev; 3],
}

impl Default for GyroCalibration {
    fn default() -> Self {
        Self::new()
    }
}

impl GyroCalibration {
    pub const fn new() -> Self {
        Self::with_cycles(CALIBRATING_GYRO_CYCLES)
    }

    /// Engine averaging `cycles` samples per run
    pub const fn with_cycles(cycles: u16) -> Self {
        Self {
            state: GyroCalibrationState::Idle,
            cycles: if cycles == 0 { 1 } else { cycles },
            sum: [0; 3],
            deviation: [StdDev::new(); 3],
        }
    }

    pub fn state(&self) -> GyroCalibrationState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == GyroCalibrationState::Idle
    }

    /// Arm a full run
    pub fn start(&mut self) {
        self.state = GyroCalibrationState::Sampling {
            remaining: self.cycles,
        };
    }

    /// Feed one aligned sample
    ///
    /// A zero `movement_threshold` disables the motion check. The bias is
    /// the mean rounded to nearest with halves going up, so a mean of -3.5
    /// gives -3 and -3.7 gives -4; plain truncating division would give
    /// -3 for both.
    pub fn push<O: CalibrationObserver>(
        &mut self,
        sample: &[i32; 3],
        movement_threshold: u8,
        observer: &mut O,
    ) -> GyroCalibrationStep {
        let GyroCalibrationState::Sampling { remaining } = self.state else {
            return GyroCalibrationStep::Idle;
        };

        if remaining == self.cycles {
            self.sum = [0; 3];
            for dev in self.deviation.iter_mut() {
                dev.clear();
            }
        }

        for axis in 0..3 {
            self.sum[axis] += sample[axis];
            self.deviation[axis].push(sample[axis] as f32);
        }

        if remaining > 1 {
            self.state = GyroCalibrationState::Sampling {
                remaining: remaining - 1,
            };
            return GyroCalibrationStep::Sampling;
        }

        let threshold = movement_threshold as f32;
        if movement_threshold != 0
            && self
                .deviation
                .iter()
                .any(|dev| dev.standard_deviation() > threshold)
        {
            log_debug!("gyro moved during calibration, restarting");
            self.start();
            return GyroCalibrationStep::Restarted;
        }

        let n = self.cycles as i32;
        let zero = self.sum.map(|sum| (sum + n / 2).div_euclid(n));

        self.state = GyroCalibrationState::Idle;
        observer.on_event(CalibrationEvent::GyroCalibrated);
        log_info!("gyro calibrated: {} {} {}", zero[0], zero[1], zero[2]);
        GyroCalibrationStep::Calibrated(zero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Events(u32);

    impl CalibrationObserver for Events {
        fn on_event(&mut self, event: CalibrationEvent) {
            assert_eq!(event, CalibrationEvent::GyroCalibrated);
            self.0 += 1;
        }
    }

    #[test]
    fn test_idle_ignores_samples() {
        let mut cal = GyroCalibration::new();
        assert!(cal.is_complete());
        assert_eq!(cal.push(&[1, 2, 3], 32, &mut ()), GyroCalibrationStep::Idle);
    }

    #[test]
    fn test_mean_rounded_to_nearest() {
        let mut cal = GyroCalibration::with_cycles(4);
        let mut events = Events::default();
        cal.start();

        let samples = [[10, -3, 0], [11, -4, 1], [10, -4, 0], [11, -3, 1]];
        let mut last = GyroCalibrationStep::Idle;
        for sample in &samples {
            last = cal.push(sample, 32, &mut events);
        }
        // means: 10.5, -3.5, 0.5 rounded half up
        assert_eq!(last, GyroCalibrationStep::Calibrated([11, -3, 1]));
        assert!(cal.is_complete());
        assert_eq!(events.0, 1);
    }

    #[test]
    fn test_negative_mean_rounds_to_nearest() {
        let mut cal = GyroCalibration::with_cycles(10);
        cal.start();
        let mut last = GyroCalibrationStep::Idle;
        // mean -3.7 on x
        for i in 0..10 {
            let x = if i < 7 { -4 } else { -3 };
            last = cal.push(&[x, 0, 0], 32, &mut ());
        }
        assert_eq!(last, GyroCalibrationStep::Calibrated([-4, 0, 0]));
    }

    #[test]
    fn test_motion_rearms() {
        let mut cal = GyroCalibration::with_cycles(3);
        let mut events = Events::default();
        cal.start();

        cal.push(&[0, 0, 0], 5, &mut events);
        cal.push(&[200, 0, 0], 5, &mut events);
        assert_eq!(
            cal.push(&[-200, 0, 0], 5, &mut events),
            GyroCalibrationStep::Restarted
        );
        assert_eq!(
            cal.state(),
            GyroCalibrationState::Sampling { remaining: 3 }
        );

        // the restarted run does not see the moving samples
        for _ in 0..2 {
            cal.push(&[4, 4, 4], 5, &mut events);
        }
        assert_eq!(
            cal.push(&[4, 4, 4], 5, &mut events),
            GyroCalibrationStep::Calibrated([4, 4, 4])
        );
        assert_eq!(events.0, 1);
    }

    #[test]
    fn test_zero_threshold_accepts_motion() {
        let mut cal = GyroCalibration::with_cycles(2);
        cal.start();
        cal.push(&[1000, 0, 0], 0, &mut ());
        assert_eq!(
            cal.push(&[-1000, 0, 0], 0, &mut ()),
            GyroCalibrationStep::Calibrated([0, 0, 0])
        );
    }
}
