//! Magnetometer hard-iron calibration
//!
//! For a fixed window after arming, every compass tick compares the new
//! sample with the last accepted one. A sample is kept only when the
//! field vector has turned by roughly 8 degrees, so holding the aircraft
//! still contributes nothing. At the end of the window the offset is
//! fitted as the centre of a sphere through the kept samples.

use super::solver::CalibrationState;
use crate::traits::indicator::{CalibrationEvent, CalibrationObserver};

/// Length of the collection window
pub const MAG_CALIBRATION_WINDOW_US: u32 = 30_000_000;

/// tan(8 deg), squared for comparison against the squared ratio
const MIN_ROTATION_TAN_SQ: f32 = 0.14 * 0.14;

const MIN_FIELD_SQ: f32 = 0.01;

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MagCalibrationState {
    Idle,
    Collecting { started_at_us: u32 },
}

/// Outcome of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MagCalibrationStep {
    Idle,
    Collecting { accepted: bool },
    /// Hard-iron offset per axis
    Calibrated([i16; 3]),
    /// Not enough rotation to fit an offset
    Failed,
}

/// True when `sample` has rotated far enough from `previous`
pub fn rotated_enough(sample: &[i32; 3], previous: &[i32; 3]) -> bool {
    let mut diff = 0.0f32;
    let mut avg = 0.0f32;
    for axis in 0..3 {
        let d = (sample[axis] - previous[axis]) as f32;
        let s = (sample[axis] + previous[axis]) as f32;
        diff += d * d;
        avg += s * s / 4.0;
    }
    avg > MIN_FIELD_SQ && diff / avg > MIN_ROTATION_TAN_SQ
}

#[derive(Debug, Clone)]
pub struct MagCalibration {
    state: MagCalibrationState,
    solver: CalibrationState,
    previous: Option<[i32; 3]>,
    accepted: u32,
}

impl Default for MagCalibration {
    fn default() -> Self {
        Self::new()
    }
}

impl MagCalibration {
    pub const fn new() -> Self {
        Self {
            state: MagCalibrationState::Idle,
            solver: CalibrationState::new(),
            previous: None,
            accepted: 0,
        }
    }

    pub fn state(&self) -> MagCalibrationState {
        self.state
    }

    pub fn is_collecting(&self) -> bool {
        matches!(self.state, MagCalibrationState::Collecting { .. })
    }

    /// Samples kept in the current or last run
    pub fn accepted_samples(&self) -> u32 {
        self.accepted
    }

    /// Open the collection window at `now_us`
    pub fn start(&mut self, now_us: u32) {
        self.state = MagCalibrationState::Collecting {
            started_at_us: now_us,
        };
        self.solver.reset();
        self.previous = None;
        self.accepted = 0;
    }

    /// Advance the window by one tick
    ///
    /// `sample` has the stored offset already removed and is `None` when
    /// the device had no reading; the window still closes on time. The
    /// first sample of a run only primes the rotation reference.
    pub fn update<O: CalibrationObserver>(
        &mut self,
        now_us: u32,
        sample: Option<&[i32; 3]>,
        observer: &mut O,
    ) -> MagCalibrationStep {
        let MagCalibrationState::Collecting { started_at_us } = self.state else {
            return MagCalibrationStep::Idle;
        };

        if now_us.wrapping_sub(started_at_us) < MAG_CALIBRATION_WINDOW_US {
            observer.on_event(CalibrationEvent::IndicatorToggle);

            let Some(sample) = sample else {
                return MagCalibrationStep::Collecting { accepted: false };
            };
            let accepted = match self.previous {
                None => {
                    self.previous = Some(*sample);
                    false
                }
                Some(previous) => rotated_enough(sample, &previous),
            };

            if accepted {
                self.solver.push_offset_sample(sample);
                self.previous = Some(*sample);
                self.accepted += 1;
                observer.on_event(CalibrationEvent::MagSampleAccepted);
            }
            return MagCalibrationStep::Collecting { accepted };
        }

        self.state = MagCalibrationState::Idle;
        match self.solver.solve_offset() {
            Some(offset) => {
                let zero = offset
                    .map(|v| libm::rintf(v).clamp(i16::MIN as f32, i16::MAX as f32) as i16);
                log_info!(
                    "mag calibrated from {} samples: {} {} {}",
                    self.accepted,
                    zero[0],
                    zero[1],
                    zero[2]
                );
                observer.on_event(CalibrationEvent::MagCalibrated);
                MagCalibrationStep::Calibrated(zero)
            }
            None => {
                log_warn!("mag calibration failed after {} samples", self.accepted);
                observer.on_event(CalibrationEvent::MagCalibrationFailed);
                MagCalibrationStep::Failed
            }
        }
    }
}
