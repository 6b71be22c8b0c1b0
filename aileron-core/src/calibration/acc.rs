//! Six-position accelerometer calibration
//!
//! The aircraft is held still in each of six orientations (level,
//! inverted, and on each side). Every orientation is a separate arm of
//! the engine; samples are binned by their dominant axis and sign:
//!
//! | bin | orientation |
//! |-----|-------------|
//! | 0   | +Z          |
//! | 1   | -Z          |
//! | 2   | +X          |
//! | 3   | -X          |
//! | 4   | +Y          |
//! | 5   | -Y          |
//!
//! Once all six bins are filled the zero offset is fitted as the centre
//! of a sphere through every sample, and the per-axis gain from the
//! offset-corrected bin averages.

use super::solver::CalibrationState;
use crate::config::types::ACC_GAIN_UNITY;
use crate::traits::indicator::{CalibrationEvent, CalibrationObserver};

/// Samples collected per orientation
pub const CALIBRATING_ACC_CYCLES: u16 = 400;

pub const ACC_BIN_COUNT: usize = 6;

/// Bin of the strictly dominant axis, `None` when no axis dominates
pub fn primary_axis_bin(sample: &[i32; 3]) -> Option<usize> {
    let [x, y, z] = sample.map(i32::unsigned_abs);
    if z > x && z > y {
        Some(if sample[2] > 0 { 0 } else { 1 })
    } else if x > y && x > z {
        Some(if sample[0] > 0 { 2 } else { 3 })
    } else if y > x && y > z {
        Some(if sample[1] > 0 { 4 } else { 5 })
    } else {
        None
    }
}

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccCalibrationState {
    Idle,
    /// Armed; `remaining` samples left for the current orientation
    Sampling { remaining: u16 },
}

/// Solved trims
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AccCalibrationResult {
    pub zero: [i16; 3],
    pub gain: [i16; 3],
}

/// Outcome of one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccCalibrationStep {
    /// Not calibrating
    Idle,
    /// No dominant axis or orientation already collected
    Discarded,
    /// Sample accumulated
    Sampling,
    /// Orientation `bin` collected; re-arm for the next one
    PositionDone(usize),
    /// All six orientations solved
    Calibrated(AccCalibrationResult),
    /// Samples did not determine a solution; bins are cleared
    Failed,
}

#[derive(Debug, Clone)]
pub struct AccCalibration {
    state: AccCalibrationState,
    cycles: u16,
    one_g: i32,
    solver: CalibrationState,
    calibrated: [bool; ACC_BIN_COUNT],
    sums: [[i64; 3]; ACC_BIN_COUNT],
    counts: [u32; ACC_BIN_COUNT],
}

impl AccCalibration {
    /// Engine for a sensor reading `one_g` counts per unit of gravity
    pub const fn new(one_g: i32) -> Self {
        Self::with_cycles(one_g, CALIBRATING_ACC_CYCLES)
    }

    pub const fn with_cycles(one_g: i32, cycles: u16) -> Self {
        Self {
            state: AccCalibrationState::Idle,
            cycles: if cycles == 0 { 1 } else { cycles },
            one_g,
            solver: CalibrationState::new(),
            calibrated: [false; ACC_BIN_COUNT],
            sums: [[0; 3]; ACC_BIN_COUNT],
            counts: [0; ACC_BIN_COUNT],
        }
    }

    pub fn state(&self) -> AccCalibrationState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == AccCalibrationState::Idle
    }

    /// Orientations collected so far
    pub fn calibrated_bins(&self) -> [bool; ACC_BIN_COUNT] {
        self.calibrated
    }

    /// Arm collection of one orientation
    pub fn start(&mut self) {
        self.state = AccCalibrationState::Sampling {
            remaining: self.cycles,
        };
    }

    fn clear_bins(&mut self) {
        self.calibrated = [false; ACC_BIN_COUNT];
        self.sums = [[0; 3]; ACC_BIN_COUNT];
        self.counts = [0; ACC_BIN_COUNT];
        self.solver.reset();
    }

    /// Feed one raw, unaligned sample
    pub fn push<O: CalibrationObserver>(
        &mut self,
        sample: &[i32; 3],
        observer: &mut O,
    ) -> AccCalibrationStep {
        let AccCalibrationState::Sampling { remaining } = self.state else {
            return AccCalibrationStep::Idle;
        };

        let Some(bin) = primary_axis_bin(sample) else {
            return AccCalibrationStep::Discarded;
        };

        // a fresh run always starts level
        if bin == 0 && remaining == self.cycles {
            self.clear_bins();
        }

        if self.calibrated[bin] {
            return AccCalibrationStep::Discarded;
        }

        self.solver.push_offset_sample(sample);
        for axis in 0..3 {
            self.sums[bin][axis] += sample[axis] as i64;
        }
        self.counts[bin] += 1;

        if remaining > 1 {
            self.state = AccCalibrationState::Sampling {
                remaining: remaining - 1,
            };
            return AccCalibrationStep::Sampling;
        }

        self.state = AccCalibrationState::Idle;
        self.calibrated[bin] = true;
        observer.on_event(CalibrationEvent::AccPositionDone(bin as u8));
        log_info!("acc orientation {} collected", bin);

        if self.calibrated.iter().all(|done| *done) {
            let step = match self.solve() {
                Some(result) => {
                    observer.on_event(CalibrationEvent::AccCalibrated);
                    AccCalibrationStep::Calibrated(result)
                }
                None => {
                    log_warn!("acc calibration did not converge");
                    observer.on_event(CalibrationEvent::AccCalibrationFailed);
                    AccCalibrationStep::Failed
                }
            };
            self.clear_bins();
            return step;
        }

        AccCalibrationStep::PositionDone(bin)
    }

    fn solve(&mut self) -> Option<AccCalibrationResult> {
        let offset = self.solver.solve_offset()?;
        let zero = offset.map(|v| saturate_i16(libm::rintf(v)));

        let mut scale_state = CalibrationState::new();
        for bin in 0..ACC_BIN_COUNT {
            let count = self.counts[bin].max(1) as i64;
            let average: [i32; 3] = core::array::from_fn(|axis| {
                (self.sums[bin][axis] / count) as i32 - zero[axis] as i32
            });
            scale_state.push_scale_sample(bin / 2, &average, self.one_g);
        }

        let scale = scale_state.solve_scale()?;
        let gain = scale.map(|v| saturate_i16(libm::rintf(v * ACC_GAIN_UNITY as f32)));
        Some(AccCalibrationResult { zero, gain })
    }
}

fn saturate_i16(value: f32) -> i16 {
    value.clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
