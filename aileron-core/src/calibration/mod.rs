//! Sensor calibration engines
//!
//! Each engine is a small state machine fed one sample at a time by the
//! matching sensor pipeline. Engines never touch the configuration
//! record; they return their result and report progress through a
//! [`CalibrationObserver`](crate::traits::CalibrationObserver).

pub mod acc;
pub mod gyro;
pub mod mag;
pub mod solver;
pub mod stdev;

pub use acc::{AccCalibration, AccCalibrationResult, AccCalibrationStep, CALIBRATING_ACC_CYCLES};
pub use gyro::{GyroCalibration, GyroCalibrationStep, CALIBRATING_GYRO_CYCLES};
pub use mag::{MagCalibration, MagCalibrationStep, MAG_CALIBRATION_WINDOW_US};
pub use solver::CalibrationState;
pub use stdev::StdDev;
