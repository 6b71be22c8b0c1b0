//! Sensor pipelines
//!
//! Each pipeline owns one [`SensorDevice`](crate::traits::SensorDevice),
//! turns its raw counts into aligned, trimmed readings and drives the
//! matching calibration engine. Pipelines read their settings from the
//! [`RuntimeConfig`](crate::runtime::RuntimeConfig) and reload them
//! whenever its generation changes.

pub mod acc;
pub mod alignment;
pub mod compass;
pub mod gyro;
pub mod indicator;

pub use acc::Accelerometer;
pub use compass::{Compass, COMPASS_UPDATE_INTERVAL_US};
pub use gyro::Gyro;
pub use indicator::CalibrationIndicator;

use crate::runtime::BiquadFilter;

/// One filter per axis, cloned from an activation template
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct AxisFilters(Option<[BiquadFilter; 3]>);

impl AxisFilters {
    pub(crate) const fn disabled() -> Self {
        Self(None)
    }

    pub(crate) fn from_template(template: Option<BiquadFilter>) -> Self {
        Self(template.map(|mut filter| {
            filter.reset();
            [filter; 3]
        }))
    }

    pub(crate) fn apply(&mut self, sample: [i32; 3]) -> [i32; 3] {
        match &mut self.0 {
            Some(filters) => core::array::from_fn(|axis| {
                libm::rintf(filters[axis].apply(sample[axis] as f32)) as i32
            }),
            None => sample,
        }
    }
}
