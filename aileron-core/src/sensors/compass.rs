//! Compass pipeline
//!
//! Runs on its own 10 Hz tick: read -> align -> remove hard-iron offset.
//! Raising [`StateFlags::CALIBRATE_MAG`] starts a 30 s collection window;
//! the solved offset is written to the record, the calibration-done flag
//! is set and the record saved.

use super::alignment::align;
use crate::calibration::{MagCalibration, MagCalibrationStep};
use crate::config::features::PersistentFlags;
use crate::config::store::{ConfigError, ConfigHandle};
use crate::state::StateFlags;
use crate::traits::{CalibrationObserver, SensorDevice};

/// Minimum spacing between compass updates
pub const COMPASS_UPDATE_INTERVAL_US: u32 = 100_000;

pub struct Compass<D> {
    device: D,
    calibration: MagCalibration,
    generation: Option<u32>,
    zero: [i16; 3],
    /// Offset in use before the running calibration cleared it
    previous_zero: [i16; 3],
    next_update_at_us: u32,
    adc: [i32; 3],
}

impl<D: SensorDevice> Compass<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            calibration: MagCalibration::new(),
            generation: None,
            zero: [0; 3],
            previous_zero: [0; 3],
            next_update_at_us: 0,
            adc: [0; 3],
        }
    }

    pub fn init(&mut self) -> bool {
        self.device.init()
    }

    pub fn is_calibrating(&self) -> bool {
        self.calibration.is_collecting()
    }

    pub fn calibration(&self) -> &MagCalibration {
        &self.calibration
    }

    /// Latest field reading with the offset removed
    pub fn adc(&self) -> [i32; 3] {
        self.adc
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    /// Process one tick
    ///
    /// Returns `Ok(false)` when called before the next tick is due or
    /// when the device had nothing new. A running calibration window
    /// advances on every due tick, read or not.
    pub fn update<C, O>(
        &mut self,
        now_us: u32,
        state: &mut StateFlags,
        config: &mut C,
        observer: &mut O,
    ) -> Result<bool, ConfigError>
    where
        C: ConfigHandle,
        O: CalibrationObserver,
    {
        if (now_us.wrapping_sub(self.next_update_at_us) as i32) < 0 {
            return Ok(false);
        }
        self.next_update_at_us = now_us.wrapping_add(COMPASS_UPDATE_INTERVAL_US);

        let runtime = config.runtime();
        if self.generation != Some(runtime.generation) {
            self.zero = runtime.sensors.mag_zero;
            self.generation = Some(runtime.generation);
        }

        if state.contains(StateFlags::CALIBRATE_MAG) {
            state.remove(StateFlags::CALIBRATE_MAG);
            self.previous_zero = self.zero;
            self.zero = [0; 3];
            config.config_mut().mag.mag_zero = [0; 3];
            self.calibration.start(now_us);
        }

        let mut raw = [0i16; 3];
        let aligned = self.device.read(&mut raw).then(|| {
            let sensors = &config.runtime().sensors;
            align(raw.map(i32::from), sensors.mag_align, &sensors.board_rotation)
        });

        let sample = aligned.map(|aligned| self.remove_offset(&aligned));
        match self.calibration.update(now_us, sample.as_ref(), observer) {
            MagCalibrationStep::Calibrated(zero) => {
                let record = config.config_mut();
                record.mag.mag_zero = zero;
                record.persistent_flags.insert(PersistentFlags::MAG_CALIBRATION_DONE);
                config.save_config_and_notify()?;
                self.zero = config.runtime().sensors.mag_zero;
                self.generation = Some(config.runtime().generation);
            }
            MagCalibrationStep::Failed => {
                self.zero = self.previous_zero;
                config.config_mut().mag.mag_zero = self.previous_zero;
            }
            MagCalibrationStep::Idle | MagCalibrationStep::Collecting { .. } => {}
        }

        let Some(aligned) = aligned else {
            return Ok(false);
        };
        self.adc = self.remove_offset(&aligned);
        Ok(true)
    }

    fn remove_offset(&self, aligned: &[i32; 3]) -> [i32; 3] {
        core::array::from_fn(|axis| aligned[axis] - self.zero[axis] as i32)
    }
}
