//! Accelerometer pipeline
//!
//! read -> filter -> calibrate -> trim -> align. Calibration sees the
//! filtered chip-frame samples, so the six orientations are classified
//! before any trim is applied. A solved calibration is written to the
//! record and saved straight away.

use super::alignment::align;
use super::AxisFilters;
use crate::calibration::{AccCalibration, AccCalibrationStep};
use crate::config::store::{ConfigError, ConfigHandle};
use crate::config::types::ACC_GAIN_UNITY;
use crate::runtime::RuntimeConfig;
use crate::traits::{CalibrationObserver, SensorDevice};

/// Apply zero and gain trims to one sample
pub fn apply_trims(sample: [i32; 3], zero: &[i16; 3], gain: &[i16; 3]) -> [i32; 3] {
    core::array::from_fn(|axis| {
        let centered = sample[axis] as i64 - zero[axis] as i64;
        (centered * gain[axis] as i64 / ACC_GAIN_UNITY as i64) as i32
    })
}

pub struct Accelerometer<D> {
    device: D,
    calibration: AccCalibration,
    filters: AxisFilters,
    generation: Option<u32>,
    zero: [i16; 3],
    gain: [i16; 3],
    adc: [i32; 3],
}

impl<D: SensorDevice> Accelerometer<D> {
    /// Pipeline for a device reading `one_g` counts per unit of gravity
    pub fn new(device: D, one_g: i32) -> Self {
        Self::with_calibration(device, AccCalibration::new(one_g))
    }

    pub fn with_calibration(device: D, calibration: AccCalibration) -> Self {
        Self {
            device,
            calibration,
            filters: AxisFilters::disabled(),
            generation: None,
            zero: [0; 3],
            gain: [ACC_GAIN_UNITY; 3],
            adc: [0; 3],
        }
    }

    pub fn init(&mut self) -> bool {
        self.device.init()
    }

    /// Arm collection of the next orientation
    pub fn start_calibration(&mut self) {
        self.calibration.start();
    }

    pub fn is_calibration_complete(&self) -> bool {
        self.calibration.is_complete()
    }

    pub fn calibration(&self) -> &AccCalibration {
        &self.calibration
    }

    /// Latest trimmed, aligned reading
    pub fn adc(&self) -> [i32; 3] {
        self.adc
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    fn sync(&mut self, runtime: &RuntimeConfig) {
        if self.generation != Some(runtime.generation) {
            self.filters = AxisFilters::from_template(runtime.sensors.acc_lpf);
            self.zero = runtime.sensors.acc_zero;
            self.gain = runtime.sensors.acc_gain;
            self.generation = Some(runtime.generation);
        }
    }

    /// Process one sample
    ///
    /// Returns `Ok(false)` when the device had nothing new. Errors come
    /// only from saving a finished calibration.
    pub fn update<C, O>(&mut self, config: &mut C, observer: &mut O) -> Result<bool, ConfigError>
    where
        C: ConfigHandle,
        O: CalibrationObserver,
    {
        self.sync(config.runtime());

        let mut raw = [0i16; 3];
        if !self.device.read(&mut raw) {
            return Ok(false);
        }

        let filtered = self.filters.apply(raw.map(i32::from));

        if !self.calibration.is_complete() {
            if let AccCalibrationStep::Calibrated(result) =
                self.calibration.push(&filtered, observer)
            {
                let record = config.config_mut();
                record.acc.acc_zero = result.zero;
                record.acc.acc_gain = result.gain;
                config.save_config_and_notify()?;
                self.sync(config.runtime());
            }
        }

        let trimmed = apply_trims(filtered, &self.zero, &self.gain);
        let sensors = &config.runtime().sensors;
        self.adc = align(trimmed, sensors.acc_align, &sensors.board_rotation);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::testing::{unfiltered_store, HeldSample};

    const ONE_G: i16 = 4096;

    #[test]
    fn test_trims() {
        assert_eq!(
            apply_trims([100, -100, 4196], &[0, 0, 100], &[4096, 8192, 2048]),
            [100, -200, 2048]
        );
    }

    #[test]
    fn test_six_point_written_and_saved() {
        let mut store = unfiltered_store();
        let beeps_before = store.beeper().confirmations;
        let mut acc = Accelerometer::with_calibration(
            HeldSample::new([0, 0, 0]),
            AccCalibration::with_cycles(ONE_G as i32, 8),
        );

        let offset = [35i16, -60, 120];
        let orientations = [
            [0, 0, ONE_G],
            [0, 0, -ONE_G],
            [ONE_G, 0, 0],
            [-ONE_G, 0, 0],
            [0, ONE_G, 0],
            [0, -ONE_G, 0],
        ];

        for g in orientations {
            acc.device_mut().sample = core::array::from_fn(|axis| g[axis] + offset[axis]);
            acc.start_calibration();
            for _ in 0..8 {
                acc.update(&mut store, &mut ()).unwrap();
            }
        }

        assert!(acc.is_calibration_complete());
        assert_eq!(store.record().acc.acc_zero, offset);
        for gain in store.record().acc.acc_gain {
            assert!((gain - 4096).abs() <= 1, "gain {gain}");
        }
        assert_eq!(store.beeper().confirmations, beeps_before + 1);

        acc.device_mut().sample = [35, -60, 120 + ONE_G];
        acc.update(&mut store, &mut ()).unwrap();
        let level = acc.adc();
        assert!(level[0].abs() <= 1 && level[1].abs() <= 1);
        assert!((level[2] - ONE_G as i32).abs() <= 2);
    }

    #[test]
    fn test_alignment_after_trims() {
        let mut store = unfiltered_store();
        store.record_mut().acc.acc_zero = [10, 0, 0];
        store.record_mut().sensor_alignment.acc_align =
            crate::config::types::SensorAlign::Cw180;
        store.save_config_and_notify().unwrap();

        let mut acc = Accelerometer::new(HeldSample::new([110, 50, 4096]), ONE_G as i32);
        acc.update(&mut store, &mut ()).unwrap();
        assert_eq!(acc.adc(), [-100, -50, 4096]);
    }
}
