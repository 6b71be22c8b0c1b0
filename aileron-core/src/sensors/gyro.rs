//! Gyro pipeline
//!
//! read -> filter -> align -> calibrate -> remove bias. While the bias is
//! being measured the output is held at zero so the rate loop sees no
//! motion.

use super::alignment::align;
use super::AxisFilters;
use crate::calibration::{GyroCalibration, GyroCalibrationStep};
use crate::runtime::RuntimeConfig;
use crate::traits::{CalibrationObserver, SensorDevice};

pub struct Gyro<D> {
    device: D,
    calibration: GyroCalibration,
    filters: AxisFilters,
    generation: Option<u32>,
    zero: [i32; 3],
    adc: [i32; 3],
}

impl<D: SensorDevice> Gyro<D> {
    /// Pipeline that measures the bias on its first samples
    pub fn new(device: D) -> Self {
        Self::with_calibration(device, GyroCalibration::new())
    }

    /// Pipeline driving a custom engine, armed immediately
    pub fn with_calibration(device: D, mut calibration: GyroCalibration) -> Self {
        calibration.start();
        Self {
            device,
            calibration,
            filters: AxisFilters::disabled(),
            generation: None,
            zero: [0; 3],
            adc: [0; 3],
        }
    }

    pub fn init(&mut self) -> bool {
        self.device.init()
    }

    /// Re-measure the bias
    pub fn start_calibration(&mut self) {
        self.calibration.start();
    }

    pub fn is_calibration_complete(&self) -> bool {
        self.calibration.is_complete()
    }

    /// Bias in aligned counts
    pub fn zero(&self) -> [i32; 3] {
        self.zero
    }

    /// Latest corrected rate in aligned counts
    pub fn adc(&self) -> [i32; 3] {
        self.adc
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    fn sync(&mut self, runtime: &RuntimeConfig) {
        if self.generation != Some(runtime.generation) {
            self.filters = AxisFilters::from_template(runtime.sensors.gyro_lpf);
            self.generation = Some(runtime.generation);
        }
    }

    /// Process one sample
    ///
    /// Returns `false` when the device had nothing new.
    pub fn update<O: CalibrationObserver>(
        &mut self,
        runtime: &RuntimeConfig,
        observer: &mut O,
    ) -> bool {
        self.sync(runtime);

        let mut raw = [0i16; 3];
        if !self.device.read(&mut raw) {
            return false;
        }

        let filtered = self.filters.apply(raw.map(i32::from));
        let sensors = &runtime.sensors;
        let aligned = align(filtered, sensors.gyro_align, &sensors.board_rotation);

        if !self.calibration.is_complete() {
            let threshold = sensors.gyro_movement_calibration_threshold;
            if let GyroCalibrationStep::Calibrated(zero) =
                self.calibration.push(&aligned, threshold, observer)
            {
                self.zero = zero;
            }
            self.adc = [0; 3];
            return true;
        }

        self.adc = core::array::from_fn(|axis| aligned[axis] - self.zero[axis]);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::testing::{unfiltered_store, HeldSample};
    use crate::traits::CalibrationEvent;

    #[derive(Default)]
    struct Events(u32);

    impl CalibrationObserver for Events {
        fn on_event(&mut self, event: CalibrationEvent) {
            if event == CalibrationEvent::GyroCalibrated {
                self.0 += 1;
            }
        }
    }

    #[test]
    fn test_output_held_during_calibration() {
        let store = unfiltered_store();
        let mut gyro = Gyro::with_calibration(
            HeldSample::new([12, -7, 3]),
            GyroCalibration::with_cycles(10),
        );
        let mut events = Events::default();

        for _ in 0..10 {
            assert!(gyro.update(store.runtime(), &mut events));
            assert_eq!(gyro.adc(), [0; 3]);
        }
        assert!(gyro.is_calibration_complete());
        assert_eq!(gyro.zero(), [12, -7, 3]);
        assert_eq!(events.0, 1);

        gyro.device_mut().sample = [20, -7, 3];
        gyro.update(store.runtime(), &mut events);
        assert_eq!(gyro.adc(), [8, 0, 0]);
    }

    #[test]
    fn test_bias_measured_in_board_frame() {
        let mut store = unfiltered_store();
        store.record_mut().sensor_alignment.gyro_align =
            crate::config::types::SensorAlign::Cw90;
        store.save_config_and_notify().unwrap();

        let mut gyro = Gyro::with_calibration(
            HeldSample::new([5, 9, 1]),
            GyroCalibration::with_cycles(4),
        );
        for _ in 0..4 {
            gyro.update(store.runtime(), &mut ());
        }
        assert_eq!(gyro.zero(), [9, -5, 1]);
    }

    #[test]
    fn test_no_sample_no_update() {
        let store = unfiltered_store();
        let mut device = HeldSample::new([1, 1, 1]);
        device.ready = false;
        let mut gyro = Gyro::with_calibration(device, GyroCalibration::with_cycles(2));
        assert!(!gyro.update(store.runtime(), &mut ()));
        assert!(!gyro.is_calibration_complete());
    }
}
