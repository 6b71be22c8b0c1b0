//! Property tests for the calibration engines

use aileron_core::calibration::{GyroCalibration, GyroCalibrationStep, CALIBRATING_GYRO_CYCLES};
use proptest::prelude::*;

/// Factory movement threshold
const MOVEMENT_THRESHOLD: u8 = 32;

fn still_gyro_run() -> impl Strategy<Value = ([i32; 3], Vec<[i32; 3]>)> {
    (
        prop::array::uniform3(-600i32..600),
        prop::collection::vec(
            prop::array::uniform3(-12i32..=12),
            CALIBRATING_GYRO_CYCLES as usize,
        ),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn still_gyro_converges_to_rounded_mean((bias, noise) in still_gyro_run()) {
        let mut cal = GyroCalibration::new();
        cal.start();

        let mut sum = [0i32; 3];
        let mut outcome = GyroCalibrationStep::Idle;
        for (cycle, jitter) in noise.iter().enumerate() {
            let sample: [i32; 3] = core::array::from_fn(|axis| bias[axis] + jitter[axis]);
            for axis in 0..3 {
                sum[axis] += sample[axis];
            }
            outcome = cal.push(&sample, MOVEMENT_THRESHOLD, &mut ());
            if cycle + 1 < noise.len() {
                prop_assert_eq!(outcome, GyroCalibrationStep::Sampling);
            }
        }

        let n = CALIBRATING_GYRO_CYCLES as i32;
        let expected = sum.map(|s| (s + n / 2).div_euclid(n));
        prop_assert_eq!(outcome, GyroCalibrationStep::Calibrated(expected));
        prop_assert!(cal.is_complete());
    }
}
