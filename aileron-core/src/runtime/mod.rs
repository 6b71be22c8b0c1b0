//! Derived runtime views
//!
//! Everything the flight loop reads is rebuilt here from the validated
//! record on each activation. Consumers treat a [`RuntimeConfig`] as
//! read-only; the `generation` counter tells stateful consumers such as
//! the sensor pipelines that coefficients or trims changed.

pub mod curves;
pub mod filter;

pub use curves::RcCurves;
pub use filter::BiquadFilter;

use crate::config::board::BoardDescriptor;
use crate::config::master::MasterConfig;
use crate::config::mixer::{MixerConfig, MixerMode};
use crate::config::nav::NavConfig;
use crate::config::profile::{
    ControlRateConfig, PidProfile, RcControlsConfig, ServoParam, MAX_SUPPORTED_SERVOS,
};
use crate::config::types::{
    BarometerConfig, EscAndServoConfig, FailsafeConfig, Flight3dConfig, GimbalConfig, RxConfig,
    SensorAlign, TelemetryConfig,
};
use crate::sensors::alignment::{self, BoardRotation};

/// Attitude estimator gains
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImuRuntimeConfig {
    pub dcm_kp_acc: f32,
    pub dcm_ki_acc: f32,
    pub dcm_kp_mag: f32,
    pub dcm_ki_mag: f32,
    /// Arming is refused above this tilt, in degrees
    pub small_angle: u8,
}

impl ImuRuntimeConfig {
    fn from_record(record: &MasterConfig) -> Self {
        Self {
            dcm_kp_acc: record.dcm_kp_acc as f32 / 10000.0,
            dcm_ki_acc: record.dcm_ki_acc as f32 / 10000.0,
            dcm_kp_mag: record.dcm_kp_mag as f32 / 10000.0,
            dcm_ki_mag: record.dcm_ki_mag as f32 / 10000.0,
            small_angle: record.small_angle,
        }
    }
}

/// Sensor processing settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorRuntimeConfig {
    pub gyro_align: SensorAlign,
    pub acc_align: SensorAlign,
    pub mag_align: SensorAlign,
    pub board_rotation: BoardRotation,
    /// Template for the per-axis gyro filters, `None` when disabled
    pub gyro_lpf: Option<BiquadFilter>,
    pub gyro_movement_calibration_threshold: u8,
    /// Template for the per-axis acceleration filters
    pub acc_lpf: Option<BiquadFilter>,
    pub acc_zero: [i16; 3],
    pub acc_gain: [i16; 3],
    pub mag_zero: [i16; 3],
}

/// Snapshot consumed by the flight loop
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Incremented on every activation
    pub generation: u32,
    pub profile_index: usize,
    pub rate_profile_index: usize,
    pub rates: ControlRateConfig,
    pub curves: RcCurves,
    pub pid: PidProfile,
    pub rc_controls: RcControlsConfig,
    pub imu: ImuRuntimeConfig,
    pub sensors: SensorRuntimeConfig,
    pub mixer_mode: MixerMode,
    pub mixer: MixerConfig,
    pub esc_and_servo: EscAndServoConfig,
    pub flight_3d: Flight3dConfig,
    pub rx: RxConfig,
    pub servo_conf: [ServoParam; MAX_SUPPORTED_SERVOS],
    pub gimbal: GimbalConfig,
    pub failsafe: FailsafeConfig,
    pub nav: NavConfig,
    pub baro: BarometerConfig,
    pub telemetry: TelemetryConfig,
}

impl RuntimeConfig {
    /// Build every view from a validated record
    ///
    /// `rate_profile_index` must be in range; the caller clamps it.
    pub fn activate(
        record: &MasterConfig,
        board: &BoardDescriptor,
        rate_profile_index: usize,
        generation: u32,
    ) -> Self {
        let profile = record.current_profile();
        let rates = record.control_rate_profiles[rate_profile_index];
        let pid = profile.pid;

        let align = &record.sensor_alignment;
        let sensors = SensorRuntimeConfig {
            gyro_align: alignment::resolve(align.gyro_align, board.sensors.gyro_align),
            acc_align: alignment::resolve(align.acc_align, board.sensors.acc_align),
            mag_align: alignment::resolve(align.mag_align, board.sensors.mag_align),
            board_rotation: BoardRotation::new(&record.board_alignment),
            gyro_lpf: BiquadFilter::for_looptime(pid.gyro_soft_lpf_hz, record.looptime),
            gyro_movement_calibration_threshold: record.gyro.gyro_movement_calibration_threshold,
            acc_lpf: BiquadFilter::for_looptime(pid.acc_soft_lpf_hz, record.looptime),
            acc_zero: record.acc.acc_zero,
            acc_gain: record.acc.acc_gain,
            mag_zero: record.mag.mag_zero,
        };

        Self {
            generation,
            profile_index: record.current_profile_index as usize,
            rate_profile_index,
            rates,
            curves: RcCurves::generate(&rates, &record.esc_and_servo),
            pid,
            rc_controls: profile.rc_controls,
            imu: ImuRuntimeConfig::from_record(record),
            sensors,
            mixer_mode: record.mixer_mode,
            mixer: record.mixer,
            esc_and_servo: record.esc_and_servo,
            flight_3d: record.flight_3d,
            rx: record.rx,
            servo_conf: profile.servo_conf,
            gimbal: profile.gimbal,
            failsafe: record.failsafe,
            nav: record.nav,
            baro: record.baro,
            telemetry: record.telemetry,
        }
    }

    /// Switch the live rate profile and regenerate the curves
    pub fn use_rate_profile(&mut self, index: usize, rates: &ControlRateConfig) {
        self.rate_profile_index = index;
        self.rates = *rates;
        self.curves = RcCurves::generate(rates, &self.esc_and_servo);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::board::BoardId;
    use crate::config::defaults::factory_config;
    use crate::config::types::BoardAlignment;

    #[test]
    fn test_dcm_gains_scaled() {
        let board = BoardId::Naze.descriptor();
        let record = factory_config(board);
        let runtime = RuntimeConfig::activate(&record, board, 0, 1);
        assert_eq!(runtime.imu.dcm_kp_acc, 0.25);
        assert_eq!(runtime.imu.dcm_ki_acc, 0.005);
        assert_eq!(runtime.imu.dcm_kp_mag, 1.0);
        assert_eq!(runtime.imu.dcm_ki_mag, 0.0);
        assert_eq!(runtime.imu.small_angle, 25);
        assert_eq!(runtime.generation, 1);
    }

    #[test]
    fn test_board_alignment_defaults() {
        let board = BoardId::Cc3d.descriptor();
        let record = factory_config(board);
        let runtime = RuntimeConfig::activate(&record, board, 0, 0);
        assert_eq!(runtime.sensors.gyro_align, SensorAlign::Cw270);
        assert_eq!(runtime.sensors.acc_align, SensorAlign::Cw270);
        assert!(runtime.sensors.board_rotation.is_standard());
    }

    #[test]
    fn test_user_alignment_wins() {
        let board = BoardId::Cc3d.descriptor();
        let mut record = factory_config(board);
        record.sensor_alignment.acc_align = SensorAlign::Cw90Flip;
        record.board_alignment = BoardAlignment {
            roll_deci_degrees: 50,
            ..BoardAlignment::default()
        };
        let runtime = RuntimeConfig::activate(&record, board, 0, 0);
        assert_eq!(runtime.sensors.acc_align, SensorAlign::Cw90Flip);
        assert!(!runtime.sensors.board_rotation.is_standard());
    }

    #[test]
    fn test_filters_follow_profile() {
        let board = BoardId::Naze.descriptor();
        let mut record = factory_config(board);
        record.profiles[0].pid.acc_soft_lpf_hz = 0;
        let runtime = RuntimeConfig::activate(&record, board, 0, 0);
        assert!(runtime.sensors.acc_lpf.is_none());
        assert!(runtime.sensors.gyro_lpf.is_some());
    }

    #[test]
    fn test_rate_profile_switch_regenerates_curves() {
        let board = BoardId::Naze.descriptor();
        let mut record = factory_config(board);
        record.control_rate_profiles[2].rc_rate8 = 200;
        let mut runtime = RuntimeConfig::activate(&record, board, 0, 0);
        let before = runtime.curves;

        runtime.use_rate_profile(2, &record.control_rate_profiles[2]);
        assert_eq!(runtime.rate_profile_index, 2);
        assert_ne!(runtime.curves, before);
        assert_eq!(runtime.curves.lookup_pitch_roll(500), 1000);
    }
}
