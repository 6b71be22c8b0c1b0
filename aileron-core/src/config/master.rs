//! The master record
//!
//! One structure holds every tunable of the vehicle. It is persisted as a
//! whole and restored as a whole; sub-systems receive views of it after
//! validation and activation.

use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

use super::features::{Features, PersistentFlags};
use super::mixer::{MixerConfig, MixerMode, MotorMixer, MAX_SUPPORTED_MOTORS};
use super::nav::NavConfig;
use super::profile::{
    ControlRateConfig, Profile, MAX_CONTROL_RATE_PROFILE_COUNT, MAX_PROFILE_COUNT,
};
use super::serial::SerialConfig;
use super::types::*;

/// Complete persisted configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, MaxSize)]
pub struct MasterConfig {
    /// Schema version the record was written with
    pub version: u8,
    pub mixer_mode: MixerMode,
    /// Configured features, see [`super::features::ActiveFeatures`] for the flight view
    pub enabled_features: Features,
    pub persistent_flags: PersistentFlags,

    pub sensor_hardware: SensorHardware,
    pub board_alignment: BoardAlignment,
    pub sensor_alignment: SensorAlignmentConfig,

    /// Main loop period in µs
    pub looptime: u16,
    /// Shift the PLL to keep harmonics out of the UHF band
    pub emf_avoidance: bool,
    pub i2c_overclock: bool,
    /// Run the loop from the gyro data-ready interrupt
    pub gyro_sync: bool,
    /// Gyro samples per loop when synchronised
    pub gyro_sync_denominator: u8,

    /// 1 for normal yaw, -1 for inverted
    pub yaw_control_direction: i8,
    /// DCM gains, ×10000
    pub dcm_kp_acc: u16,
    pub dcm_ki_acc: u16,
    pub dcm_kp_mag: u16,
    pub dcm_ki_mag: u16,
    /// Largest tilt in degrees that still allows arming
    pub small_angle: u8,

    pub gyro: GyroConfig,
    pub acc: AccTrims,
    pub mag: MagConfig,
    pub baro: BarometerConfig,
    pub battery: BatteryConfig,
    pub telemetry: TelemetryConfig,

    pub rx: RxConfig,
    /// Hardware input filtering for noisy receivers
    pub input_filtering_mode: bool,
    /// Allow disarm by switch regardless of throttle
    pub disarm_kill_switch: bool,
    /// Seconds at zero throttle before auto disarm, zero disables
    pub auto_disarm_delay: u8,

    pub mixer: MixerConfig,
    pub esc_and_servo: EscAndServoConfig,
    pub flight_3d: Flight3dConfig,
    /// Motor update rate in Hz
    pub motor_pwm_rate: u16,
    /// Servo update rate in Hz
    pub servo_pwm_rate: u16,
    pub custom_motor_mixer: [MotorMixer; MAX_SUPPORTED_MOTORS],

    pub gps: GpsConfig,
    pub nav: NavConfig,
    pub serial: SerialConfig,
    pub failsafe: FailsafeConfig,
    pub blackbox: BlackboxConfig,
    pub led_strip: LedStripConfig,

    pub current_profile_index: u8,
    pub profiles: [Profile; MAX_PROFILE_COUNT],
    pub control_rate_profiles: [ControlRateConfig; MAX_CONTROL_RATE_PROFILE_COUNT],

    /// Beeper modes currently silenced
    pub beeper_off_flags: u32,
    /// Beeper modes the user prefers silenced
    pub prefered_beeper_off_flags: u32,
}

impl MasterConfig {
    /// Profile selected by `current_profile_index`
    ///
    /// Falls back to the first profile for an out-of-range index.
    pub fn current_profile(&self) -> &Profile {
        self.profiles
            .get(self.current_profile_index as usize)
            .unwrap_or(&self.profiles[0])
    }

    /// Mutable access to the selected profile
    pub fn current_profile_mut(&mut self) -> &mut Profile {
        let index = self.current_profile_index as usize;
        let index = if index < MAX_PROFILE_COUNT { index } else { 0 };
        &mut self.profiles[index]
    }

    /// True when every feature in `mask` is configured
    pub fn feature_configured(&self, mask: Features) -> bool {
        self.enabled_features.contains(mask)
    }
}
