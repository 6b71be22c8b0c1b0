//! Tuning profiles and rate profiles
//!
//! A [`Profile`] holds the PID gains and switch assignments for one flying
//! style. A [`ControlRateConfig`] holds the stick response curves and can
//! be switched independently of the profile.

use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

use super::types::GimbalConfig;

/// Tuning profiles in the master record
pub const MAX_PROFILE_COUNT: usize = 3;

/// Rate profiles in the master record
pub const MAX_CONTROL_RATE_PROFILE_COUNT: usize = 3;

/// Aux switch assignments per profile
pub const MAX_MODE_ACTIVATION_CONDITION_COUNT: usize = 20;

/// In-flight adjustment slots per profile
pub const MAX_ADJUSTMENT_RANGE_COUNT: usize = 12;

/// Servo outputs per profile
pub const MAX_SUPPORTED_SERVOS: usize = 8;

/// Controllers in the PID table
pub const PID_ITEM_COUNT: usize = 10;

/// Upper bound for the yaw P-term
pub const YAW_P_LIMIT_MAX: u16 = 300;

/// Row of the PID table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(usize)]
pub enum PidIndex {
    Roll = 0,
    Pitch = 1,
    Yaw = 2,
    /// Altitude hold
    Alt = 3,
    /// Position hold
    Pos = 4,
    /// Position rate
    PosR = 5,
    /// Fixed-wing navigation rate
    NavR = 6,
    /// Self-level strength, cutoff and horizon transition
    Level = 7,
    /// Heading hold
    Mag = 8,
    /// Vertical velocity
    Vel = 9,
}

/// PID gains and filters in 8-bit tuning units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidProfile {
    pub p8: [u8; PID_ITEM_COUNT],
    pub i8: [u8; PID_ITEM_COUNT],
    pub d8: [u8; PID_ITEM_COUNT],
    /// Accelerometer software low-pass cutoff in Hz, zero disables
    pub acc_soft_lpf_hz: u8,
    /// Gyro software low-pass cutoff in Hz, zero disables
    pub gyro_soft_lpf_hz: u8,
    /// D-term low-pass cutoff in Hz
    pub dterm_lpf_hz: u8,
    /// Yaw P-term low-pass cutoff in Hz, zero disables
    pub yaw_pterm_lpf_hz: u8,
    pub yaw_p_limit: u16,
    /// Roll and pitch angle limit in tenths of a degree
    pub max_angle_inclination: [i16; 2],
}

impl PidProfile {
    /// Set one row of the table
    pub fn set(&mut self, index: PidIndex, p: u8, i: u8, d: u8) {
        let row = index as usize;
        self.p8[row] = p;
        self.i8[row] = i;
        self.d8[row] = d;
    }

    /// Gains of one row as (P, I, D)
    pub fn get(&self, index: PidIndex) -> (u8, u8, u8) {
        let row = index as usize;
        (self.p8[row], self.i8[row], self.d8[row])
    }
}

impl Default for PidProfile {
    fn default() -> Self {
        let mut pid = Self {
            p8: [0; PID_ITEM_COUNT],
            i8: [0; PID_ITEM_COUNT],
            d8: [0; PID_ITEM_COUNT],
            acc_soft_lpf_hz: 15,
            gyro_soft_lpf_hz: 60,
            dterm_lpf_hz: 30,
            yaw_pterm_lpf_hz: 0,
            yaw_p_limit: YAW_P_LIMIT_MAX,
            max_angle_inclination: [300, 300],
        };
        pid.set(PidIndex::Roll, 45, 50, 70);
        pid.set(PidIndex::Pitch, 45, 50, 70);
        pid.set(PidIndex::Yaw, 100, 40, 0);
        pid.set(PidIndex::Alt, 50, 0, 0);
        pid.set(PidIndex::Pos, 65, 120, 10);
        pid.set(PidIndex::PosR, 180, 15, 100);
        pid.set(PidIndex::NavR, 14, 2, 8);
        pid.set(PidIndex::Level, 160, 10, 75);
        pid.set(PidIndex::Mag, 40, 0, 0);
        pid.set(PidIndex::Vel, 100, 50, 10);
        pid
    }
}

/// Aux channel window in 25µs steps above 900µs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelRange {
    pub start_step: u8,
    pub end_step: u8,
}

impl ChannelRange {
    /// True when the window covers no pulse width
    pub const fn is_empty(&self) -> bool {
        self.start_step >= self.end_step
    }
}

/// Flight mode enabled while an aux channel is in range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModeActivationCondition {
    /// Flight mode box identifier
    pub mode_id: u8,
    pub aux_channel_index: u8,
    pub range: ChannelRange,
}

/// In-flight tuning adjustment bound to an aux channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdjustmentRange {
    pub aux_channel_index: u8,
    pub range: ChannelRange,
    /// Parameter being adjusted, zero for none
    pub adjustment_function: u8,
    /// Channel whose position selects the adjustment direction
    pub aux_switch_channel_index: u8,
}

/// Stick deadbands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RcControlsConfig {
    /// Roll and pitch deadband in µs
    pub deadband: u8,
    pub yaw_deadband: u8,
    /// Position hold stick deadband
    pub pos_hold_deadband: u8,
    /// Altitude hold throttle deadband
    pub alt_hold_deadband: u8,
}

impl Default for RcControlsConfig {
    fn default() -> Self {
        Self {
            deadband: 5,
            yaw_deadband: 5,
            pos_hold_deadband: 20,
            alt_hold_deadband: 50,
        }
    }
}

/// One servo output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoParam {
    pub min: i16,
    pub max: i16,
    pub middle: i16,
    /// Rate in percent, negative reverses
    pub rate: i8,
    /// Throw at `min` in degrees
    pub angle_at_min: u8,
    /// Throw at `max` in degrees
    pub angle_at_max: u8,
    /// RC channel passed straight through, if any
    pub forward_from_channel: Option<u8>,
}

impl Default for ServoParam {
    fn default() -> Self {
        Self {
            min: 1000,
            max: 2000,
            middle: 1500,
            rate: 100,
            angle_at_min: 90,
            angle_at_max: 90,
            forward_from_channel: None,
        }
    }
}

/// One tuning profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Profile {
    /// Rate profile selected together with this profile
    pub default_rate_profile_index: u8,
    pub pid: PidProfile,
    /// Magnetic declination as `[sign]dddmm`
    pub mag_declination: i16,
    pub mode_activation_conditions: [ModeActivationCondition; MAX_MODE_ACTIVATION_CONDITION_COUNT],
    pub adjustment_ranges: [AdjustmentRange; MAX_ADJUSTMENT_RANGE_COUNT],
    pub rc_controls: RcControlsConfig,
    /// Throttle boost when tilted, 0-100
    pub throttle_tilt_compensation_strength: u8,
    pub servo_conf: [ServoParam; MAX_SUPPORTED_SERVOS],
    pub gimbal: GimbalConfig,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            default_rate_profile_index: 0,
            pid: PidProfile::default(),
            mag_declination: 0,
            mode_activation_conditions: [ModeActivationCondition::default();
                MAX_MODE_ACTIVATION_CONDITION_COUNT],
            adjustment_ranges: [AdjustmentRange::default(); MAX_ADJUSTMENT_RANGE_COUNT],
            rc_controls: RcControlsConfig::default(),
            throttle_tilt_compensation_strength: 0,
            servo_conf: [ServoParam::default(); MAX_SUPPORTED_SERVOS],
            gimbal: GimbalConfig::default(),
        }
    }
}

/// Stick response curves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControlRateConfig {
    /// Roll/pitch stick scale, 100 is unity
    pub rc_rate8: u8,
    /// Roll/pitch expo, 0-100
    pub rc_expo8: u8,
    /// Throttle curve midpoint, 0-100
    pub thr_mid8: u8,
    /// Throttle curve expo, 0-100
    pub thr_expo8: u8,
    /// Roll, pitch and yaw rates
    pub rates: [u8; 3],
    /// Throttle PID attenuation above the TPA breakpoint, in percent
    pub dyn_thr_pid: u8,
    /// Yaw expo, 0-100
    pub rc_yaw_expo8: u8,
    /// Throttle at which attenuation starts
    pub tpa_breakpoint: u16,
}

impl Default for ControlRateConfig {
    fn default() -> Self {
        Self {
            rc_rate8: 90,
            rc_expo8: 70,
            thr_mid8: 50,
            thr_expo8: 0,
            rates: [0; 3],
            dyn_thr_pid: 0,
            rc_yaw_expo8: 20,
            tpa_breakpoint: 1500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pid_defaults_table() {
        let pid = PidProfile::default();
        assert_eq!(pid.p8, [45, 45, 100, 50, 65, 180, 14, 160, 40, 100]);
        assert_eq!(pid.i8, [50, 50, 40, 0, 120, 15, 2, 10, 0, 50]);
        assert_eq!(pid.d8, [70, 70, 0, 0, 10, 100, 8, 75, 0, 10]);
        assert_eq!(pid.yaw_p_limit, YAW_P_LIMIT_MAX);
        assert_eq!(pid.max_angle_inclination, [300, 300]);
    }

    #[test]
    fn test_pid_set_get() {
        let mut pid = PidProfile::default();
        pid.set(PidIndex::Roll, 36, 40, 20);
        assert_eq!(pid.get(PidIndex::Roll), (36, 40, 20));
        assert_eq!(pid.get(PidIndex::Pitch), (45, 50, 70));
    }

    #[test]
    fn test_channel_range_empty() {
        assert!(ChannelRange::default().is_empty());
        let range = ChannelRange {
            start_step: 0,
            end_step: 48,
        };
        assert!(!range.is_empty());
    }
}
