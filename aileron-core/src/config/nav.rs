//! Navigation settings
//!
//! Consumed by the position estimator and the navigation controllers.
//! Distances are in centimetres and speeds in cm/s unless noted.

use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

/// Pilot stick authority while a navigation mode is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NavUserControl {
    /// Sticks command an attitude, release holds position
    #[default]
    GpsAtti,
    /// Sticks command a velocity
    GpsCruise,
}

/// How return-to-home chooses its altitude
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RthAltControlStyle {
    /// Keep the current altitude
    NoAlt,
    /// Climb by the configured altitude
    ExtraAlt,
    /// Fly at exactly the configured altitude
    ConstAlt,
    /// Fly at the highest altitude reached in flight
    MaxAlt,
    /// Climb to the configured altitude if lower
    #[default]
    AtLeastAlt,
}

/// Behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NavFlags {
    /// Altitude hold treats mid throttle as zero climb
    pub use_thr_mid_for_althold: bool,
    /// Refuse to arm when navigation is unsafe
    pub extra_arming_safety: bool,
    pub user_control_mode: NavUserControl,
    pub rth_alt_control_style: RthAltControlStyle,
    /// Return with the tail pointing home
    pub rth_tail_first: bool,
    pub disarm_on_landing: bool,
}

impl Default for NavFlags {
    fn default() -> Self {
        Self {
            use_thr_mid_for_althold: true,
            extra_arming_safety: true,
            user_control_mode: NavUserControl::GpsAtti,
            rth_alt_control_style: RthAltControlStyle::AtLeastAlt,
            rth_tail_first: false,
            disarm_on_landing: false,
        }
    }
}

/// Inertial position estimator weights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InavConfig {
    /// Satellites required before GPS is trusted
    pub gps_min_sats: u8,
    /// GPS processing delay in ms
    pub gps_delay_ms: u16,
    /// Calibrate the vertical accelerometer bias while disarmed
    pub accz_unarmed_cal: bool,
    /// Use the receiver's NED velocity instead of differentiating position
    pub use_gps_velned: bool,
    pub w_z_baro_p: f32,
    pub w_z_gps_p: f32,
    pub w_z_gps_v: f32,
    pub w_xy_gps_p: f32,
    pub w_xy_gps_v: f32,
    pub w_z_res_v: f32,
    pub w_xy_res_v: f32,
    pub w_acc_bias: f32,
    /// Estimate uncertainty above which position is considered lost
    pub max_eph_epv: f32,
    /// Uncertainty assigned to barometric altitude
    pub baro_epv: f32,
}

impl Default for InavConfig {
    fn default() -> Self {
        Self {
            gps_min_sats: 6,
            gps_delay_ms: 200,
            accz_unarmed_cal: true,
            use_gps_velned: false,
            w_z_baro_p: 0.35,
            w_z_gps_p: 0.2,
            w_z_gps_v: 0.2,
            w_xy_gps_p: 1.0,
            w_xy_gps_v: 2.0,
            w_z_res_v: 0.5,
            w_xy_res_v: 0.5,
            w_acc_bias: 0.01,
            max_eph_epv: 1000.0,
            baro_epv: 100.0,
        }
    }
}

/// Navigation limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NavConfig {
    pub flags: NavFlags,
    pub inav: InavConfig,
    /// Seconds without a position before navigation gives up
    pub pos_failure_timeout: u8,
    pub waypoint_radius: u16,
    pub max_speed: u16,
    pub max_manual_speed: u16,
    pub max_manual_climb_rate: u16,
    pub land_descent_rate: u16,
    pub emerg_descent_rate: u16,
    /// Closer than this, return-to-home lands immediately
    pub min_rth_distance: u16,
    pub rth_altitude: u16,

    /// Multirotor bank limit in degrees
    pub mc_max_bank_angle: u8,
    pub mc_hover_throttle: u16,
    pub mc_min_fly_throttle: u16,

    /// Fixed-wing bank limit in degrees
    pub fw_max_bank_angle: u8,
    pub fw_max_climb_angle: u8,
    pub fw_max_dive_angle: u8,
    pub fw_cruise_throttle: u16,
    pub fw_max_throttle: u16,
    pub fw_min_throttle: u16,
    pub fw_pitch_to_throttle: u8,
    pub fw_roll_to_pitch: u8,
    pub fw_loiter_radius: u16,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            flags: NavFlags::default(),
            inav: InavConfig::default(),
            pos_failure_timeout: 5,
            waypoint_radius: 300,
            max_speed: 300,
            max_manual_speed: 500,
            max_manual_climb_rate: 200,
            land_descent_rate: 200,
            emerg_descent_rate: 500,
            min_rth_distance: 500,
            rth_altitude: 1000,
            mc_max_bank_angle: 30,
            mc_hover_throttle: 1500,
            mc_min_fly_throttle: 1200,
            fw_max_bank_angle: 30,
            fw_max_climb_angle: 20,
            fw_max_dive_angle: 15,
            fw_cruise_throttle: 1500,
            fw_max_throttle: 1900,
            fw_min_throttle: 1300,
            fw_pitch_to_throttle: 20,
            fw_roll_to_pitch: 50,
            fw_loiter_radius: 3000,
        }
    }
}
