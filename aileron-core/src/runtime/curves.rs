//! Stick response curves
//!
//! Each curve is a short table generated from the active rate profile.
//! The flight loop interpolates linearly between entries spaced 100
//! stick units apart.

use crate::config::profile::ControlRateConfig;
use crate::config::types::EscAndServoConfig;

pub const PITCH_LOOKUP_LENGTH: usize = 7;
pub const YAW_LOOKUP_LENGTH: usize = 7;
pub const THROTTLE_LOOKUP_LENGTH: usize = 12;

/// Largest stick deflection from center
pub const MAX_STICK_DEFLECTION: i32 = 500;

/// Throttle input span after mapping
pub const MAX_THROTTLE_INPUT: i32 = 1000;

const PWM_RANGE_MIN: i32 = 1000;
const PWM_RANGE_MAX: i32 = 2000;

/// Generated lookup tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RcCurves {
    pitch_roll: [i16; PITCH_LOOKUP_LENGTH],
    yaw: [i16; YAW_LOOKUP_LENGTH],
    throttle: [i16; THROTTLE_LOOKUP_LENGTH],
}

impl RcCurves {
    /// Build every table from a rate profile
    pub fn generate(rates: &ControlRateConfig, esc: &EscAndServoConfig) -> Self {
        Self {
            pitch_roll: pitch_roll_curve(rates),
            yaw: yaw_curve(rates),
            throttle: throttle_curve(rates, esc),
        }
    }

    pub fn pitch_roll_table(&self) -> &[i16; PITCH_LOOKUP_LENGTH] {
        &self.pitch_roll
    }

    pub fn yaw_table(&self) -> &[i16; YAW_LOOKUP_LENGTH] {
        &self.yaw
    }

    pub fn throttle_table(&self) -> &[i16; THROTTLE_LOOKUP_LENGTH] {
        &self.throttle
    }

    /// Roll or pitch command for a deflection in `0..=500`
    pub fn lookup_pitch_roll(&self, deflection: i32) -> i16 {
        interpolate(&self.pitch_roll, deflection.clamp(0, MAX_STICK_DEFLECTION))
    }

    /// Yaw command for a deflection in `0..=500`
    pub fn lookup_yaw(&self, deflection: i32) -> i16 {
        interpolate(&self.yaw, deflection.clamp(0, MAX_STICK_DEFLECTION))
    }

    /// Motor throttle for an input in `0..=1000`
    pub fn lookup_throttle(&self, input: i32) -> i16 {
        interpolate(&self.throttle, input.clamp(0, MAX_THROTTLE_INPUT))
    }

    /// Signed roll or pitch command for a stick pulse width
    pub fn pitch_roll_command(&self, rc_data: u16, midrc: u16, deadband: u8) -> i16 {
        let (deflection, negative) = deflection(rc_data, midrc, deadband);
        let command = self.lookup_pitch_roll(deflection);
        if negative {
            -command
        } else {
            command
        }
    }

    /// Signed yaw command for a stick pulse width
    pub fn yaw_command(&self, rc_data: u16, midrc: u16, deadband: u8) -> i16 {
        let (deflection, negative) = deflection(rc_data, midrc, deadband);
        let command = self.lookup_yaw(deflection);
        if negative {
            -command
        } else {
            command
        }
    }

    /// Motor value for a throttle pulse width
    ///
    /// `[mincheck, 2000]` maps onto the curve input range first.
    pub fn throttle_command(&self, rc_data: u16, mincheck: u16) -> i16 {
        let mincheck = (mincheck as i32).min(PWM_RANGE_MAX - 1);
        let pulse = (rc_data as i32).clamp(mincheck, PWM_RANGE_MAX);
        let input = (pulse - mincheck) * PWM_RANGE_MIN / (PWM_RANGE_MAX - mincheck);
        self.lookup_throttle(input)
    }
}

fn deflection(rc_data: u16, midrc: u16, deadband: u8) -> (i32, bool) {
    let offset = rc_data as i32 - midrc as i32;
    let mut deflection = offset.abs().min(MAX_STICK_DEFLECTION);
    if deadband != 0 {
        deflection = (deflection - deadband as i32).max(0);
    }
    (deflection, offset < 0)
}

fn interpolate(table: &[i16], value: i32) -> i16 {
    let index = (value / 100) as usize;
    let low = table[index] as i32;
    let Some(&high) = table.get(index + 1) else {
        return low as i16;
    };
    (low + (value - index as i32 * 100) * (high as i32 - low) / 100) as i16
}

fn pitch_roll_curve(rates: &ControlRateConfig) -> [i16; PITCH_LOOKUP_LENGTH] {
    let expo = rates.rc_expo8 as i32;
    let rate = rates.rc_rate8 as i32;
    core::array::from_fn(|i| {
        let i = i as i32;
        ((2500 + expo * (i * i - 25)) * i * rate / 2500) as i16
    })
}

fn yaw_curve(rates: &ControlRateConfig) -> [i16; YAW_LOOKUP_LENGTH] {
    let expo = rates.rc_yaw_expo8 as i32;
    core::array::from_fn(|i| {
        let i = i as i32;
        ((2500 + expo * (i * i - 25)) * i / 25) as i16
    })
}

fn throttle_curve(
    rates: &ControlRateConfig,
    esc: &EscAndServoConfig,
) -> [i16; THROTTLE_LOOKUP_LENGTH] {
    let mid = rates.thr_mid8.min(100) as i32;
    let expo = rates.thr_expo8.min(100) as i32;
    let min = esc.minthrottle as i32;
    let span = esc.maxthrottle as i32 - min;

    core::array::from_fn(|i| {
        let tmp = 10 * i as i32 - mid;
        let y = match tmp {
            t if t > 0 => 100 - mid,
            t if t < 0 => mid,
            _ => 1,
        }
        .max(1);
        let shaped = 10 * mid + tmp * (100 - expo + expo * (tmp * tmp) / (y * y)) / 10;
        (min + span * shaped / 1000) as i16
    })
}
