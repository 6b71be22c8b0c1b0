//! Mixer selection and custom motor table

use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

/// Motors in the custom mixer table
pub const MAX_SUPPORTED_MOTORS: usize = 12;

/// Airframe geometry
///
/// Discriminants are part of the persisted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MixerMode {
    Tri = 1,
    QuadP = 2,
    #[default]
    QuadX = 3,
    Bicopter = 4,
    Gimbal = 5,
    Y6 = 6,
    Hex6 = 7,
    FlyingWing = 8,
    Y4 = 9,
    Hex6X = 10,
    OctoX8 = 11,
    OctoFlatP = 12,
    OctoFlatX = 13,
    Airplane = 14,
    Heli120Ccpm = 15,
    Heli90Deg = 16,
    Vtail4 = 17,
    Hex6H = 18,
    PpmToServo = 19,
    DualCopter = 20,
    SingleCopter = 21,
    Atail4 = 22,
    Custom = 23,
    CustomAirplane = 24,
    CustomTri = 25,
}

/// Mixer used when the configured one is unavailable
pub const DEFAULT_MIXER: MixerMode = MixerMode::QuadX;

impl MixerMode {
    /// Whether firmware built for a board supports this mixer
    ///
    /// Never-finished geometries are always off. Uncommon ones are only
    /// available on boards with room for their tables.
    pub const fn is_enabled(self, uncommon_mixers: bool) -> bool {
        use MixerMode::*;
        match self {
            Bicopter | Gimbal | Heli120Ccpm | Heli90Deg | PpmToServo | DualCopter
            | SingleCopter => false,
            QuadP | Y6 | Hex6 | Y4 | OctoFlatP | OctoFlatX | Vtail4 | Hex6H | Atail4 => {
                uncommon_mixers
            }
            Tri | QuadX | FlyingWing | Hex6X | OctoX8 | Airplane | Custom | CustomAirplane
            | CustomTri => true,
        }
    }
}

/// One row of a motor mixer
///
/// A row with zero throttle terminates the table.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorMixer {
    pub throttle: f32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl MotorMixer {
    pub const fn new(throttle: f32, roll: f32, pitch: f32, yaw: f32) -> Self {
        Self {
            throttle,
            roll,
            pitch,
            yaw,
        }
    }

    /// Terminating row
    pub const UNUSED: Self = Self::new(0.0, 0.0, 0.0, 0.0);
}

/// Quad in X configuration
pub const MIXER_QUAD_X: [MotorMixer; 4] = [
    MotorMixer::new(1.0, -1.0, 1.0, -1.0), // REAR_R
    MotorMixer::new(1.0, -1.0, -1.0, 1.0), // FRONT_R
    MotorMixer::new(1.0, 1.0, 1.0, 1.0),   // REAR_L
    MotorMixer::new(1.0, 1.0, -1.0, -1.0), // FRONT_L
];

/// Mixer behaviour settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MixerConfig {
    /// 1 for props-in, -1 for props-out
    pub yaw_motor_direction: i8,
    /// Limit on yaw authority to prevent jumps
    pub yaw_jump_prevention_limit: u16,
    /// Keep the tricopter tail servo live while disarmed
    pub tri_unarmed_servo: bool,
    /// Servo output low-pass cutoff in 0.001 of the loop rate
    pub servo_lowpass_freq: i16,
    pub servo_lowpass_enable: bool,
}

impl Default for MixerConfig {
    fn default() -> Self {
        Self {
            yaw_motor_direction: 1,
            yaw_jump_prevention_limit: 200,
            tri_unarmed_servo: true,
            servo_lowpass_freq: 400,
            servo_lowpass_enable: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mixer_enabled_everywhere() {
        assert!(DEFAULT_MIXER.is_enabled(false));
        assert!(DEFAULT_MIXER.is_enabled(true));
    }

    #[test]
    fn test_unfinished_mixers_disabled() {
        assert!(!MixerMode::Gimbal.is_enabled(true));
        assert!(!MixerMode::Heli120Ccpm.is_enabled(true));
        assert!(!MixerMode::PpmToServo.is_enabled(true));
    }

    #[test]
    fn test_uncommon_mixers_follow_board() {
        assert!(MixerMode::Y6.is_enabled(true));
        assert!(!MixerMode::Y6.is_enabled(false));
        assert!(MixerMode::Hex6X.is_enabled(false));
    }
}
