//! Sensor and board alignment
//!
//! Chip rotations are exact axis permutations. Board alignment is an
//! arbitrary rotation built from the configured deci-degree angles and is
//! skipped entirely when all three angles are zero.

use crate::config::types::{BoardAlignment, SensorAlign};

const X: usize = 0;
const Y: usize = 1;
const Z: usize = 2;

fn deci_degrees_to_radians(angle: i16) -> f32 {
    angle as f32 / 10.0 * core::f32::consts::PI / 180.0
}

/// Resolve `Default` to the board's native orientation
pub fn resolve(configured: SensorAlign, board_default: SensorAlign) -> SensorAlign {
    match configured {
        SensorAlign::Default => board_default,
        other => other,
    }
}

/// Rotate a raw sample by the chip mounting orientation
pub fn align_sensor(v: [i32; 3], rotation: SensorAlign) -> [i32; 3] {
    match rotation {
        SensorAlign::Default | SensorAlign::Cw0 => v,
        SensorAlign::Cw90 => [v[Y], -v[X], v[Z]],
        SensorAlign::Cw180 => [-v[X], -v[Y], v[Z]],
        SensorAlign::Cw270 => [-v[Y], v[X], v[Z]],
        SensorAlign::Cw0Flip => [-v[X], v[Y], -v[Z]],
        SensorAlign::Cw90Flip => [v[Y], v[X], -v[Z]],
        SensorAlign::Cw180Flip => [v[X], -v[Y], -v[Z]],
        SensorAlign::Cw270Flip => [-v[Y], -v[X], -v[Z]],
    }
}

/// Board rotation matrix, `None` for a standard mounting
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoardRotation {
    matrix: Option<[[f32; 3]; 3]>,
}

impl BoardRotation {
    pub fn new(alignment: &BoardAlignment) -> Self {
        let standard = alignment.roll_deci_degrees == 0
            && alignment.pitch_deci_degrees == 0
            && alignment.yaw_deci_degrees == 0;
        if standard {
            return Self { matrix: None };
        }

        let roll = deci_degrees_to_radians(alignment.roll_deci_degrees);
        let pitch = deci_degrees_to_radians(alignment.pitch_deci_degrees);
        let yaw = deci_degrees_to_radians(alignment.yaw_deci_degrees);

        let (sinx, cosx) = (libm::sinf(roll), libm::cosf(roll));
        let (siny, cosy) = (libm::sinf(pitch), libm::cosf(pitch));
        let (sinz, cosz) = (libm::sinf(yaw), libm::cosf(yaw));

        let coszcosx = cosz * cosx;
        let sinzcosx = sinz * cosx;
        let coszsinx = sinx * cosz;
        let sinzsinx = sinx * sinz;

        Self {
            matrix: Some([
                [cosz * cosy, -cosy * sinz, siny],
                [sinzcosx + coszsinx * siny, coszcosx - sinzsinx * siny, -sinx * cosy],
                [sinzsinx - coszcosx * siny, coszsinx + sinzcosx * siny, cosy * cosx],
            ]),
        }
    }

    pub fn is_standard(&self) -> bool {
        self.matrix.is_none()
    }

    pub fn apply(&self, v: [i32; 3]) -> [i32; 3] {
        let Some(m) = &self.matrix else {
            return v;
        };
        let (x, y, z) = (v[X] as f32, v[Y] as f32, v[Z] as f32);
        core::array::from_fn(|axis| {
            libm::rintf(m[0][axis] * x + m[1][axis] * y + m[2][axis] * z) as i32
        })
    }
}

/// Chip rotation followed by board rotation
pub fn align(v: [i32; 3], rotation: SensorAlign, board: &BoardRotation) -> [i32; 3] {
    board.apply(align_sensor(v, rotation))
}

/// Trim the board alignment by a roll and pitch delta in deci-degrees
///
/// The delta is given in the airframe frame and is rotated by the board
/// yaw before being added.
pub fn update_board_alignment(alignment: &mut BoardAlignment, roll: i16, pitch: i16) {
    let yaw = deci_degrees_to_radians(alignment.yaw_deci_degrees);
    let (sin_yaw, cos_yaw) = (libm::sinf(yaw), libm::cosf(yaw));
    let (roll, pitch) = (roll as f32, pitch as f32);

    alignment.roll_deci_degrees =
        (alignment.roll_deci_degrees as f32 - sin_yaw * pitch + cos_yaw * roll) as i16;
    alignment.pitch_deci_degrees =
        (alignment.pitch_deci_degrees as f32 + cos_yaw * pitch + sin_yaw * roll) as i16;
}
