/// Euler-angle accumulation and the transforms built from it.
use nalgebra::Matrix4;

use crate::math::{quat_from_axis_angle, quat_identity, quat_mul, quat_normalize, Mat4, Quat, Vec3};

/// Accumulated rotation about each axis (in radians).
///
/// Interactive look input integrates here additively and is converted back to
/// a quaternion every frame, so repeated quaternion products never compound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerAngles {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl EulerAngles {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    pub fn to_quat(&self) -> Quat {
        quat_from_euler(self)
    }
}

impl Default for EulerAngles {
    fn default() -> Self {
        Self::zero()
    }
}

/// Builds an orientation from Euler angles.
///
/// Starting from identity, the Z rotation is multiplied on first, then Y, then
/// X, and the product is renormalized. The camera's up behaviour depends on
/// this exact order.
pub fn quat_from_euler(euler: &EulerAngles) -> Quat {
    let mut result = quat_identity();
    result = quat_mul(&result, &quat_from_axis_angle(&Vec3::z(), euler.z));
    result = quat_mul(&result, &quat_from_axis_angle(&Vec3::y(), euler.y));
    result = quat_mul(&result, &quat_from_axis_angle(&Vec3::x(), euler.x));
    quat_normalize(&result)
}

/// Identity with the translation column set to `offset`.
pub fn translation_matrix(offset: &Vec3) -> Mat4 {
    Matrix4::new_translation(offset)
}
