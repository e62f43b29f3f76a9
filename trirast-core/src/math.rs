/// Vector, quaternion and matrix primitives.
///
/// All types are nalgebra fixed-size values: vectors store their components
/// in a flat array, quaternions store `[x, y, z, w]` and 4x4 matrices are
/// column-major, so `as_slice()` yields exactly the layout the rasterization
/// kernel consumes. Named accessors (`.x`, `.w`, `.imag()`) come from nalgebra.
use nalgebra::{Matrix4, Quaternion, Vector2, Vector3, Vector4};

pub type Vec2 = Vector2<f32>;
pub type Vec3 = Vector3<f32>;
pub type Vec4 = Vector4<f32>;
pub type Quat = Quaternion<f32>;
pub type Mat4 = Matrix4<f32>;

/// The identity rotation, `(0, 0, 0, 1)`.
pub fn quat_identity() -> Quat {
    Quaternion::identity()
}

pub fn cross(left: &Vec3, right: &Vec3) -> Vec3 {
    left.cross(right)
}

pub fn add(left: &Vec3, right: &Vec3) -> Vec3 {
    left + right
}

pub fn scale(v: &Vec3, factor: f32) -> Vec3 {
    v * factor
}

pub fn quat_dot(left: &Quat, right: &Quat) -> f32 {
    left.coords.dot(&right.coords)
}

/// Divides `q` by its length.
///
/// `q` must not be the zero quaternion; the result is NaN if it is.
pub fn quat_normalize(q: &Quat) -> Quat {
    let len = quat_dot(q, q).sqrt();
    Quaternion::from_vector(q.coords / len)
}

/// True inverse: the conjugate divided by the squared norm.
///
/// For unit quaternions this equals the conjugate.
pub fn quat_inverse(q: &Quat) -> Quat {
    let norm_sq = quat_dot(q, q);
    Quaternion::from_vector(q.conjugate().coords / norm_sq)
}

/// Rotation of `angle` radians about `axis`. The axis must already be unit length.
pub fn quat_from_axis_angle(axis: &Vec3, angle: f32) -> Quat {
    let half = angle * 0.5;
    Quaternion::from_parts(half.cos(), axis * half.sin())
}

/// Hamilton product; applying the result rotates by `right` first, then `left`.
pub fn quat_mul(left: &Quat, right: &Quat) -> Quat {
    left * right
}

/// Rotates `v` by `q` with the two-cross-product expansion
/// `v + w*t + u x t` where `u = q.xyz` and `t = 2 * (u x v)`.
pub fn quat_mul_vec3(q: &Quat, v: &Vec3) -> Vec3 {
    let u = q.imag();
    let t = u.cross(v) * 2.0;
    v + t * q.w + u.cross(&t)
}

/// Rotation matrix for a unit quaternion.
pub fn quat_to_matrix(q: &Quat) -> Mat4 {
    let (x, y, z, w) = (q.i, q.j, q.k, q.w);
    let (xx, yy, zz) = (x * x, y * y, z * z);
    let (xy, xz, yz) = (x * y, x * z, y * z);
    let (wx, wy, wz) = (w * x, w * y, w * z);

    // nalgebra's constructor takes rows
    #[rustfmt::skip]
    let m = Matrix4::new(
        1.0 - 2.0 * (yy + zz), 2.0 * (xy - wz),       2.0 * (xz + wy),       0.0,
        2.0 * (xy + wz),       1.0 - 2.0 * (xx + zz), 2.0 * (yz - wx),       0.0,
        2.0 * (xz - wy),       2.0 * (yz + wx),       1.0 - 2.0 * (xx + yy), 0.0,
        0.0,                   0.0,                   0.0,                   1.0,
    );
    m
}

/// `result * v == left * (right * v)`.
pub fn matrix_multiply(left: &Mat4, right: &Mat4) -> Mat4 {
    left * right
}
