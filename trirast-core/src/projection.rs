/// Perspective projection and the combined view-projection transform.
use nalgebra::Matrix4;
use std::f32::consts::PI;

use crate::camera::Camera;
use crate::math::{matrix_multiply, quat_inverse, quat_to_matrix, Mat4};
use crate::transform::translation_matrix;

/// Right-handed perspective matrix.
///
/// X and Y are scaled by `cot(fov/2)` (X additionally divided by the aspect
/// ratio); view-space `-z` becomes clip-space `w`, and the near/far planes map
/// to NDC depth `-1`/`+1`.
pub fn perspective_projection(fov_degrees: f32, aspect_x_over_y: f32, near: f32, far: f32) -> Mat4 {
    let cotangent = 1.0 / (fov_degrees * (PI / 360.0)).tan();
    let a = cotangent / aspect_x_over_y;
    let b = cotangent;
    let c = (near + far) / (near - far);
    let d = (2.0 * near * far) / (near - far);

    #[rustfmt::skip]
    let m = Matrix4::new(
        a,   0.0, 0.0,  0.0,
        0.0, b,   0.0,  0.0,
        0.0, 0.0, c,    d,
        0.0, 0.0, -1.0, 0.0,
    );
    m
}

/// World-to-clip transform for `camera` rendering into a `width` x `height` surface.
///
/// `height` must be non-zero; callers resize the framebuffer to positive
/// dimensions before deriving the matrix.
pub fn derive_view_projection(camera: &Camera, width: u32, height: u32) -> Mat4 {
    debug_assert!(height > 0, "view projection needs a non-empty surface");

    let view = translation_matrix(&-camera.position);
    let view = matrix_multiply(&quat_to_matrix(&quat_inverse(&camera.orientation)), &view);

    let perspective = perspective_projection(
        camera.fov_degrees,
        width as f32 / height as f32,
        camera.near_plane,
        camera.far_plane,
    );

    matrix_multiply(&perspective, &view)
}
