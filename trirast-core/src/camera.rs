/// Free-flying camera and its per-frame input protocol.
use crate::config::CameraConfig;
use crate::math::{quat_identity, quat_mul_vec3, quat_normalize, Quat, Vec2, Vec3};
use crate::transform::EulerAngles;

/// Camera placement and lens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub orientation: Quat,
    pub near_plane: f32,
    pub far_plane: f32,
    pub fov_degrees: f32,
}

impl Camera {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            position: config.start_position,
            orientation: quat_identity(),
            near_plane: config.near_plane,
            far_plane: config.far_plane,
            fov_degrees: config.fov_degrees,
        }
    }

    /// Bounds the drift left behind by repeated quaternion products.
    pub fn renormalize(&mut self) {
        self.orientation = quat_normalize(&self.orientation);
    }

    /// Unit vector the camera looks along (local `-Z` in world space).
    pub fn forward(&self) -> Vec3 {
        quat_mul_vec3(&self.orientation, &Vec3::new(0.0, 0.0, -1.0))
    }
}

/// The default lens at the origin.
impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            ..Self::from_config(&CameraConfig::default())
        }
    }
}

/// Input sampled for one frame, already mapped from physical keys.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraInput {
    pub cursor: Vec2,
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub fast: bool,
    pub slow: bool,
    pub zoom_in: bool,
    pub zoom_out: bool,
    pub reset: bool,
}

/// Turns per-frame input into camera motion.
///
/// Look input accumulates in Euler angles; the orientation is rebuilt from
/// them every frame.
#[derive(Debug, Clone)]
pub struct CameraController {
    config: CameraConfig,
    euler: EulerAngles,
    last_cursor: Option<Vec2>,
}

impl CameraController {
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            euler: EulerAngles::zero(),
            last_cursor: None,
        }
    }

    pub fn euler(&self) -> EulerAngles {
        self.euler
    }

    /// Speed multiplier from the fast/slow modifiers; both combine.
    pub fn speed_modifier(&self, input: &CameraInput) -> f32 {
        let mut modifier = 1.0;
        if input.fast {
            modifier *= self.config.fast_multiplier;
        }
        if input.slow {
            modifier *= self.config.slow_multiplier;
        }
        modifier
    }

    pub fn update(&mut self, camera: &mut Camera, input: &CameraInput, delta_time: f32) {
        // The first sample only seeds the cursor.
        let cursor_delta = match self.last_cursor {
            Some(last) => input.cursor - last,
            None => Vec2::zeros(),
        };
        self.last_cursor = Some(input.cursor);

        // Cursor right turns left: yaw decreases with +dx, pitch with +dy.
        let sensitivity = self.config.cursor_sensitivity;
        self.euler
            .rotate(-cursor_delta.y * sensitivity, -cursor_delta.x * sensitivity, 0.0);
        camera.orientation = self.euler.to_quat();

        let speed = self.config.base_speed * delta_time * self.speed_modifier(input);
        let mut local_move = Vec3::zeros();
        if input.forward {
            local_move.z -= speed;
        }
        if input.back {
            local_move.z += speed;
        }
        if input.left {
            local_move.x -= speed;
        }
        if input.right {
            local_move.x += speed;
        }
        if input.up {
            local_move.y += speed;
        }
        if input.down {
            local_move.y -= speed;
        }
        camera.position += quat_mul_vec3(&camera.orientation, &local_move);

        let zoom_step = self.config.zoom_rate * delta_time;
        if input.zoom_in {
            camera.fov_degrees -= zoom_step;
        }
        if input.zoom_out {
            camera.fov_degrees += zoom_step;
        }
        camera.fov_degrees = camera
            .fov_degrees
            .clamp(self.config.min_fov_degrees, self.config.max_fov_degrees);

        if input.reset {
            camera.position = Vec3::zeros();
            camera.orientation = quat_identity();
            self.euler = EulerAngles::zero();
        }
    }
}
