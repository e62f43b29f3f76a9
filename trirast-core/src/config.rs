/// Tunable constants for the camera, the frame loop and mesh ingestion.
use crate::math::Vec3;

/// Camera lens, motion and look settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub start_position: Vec3,
    pub near_plane: f32,
    pub far_plane: f32,
    pub fov_degrees: f32,
    pub min_fov_degrees: f32,
    pub max_fov_degrees: f32,
    /// Degrees per second while a zoom input is held.
    pub zoom_rate: f32,
    /// World units per second before modifiers.
    pub base_speed: f32,
    pub fast_multiplier: f32,
    pub slow_multiplier: f32,
    /// Radians per unit of cursor travel.
    pub cursor_sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            start_position: Vec3::new(-2.0, 1.0, 2.0),
            near_plane: 0.005,
            far_plane: 1000.0,
            fov_degrees: 90.0,
            min_fov_degrees: 10.0,
            max_fov_degrees: 170.0,
            zoom_rate: 60.0,
            base_speed: 0.4,
            fast_multiplier: 4.0,
            slow_multiplier: 0.25,
            cursor_sensitivity: 0.005,
        }
    }
}

/// Frame loop pacing and diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameConfig {
    pub min_delta_time: f32,
    pub max_delta_time: f32,
    /// Prefix of the window title; frame statistics follow it.
    pub title: String,
    /// Refresh the window title every this many frames.
    pub title_interval: u64,
    pub initial_width: i32,
    pub initial_height: i32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            min_delta_time: 0.001,
            max_delta_time: 0.1,
            title: "trirast".to_string(),
            title_interval: 16,
            initial_width: 800,
            initial_height: 600,
        }
    }
}

/// Everything the frame loop needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub camera: CameraConfig,
    pub frame: FrameConfig,
    /// Upper bound on the vertex stream, in floats.
    pub vertex_capacity: usize,
}

impl RenderConfig {
    pub const DEFAULT_VERTEX_CAPACITY: usize = 1024 * 1024 * 20;
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            frame: FrameConfig::default(),
            vertex_capacity: Self::DEFAULT_VERTEX_CAPACITY,
        }
    }
}
