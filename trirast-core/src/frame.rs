/// The per-frame control loop.
///
/// Each frame runs strictly in order: poll the window, integrate camera
/// input, resize the framebuffer if the window changed size, derive the
/// view-projection matrix, run the kernel, present, report statistics.
use std::fmt;
use thiserror::Error;

use crate::camera::{Camera, CameraController, CameraInput};
use crate::config::{FrameConfig, RenderConfig};
use crate::framebuffer::{Framebuffer, FramebufferError};
use crate::geometry::VertexStream;
use crate::kernel::{column_major, KernelInvocation, RasterKernel};
use crate::platform::{Action, PlatformError, Presenter, Window};
use crate::projection::derive_view_projection;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Framebuffer(#[from] FramebufferError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error("initial surface size {width}x{height} must be positive")]
    InvalidSurface { width: i32, height: i32 },
}

/// Everything one renderer instance mutates from frame to frame.
#[derive(Debug)]
pub struct RenderState {
    pub camera: Camera,
    pub controller: CameraController,
    pub framebuffer: Framebuffer,
    pub wireframe: bool,
}

impl RenderState {
    pub fn new(config: &RenderConfig) -> Result<Self, FrameError> {
        let (width, height) = (config.frame.initial_width, config.frame.initial_height);
        let mut framebuffer = Framebuffer::new();
        framebuffer.resize(width, height)?;
        if !framebuffer.is_allocated() {
            return Err(FrameError::InvalidSurface { width, height });
        }

        Ok(Self {
            camera: Camera::from_config(&config.camera),
            controller: CameraController::new(config.camera.clone()),
            framebuffer,
            wireframe: false,
        })
    }
}

/// Diagnostics for one finished frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub frame_index: u64,
    /// Clamped seconds since the previous frame.
    pub delta_time: f32,
    /// Seconds spent inside the kernel.
    pub render_time: f64,
    pub width: u32,
    pub height: u32,
    /// Length of the vertex stream in floats.
    pub vertex_floats: usize,
}

impl FrameStats {
    pub fn fps(&self) -> u32 {
        (1.0 / self.delta_time) as u32
    }
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "dt:{:.3}ms fps:{} render:{:.3}ms x:{} y:{} vert:{}floats",
            self.delta_time * 1000.0,
            self.fps(),
            self.render_time * 1000.0,
            self.width,
            self.height,
            self.vertex_floats
        )
    }
}

/// Owns the render state and the vertex stream and sequences every frame.
pub struct FrameLoop {
    config: FrameConfig,
    state: RenderState,
    vertices: VertexStream,
    previous_time: Option<f64>,
    frame_index: u64,
}

impl FrameLoop {
    pub fn new(config: &RenderConfig, vertices: VertexStream) -> Result<Self, FrameError> {
        Ok(Self {
            config: config.frame.clone(),
            state: RenderState::new(config)?,
            vertices,
            previous_time: None,
            frame_index: 0,
        })
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub fn vertices(&self) -> &VertexStream {
        &self.vertices
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Starts the frame clock; the first frame's delta is measured from here.
    pub fn begin<W: Window + ?Sized>(&mut self, window: &W) {
        self.previous_time = Some(window.time());
    }

    /// Runs frames until the window asks to close. Returns the last frame's statistics.
    pub fn run<W, K, P>(
        &mut self,
        window: &mut W,
        kernel: &mut K,
        presenter: &mut P,
    ) -> Result<Option<FrameStats>, FrameError>
    where
        W: Window + ?Sized,
        K: RasterKernel + ?Sized,
        P: Presenter + ?Sized,
    {
        let _span = tracing::info_span!("frame_loop").entered();
        tracing::info!(vertex_floats = self.vertices.len(), "frame loop starting");

        self.begin(window);
        let mut last = None;
        while !window.should_close() {
            last = Some(self.step(window, kernel, presenter)?);
        }

        tracing::info!(frames = self.frame_index, "frame loop finished");
        Ok(last)
    }

    /// Runs exactly one frame.
    pub fn step<W, K, P>(
        &mut self,
        window: &mut W,
        kernel: &mut K,
        presenter: &mut P,
    ) -> Result<FrameStats, FrameError>
    where
        W: Window + ?Sized,
        K: RasterKernel + ?Sized,
        P: Presenter + ?Sized,
    {
        window.poll_events()?;
        let now = window.time();
        let previous = self.previous_time.replace(now).unwrap_or(now);
        let delta_time =
            ((now - previous) as f32).clamp(self.config.min_delta_time, self.config.max_delta_time);
        self.frame_index += 1;

        if window.is_down(Action::Quit) {
            window.request_close();
        }

        let input = sample_input(window);
        let state = &mut self.state;
        state.controller.update(&mut state.camera, &input, delta_time);
        state.wireframe = window.is_down(Action::Wireframe);

        let (window_width, window_height) = window.size();
        let fb = &mut state.framebuffer;
        if (window_width, window_height) != (fb.width() as i32, fb.height() as i32) {
            fb.resize(window_width, window_height)?;
        }

        state.camera.renormalize();
        let (width, height) = (fb.width(), fb.height());
        let view_projection = derive_view_projection(&state.camera, width, height);

        let render_begin = window.time();
        let (color, depth) = fb.surfaces_mut();
        kernel.render(KernelInvocation {
            color,
            depth,
            width,
            height,
            vertices: self.vertices.as_slice(),
            view_projection: column_major(&view_projection),
            camera_position: state.camera.position,
            wireframe: state.wireframe,
        });
        let render_time = window.time() - render_begin;

        if let Err(e) = presenter.present(fb.color(), width, height) {
            tracing::warn!(error = %e, "presentation failed");
        }

        let stats = FrameStats {
            frame_index: self.frame_index,
            delta_time,
            render_time,
            width,
            height,
            vertex_floats: self.vertices.len(),
        };
        tracing::debug!(target: "trirast::frame", "{stats}");

        let interval = self.config.title_interval;
        if interval > 0 && self.frame_index % interval == 0 {
            window.set_title(&format!("{} [{}]", self.config.title, stats));
        }

        Ok(stats)
    }
}

fn sample_input<W: Window + ?Sized>(window: &W) -> CameraInput {
    CameraInput {
        cursor: window.cursor_position(),
        forward: window.is_down(Action::MoveForward),
        back: window.is_down(Action::MoveBack),
        left: window.is_down(Action::MoveLeft),
        right: window.is_down(Action::MoveRight),
        up: window.is_down(Action::MoveUp),
        down: window.is_down(Action::MoveDown),
        fast: window.is_down(Action::Fast),
        slow: window.is_down(Action::Slow),
        zoom_in: window.is_down(Action::ZoomIn),
        zoom_out: window.is_down(Action::ZoomOut),
        reset: window.is_down(Action::Reset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::VERTEX_FLOATS;
    use crate::headless::{CapturePresenter, HeadlessWindow};
    use crate::math::{quat_identity, Mat4, Vec2, Vec3};
    use crate::mesh::{flatten, ParsedMesh};

    #[derive(Default)]
    struct RecordingKernel {
        calls: Vec<Call>,
    }

    #[derive(Debug, Clone)]
    struct Call {
        width: u32,
        height: u32,
        color_len: usize,
        depth_len: usize,
        vertex_count: usize,
        view_projection: Mat4,
        camera_position: Vec3,
        wireframe: bool,
    }

    impl RasterKernel for RecordingKernel {
        fn render(&mut self, frame: KernelInvocation<'_>) {
            self.calls.push(Call {
                width: frame.width,
                height: frame.height,
                color_len: frame.color.len(),
                depth_len: frame.depth.len(),
                vertex_count: frame.vertex_count(),
                view_projection: frame.view_projection_matrix(),
                camera_position: frame.camera_position,
                wireframe: frame.wireframe,
            });
            for pixel in frame.color.chunks_exact_mut(4) {
                pixel.copy_from_slice(&[10, 20, 30, 255]);
            }
        }
    }

    struct FailingPresenter {
        attempts: u32,
    }

    impl Presenter for FailingPresenter {
        fn present(&mut self, _: &[u8], _: u32, _: u32) -> Result<(), PlatformError> {
            self.attempts += 1;
            Err(PlatformError::Present("display went away".to_string()))
        }
    }

    fn config(width: i32, height: i32) -> RenderConfig {
        let mut config = RenderConfig::default();
        config.frame.initial_width = width;
        config.frame.initial_height = height;
        config
    }

    fn cube_stream() -> VertexStream {
        let mut stream = VertexStream::with_capacity(4096);
        flatten(&ParsedMesh::cube(1.0), &mut stream, Vec3::zeros(), 1.0).unwrap();
        stream
    }

    #[test]
    fn test_forward_frame_moves_along_view_axis() {
        let mut frames = FrameLoop::new(&config(64, 48), cube_stream()).unwrap();
        let mut window = HeadlessWindow::new(64, 48).with_frame_step(0.016);
        window.press(Action::MoveForward);
        let mut kernel = RecordingKernel::default();
        let mut presenter = CapturePresenter::new();

        let start = frames.state().camera.position;
        assert_eq!(start, Vec3::new(-2.0, 1.0, 2.0));

        frames.begin(&window);
        let stats = frames.step(&mut window, &mut kernel, &mut presenter).unwrap();

        let camera = &frames.state().camera;
        let moved = camera.position - start;
        assert!((stats.delta_time - 0.016).abs() < 1e-6);
        assert!((moved.norm() - 0.4 * 0.016).abs() < 1e-5);
        assert!((moved.normalize() - camera.forward()).norm() < 1e-5);
        assert!((camera.orientation.coords - quat_identity().coords).norm() < 1e-6);
    }

    #[test]
    fn test_kernel_receives_current_frame() {
        let stream = cube_stream();
        let floats = stream.len();
        let mut frames = FrameLoop::new(&config(32, 16), stream).unwrap();
        let mut window = HeadlessWindow::new(32, 16);
        let mut kernel = RecordingKernel::default();
        let mut presenter = CapturePresenter::new();

        frames.begin(&window);
        let stats = frames.step(&mut window, &mut kernel, &mut presenter).unwrap();

        let call = &kernel.calls[0];
        assert_eq!((call.width, call.height), (32, 16));
        assert_eq!(call.color_len, 32 * 16 * 4);
        assert_eq!(call.depth_len, 32 * 16);
        assert_eq!(call.vertex_count, floats / VERTEX_FLOATS);
        assert_eq!(call.camera_position, frames.state().camera.position);
        assert!(!call.wireframe);

        let expected = derive_view_projection(&frames.state().camera, 32, 16);
        assert!((call.view_projection - expected).norm() < 1e-6);

        assert_eq!(presenter.size(), (32, 16));
        assert_eq!(presenter.pixel(31, 15), Some([10, 20, 30, 255]));
        assert_eq!(stats.vertex_floats, floats);
        assert_eq!(frames.vertices().len(), floats);
    }

    #[test]
    fn test_window_resize_reallocates_before_render() {
        let mut frames = FrameLoop::new(&config(32, 16), cube_stream()).unwrap();
        let mut window = HeadlessWindow::new(32, 16);
        let mut kernel = RecordingKernel::default();
        let mut presenter = CapturePresenter::new();

        frames.step(&mut window, &mut kernel, &mut presenter).unwrap();
        window.resize(50, 20);
        frames.step(&mut window, &mut kernel, &mut presenter).unwrap();
        assert_eq!((kernel.calls[1].width, kernel.calls[1].height), (50, 20));
        assert_eq!(kernel.calls[1].color_len, 50 * 20 * 4);

        // minimised windows keep the last surface
        window.resize(0, 0);
        let stats = frames.step(&mut window, &mut kernel, &mut presenter).unwrap();
        assert_eq!((stats.width, stats.height), (50, 20));
    }

    #[test]
    fn test_delta_time_is_clamped() {
        let mut frames = FrameLoop::new(&config(8, 8), VertexStream::with_capacity(0)).unwrap();
        let mut window = HeadlessWindow::new(8, 8).with_frame_step(2.0);
        let mut kernel = RecordingKernel::default();
        let mut presenter = CapturePresenter::new();

        frames.begin(&window);
        let stats = frames.step(&mut window, &mut kernel, &mut presenter).unwrap();
        assert_eq!(stats.delta_time, 0.1);

        let mut window = HeadlessWindow::new(8, 8).with_frame_step(0.0);
        let stats = frames.step(&mut window, &mut kernel, &mut presenter).unwrap();
        assert_eq!(stats.delta_time, 0.001);
    }

    #[test]
    fn test_wireframe_follows_held_action() {
        let mut frames = FrameLoop::new(&config(8, 8), cube_stream()).unwrap();
        let mut window = HeadlessWindow::new(8, 8);
        let mut kernel = RecordingKernel::default();
        let mut presenter = CapturePresenter::new();

        window.press(Action::Wireframe);
        frames.step(&mut window, &mut kernel, &mut presenter).unwrap();
        window.release(Action::Wireframe);
        frames.step(&mut window, &mut kernel, &mut presenter).unwrap();

        assert!(kernel.calls[0].wireframe);
        assert!(!kernel.calls[1].wireframe);
    }

    #[test]
    fn test_cursor_look_changes_orientation() {
        let mut frames = FrameLoop::new(&config(8, 8), cube_stream()).unwrap();
        let mut window = HeadlessWindow::new(8, 8);
        let mut kernel = RecordingKernel::default();
        let mut presenter = CapturePresenter::new();

        window.move_cursor(Vec2::new(400.0, 300.0));
        frames.step(&mut window, &mut kernel, &mut presenter).unwrap();
        assert_eq!(frames.state().camera.orientation, quat_identity());

        window.move_cursor(Vec2::new(420.0, 300.0));
        frames.step(&mut window, &mut kernel, &mut presenter).unwrap();
        let euler = frames.state().controller.euler();
        assert!((euler.y + 20.0 * 0.005).abs() < 1e-6);
        assert!((frames.state().camera.orientation.norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_quit_stops_run() {
        let mut frames = FrameLoop::new(&config(8, 8), cube_stream()).unwrap();
        let mut window = HeadlessWindow::new(8, 8).with_frame_limit(100);
        window.press(Action::Quit);
        let mut kernel = RecordingKernel::default();
        let mut presenter = CapturePresenter::new();

        let last = frames.run(&mut window, &mut kernel, &mut presenter).unwrap();
        // the quitting frame still renders and presents
        assert_eq!(last.map(|s| s.frame_index), Some(1));
        assert_eq!(kernel.calls.len(), 1);
        assert_eq!(presenter.frames(), 1);
    }

    #[test]
    fn test_run_honours_frame_limit_and_title_interval() {
        let mut frames = FrameLoop::new(&config(8, 8), cube_stream()).unwrap();
        let mut window = HeadlessWindow::new(8, 8).with_frame_limit(20);
        let mut kernel = RecordingKernel::default();
        let mut presenter = CapturePresenter::new();

        let last = frames.run(&mut window, &mut kernel, &mut presenter).unwrap().unwrap();
        assert_eq!(last.frame_index, 20);
        assert_eq!(frames.frame_index(), 20);
        assert_eq!(window.frames_polled(), 20);
        assert!(window.title().starts_with("trirast [dt:"));
        assert!(window.title().contains("x:8 y:8"));
    }

    #[test]
    fn test_presentation_failure_is_advisory() {
        let mut frames = FrameLoop::new(&config(8, 8), cube_stream()).unwrap();
        let mut window = HeadlessWindow::new(8, 8).with_frame_limit(3);
        let mut kernel = RecordingKernel::default();
        let mut presenter = FailingPresenter { attempts: 0 };

        frames.run(&mut window, &mut kernel, &mut presenter).unwrap();
        assert_eq!(presenter.attempts, 3);
        assert_eq!(kernel.calls.len(), 3);
    }

    #[test]
    fn test_invalid_initial_surface_is_rejected() {
        let err = FrameLoop::new(&config(0, 600), cube_stream()).err().unwrap();
        assert!(matches!(err, FrameError::InvalidSurface { width: 0, height: 600 }));
    }

    #[test]
    fn test_stats_display() {
        let stats = FrameStats {
            frame_index: 3,
            delta_time: 0.016,
            render_time: 0.002,
            width: 800,
            height: 600,
            vertex_floats: 216,
        };
        assert_eq!(stats.fps(), 62);
        assert_eq!(
            stats.to_string(),
            "dt:16.000ms fps:62 render:2.000ms x:800 y:600 vert:216floats"
        );
    }
}
