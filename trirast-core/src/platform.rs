/// Windowing, input and presentation collaborators.
///
/// The frame loop only queries these; the one command it issues back is
/// closing the window or updating its title.
use std::io;
use thiserror::Error;

use crate::math::Vec2;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("platform I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("presentation failed: {0}")]
    Present(String),
}

/// Inputs the renderer reacts to; backends bind physical keys to these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveForward,
    MoveBack,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    /// Speed modifier: four times faster.
    Fast,
    /// Speed modifier: four times slower.
    Slow,
    ZoomIn,
    ZoomOut,
    Wireframe,
    Reset,
    Quit,
}

/// A window (or window-like surface) that supplies per-frame state.
pub trait Window {
    /// Pumps pending events; called once at the top of every frame.
    fn poll_events(&mut self) -> Result<(), PlatformError>;

    /// Monotonic time in seconds.
    fn time(&self) -> f64;

    /// Current drawable size. May be zero or negative while minimised.
    fn size(&self) -> (i32, i32);

    fn is_down(&self, action: Action) -> bool;

    fn cursor_position(&self) -> Vec2;

    fn should_close(&self) -> bool;

    fn request_close(&mut self);

    /// Best effort; backends may ignore it.
    fn set_title(&mut self, title: &str);
}

/// Displays a finished colour buffer.
pub trait Presenter {
    /// `color` is tightly packed RGBA8, row-major, `width * height` pixels.
    fn present(&mut self, color: &[u8], width: u32, height: u32) -> Result<(), PlatformError>;
}
