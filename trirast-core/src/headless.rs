/// Deterministic window and presenter with no display attached.
///
/// Used for benchmarking a kernel without a terminal and for driving the
/// frame loop in tests.
use std::collections::HashSet;

use crate::math::Vec2;
use crate::platform::{Action, PlatformError, Presenter, Window};

/// A window whose clock advances by a fixed step on every poll.
#[derive(Debug, Clone)]
pub struct HeadlessWindow {
    size: (i32, i32),
    time: f64,
    frame_step: f64,
    frame_limit: Option<u64>,
    frames_polled: u64,
    held: HashSet<Action>,
    cursor: Vec2,
    close_requested: bool,
    title: String,
}

impl HeadlessWindow {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            size: (width, height),
            time: 0.0,
            frame_step: 1.0 / 60.0,
            frame_limit: None,
            frames_polled: 0,
            held: HashSet::new(),
            cursor: Vec2::zeros(),
            close_requested: false,
            title: String::new(),
        }
    }

    /// Seconds the clock advances per poll.
    pub fn with_frame_step(mut self, seconds: f64) -> Self {
        self.frame_step = seconds;
        self
    }

    /// Report `should_close` once this many frames have been polled.
    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.frame_limit = Some(frames);
        self
    }

    pub fn press(&mut self, action: Action) {
        self.held.insert(action);
    }

    pub fn release(&mut self, action: Action) {
        self.held.remove(&action);
    }

    pub fn move_cursor(&mut self, position: Vec2) {
        self.cursor = position;
    }

    pub fn resize(&mut self, width: i32, height: i32) {
        self.size = (width, height);
    }

    pub fn frames_polled(&self) -> u64 {
        self.frames_polled
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

impl Window for HeadlessWindow {
    fn poll_events(&mut self) -> Result<(), PlatformError> {
        self.time += self.frame_step;
        self.frames_polled += 1;
        Ok(())
    }

    fn time(&self) -> f64 {
        self.time
    }

    fn size(&self) -> (i32, i32) {
        self.size
    }

    fn is_down(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    fn cursor_position(&self) -> Vec2 {
        self.cursor
    }

    fn should_close(&self) -> bool {
        self.close_requested
            || self
                .frame_limit
                .is_some_and(|limit| self.frames_polled >= limit)
    }

    fn request_close(&mut self) {
        self.close_requested = true;
    }

    fn set_title(&mut self, title: &str) {
        self.title.clear();
        self.title.push_str(title);
    }
}

/// Keeps a copy of the most recently presented frame.
#[derive(Debug, Default)]
pub struct CapturePresenter {
    frames: u64,
    width: u32,
    height: u32,
    last: Vec<u8>,
}

impl CapturePresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// RGBA of one pixel of the last frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = (y as usize * self.width as usize + x as usize) * 4;
        self.last.get(at..at + 4)?.try_into().ok()
    }
}

impl Presenter for CapturePresenter {
    fn present(&mut self, color: &[u8], width: u32, height: u32) -> Result<(), PlatformError> {
        self.last.clear();
        self.last.extend_from_slice(color);
        self.width = width;
        self.height = height;
        self.frames += 1;
        Ok(())
    }
}
