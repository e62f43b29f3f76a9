/// Terminal front end for the trirast frame loop
use crossterm::{cursor, event, execute, terminal};
use std::io::{self, stdout, BufWriter};
use std::time::{Duration, Instant};
use trirast_core::{FrameError, FrameLoop, FrameStats, PlatformError, RenderConfig, VertexStream, Window};

pub mod presenter;
pub mod renderer;
pub mod window;

pub use presenter::TerminalPresenter;
pub use renderer::ScanlineKernel;
pub use window::TerminalWindow;

/// Runs the frame loop inside the terminal's alternate screen.
pub struct TerminalApp {
    frames: FrameLoop,
    kernel: ScanlineKernel,
    target_frame_time: Duration,
}

impl TerminalApp {
    /// The initial surface follows the current terminal size.
    pub fn new(mut config: RenderConfig, vertices: VertexStream, target_fps: u32) -> Result<Self, FrameError> {
        let (cols, rows) = terminal::size().map_err(PlatformError::from)?;
        let (width, height) = TerminalWindow::surface_size(cols, rows);
        config.frame.initial_width = width;
        config.frame.initial_height = height;

        Ok(Self {
            frames: FrameLoop::new(&config, vertices)?,
            kernel: ScanlineKernel::default(),
            target_frame_time: Duration::from_secs_f64(1.0 / target_fps.max(1) as f64),
        })
    }

    pub fn run(&mut self) -> Result<Option<FrameStats>, FrameError> {
        enter().map_err(PlatformError::from)?;

        let result = self.main_loop();

        // Cleanup
        if let Err(e) = leave() {
            tracing::warn!(error = %e, "failed to restore terminal");
        }

        result
    }

    fn main_loop(&mut self) -> Result<Option<FrameStats>, FrameError> {
        let mut window = TerminalWindow::new()?;
        let mut presenter = TerminalPresenter::new(BufWriter::new(stdout()));
        let mut last = None;

        self.frames.begin(&window);
        while !window.should_close() {
            let frame_start = Instant::now();
            last = Some(self.frames.step(&mut window, &mut self.kernel, &mut presenter)?);

            // Frame timing
            let elapsed = frame_start.elapsed();
            if elapsed < self.target_frame_time {
                std::thread::sleep(self.target_frame_time - elapsed);
            }
        }

        Ok(last)
    }
}

fn enter() -> io::Result<()> {
    terminal::enable_raw_mode()?;
    execute!(
        stdout(),
        terminal::EnterAlternateScreen,
        cursor::Hide,
        event::EnableMouseCapture
    )
}

fn leave() -> io::Result<()> {
    execute!(
        stdout(),
        event::DisableMouseCapture,
        cursor::Show,
        terminal::LeaveAlternateScreen
    )?;
    terminal::disable_raw_mode()
}
