/// Half-block presenter: two framebuffer rows per terminal row
use crossterm::{
    cursor,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::Write;
use trirast_core::platform::{PlatformError, Presenter};

/// Upper half block; foreground paints the top pixel, background the bottom.
const HALF_BLOCK: char = '\u{2580}';

pub struct TerminalPresenter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn rgb(color: &[u8], width: usize, x: usize, y: usize) -> Color {
    let at = (y * width + x) * 4;
    match color.get(at..at + 3) {
        Some(&[r, g, b]) => Color::Rgb { r, g, b },
        _ => Color::Black,
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn present(&mut self, color: &[u8], width: u32, height: u32) -> Result<(), PlatformError> {
        let (width, height) = (width as usize, height as usize);
        if color.len() < width * height * 4 {
            return Err(PlatformError::Present(format!(
                "colour buffer holds {} bytes, {}x{} needs {}",
                color.len(),
                width,
                height,
                width * height * 4
            )));
        }

        let mut last: Option<(Color, Color)> = None;
        for row in 0..height.div_ceil(2) {
            self.writer.queue(cursor::MoveTo(0, row as u16))?;
            for x in 0..width {
                let top = rgb(color, width, x, row * 2);
                let bottom = if row * 2 + 1 < height {
                    rgb(color, width, x, row * 2 + 1)
                } else {
                    Color::Black
                };

                if last != Some((top, bottom)) {
                    self.writer
                        .queue(SetForegroundColor(top))?
                        .queue(SetBackgroundColor(bottom))?;
                    last = Some((top, bottom));
                }
                self.writer.queue(Print(HALF_BLOCK))?;
            }
        }
        self.writer.queue(ResetColor)?;
        self.writer.flush()?;
        Ok(())
    }
}
