/// crossterm-backed window: keyboard, mouse and terminal size
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind,
};
use crossterm::{execute, terminal};
use std::collections::HashMap;
use std::io::stdout;
use std::time::{Duration, Instant};
use trirast_core::math::Vec2;
use trirast_core::platform::{Action, PlatformError, Window};

/// Most terminals never report key releases, so a key counts as held for
/// this long after its last press or repeat.
const HOLD_WINDOW: Duration = Duration::from_millis(120);

/// Nominal pixel size of one terminal cell, for cursor motion.
const CELL_SIZE: (f32, f32) = (8.0, 16.0);

pub struct TerminalWindow {
    start: Instant,
    cols: u16,
    rows: u16,
    held: HashMap<Action, Instant>,
    cursor: Vec2,
    close_requested: bool,
}

impl TerminalWindow {
    pub fn new() -> Result<Self, PlatformError> {
        let (cols, rows) = terminal::size()?;
        Ok(Self::with_size(cols, rows))
    }

    pub fn with_size(cols: u16, rows: u16) -> Self {
        Self {
            start: Instant::now(),
            cols,
            rows,
            held: HashMap::new(),
            cursor: Vec2::zeros(),
            close_requested: false,
        }
    }

    /// Surface size for a terminal: each cell shows two pixel rows.
    pub fn surface_size(cols: u16, rows: u16) -> (i32, i32) {
        (cols as i32, rows as i32 * 2)
    }

    fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(key) => self.handle_key(key, now),
            Event::Mouse(MouseEvent { kind, column, row, .. }) => {
                if matches!(kind, MouseEventKind::Moved | MouseEventKind::Drag(_)) {
                    self.cursor = Vec2::new(column as f32 * CELL_SIZE.0, row as f32 * CELL_SIZE.1);
                }
            }
            Event::Resize(cols, rows) => {
                tracing::debug!(cols, rows, "terminal resized");
                self.cols = cols;
                self.rows = rows;
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        let mut actions = Vec::with_capacity(2);
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            actions.push(Action::Quit);
        } else if let Some(action) = map_key(key.code) {
            actions.push(action);
        }
        if key.modifiers.contains(KeyModifiers::SHIFT) {
            actions.push(Action::Fast);
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            actions.push(Action::Slow);
        }

        for action in actions {
            if key.kind == KeyEventKind::Release {
                self.held.remove(&action);
            } else {
                self.held.insert(action, now);
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        self.held
            .retain(|_, pressed| now.saturating_duration_since(*pressed) < HOLD_WINDOW);
    }
}

fn map_key(code: KeyCode) -> Option<Action> {
    let action = match code {
        KeyCode::Esc => Action::Quit,
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            'w' => Action::MoveForward,
            's' => Action::MoveBack,
            'a' => Action::MoveLeft,
            'd' => Action::MoveRight,
            'e' => Action::MoveUp,
            'q' => Action::MoveDown,
            'c' => Action::ZoomIn,
            'z' => Action::ZoomOut,
            'v' => Action::Wireframe,
            'r' => Action::Reset,
            _ => return None,
        },
        _ => return None,
    };
    Some(action)
}

impl Window for TerminalWindow {
    fn poll_events(&mut self) -> Result<(), PlatformError> {
        let now = Instant::now();
        self.expire(now);
        while event::poll(Duration::ZERO)? {
            let event = event::read()?;
            self.handle_event(event, now);
        }
        Ok(())
    }

    fn time(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    fn size(&self) -> (i32, i32) {
        Self::surface_size(self.cols, self.rows)
    }

    fn is_down(&self, action: Action) -> bool {
        self.held.contains_key(&action)
    }

    fn cursor_position(&self) -> Vec2 {
        self.cursor
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }

    fn request_close(&mut self) {
        self.close_requested = true;
    }

    fn set_title(&mut self, title: &str) {
        if let Err(e) = execute!(stdout(), terminal::SetTitle(title)) {
            tracing::debug!(error = %e, "could not set terminal title");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEventState, MouseButton};

    fn key(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        })
    }

    fn press(c: char) -> Event {
        key(KeyCode::Char(c), KeyModifiers::NONE, KeyEventKind::Press)
    }

    #[test]
    fn test_key_bindings() {
        let expected = [
            ('w', Action::MoveForward),
            ('s', Action::MoveBack),
            ('a', Action::MoveLeft),
            ('d', Action::MoveRight),
            ('e', Action::MoveUp),
            ('q', Action::MoveDown),
            ('c', Action::ZoomIn),
            ('z', Action::ZoomOut),
            ('v', Action::Wireframe),
            ('r', Action::Reset),
        ];
        for (c, action) in expected {
            assert_eq!(map_key(KeyCode::Char(c)), Some(action));
        }
        assert_eq!(map_key(KeyCode::Esc), Some(Action::Quit));
        assert_eq!(map_key(KeyCode::Char('x')), None);
    }

    #[test]
    fn test_shifted_key_moves_fast() {
        let mut window = TerminalWindow::with_size(80, 24);
        let now = Instant::now();
        window.handle_event(key(KeyCode::Char('W'), KeyModifiers::SHIFT, KeyEventKind::Press), now);
        assert!(window.is_down(Action::MoveForward));
        assert!(window.is_down(Action::Fast));
        assert!(!window.is_down(Action::Slow));
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut window = TerminalWindow::with_size(80, 24);
        window.handle_event(
            key(KeyCode::Char('c'), KeyModifiers::CONTROL, KeyEventKind::Press),
            Instant::now(),
        );
        assert!(window.is_down(Action::Quit));
        assert!(!window.is_down(Action::ZoomIn));
    }

    #[test]
    fn test_held_key_expires_without_repeat() {
        let mut window = TerminalWindow::with_size(80, 24);
        let t0 = Instant::now();
        window.handle_event(press('w'), t0);

        window.expire(t0 + HOLD_WINDOW / 2);
        assert!(window.is_down(Action::MoveForward));

        // a repeat refreshes the hold
        window.handle_event(
            key(KeyCode::Char('w'), KeyModifiers::NONE, KeyEventKind::Repeat),
            t0 + HOLD_WINDOW / 2,
        );
        window.expire(t0 + HOLD_WINDOW);
        assert!(window.is_down(Action::MoveForward));

        window.expire(t0 + HOLD_WINDOW * 2);
        assert!(!window.is_down(Action::MoveForward));
    }

    #[test]
    fn test_release_clears_immediately() {
        let mut window = TerminalWindow::with_size(80, 24);
        let now = Instant::now();
        window.handle_event(press('v'), now);
        window.handle_event(key(KeyCode::Char('v'), KeyModifiers::NONE, KeyEventKind::Release), now);
        assert!(!window.is_down(Action::Wireframe));
    }

    #[test]
    fn test_mouse_motion_scales_to_pixels() {
        let mut window = TerminalWindow::with_size(80, 24);
        let now = Instant::now();
        window.handle_event(
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::Drag(MouseButton::Left),
                column: 10,
                row: 3,
                modifiers: KeyModifiers::NONE,
            }),
            now,
        );
        assert_eq!(window.cursor_position(), Vec2::new(80.0, 48.0));

        window.handle_event(
            Event::Mouse(MouseEvent {
                kind: MouseEventKind::ScrollUp,
                column: 0,
                row: 0,
                modifiers: KeyModifiers::NONE,
            }),
            now,
        );
        assert_eq!(window.cursor_position(), Vec2::new(80.0, 48.0));
    }

    #[test]
    fn test_resize_doubles_rows() {
        let mut window = TerminalWindow::with_size(80, 24);
        assert_eq!(window.size(), (80, 48));
        window.handle_event(Event::Resize(100, 30), Instant::now());
        assert_eq!(window.size(), (100, 60));
    }

    #[test]
    fn test_request_close() {
        let mut window = TerminalWindow::with_size(80, 24);
        assert!(!window.should_close());
        window.request_close();
        assert!(window.should_close());
    }
}
