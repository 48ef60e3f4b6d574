//! Keyboard input for the TUI.
//!
//! Printable characters always become [`Action::Input`]; commands live on
//! function keys so they never collide with typed text:
//!
//! | Key | Action |
//! |-----|--------|
//! | Tab / Down, Shift+Tab / Up | next / previous input |
//! | Enter | submit or accept |
//! | Esc | dismiss dialog, quit |
//! | F2 | detect device |
//! | F3 | choose output folder |
//! | F5 / F6 | start / stop logging |
//! | F8 | sign out |
//! | F10, Ctrl+C | quit |

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use thiserror::Error;

use super::app::Action;

/// Errors from reading terminal events.
#[derive(Debug, Error)]
pub enum EventError {
    #[error("failed to read terminal event: {0}")]
    Io(#[from] std::io::Error),
}

/// Polls crossterm for key presses.
#[derive(Debug, Default)]
pub struct EventHandler;

impl EventHandler {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Wait up to `timeout` for a key press and decode it.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Io`] if the terminal cannot be read.
    pub fn poll(&self, timeout: Duration) -> Result<Option<Action>, EventError> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => Ok(map_key(key)),
            _ => Ok(None),
        }
    }
}

/// Decode a key event. Releases and repeats of non-text keys are ignored.
#[must_use]
pub fn map_key(key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }

    let action = match key.code {
        KeyCode::Char(c) => Action::Input(c),
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Tab | KeyCode::Down => Action::NextInput,
        KeyCode::BackTab | KeyCode::Up => Action::PreviousInput,
        KeyCode::Enter => Action::Submit,
        KeyCode::Esc => Action::Cancel,
        KeyCode::F(2) => Action::Detect,
        KeyCode::F(3) => Action::Browse,
        KeyCode::F(5) => Action::Start,
        KeyCode::F(6) => Action::Stop,
        KeyCode::F(8) => Action::Logout,
        KeyCode::F(10) => Action::Quit,
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_printable_keys_are_input() {
        assert_eq!(map_key(key(KeyCode::Char('q'))), Some(Action::Input('q')));
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('S'), KeyModifiers::SHIFT)),
            Some(Action::Input('S'))
        );
    }

    #[test]
    fn test_function_keys() {
        assert_eq!(map_key(key(KeyCode::F(2))), Some(Action::Detect));
        assert_eq!(map_key(key(KeyCode::F(5))), Some(Action::Start));
        assert_eq!(map_key(key(KeyCode::F(6))), Some(Action::Stop));
        assert_eq!(map_key(key(KeyCode::F(8))), Some(Action::Logout));
        assert_eq!(map_key(key(KeyCode::F(12))), None);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(event), Some(Action::Quit));
        let other = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL);
        assert_eq!(map_key(other), None);
    }

    #[test]
    fn test_release_ignored() {
        let mut event = key(KeyCode::Enter);
        event.kind = KeyEventKind::Release;
        assert_eq!(map_key(event), None);
    }
}
