//! Keyboard surface consumed by the engine

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

/// Keys the engine reacts to. Everything else is `Other` and passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Move the highlight to the next candidate
    Down,
    /// Move the highlight to the previous candidate
    Up,
    /// Commit the highlighted candidate
    Enter,
    /// Hide the dropdown
    Escape,
    Other,
}

/// Whether the engine consumed a key.
///
/// A host suppresses its default action for handled keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
}

impl KeyOutcome {
    pub fn is_handled(self) -> bool {
        self == KeyOutcome::Handled
    }
}

impl From<KeyCode> for Key {
    fn from(code: KeyCode) -> Self {
        match code {
            KeyCode::Down => Key::Down,
            KeyCode::Up => Key::Up,
            KeyCode::Enter => Key::Enter,
            KeyCode::Esc => Key::Escape,
            _ => Key::Other,
        }
    }
}

impl From<&KeyEvent> for Key {
    fn from(event: &KeyEvent) -> Self {
        // Releases would otherwise cycle twice per keypress on terminals
        // reporting them.
        if event.kind == KeyEventKind::Release {
            return Key::Other;
        }
        Key::from(event.code)
    }
}
