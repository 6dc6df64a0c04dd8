use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    // UI Events
    Quit,
    Render,
    NextTab,

    // Navigation Events
    Up,
    Down,
    Left,
    Right,
    Activate, // the one validated "select" per row
    Toggle,

    // Search Events
    FocusSearch,
    UnfocusSearch,
    SearchInput(char),
    SearchBackspace,
    SubmitSearch,
    ClearSearch,
}

pub struct EventHandler {
    poll_timeout: Duration,
}

impl EventHandler {
    pub fn new() -> Self {
        Self {
            poll_timeout: Duration::from_millis(100),
        }
    }

    /// Wait briefly for the next terminal event. `search_focused` selects the
    /// key map: while the search bar has focus, printable keys are text.
    pub fn next_event(&self, search_focused: bool) -> Result<Option<AppEvent>> {
        if !event::poll(self.poll_timeout)? {
            return Ok(None);
        }

        let app_event = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if search_focused {
                    key_to_search_event(key)
                } else {
                    key_to_app_event(key)
                }
            }
            Event::Resize(_, _) => Some(AppEvent::Render),
            _ => None,
        };
        Ok(app_event)
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

pub fn key_to_search_event(key: KeyEvent) -> Option<AppEvent> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AppEvent::Quit),
        (KeyCode::Esc, _) => Some(AppEvent::UnfocusSearch),
        (KeyCode::Enter, _) => Some(AppEvent::SubmitSearch),
        (KeyCode::Backspace, _) => Some(AppEvent::SearchBackspace),
        (KeyCode::Up, _) => Some(AppEvent::Up),
        (KeyCode::Down, _) => Some(AppEvent::Down),
        (KeyCode::Tab, _) => Some(AppEvent::NextTab),
        (KeyCode::Char(c), _) => Some(AppEvent::SearchInput(c)),
        _ => None,
    }
}

pub fn key_to_app_event(key: KeyEvent) -> Option<AppEvent> {
    match (key.code, key.modifiers) {
        // Quit
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AppEvent::Quit),
        (KeyCode::Char('q'), _) => Some(AppEvent::Quit),

        // Navigation
        (KeyCode::Up, _) | (KeyCode::Char('k'), _) => Some(AppEvent::Up),
        (KeyCode::Down, _) | (KeyCode::Char('j'), _) => Some(AppEvent::Down),
        (KeyCode::Left, _) | (KeyCode::Char('h'), _) => Some(AppEvent::Left),
        (KeyCode::Right, _) | (KeyCode::Char('l'), _) => Some(AppEvent::Right),
        (KeyCode::Enter, _) => Some(AppEvent::Activate),
        (KeyCode::Char(' '), _) => Some(AppEvent::Toggle),
        (KeyCode::Tab, _) => Some(AppEvent::NextTab),

        // Search
        (KeyCode::Char('/'), _) => Some(AppEvent::FocusSearch),
        (KeyCode::Esc, _) => Some(AppEvent::ClearSearch),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_search_keys_are_text() {
        assert_eq!(key_to_search_event(key(KeyCode::Char('q'))), Some(AppEvent::SearchInput('q')));
        assert_eq!(key_to_search_event(key(KeyCode::Char('/'))), Some(AppEvent::SearchInput('/')));
        assert_eq!(key_to_search_event(key(KeyCode::Enter)), Some(AppEvent::SubmitSearch));
        assert_eq!(key_to_search_event(key(KeyCode::Esc)), Some(AppEvent::UnfocusSearch));
    }

    #[test]
    fn test_app_keys() {
        assert_eq!(key_to_app_event(key(KeyCode::Char('q'))), Some(AppEvent::Quit));
        assert_eq!(key_to_app_event(key(KeyCode::Char('/'))), Some(AppEvent::FocusSearch));
        assert_eq!(key_to_app_event(key(KeyCode::Enter)), Some(AppEvent::Activate));
        assert_eq!(key_to_app_event(key(KeyCode::Esc)), Some(AppEvent::ClearSearch));
        assert_eq!(
            key_to_app_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(AppEvent::Quit)
        );
        assert_eq!(key_to_app_event(key(KeyCode::F(5))), None);
    }
}
