use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use log::warn;
use std::time::Duration;

/// TUI-specific input events
#[derive(Debug, Clone, PartialEq)]
pub enum TuiEvent {
    // Global shortcuts
    ForceQuit,     // Ctrl+C
    OpenPicker,    // Ctrl+O
    OpenSearch,    // Ctrl+F
    OpenDashboard, // Ctrl+D
    SaveForm,      // Ctrl+S
    Escape,
    Submit,

    // Editing and navigation (meaning depends on the focused overlay)
    InputChar(char),
    Paste(String), // Bracketed paste
    Backspace,
    Delete,
    Tab,
    BackTab,
    CursorUp,
    CursorDown,
    CursorLeft,
    CursorRight,
    WordLeft,  // Ctrl+Left
    WordRight, // Ctrl+Right
    CursorHome,
    CursorEnd,
    PageUp,
    PageDown,

    Resize,
}

/// Poll for an event without blocking (returns immediately)
pub fn poll_event_immediate() -> Option<TuiEvent> {
    poll_event_timeout(Duration::ZERO)
}

/// Poll for an event, blocking up to `timeout`.
pub fn poll_event_timeout(timeout: Duration) -> Option<TuiEvent> {
    match event::poll(timeout) {
        Ok(true) => {}
        Ok(false) => return None,
        Err(e) => {
            warn!("Event poll failed: {}", e);
            return None;
        }
    }
    match event::read() {
        Ok(event) => translate(event),
        Err(e) => {
            warn!("Event read failed: {}", e);
            None
        }
    }
}

fn translate(event: Event) -> Option<TuiEvent> {
    match event {
        Event::Key(key_event) => {
            // Keyboard enhancement reports releases too; only presses count
            if key_event.kind == KeyEventKind::Release {
                return None;
            }
            log::debug!("Key event: {:?} with modifiers {:?}", key_event.code, key_event.modifiers);
            Some(match (key_event.modifiers, key_event.code) {
                (KeyModifiers::CONTROL, KeyCode::Char('c')) => TuiEvent::ForceQuit,
                (KeyModifiers::CONTROL, KeyCode::Char('o')) => TuiEvent::OpenPicker,
                (KeyModifiers::CONTROL, KeyCode::Char('f')) => TuiEvent::OpenSearch,
                (KeyModifiers::CONTROL, KeyCode::Char('d')) => TuiEvent::OpenDashboard,
                (KeyModifiers::CONTROL, KeyCode::Char('s')) => TuiEvent::SaveForm,
                // Ctrl+J inserts newline (ASCII LF; Ctrl+Enter sends this in most terminals)
                (KeyModifiers::CONTROL, KeyCode::Char('j')) => TuiEvent::InputChar('\n'),
                (KeyModifiers::CONTROL, KeyCode::Left) => TuiEvent::WordLeft,
                (KeyModifiers::CONTROL, KeyCode::Right) => TuiEvent::WordRight,
                (_, KeyCode::Char(c)) => TuiEvent::InputChar(c),
                (_, KeyCode::Backspace) => TuiEvent::Backspace,
                (_, KeyCode::Delete) => TuiEvent::Delete,
                (_, KeyCode::Enter) => TuiEvent::Submit,
                (_, KeyCode::Esc) => TuiEvent::Escape,
                (_, KeyCode::Tab) => TuiEvent::Tab,
                (_, KeyCode::BackTab) => TuiEvent::BackTab,
                (_, KeyCode::Up) => TuiEvent::CursorUp,
                (_, KeyCode::Down) => TuiEvent::CursorDown,
                (_, KeyCode::Left) => TuiEvent::CursorLeft,
                (_, KeyCode::Right) => TuiEvent::CursorRight,
                (_, KeyCode::Home) => TuiEvent::CursorHome,
                (_, KeyCode::End) => TuiEvent::CursorEnd,
                (_, KeyCode::PageUp) => TuiEvent::PageUp,
                (_, KeyCode::PageDown) => TuiEvent::PageDown,
                _ => return None,
            })
        }
        Event::Paste(data) => Some(TuiEvent::Paste(data)),
        Event::Resize(_, _) => Some(TuiEvent::Resize),
        _ => None,
    }
}
