use crossterm::event::{self, Event, KeyCode, KeyModifiers, MouseEventKind};

/// TUI-specific input events
pub enum TuiEvent {
    /// Ctrl+C - quits regardless of state
    ForceQuit,
    /// Esc
    Quit,
    Submit,

    // TUI-local events (handled directly in TUI)
    InputChar(char),
    Paste(String), // Bracketed paste - preserves newlines
    Backspace,
    ScrollUp,
    ScrollDown,
    ScrollPageUp,
    ScrollPageDown,
    ScrollToBottom, // End key - also re-engages stick-to-bottom
    Resize,
}

/// Poll for an event with timeout (blocks up to 100ms)
pub fn poll_event() -> Option<TuiEvent> {
    poll_event_timeout(std::time::Duration::from_millis(100))
}

/// Poll for an event without blocking (returns immediately)
pub fn poll_event_immediate() -> Option<TuiEvent> {
    poll_event_timeout(std::time::Duration::ZERO)
}

fn poll_event_timeout(timeout: std::time::Duration) -> Option<TuiEvent> {
    if !event::poll(timeout).unwrap_or(false) {
        return None;
    }
    match event::read().ok()? {
        Event::Key(key_event) => match (key_event.modifiers, key_event.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => Some(TuiEvent::ForceQuit),
            // Ctrl+J inserts newline (ASCII LF; Ctrl+Enter sends this in most terminals)
            (KeyModifiers::CONTROL, KeyCode::Char('j')) => Some(TuiEvent::InputChar('\n')),
            (_, KeyCode::Char(c)) => Some(TuiEvent::InputChar(c)),
            (_, KeyCode::Backspace) => Some(TuiEvent::Backspace),
            (_, KeyCode::Enter) => Some(TuiEvent::Submit),
            (_, KeyCode::Esc) => Some(TuiEvent::Quit),
            (_, KeyCode::Up) => Some(TuiEvent::ScrollUp),
            (_, KeyCode::Down) => Some(TuiEvent::ScrollDown),
            (_, KeyCode::PageUp) => Some(TuiEvent::ScrollPageUp),
            (_, KeyCode::PageDown) => Some(TuiEvent::ScrollPageDown),
            (_, KeyCode::End) => Some(TuiEvent::ScrollToBottom),
            _ => None,
        },
        Event::Mouse(mouse_event) => match mouse_event.kind {
            MouseEventKind::ScrollUp => Some(TuiEvent::ScrollUp),
            MouseEventKind::ScrollDown => Some(TuiEvent::ScrollDown),
            _ => None,
        },
        Event::Paste(data) => Some(TuiEvent::Paste(data)),
        Event::Resize(_, _) => Some(TuiEvent::Resize),
        _ => None,
    }
}
