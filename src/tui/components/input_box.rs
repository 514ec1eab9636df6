//! # InputBox Component
//!
//! The composer: captures draft text, handles editing, and emits the draft
//! on submission. Whether a submission is allowed is the parent's call (it
//! knows the session state), so the box itself accepts every Enter.
//!
//! The border dims when the composer is disabled, and the title shows the
//! staged attachment, if any.

use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

/// Tallest the composer grows before it starts scrolling internally.
const MAX_VISIBLE_LINES: u16 = 6;
/// Borders, top + bottom.
const VERTICAL_OVERHEAD: u16 = 2;

/// High-level events emitted by the InputBox
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// User pressed Enter; carries the whole draft, buffer cleared.
    Submit(String),
    /// Text content changed.
    Changed,
}

pub struct InputBox {
    /// Draft text (internal state)
    pub buffer: String,
    /// Whether submission is currently possible (prop, set each frame)
    pub enabled: bool,
    /// Staged attachment shown in the title (prop, set each frame)
    pub attachment_label: Option<String>,
}

impl Default for InputBox {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBox {
    pub fn new() -> Self {
        InputBox {
            buffer: String::new(),
            enabled: false,
            attachment_label: None,
        }
    }

    /// Height needed for the current draft, clamped to the viewport limit.
    pub fn calculate_height(&self, width: u16) -> u16 {
        let inner = width.saturating_sub(2).max(1) as usize;
        let lines: usize = self
            .buffer
            .split('\n')
            .map(|line| textwrap::wrap(line, inner).len().max(1))
            .sum();
        (lines as u16).clamp(1, MAX_VISIBLE_LINES) + VERTICAL_OVERHEAD
    }

    fn wrapped_lines(&self, width: u16) -> Vec<String> {
        let inner = width.saturating_sub(2).max(1) as usize;
        let mut out = Vec::new();
        for line in self.buffer.split('\n') {
            let wrapped = textwrap::wrap(line, inner);
            if wrapped.is_empty() {
                out.push(String::new());
            } else {
                out.extend(wrapped.into_iter().map(|l| l.into_owned()));
            }
        }
        out
    }

    fn title(&self) -> String {
        match &self.attachment_label {
            Some(label) => format!("Input (attached: {label})"),
            None => String::from("Input"),
        }
    }
}

impl Component for InputBox {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let style = if self.enabled {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
        };

        let lines = self.wrapped_lines(area.width);
        let visible_count = area.height.saturating_sub(VERTICAL_OVERHEAD) as usize;
        let skip = lines.len().saturating_sub(visible_count.max(1));
        let visible = lines[skip..].join("\n");

        let input = Paragraph::new(visible)
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .border_style(style)
                    .title(self.title()),
            )
            .style(style);
        frame.render_widget(input, area);

        // Cursor sits after the last drafted character.
        let last_width = lines.last().map(|l| l.width() as u16).unwrap_or(0);
        let cursor_y = area.y + 1 + (lines.len() - 1 - skip) as u16;
        frame.set_cursor_position((area.x + 1 + last_width, cursor_y));
    }
}

impl EventHandler for InputBox {
    type Event = InputEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::InputChar(c) => {
                self.buffer.push(*c);
                Some(InputEvent::Changed)
            }
            TuiEvent::Paste(text) => {
                self.buffer.push_str(text);
                Some(InputEvent::Changed)
            }
            TuiEvent::Backspace => {
                self.buffer.pop().map(|_| InputEvent::Changed)
            }
            TuiEvent::Submit => {
                Some(InputEvent::Submit(std::mem::take(&mut self.buffer)))
            }
            _ => None,
        }
    }
}
