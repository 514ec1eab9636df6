use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Text;
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::core::state::Bubble;
use crate::tui::markdown;

/// A stateless widget rendering one transcript bubble.
///
/// Created fresh each frame by `MessageList` for every visible bubble.
/// Assistant text is rendered as markdown; user text is shown verbatim.
/// The error bubble carries the assistant title so a failure reads as a
/// reply, but its body is red.
#[derive(Clone, Copy)]
pub struct BubbleView<'a> {
    bubble: &'a Bubble,
}

impl<'a> BubbleView<'a> {
    pub fn new(bubble: &'a Bubble) -> Self {
        BubbleView { bubble }
    }

    /// Predict rendered height at `width` without drawing. `line_count`
    /// accounts for the block borders, so this matches the render exactly.
    pub fn height(bubble: &Bubble, width: u16) -> u16 {
        if width == 0 {
            return 1;
        }
        BubbleView::new(bubble).paragraph().line_count(width) as u16
    }

    fn role(&self) -> &'static str {
        match self.bubble {
            Bubble::User(_) => "you",
            Bubble::Assistant(_) | Bubble::Typing | Bubble::Error(_) => "parley",
        }
    }

    fn border_style(&self) -> Style {
        let base = match self.bubble {
            Bubble::User(_) => Style::default().fg(Color::Cyan),
            Bubble::Assistant(_) | Bubble::Typing => Style::default().fg(Color::Green),
            Bubble::Error(_) => Style::default().fg(Color::Red),
        };
        base.add_modifier(Modifier::DIM)
    }

    fn content(&self) -> Text<'static> {
        match self.bubble {
            Bubble::User(text) => {
                Text::styled(text.clone(), Style::default().fg(Color::Cyan))
            }
            Bubble::Assistant(text) => markdown::render(text, Color::Green),
            Bubble::Typing => Text::styled(
                "…",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ),
            Bubble::Error(message) => {
                Text::styled(message.clone(), Style::default().fg(Color::Red))
            }
        }
    }

    fn paragraph(&self) -> Paragraph<'static> {
        Paragraph::new(self.content())
            .block(
                Block::bordered()
                    .title(self.role())
                    .border_style(self.border_style())
                    .title_style(self.border_style()),
            )
            .wrap(Wrap { trim: false })
    }
}

impl<'a> Widget for BubbleView<'a> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        self.paragraph().render(area, buf);
    }
}
