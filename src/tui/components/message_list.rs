//! # MessageList Component
//!
//! Scrollable view of the transcript.
//!
//! ## Stick-to-bottom
//!
//! While the view is pinned to the bottom, every new chunk keeps the latest
//! content visible. Scrolling up unpins; scrolling back to within
//! `STICK_TOLERANCE` rows of the bottom re-pins, so a reader hovering near
//! the end still follows the stream. The End key jumps to the bottom and
//! re-pins unconditionally.
//!
//! ## Architecture
//!
//! `MessageList` is a transient component (created each frame) wrapping
//! `&'a mut MessageListState` (persistent state) and the transcript (props).

use ratatui::Frame;
use ratatui::layout::{Position, Rect, Size};
use tui_scrollview::{ScrollView, ScrollViewState, ScrollbarVisibility};

use crate::core::state::Bubble;
use crate::tui::component::{Component, EventHandler};
use crate::tui::components::message::BubbleView;
use crate::tui::event::TuiEvent;

/// How close to the bottom (in rows) still counts as "at the bottom".
const STICK_TOLERANCE: u16 = 10;

/// Scroll state for the message list. Must be persisted in the parent
/// `TuiState`; content and viewport extents are refreshed on every render
/// so event handling between frames sees the latest layout.
pub struct MessageListState {
    pub scroll_state: ScrollViewState,
    /// When true, auto-scroll to bottom on new content.
    pub stick_to_bottom: bool,
    content_height: u16,
    viewport_height: u16,
}

impl Default for MessageListState {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageListState {
    pub fn new() -> Self {
        MessageListState {
            scroll_state: ScrollViewState::default(),
            stick_to_bottom: true, // Start attached to bottom
            content_height: 0,
            viewport_height: 0,
        }
    }

    fn max_offset(&self) -> u16 {
        self.content_height.saturating_sub(self.viewport_height)
    }

    /// Clamp scroll offset so it never exceeds the content bounds.
    fn clamp_scroll(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        if current.y > max_y {
            self.scroll_state.set_offset(Position {
                x: current.x,
                y: max_y,
            });
        }
    }

    /// Re-derive the pin after a manual scroll: near enough to the bottom
    /// counts as at the bottom.
    fn update_stick(&mut self) {
        self.clamp_scroll();
        let distance = self.max_offset().saturating_sub(self.scroll_state.offset().y);
        self.stick_to_bottom = distance <= STICK_TOLERANCE;
    }

    pub fn scroll_to_bottom(&mut self) {
        let max_y = self.max_offset();
        let current = self.scroll_state.offset();
        self.scroll_state.set_offset(Position {
            x: current.x,
            y: max_y,
        });
        self.stick_to_bottom = true;
    }

    /// Called during render once heights are known.
    fn set_extents(&mut self, content_height: u16, viewport_height: u16) {
        self.content_height = content_height;
        self.viewport_height = viewport_height;
    }
}

impl EventHandler for MessageListState {
    type Event = (); // scrolling is handled internally

    fn handle_event(&mut self, event: &TuiEvent) -> Option<Self::Event> {
        match event {
            TuiEvent::ScrollUp => {
                self.scroll_state.scroll_up();
                self.update_stick();
            }
            TuiEvent::ScrollDown => {
                self.scroll_state.scroll_down();
                self.update_stick();
            }
            TuiEvent::ScrollPageUp => {
                self.scroll_state.scroll_page_up();
                self.update_stick();
            }
            TuiEvent::ScrollPageDown => {
                self.scroll_state.scroll_page_down();
                self.update_stick();
            }
            TuiEvent::ScrollToBottom => {
                self.scroll_to_bottom();
            }
            _ => {}
        }
        None
    }
}

/// Scrollable transcript view, created fresh each frame.
pub struct MessageList<'a> {
    pub state: &'a mut MessageListState,
    pub transcript: &'a [Bubble],
}

impl<'a> MessageList<'a> {
    pub fn new(state: &'a mut MessageListState, transcript: &'a [Bubble]) -> Self {
        MessageList { state, transcript }
    }
}

impl<'a> Component for MessageList<'a> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let content_width = area.width.saturating_sub(1); // scrollbar safe area

        let heights: Vec<u16> = self
            .transcript
            .iter()
            .map(|bubble| BubbleView::height(bubble, content_width))
            .collect();
        let total_height: u16 = heights.iter().sum();

        self.state.set_extents(total_height, area.height);
        if self.state.stick_to_bottom {
            self.state.scroll_to_bottom();
        } else {
            self.state.clamp_scroll();
        }

        let mut scroll_view = ScrollView::new(Size::new(content_width, total_height))
            .vertical_scrollbar_visibility(ScrollbarVisibility::Always)
            .horizontal_scrollbar_visibility(ScrollbarVisibility::Never);

        let mut y_offset: u16 = 0;
        for (bubble, height) in self.transcript.iter().zip(&heights) {
            let bubble_rect = Rect::new(0, y_offset, content_width, *height);
            scroll_view.render_widget(BubbleView::new(bubble), bubble_rect);
            y_offset += height;
        }

        frame.render_stateful_widget(scroll_view, area, &mut self.state.scroll_state);
    }
}
