//! # TUI Adapter
//!
//! The ratatui-specific layer. Handles terminal I/O, renders the UI,
//! and translates keyboard events into core::Action values.
//!
//! This is the only module that knows about ratatui and crossterm. All
//! state transitions go through `core::action::update`; the loop here just
//! shuttles events in and effects out.

mod component;
mod components;
mod event;
pub mod markdown;
mod ui;

use std::io::stdout;
use std::sync::{Arc, mpsc};

use crossterm::cursor::{Hide, SetCursorStyle, Show};
use crossterm::event::{
    DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
};
use crossterm::execute;
use log::{debug, info};

use crate::chat::HttpTransport;
use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::request::{spawn_attachment_load, spawn_request};
use crate::core::state::Session;
use crate::tui::component::EventHandler;
use crate::tui::components::{InputBox, InputEvent, MessageListState};
use crate::tui::event::{TuiEvent, poll_event, poll_event_immediate};

/// TUI-specific presentation state (not part of core business logic)
pub struct TuiState {
    pub message_list: MessageListState,
    pub input_box: InputBox,
    /// Shown in the title bar.
    pub endpoint: String,
}

impl TuiState {
    pub fn new(endpoint: String) -> Self {
        TuiState {
            message_list: MessageListState::new(),
            input_box: InputBox::new(),
            endpoint,
        }
    }
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> std::io::Result<Self> {
        // SteadyBlock instead of a blinking cursor: set_cursor_position
        // resets the terminal's blink timer on every draw, which makes a
        // blinking cursor look erratic during continuous redraws.
        execute!(
            stdout(),
            EnableMouseCapture,
            EnableBracketedPaste,
            Show,
            SetCursorStyle::SteadyBlock,
        )?;
        info!("Terminal modes enabled (mouse, bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableMouseCapture, DisableBracketedPaste, Hide);
    }
}

/// Whether an Enter press should reach the controller. Slash commands are
/// always allowed (attachment staging works mid-stream); everything else
/// obeys the composer gate.
fn submission_allowed(session: &Session, draft: &str) -> bool {
    draft.trim_start().starts_with('/') || session.composer_enabled(draft)
}

pub fn run(config: ResolvedConfig) -> std::io::Result<()> {
    let transport = Arc::new(HttpTransport::new(config.endpoint.clone()));
    let mut session = Session::new(transport);
    let mut tui = TuiState::new(config.endpoint);

    let mut terminal = ratatui::init();
    let _terminal_mode_guard = TerminalModeGuard::new();

    // Channel for actions from background tasks
    let (tx, rx) = mpsc::channel();

    // Abort handles for in-flight background tasks; dropping them on exit
    // does not cancel, so keep them for potential future Esc-to-cancel.
    let mut active_abort_handles: Vec<tokio::task::AbortHandle> = Vec::new();

    'outer: loop {
        // Sync InputBox props with session state
        tui.input_box.enabled = submission_allowed(&session, &tui.input_box.buffer);
        tui.input_box.attachment_label = session
            .attachment
            .get()
            .map(|a| format!("{} ({} KB)", a.file_name, a.size_bytes.div_ceil(1024)));

        terminal.draw(|f| ui::draw_ui(f, &session, &mut tui))?;

        // Process first event + drain all pending events before next draw
        for event in poll_event()
            .into_iter()
            .chain(std::iter::from_fn(poll_event_immediate))
        {
            match event {
                TuiEvent::Resize => {}
                TuiEvent::ForceQuit | TuiEvent::Quit => {
                    if update(&mut session, Action::Quit) == Effect::Quit {
                        break 'outer;
                    }
                }
                TuiEvent::ScrollUp
                | TuiEvent::ScrollDown
                | TuiEvent::ScrollPageUp
                | TuiEvent::ScrollPageDown
                | TuiEvent::ScrollToBottom => {
                    tui.message_list.handle_event(&event);
                }
                TuiEvent::Submit => {
                    // Gate before the draft is consumed so a refused Enter
                    // leaves the draft intact.
                    if !submission_allowed(&session, &tui.input_box.buffer) {
                        continue;
                    }
                    if let Some(InputEvent::Submit(text)) = tui.input_box.handle_event(&event) {
                        let effect = update(&mut session, Action::Submit(text));
                        if apply_effect(effect, &session, &tx, &mut active_abort_handles) {
                            break 'outer;
                        }
                        // A fresh turn re-pins the view to the bottom.
                        tui.message_list.stick_to_bottom = true;
                    }
                }
                TuiEvent::InputChar(_) | TuiEvent::Paste(_) | TuiEvent::Backspace => {
                    tui.input_box.handle_event(&event);
                }
            }
        }

        // Handle background task actions (streamed reply chunks, attachments)
        while let Ok(action) = rx.try_recv() {
            // AttachmentLoaded carries the full data-URI; keep it out of the log.
            if !matches!(action, Action::AttachmentLoaded(_)) {
                debug!("Event loop received: {:?}", action);
            }
            let effect = update(&mut session, action);
            if apply_effect(effect, &session, &tx, &mut active_abort_handles) {
                break 'outer;
            }
        }
    }

    ratatui::restore();
    Ok(())
}

/// Execute an effect returned by `update`. Returns true if the loop should
/// exit.
fn apply_effect(
    effect: Effect,
    session: &Session,
    tx: &mpsc::Sender<Action>,
    active_abort_handles: &mut Vec<tokio::task::AbortHandle>,
) -> bool {
    match effect {
        Effect::SpawnRequest => {
            active_abort_handles.push(spawn_request(session, tx.clone()));
            false
        }
        Effect::LoadAttachment(path) => {
            active_abort_handles.push(spawn_attachment_load(path, tx.clone()));
            false
        }
        Effect::Quit => true,
        Effect::None => false,
    }
}
