//! # Actions
//!
//! Everything that can happen to a session becomes an `Action`.
//! User presses Enter? That's `Action::Submit`. A decoded stream chunk
//! arrives? That's `Action::ReplyChunk`.
//!
//! `update()` takes the session and an action and returns an `Effect` for
//! the caller to perform. No I/O happens here — spawning the request and
//! reading files are the event loop's job. This keeps the whole request
//! lifecycle testable without a terminal or a network.
//!
//! ```text
//! Session + Action  →  update()  →  mutated Session + Effect
//! ```
//!
//! Every stream action carries the request token it belongs to. A stale
//! token (from a request that is no longer current) is dropped on the
//! floor, which is what makes overlapping submissions impossible rather
//! than merely discouraged.

use std::path::PathBuf;

use log::{debug, warn};

use crate::chat::{AttachmentError, Message, PendingAttachment};
use crate::core::state::{Bubble, Session};

#[derive(Debug)]
pub enum Action {
    /// Composer submission with the raw input text.
    Submit(String),
    /// The async file decode finished (or was rejected).
    AttachmentLoaded(Result<PendingAttachment, AttachmentError>),
    /// Decoded text arrived for the request with this token.
    ReplyChunk { generation: u64, text: String },
    /// The stream for this token ended cleanly.
    ReplyDone { generation: u64 },
    /// Transport or decode failure, terminal for this token's turn.
    ReplyFailed { generation: u64, message: String },
    Quit,
}

/// Side effects `update()` asks the event loop to perform.
#[derive(Debug, PartialEq, Eq)]
pub enum Effect {
    None,
    /// Issue the request for the turn just opened.
    SpawnRequest,
    /// Read and encode a file into a pending attachment.
    LoadAttachment(PathBuf),
    Quit,
}

pub fn update(session: &mut Session, action: Action) -> Effect {
    match action {
        Action::Submit(raw) => submit(session, raw),
        Action::AttachmentLoaded(result) => attachment_loaded(session, result),
        Action::ReplyChunk { generation, text } => reply_chunk(session, generation, text),
        Action::ReplyDone { generation } => reply_done(session, generation),
        Action::ReplyFailed { generation, message } => reply_failed(session, generation, message),
        Action::Quit => Effect::Quit,
    }
}

fn submit(session: &mut Session, raw: String) -> Effect {
    let text = raw.trim();

    // Attachment commands stand in for the browser's file picker. They work
    // mid-stream too: staging an image never touches the in-flight request.
    if let Some(rest) = text.strip_prefix("/attach") {
        let path = rest.trim();
        if path.is_empty() {
            session.status_message = String::from("Usage: /attach <path>");
            return Effect::None;
        }
        return Effect::LoadAttachment(PathBuf::from(path));
    }
    if text == "/detach" {
        session.attachment.clear();
        session.status_message = String::from("Attachment removed");
        return Effect::None;
    }

    // Hard concurrency gate: one request at a time, by token, not by
    // disabled-button courtesy.
    if session.is_streaming() {
        debug!("Submission rejected: request already in flight");
        session.status_message = String::from("Still replying — wait for this turn to finish");
        return Effect::None;
    }

    // Submission gate: silent no-op without text or an attachment.
    if text.is_empty() && !session.attachment.is_some() {
        return Effect::None;
    }

    // The attachment is consumed into this turn before the stream starts;
    // take() guarantees it cannot ride along twice.
    let attachment = session.attachment.take();

    session.conversation.append(Message::user(text));
    session.transcript.push(Bubble::User(user_bubble_text(
        text,
        attachment.as_ref(),
    )));
    session.transcript.push(Bubble::Typing);

    session.outgoing_image = attachment.map(|a| a.data_uri);
    let generation = session.begin_request();
    debug!("Turn opened (generation {})", generation);
    session.status_message = String::from("Waiting for reply…");

    Effect::SpawnRequest
}

/// Display text for a user bubble; notes the consumed attachment.
fn user_bubble_text(text: &str, attachment: Option<&PendingAttachment>) -> String {
    match attachment {
        None => text.to_string(),
        Some(att) if text.is_empty() => format!("[image: {}]", att.file_name),
        Some(att) => format!("{}\n[image: {}]", text, att.file_name),
    }
}

fn attachment_loaded(
    session: &mut Session,
    result: Result<PendingAttachment, AttachmentError>,
) -> Effect {
    match result {
        Ok(att) => {
            session.status_message = format!(
                "Attached {} ({:.1} KiB)",
                att.file_name,
                att.size_bytes as f64 / 1024.0
            );
            // Last selection wins; any earlier pending image is replaced.
            session.attachment.set(att);
        }
        Err(e) => {
            warn!("Attachment rejected: {}", e);
            session.status_message = format!("Attachment rejected: {e}");
        }
    }
    Effect::None
}

fn reply_chunk(session: &mut Session, generation: u64, text: String) -> Effect {
    if !session.is_current(generation) {
        debug!("Ignoring stale chunk (generation {})", generation);
        return Effect::None;
    }

    match session.transcript.last_mut() {
        // First byte of the reply: the typing indicator dies here and
        // nowhere else.
        Some(Bubble::Typing) => {
            session.transcript.pop();
            session.transcript.push(Bubble::Assistant(text));
        }
        // Stream buffer grows in place; rendering re-reads the whole thing.
        Some(Bubble::Assistant(buffer)) => buffer.push_str(&text),
        _ => {
            warn!("Chunk arrived with no open reply bubble; starting one");
            session.transcript.push(Bubble::Assistant(text));
        }
    }
    Effect::None
}

fn reply_done(session: &mut Session, generation: u64) -> Effect {
    if !session.is_current(generation) {
        debug!("Ignoring stale completion (generation {})", generation);
        return Effect::None;
    }

    // Empty reply: the stream ended before any byte arrived.
    if matches!(session.transcript.last(), Some(Bubble::Typing)) {
        session.transcript.pop();
        session.transcript.push(Bubble::Assistant(String::new()));
    }

    // The buffer is only now converted into a history entry — raw text,
    // exactly as decoded, never the rendered form.
    let content = match session.transcript.last() {
        Some(Bubble::Assistant(text)) => text.clone(),
        _ => String::new(),
    };
    session.conversation.append(Message::assistant(content));

    session.finish_request();
    session.status_message = String::from("Ready");
    Effect::None
}

fn reply_failed(session: &mut Session, generation: u64, message: String) -> Effect {
    if !session.is_current(generation) {
        debug!("Ignoring stale failure (generation {})", generation);
        return Effect::None;
    }
    warn!("Turn failed (generation {}): {}", generation, message);

    if matches!(session.transcript.last(), Some(Bubble::Typing)) {
        session.transcript.pop();
    }
    // Cosmetic only: history stays un-appended so a retry resends a clean
    // conversation.
    session.transcript.push(Bubble::Error(message));

    session.finish_request();
    session.status_message = String::from("Request failed");
    Effect::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Role;
    use crate::test_support::{test_attachment, test_session};

    #[test]
    fn test_submit_appends_user_message_before_request() {
        let mut session = test_session();
        let effect = update(&mut session, Action::Submit("Hello".to_string()));

        assert_eq!(effect, Effect::SpawnRequest);
        assert_eq!(session.conversation.len(), 1);
        let msg = &session.conversation.snapshot()[0];
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(session.is_streaming());
        assert!(session.typing_indicator_visible());
    }

    #[test]
    fn test_submit_trims_text() {
        let mut session = test_session();
        update(&mut session, Action::Submit("  Hello  \n".to_string()));
        assert_eq!(session.conversation.snapshot()[0].content, "Hello");
    }

    #[test]
    fn test_empty_submission_is_a_noop() {
        let mut session = test_session();
        let effect = update(&mut session, Action::Submit("   \n\t ".to_string()));

        assert_eq!(effect, Effect::None);
        assert!(session.conversation.is_empty());
        assert!(session.transcript.is_empty());
        assert!(!session.is_streaming());
    }

    #[test]
    fn test_attachment_only_submission_proceeds() {
        let mut session = test_session();
        session.attachment.set(test_attachment("photo.png"));

        let effect = update(&mut session, Action::Submit(String::new()));
        assert_eq!(effect, Effect::SpawnRequest);
        assert_eq!(session.conversation.len(), 1);
        assert_eq!(session.conversation.snapshot()[0].content, "");
        // Consumed into the turn: slot empty, data-URI staged for the request.
        assert!(!session.attachment.is_some());
        assert!(session.outgoing_image.is_some());
    }

    #[test]
    fn test_submit_while_streaming_is_rejected() {
        let mut session = test_session();
        update(&mut session, Action::Submit("first".to_string()));
        let generation = session.generation();

        let effect = update(&mut session, Action::Submit("second".to_string()));
        assert_eq!(effect, Effect::None);
        // Only the first user message exists, same request still current.
        assert_eq!(session.conversation.len(), 1);
        assert!(session.is_current(generation));
    }

    #[test]
    fn test_first_chunk_replaces_typing_indicator() {
        let mut session = test_session();
        update(&mut session, Action::Submit("hi".to_string()));
        let generation = session.generation();
        assert!(session.typing_indicator_visible());

        update(
            &mut session,
            Action::ReplyChunk {
                generation,
                text: "He".to_string(),
            },
        );
        assert!(!session.typing_indicator_visible());
        assert_eq!(
            session.transcript.last(),
            Some(&Bubble::Assistant("He".to_string()))
        );
    }

    #[test]
    fn test_chunks_accumulate_and_done_appends_history() {
        let mut session = test_session();
        update(&mut session, Action::Submit("Hello".to_string()));
        let generation = session.generation();

        for chunk in ["Hi", " there"] {
            update(
                &mut session,
                Action::ReplyChunk {
                    generation,
                    text: chunk.to_string(),
                },
            );
        }
        update(&mut session, Action::ReplyDone { generation });

        // History: user turn then the full assistant text, raw.
        let history = session.conversation.snapshot();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], Message::user("Hello"));
        assert_eq!(history[1], Message::assistant("Hi there"));
        assert!(!session.is_streaming());
        assert_eq!(
            session.transcript.last(),
            Some(&Bubble::Assistant("Hi there".to_string()))
        );
    }

    #[test]
    fn test_history_holds_raw_text_not_rendered_output() {
        let mut session = test_session();
        update(&mut session, Action::Submit("code?".to_string()));
        let generation = session.generation();

        let markdown = "**bold** and\n```rust\nfn main() {}\n```";
        update(
            &mut session,
            Action::ReplyChunk {
                generation,
                text: markdown.to_string(),
            },
        );
        update(&mut session, Action::ReplyDone { generation });

        assert_eq!(session.conversation.snapshot()[1].content, markdown);
    }

    #[test]
    fn test_empty_reply_still_closes_the_turn() {
        let mut session = test_session();
        update(&mut session, Action::Submit("hi".to_string()));
        let generation = session.generation();

        update(&mut session, Action::ReplyDone { generation });
        assert!(!session.typing_indicator_visible());
        assert_eq!(session.conversation.len(), 2);
        assert_eq!(session.conversation.snapshot()[1].content, "");
        assert!(!session.is_streaming());
    }

    #[test]
    fn test_failure_shows_error_and_leaves_history_clean() {
        let mut session = test_session();
        update(&mut session, Action::Submit("hi".to_string()));
        let generation = session.generation();

        update(
            &mut session,
            Action::ReplyFailed {
                generation,
                message: "network error: refused".to_string(),
            },
        );

        // Indicator gone, one error bubble, history has only the user turn,
        // composer usable again.
        assert!(!session.typing_indicator_visible());
        assert_eq!(
            session.transcript.last(),
            Some(&Bubble::Error("network error: refused".to_string()))
        );
        assert_eq!(session.conversation.len(), 1);
        assert!(!session.is_streaming());
        assert!(session.composer_enabled("retry"));
    }

    #[test]
    fn test_failure_mid_stream_keeps_partial_bubble_out_of_history() {
        let mut session = test_session();
        update(&mut session, Action::Submit("hi".to_string()));
        let generation = session.generation();

        update(
            &mut session,
            Action::ReplyChunk {
                generation,
                text: "partial".to_string(),
            },
        );
        update(
            &mut session,
            Action::ReplyFailed {
                generation,
                message: "connection reset".to_string(),
            },
        );

        // The partial text stays visible, the error follows it, and neither
        // reaches the transmitted history.
        assert_eq!(session.conversation.len(), 1);
        let n = session.transcript.len();
        assert_eq!(
            session.transcript[n - 2],
            Bubble::Assistant("partial".to_string())
        );
        assert_eq!(
            session.transcript[n - 1],
            Bubble::Error("connection reset".to_string())
        );
    }

    #[test]
    fn test_stale_generation_actions_are_ignored() {
        let mut session = test_session();
        update(&mut session, Action::Submit("one".to_string()));
        let stale = session.generation();
        update(&mut session, Action::ReplyDone { generation: stale });

        update(&mut session, Action::Submit("two".to_string()));
        let history_len = session.conversation.len();
        let transcript_len = session.transcript.len();

        // Late arrivals from the finished request must change nothing.
        update(
            &mut session,
            Action::ReplyChunk {
                generation: stale,
                text: "ghost".to_string(),
            },
        );
        update(&mut session, Action::ReplyDone { generation: stale });
        update(
            &mut session,
            Action::ReplyFailed {
                generation: stale,
                message: "ghost".to_string(),
            },
        );

        assert_eq!(session.conversation.len(), history_len);
        assert_eq!(session.transcript.len(), transcript_len);
        assert!(session.is_streaming());
    }

    #[test]
    fn test_attach_command_requests_load() {
        let mut session = test_session();
        let effect = update(&mut session, Action::Submit("/attach ~/cat.png".to_string()));
        assert_eq!(effect, Effect::LoadAttachment(PathBuf::from("~/cat.png")));
        // A command never opens a turn.
        assert!(session.conversation.is_empty());
        assert!(!session.is_streaming());
    }

    #[test]
    fn test_attach_command_without_path_shows_usage() {
        let mut session = test_session();
        let effect = update(&mut session, Action::Submit("/attach".to_string()));
        assert_eq!(effect, Effect::None);
        assert_eq!(session.status_message, "Usage: /attach <path>");
    }

    #[test]
    fn test_detach_command_clears_pending_attachment() {
        let mut session = test_session();
        session.attachment.set(test_attachment("cat.png"));

        update(&mut session, Action::Submit("/detach".to_string()));
        assert!(!session.attachment.is_some());
    }

    #[test]
    fn test_attachment_loaded_replaces_previous() {
        let mut session = test_session();
        update(
            &mut session,
            Action::AttachmentLoaded(Ok(test_attachment("first.png"))),
        );
        update(
            &mut session,
            Action::AttachmentLoaded(Ok(test_attachment("second.png"))),
        );
        assert_eq!(
            session.attachment.get().unwrap().file_name,
            "second.png"
        );
    }

    #[test]
    fn test_attachment_rejection_is_a_notice_not_a_turn() {
        let mut session = test_session();
        update(
            &mut session,
            Action::AttachmentLoaded(Err(AttachmentError::TooLarge {
                size: 6_000_000,
            })),
        );
        assert!(session.status_message.starts_with("Attachment rejected"));
        assert!(!session.attachment.is_some());
        // An oversized file on its own never enables the composer.
        assert!(!session.composer_enabled(""));
    }

    #[test]
    fn test_user_bubble_notes_attachment() {
        assert_eq!(user_bubble_text("look", Some(&test_attachment("c.png"))),
            "look\n[image: c.png]");
        assert_eq!(
            user_bubble_text("", Some(&test_attachment("c.png"))),
            "[image: c.png]"
        );
        assert_eq!(user_bubble_text("plain", None), "plain");
    }

    #[test]
    fn test_quit() {
        let mut session = test_session();
        assert_eq!(update(&mut session, Action::Quit), Effect::Quit);
    }
}
