//! # Session State
//!
//! One `Session` value owns everything the controller needs:
//!
//! ```text
//! Session
//! ├── transport: Arc<dyn ChatTransport>   // completion endpoint
//! ├── conversation: Conversation          // transmitted history
//! ├── transcript: Vec<Bubble>             // displayed log (incl. typing/errors)
//! ├── attachment: AttachmentSlot          // at most one staged image
//! ├── outgoing_image: Option<String>      // data-URI for the in-flight turn
//! ├── status_message: String              // title bar text
//! ├── generation: u64                     // request token counter
//! └── in_flight: Option<u64>              // active request token
//! ```
//!
//! The transcript and the conversation deliberately diverge: the live
//! assistant bubble and inline error bubbles exist only in the transcript.
//! History gains its assistant entry when the stream completes, and failed
//! turns never reach it — so a retry resends a clean history.
//!
//! State changes only happen through `update(session, action)` in action.rs.

use std::sync::Arc;

use crate::chat::{AttachmentSlot, ChatTransport, Conversation};

/// One entry in the displayed transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bubble {
    User(String),
    /// While a request is streaming, the last `Assistant` bubble is the
    /// stream buffer, mutated in place on every chunk.
    Assistant(String),
    /// Typing indicator placeholder. Created on submission, destroyed the
    /// moment the first decoded byte arrives or the request fails.
    Typing,
    /// Assistant-styled inline error notice. Cosmetic only — never part of
    /// the transmitted history.
    Error(String),
}

pub struct Session {
    pub transport: Arc<dyn ChatTransport>,
    pub conversation: Conversation,
    pub transcript: Vec<Bubble>,
    pub attachment: AttachmentSlot,
    /// Consumed attachment for the request currently being sent.
    pub outgoing_image: Option<String>,
    pub status_message: String,
    generation: u64,
    in_flight: Option<u64>,
}

impl Session {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Session {
            transport,
            conversation: Conversation::new(),
            transcript: Vec::new(),
            attachment: AttachmentSlot::new(),
            outgoing_image: None,
            status_message: String::from("Welcome to Parley!"),
            generation: 0,
            in_flight: None,
        }
    }

    /// Allocates a fresh request token and marks it in flight.
    pub fn begin_request(&mut self) -> u64 {
        self.generation += 1;
        self.in_flight = Some(self.generation);
        self.generation
    }

    pub fn finish_request(&mut self) {
        self.in_flight = None;
        self.outgoing_image = None;
    }

    /// True if `generation` is the token of the request currently in flight.
    /// Stale stream actions fail this check and are ignored.
    pub fn is_current(&self, generation: u64) -> bool {
        self.in_flight == Some(generation)
    }

    pub fn is_streaming(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Token of the most recently started request.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Derived, never stored: the typing indicator is simply the trailing
    /// transcript bubble.
    pub fn typing_indicator_visible(&self) -> bool {
        matches!(self.transcript.last(), Some(Bubble::Typing))
    }

    /// Composer (send) enablement: no request in flight AND something to send.
    pub fn composer_enabled(&self, draft: &str) -> bool {
        self.in_flight.is_none() && (!draft.trim().is_empty() || self.attachment.is_some())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::test_session;

    #[test]
    fn test_session_new_defaults() {
        let session = test_session();
        assert_eq!(session.status_message, "Welcome to Parley!");
        assert!(!session.is_streaming());
        assert!(session.conversation.is_empty());
        assert!(session.transcript.is_empty());
        assert!(!session.typing_indicator_visible());
    }

    #[test]
    fn test_request_token_lifecycle() {
        let mut session = test_session();
        let first = session.begin_request();
        assert!(session.is_current(first));
        assert!(session.is_streaming());

        session.finish_request();
        assert!(!session.is_current(first));

        let second = session.begin_request();
        assert_ne!(first, second);
        assert!(!session.is_current(first));
        assert!(session.is_current(second));
    }

    #[test]
    fn test_composer_enabled_requires_content_and_idle() {
        let mut session = test_session();
        assert!(!session.composer_enabled(""));
        assert!(!session.composer_enabled("   \n "));
        assert!(session.composer_enabled("hello"));

        session.begin_request();
        assert!(!session.composer_enabled("hello"));
    }
}
