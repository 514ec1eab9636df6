//! # Chat Domain
//!
//! Everything that talks to (or models) the completion endpoint:
//! conversation history, the pending attachment, the HTTP transport,
//! and the chunk-boundary-safe UTF-8 decoder.
//!
//! No TUI types in here — presentation lives in the `tui` module.

pub mod attachment;
pub mod decode;
pub mod transport;
pub mod types;

pub use attachment::{AttachmentError, AttachmentSlot, PendingAttachment, MAX_ATTACHMENT_BYTES};
pub use decode::{DecodeFault, Utf8StreamDecoder};
pub use transport::{ChatTransport, HttpTransport, TransportError};
pub use types::{Conversation, Message, Role};
