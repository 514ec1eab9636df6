//! Pending image attachment: load, validate, hold, hand off.
//!
//! At most one attachment is alive at a time. It exists only between "file
//! selected" and "turn submitted or cleared", and is consumed exactly once
//! per submission so the same image can never be sent twice.

use std::fmt;
use std::io;
use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{debug, warn};

/// Client-enforced maximum attachment size: 5 MiB.
pub const MAX_ATTACHMENT_BYTES: u64 = 5 * 1024 * 1024;

/// An image staged for the next submission, already encoded as a data-URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAttachment {
    /// `data:<mime>;base64,...` — sent verbatim as the request's `image` field.
    pub data_uri: String,
    pub size_bytes: u64,
    /// File name for display purposes only.
    pub file_name: String,
}

#[derive(Debug)]
pub enum AttachmentError {
    /// File exceeds [`MAX_ATTACHMENT_BYTES`]. Surfaced as a notice, not a crash.
    TooLarge { size: u64 },
    /// Extension does not map to a supported image type.
    UnsupportedType(String),
    Io(io::Error),
}

impl fmt::Display for AttachmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttachmentError::TooLarge { size } => write!(
                f,
                "image is {} bytes, limit is {} (5 MiB)",
                size, MAX_ATTACHMENT_BYTES
            ),
            AttachmentError::UnsupportedType(ext) => {
                write!(f, "unsupported image type: .{ext}")
            }
            AttachmentError::Io(e) => write!(f, "could not read file: {e}"),
        }
    }
}

impl std::error::Error for AttachmentError {}

/// Maps a file extension to an image MIME type.
fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Asynchronously reads and encodes a file into a [`PendingAttachment`].
///
/// The size limit is checked against file metadata before any bytes are
/// read, so an oversized selection never costs a full read.
pub async fn load_attachment(path: &Path) -> Result<PendingAttachment, AttachmentError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let mime = mime_for_extension(ext)
        .ok_or_else(|| AttachmentError::UnsupportedType(ext.to_string()))?;

    let meta = tokio::fs::metadata(path).await.map_err(AttachmentError::Io)?;
    let size = meta.len();
    if size > MAX_ATTACHMENT_BYTES {
        warn!("Attachment rejected ({} bytes): {}", size, path.display());
        return Err(AttachmentError::TooLarge { size });
    }

    let bytes = tokio::fs::read(path).await.map_err(AttachmentError::Io)?;
    let data_uri = format!("data:{};base64,{}", mime, BASE64.encode(&bytes));
    debug!(
        "Attachment loaded: {} ({} bytes, {})",
        path.display(),
        size,
        mime
    );

    Ok(PendingAttachment {
        data_uri,
        size_bytes: size,
        file_name: path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string(),
    })
}

/// Holds at most one pending attachment. Last selection wins; `take()`
/// yields it at most once.
#[derive(Debug, Default)]
pub struct AttachmentSlot {
    pending: Option<PendingAttachment>,
}

impl AttachmentSlot {
    pub fn new() -> Self {
        AttachmentSlot::default()
    }

    /// Replaces any existing pending attachment (no queueing).
    pub fn set(&mut self, attachment: PendingAttachment) {
        if self.pending.is_some() {
            debug!("Replacing pending attachment");
        }
        self.pending = Some(attachment);
    }

    /// Returns the pending attachment and resets the slot to empty.
    /// Called exactly once per submission.
    pub fn take(&mut self) -> Option<PendingAttachment> {
        self.pending.take()
    }

    /// Discards any pending attachment without sending it.
    pub fn clear(&mut self) {
        self.pending = None;
    }

    pub fn get(&self) -> Option<&PendingAttachment> {
        self.pending.as_ref()
    }

    pub fn is_some(&self) -> bool {
        self.pending.is_some()
    }
}
