//! Chunk-boundary-safe UTF-8 decoding.
//!
//! The transport hands over raw byte chunks whose boundaries are chosen by
//! the network, not by the server — a chunk may end mid-way through a
//! multi-byte code point. Decoding each chunk independently (or lossily)
//! would corrupt those characters, so the decoder carries the trailing
//! incomplete sequence from one chunk into the next. Decoding is therefore
//! invariant to how the stream was segmented.

use std::fmt;

/// A malformed byte stream. Terminal for the current turn only.
#[derive(Debug, PartialEq, Eq)]
pub enum DecodeFault {
    /// Bytes that can never begin or continue a valid UTF-8 sequence.
    InvalidSequence,
    /// The stream ended inside a multi-byte sequence.
    Truncated,
}

impl fmt::Display for DecodeFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeFault::InvalidSequence => write!(f, "response is not valid UTF-8"),
            DecodeFault::Truncated => write!(f, "response ended mid-character"),
        }
    }
}

impl std::error::Error for DecodeFault {}

/// Incremental UTF-8 decoder.
///
/// Feed arbitrary byte chunks through [`decode`](Self::decode); call
/// [`finish`](Self::finish) once the stream ends to reject a dangling
/// partial sequence.
#[derive(Debug, Default)]
pub struct Utf8StreamDecoder {
    /// Trailing bytes of an incomplete code point (at most 3).
    pending: Vec<u8>,
}

impl Utf8StreamDecoder {
    pub fn new() -> Self {
        Utf8StreamDecoder::default()
    }

    /// Decodes a chunk, returning all complete characters it closes out.
    /// An empty return value is normal when a chunk only extends a pending
    /// sequence.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, DecodeFault> {
        if self.pending.is_empty() && chunk.is_empty() {
            return Ok(String::new());
        }

        let mut buf = std::mem::take(&mut self.pending);
        buf.extend_from_slice(chunk);

        match std::str::from_utf8(&buf) {
            Ok(text) => Ok(text.to_string()),
            Err(err) => {
                let valid = err.valid_up_to();
                if err.error_len().is_some() {
                    // A byte that cannot be part of any sequence — not a
                    // chunk-boundary artifact.
                    return Err(DecodeFault::InvalidSequence);
                }
                // Incomplete trailing sequence: emit the valid prefix and
                // carry the tail into the next chunk.
                self.pending = buf[valid..].to_vec();
                // valid_up_to guarantees this prefix is well-formed
                let text = std::str::from_utf8(&buf[..valid])
                    .map_err(|_| DecodeFault::InvalidSequence)?;
                Ok(text.to_string())
            }
        }
    }

    /// Marks end-of-stream. Fails if a partial sequence is still pending.
    pub fn finish(&mut self) -> Result<(), DecodeFault> {
        if self.pending.is_empty() {
            Ok(())
        } else {
            self.pending.clear();
            Err(DecodeFault::Truncated)
        }
    }
}
