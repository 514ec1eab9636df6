//! # Request Lifecycle
//!
//! Background tasks for one turn: the transport pushes raw byte chunks into
//! a bounded channel while the consumer pulls them through the stateful
//! UTF-8 decoder and forwards decoded text to the event loop as actions.
//! Exactly one terminal action (`ReplyDone` or `ReplyFailed`) is emitted
//! per request, carrying the request token so a stale stream can never
//! touch a newer turn.

use std::path::PathBuf;
use std::sync::mpsc;

use bytes::Bytes;
use log::{debug, info, warn};
use tokio::task::AbortHandle;

use crate::chat::attachment::load_attachment;
use crate::chat::{DecodeFault, Utf8StreamDecoder};
use crate::core::action::Action;
use crate::core::state::Session;

/// Channel depth for raw byte chunks; applies backpressure to the transport
/// if the UI loop stalls.
const CHUNK_CHANNEL_DEPTH: usize = 64;

/// Spawns the request for the turn the session just opened. Reads the
/// conversation snapshot and staged image; does not mutate the session.
pub fn spawn_request(session: &Session, tx: mpsc::Sender<Action>) -> AbortHandle {
    let transport = session.transport.clone();
    let messages = session.conversation.snapshot().to_vec();
    let image = session.outgoing_image.clone();
    let generation = session.generation();
    info!("Spawning completion request (generation {})", generation);

    let handle = tokio::spawn(async move {
        let (byte_tx, byte_rx) = tokio::sync::mpsc::channel::<Bytes>(CHUNK_CHANNEL_DEPTH);

        // Producer and consumer run concurrently; the transport dropping
        // its sender is the end-of-stream signal.
        let send = transport.send(&messages, image.as_deref(), byte_tx);
        let consume = consume_stream(byte_rx, generation, tx.clone());
        let (sent, consumed) = tokio::join!(send, consume);

        // A decode fault drops the receiver, which surfaces on the
        // transport side as a closed channel — the fault is the real cause,
        // so it wins.
        let terminal = match (sent, consumed) {
            (_, Err(fault)) => Action::ReplyFailed {
                generation,
                message: fault.to_string(),
            },
            (Err(e), Ok(())) => Action::ReplyFailed {
                generation,
                message: e.to_string(),
            },
            (Ok(()), Ok(())) => Action::ReplyDone { generation },
        };
        if tx.send(terminal).is_err() {
            warn!("Failed to deliver terminal action: receiver dropped");
        }
    });

    handle.abort_handle()
}

/// Drains the byte channel through the decoder, forwarding each non-empty
/// decoded increment. Returns the decode outcome; chunk delivery itself
/// never fails the stream.
async fn consume_stream(
    mut rx: tokio::sync::mpsc::Receiver<Bytes>,
    generation: u64,
    tx: mpsc::Sender<Action>,
) -> Result<(), DecodeFault> {
    let mut decoder = Utf8StreamDecoder::new();
    let mut total_len = 0usize;

    while let Some(chunk) = rx.recv().await {
        let text = decoder.decode(&chunk)?;
        if text.is_empty() {
            // Chunk only extended a pending multi-byte sequence.
            continue;
        }
        total_len += text.len();
        if tx
            .send(Action::ReplyChunk { generation, text })
            .is_err()
        {
            warn!("Failed to forward chunk: receiver dropped");
            return Ok(());
        }
    }

    debug!(
        "Stream drained (generation {}, {} decoded bytes)",
        generation, total_len
    );
    decoder.finish()
}

/// Spawns the awaitable file decode for a pending attachment.
pub fn spawn_attachment_load(path: PathBuf, tx: mpsc::Sender<Action>) -> AbortHandle {
    info!("Loading attachment: {}", path.display());
    let handle = tokio::spawn(async move {
        let result = load_attachment(&path).await;
        if tx.send(Action::AttachmentLoaded(result)).is_err() {
            warn!("Failed to deliver attachment result: receiver dropped");
        }
    });
    handle.abort_handle()
}
