//! HTTP transport to the completion endpoint.
//!
//! One POST per turn carrying the full conversation (plus the optional
//! image data-URI) as JSON. The response body is an undifferentiated byte
//! stream: no SSE framing, no delimiters — the concatenation of all chunks
//! in arrival order is the full assistant reply. Raw chunks are forwarded
//! over an mpsc channel; end-of-stream is signalled by the sender dropping.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::mpsc::Sender;

use super::types::Message;

/// Errors that can occur while issuing a request or draining its body.
#[derive(Debug)]
pub enum TransportError {
    /// Network-level failure (DNS, connection refused, mid-stream read fault).
    Network(String),
    /// The endpoint answered with a non-success status.
    Api { status: u16, message: String },
    /// The receiving side of the chunk channel was dropped.
    ChannelClosed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Network(msg) => write!(f, "network error: {msg}"),
            TransportError::Api { status, message } => {
                write!(f, "server error (HTTP {status}): {message}")
            }
            TransportError::ChannelClosed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Wire body for the completion request.
#[derive(Serialize, Debug)]
struct ChatRequestBody<'a> {
    messages: &'a [Message],
    /// `data:image/...;base64,...` or null.
    image: Option<&'a str>,
}

/// One-shot streaming request to the completion endpoint.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    fn name(&self) -> &str;

    /// Sends the conversation snapshot and forwards raw body chunks to
    /// `sender` until the stream ends. Dropping `sender` on return is the
    /// end-of-stream signal.
    async fn send(
        &self,
        messages: &[Message],
        image: Option<&str>,
        sender: Sender<Bytes>,
    ) -> Result<(), TransportError>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpTransport {
    /// `endpoint` is the full completion URL, e.g. `http://127.0.0.1:5000/gpt4`.
    pub fn new(endpoint: String) -> Self {
        HttpTransport {
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    async fn post(&self, body: &ChatRequestBody<'_>) -> Result<reqwest::Response, TransportError> {
        let json_body = serde_json::to_string(body)
            .map_err(|e| TransportError::Network(format!("request serialization failed: {e}")))?;
        debug!("Request body: {} bytes", json_body.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .body(json_body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        debug!("Response status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            warn!("Completion endpoint error: {} - {}", status, message);
            return Err(TransportError::Api { status, message });
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(
        &self,
        messages: &[Message],
        image: Option<&str>,
        sender: Sender<Bytes>,
    ) -> Result<(), TransportError> {
        info!(
            "POST {} ({} messages, image: {})",
            self.endpoint,
            messages.len(),
            image.is_some()
        );

        let response = self.post(&ChatRequestBody { messages, image }).await?;

        let mut stream = response.bytes_stream();
        let mut chunk_count = 0usize;
        let mut total_len = 0usize;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| TransportError::Network(e.to_string()))?;
            if chunk.is_empty() {
                continue;
            }
            chunk_count += 1;
            total_len += chunk.len();
            debug!("Forwarding chunk {} ({} bytes)", chunk_count, chunk.len());
            if sender.send(chunk).await.is_err() {
                warn!("Chunk send failed: receiver dropped");
                return Err(TransportError::ChannelClosed);
            }
        }

        info!("Stream ended: {} chunks, {} bytes", chunk_count, total_len);
        Ok(())
    }
}
