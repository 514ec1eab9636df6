//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc::Sender;

use crate::chat::{ChatTransport, Message, PendingAttachment, TransportError};
use crate::core::state::Session;

/// A transport that never streams anything, for tests that don't need I/O.
pub struct NoopTransport;

#[async_trait]
impl ChatTransport for NoopTransport {
    fn name(&self) -> &str {
        "noop"
    }

    async fn send(
        &self,
        _messages: &[Message],
        _image: Option<&str>,
        _sender: Sender<Bytes>,
    ) -> Result<(), TransportError> {
        Ok(())
    }
}

/// A transport that replays a fixed chunk script or fails outright.
pub struct ScriptedTransport {
    chunks: Vec<Vec<u8>>,
    failure: Option<String>,
}

impl ScriptedTransport {
    pub fn replying(chunks: Vec<Vec<u8>>) -> Self {
        ScriptedTransport {
            chunks,
            failure: None,
        }
    }

    pub fn failing(message: &str) -> Self {
        ScriptedTransport {
            chunks: Vec::new(),
            failure: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send(
        &self,
        _messages: &[Message],
        _image: Option<&str>,
        sender: Sender<Bytes>,
    ) -> Result<(), TransportError> {
        if let Some(message) = &self.failure {
            return Err(TransportError::Network(message.clone()));
        }
        for chunk in &self.chunks {
            if sender.send(Bytes::from(chunk.clone())).await.is_err() {
                return Err(TransportError::ChannelClosed);
            }
        }
        Ok(())
    }
}

/// Creates a test Session with a NoopTransport.
pub fn test_session() -> Session {
    Session::new(Arc::new(NoopTransport))
}

pub fn session_with_transport(transport: ScriptedTransport) -> Session {
    Session::new(Arc::new(transport))
}

/// A small in-memory attachment for controller tests.
pub fn test_attachment(name: &str) -> PendingAttachment {
    PendingAttachment {
        data_uri: "data:image/png;base64,iVBORw0KGgo=".to_string(),
        size_bytes: 8,
        file_name: name.to_string(),
    }
}
