use serde::{Deserialize, Serialize};

/// Who authored a message. Serialized with the endpoint's role names.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

/// One turn entry as transmitted to the server. Immutable once appended
/// to the conversation — the *displayed* assistant bubble mutates while
/// streaming, but its history entry is only created when the stream ends.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered, append-only log of messages: insertion order is chronological
/// order and transmission order. The full history is resent on every request.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Conversation::default()
    }

    /// Appends a message to the end of the history. There is no removal,
    /// reordering, or mutation of past entries.
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// The full ordered sequence, as sent to the server.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
