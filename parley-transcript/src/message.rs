//! Messages and author roles.

use crate::id::MessageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human at the keyboard.
    User,
    /// The model.
    Assistant,
}

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Identity, unique within a transcript.
    pub id: MessageId,
    /// Who wrote it.
    pub role: Role,
    /// Text content. Replaced wholesale while `streaming`, frozen after.
    pub content: String,
    /// When the message was created.
    pub created_at: DateTime<Utc>,
    /// Whether the reply is still arriving. Only ever true for assistant messages.
    #[serde(default)]
    pub streaming: bool,
}

impl Message {
    /// A final message with a fresh id.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            role,
            content: content.into(),
            created_at: Utc::now(),
            streaming: false,
        }
    }

    /// A final user message with a fresh id.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// A final assistant message with a fresh id.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// An empty, streaming message waiting for its first fragment.
    pub fn placeholder(id: MessageId, role: Role) -> Self {
        Self {
            id,
            role,
            content: String::new(),
            created_at: Utc::now(),
            streaming: true,
        }
    }

    /// Replace the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<MessageId>) -> Self {
        self.id = id.into();
        self
    }
}
