//! Immutable transcript snapshots.

use crate::id::MessageId;
use crate::message::Message;
use std::ops::Deref;
use std::sync::Arc;

/// An immutable, ordered snapshot of the conversation.
///
/// Cloning is a reference-count bump. Insertion order is display order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Arc<[Message]>,
}

impl Transcript {
    pub(crate) fn from_vec(messages: Vec<Message>) -> Self {
        Self {
            messages: messages.into(),
        }
    }

    /// Look up a message by id.
    pub fn get(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// Position of a message by id.
    pub fn position(&self, id: &MessageId) -> Option<usize> {
        self.messages.iter().position(|m| &m.id == id)
    }

    /// Whether any message is still streaming.
    pub fn streaming(&self) -> bool {
        self.messages.iter().any(|m| m.streaming)
    }

    /// Ids in display order.
    pub fn ids(&self) -> Vec<MessageId> {
        self.messages.iter().map(|m| m.id.clone()).collect()
    }
}

impl Deref for Transcript {
    type Target = [Message];

    fn deref(&self) -> &[Message] {
        &self.messages
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
