//! The transcript store.

use crate::error::TranscriptError;
use crate::id::MessageId;
use crate::message::{Message, Role};
use crate::transcript::Transcript;

/// Owner of the current [`Transcript`].
///
/// Each successful operation publishes a brand new snapshot. Snapshots
/// handed out earlier are never touched, so a renderer can hold one for as
/// long as it likes. There is exactly one writer; callers needing shared
/// access wrap the store themselves.
#[derive(Debug, Default)]
pub struct TranscriptStore {
    current: Transcript,
}

impl TranscriptStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Transcript {
        self.current.clone()
    }

    /// Number of messages in the current snapshot.
    pub fn len(&self) -> usize {
        self.current.len()
    }

    /// Whether the transcript is empty.
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Add a message to the end.
    pub fn append(&mut self, message: Message) -> Result<(), TranscriptError> {
        if message.streaming && message.role != Role::Assistant {
            return Err(TranscriptError::StreamingUserMessage(message.id));
        }
        if self.current.get(&message.id).is_some() {
            return Err(TranscriptError::DuplicateId(message.id));
        }
        tracing::debug!(id = %message.id, role = ?message.role, "append message");
        let mut next = self.current.to_vec();
        next.push(message);
        self.publish(next);
        Ok(())
    }

    /// Add an empty streaming message to the end.
    ///
    /// Called right after the paired user message is appended.
    pub fn append_placeholder(&mut self, id: MessageId, role: Role) -> Result<(), TranscriptError> {
        self.append(Message::placeholder(id, role))
    }

    /// Replace the content of a streaming message.
    ///
    /// Order, count and every other field are left alone.
    pub fn update_content(
        &mut self,
        id: &MessageId,
        content: impl Into<String>,
    ) -> Result<(), TranscriptError> {
        let index = self.index_of(id)?;
        if !self.current[index].streaming {
            return Err(TranscriptError::Frozen(id.clone()));
        }
        let mut next = self.current.to_vec();
        next[index].content = content.into();
        self.publish(next);
        Ok(())
    }

    /// Mark a message as final. Content is left as last updated.
    ///
    /// Finalizing a message that is already final changes nothing.
    pub fn finalize(&mut self, id: &MessageId) -> Result<(), TranscriptError> {
        let index = self.index_of(id)?;
        if !self.current[index].streaming {
            return Ok(());
        }
        tracing::debug!(id = %id, "finalize message");
        let mut next = self.current.to_vec();
        next[index].streaming = false;
        self.publish(next);
        Ok(())
    }

    /// Delete a message, keeping the order of the rest.
    pub fn remove(&mut self, id: &MessageId) -> Result<(), TranscriptError> {
        let index = self.index_of(id)?;
        tracing::debug!(id = %id, "remove message");
        let mut next = self.current.to_vec();
        next.remove(index);
        self.publish(next);
        Ok(())
    }

    fn index_of(&self, id: &MessageId) -> Result<usize, TranscriptError> {
        self.current
            .position(id)
            .ok_or_else(|| TranscriptError::NotFound(id.clone()))
    }

    fn publish(&mut self, messages: Vec<Message>) {
        self.current = Transcript::from_vec(messages);
    }
}
