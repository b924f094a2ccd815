//! Transcript errors.

use crate::id::MessageId;
use thiserror::Error;

/// Errors from [`TranscriptStore`](crate::TranscriptStore) operations.
///
/// A failed operation leaves the transcript exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    /// A message with this id is already in the transcript.
    #[error("duplicate message id: {0}")]
    DuplicateId(MessageId),

    /// No message with this id is in the transcript.
    #[error("message not found: {0}")]
    NotFound(MessageId),

    /// The message was finalized; its content can no longer change.
    #[error("message is final: {0}")]
    Frozen(MessageId),

    /// Only assistant messages may stream.
    #[error("user message cannot be streaming: {0}")]
    StreamingUserMessage(MessageId),
}
