//! Session errors.

use parley_provider::ProviderError;
use parley_transcript::{MessageId, TranscriptError};
use thiserror::Error;

/// Errors from [`StreamConsumer`](crate::StreamConsumer) and [`Session`](crate::Session).
///
/// Nothing is retried automatically; a retry is a fresh submission.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The generation backend never accepted its configuration.
    #[error("chat session not initialized")]
    UninitializedSession,

    /// The exchange failed after it started.
    #[error("generation failed: {0}")]
    GenerationFailed(#[source] ProviderError),

    /// The turn handed to `complete_turn` is not the one in flight.
    #[error("turn {0} is not in flight")]
    TurnNotInFlight(MessageId),

    /// A transcript update was rejected.
    #[error("transcript error: {0}")]
    Transcript(#[from] TranscriptError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn session_error_display() {
        assert_eq!(
            SessionError::UninitializedSession.to_string(),
            "chat session not initialized"
        );
        let err = SessionError::GenerationFailed(ProviderError::RateLimited);
        assert_eq!(err.to_string(), "generation failed: rate limited");
        assert!(err.source().is_some());
    }

    #[test]
    fn transcript_error_converts() {
        let err: SessionError = TranscriptError::NotFound("m".into()).into();
        assert!(matches!(err, SessionError::Transcript(_)));
    }

    #[test]
    fn stale_turn_names_reply_id() {
        let err = SessionError::TurnNotInFlight(MessageId::new("r-1"));
        assert_eq!(err.to_string(), "turn r-1 is not in flight");
    }
}
