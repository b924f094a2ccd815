#![deny(missing_docs)]
//! Ordered chat transcript with streaming message updates.
//!
//! A [`TranscriptStore`] owns the current [`Transcript`] snapshot. Every
//! mutation builds a new message sequence and swaps it in whole, so a
//! reader holding a snapshot never observes a half-applied update.
//! Assistant messages may be inserted as streaming placeholders, have
//! their content replaced while the reply arrives, and are then either
//! finalized or removed.

pub mod error;
pub mod id;
pub mod message;
pub mod store;
pub mod transcript;

pub use error::TranscriptError;
pub use id::MessageId;
pub use message::{Message, Role};
pub use store::TranscriptStore;
pub use transcript::Transcript;
