#![deny(missing_docs)]
//! Chat session core: one conversation, one writer, streamed replies.
//!
//! [`StreamConsumer`] drives a single exchange with a [`Chat`](parley_provider::Chat)
//! and reports the cumulative reply text after every fragment.
//! [`Session`] owns the transcript and the loading/error flags the
//! presentation layer renders, and turns a submission into an optimistic
//! user message, a streaming placeholder, and finally either a finished
//! reply or a removed placeholder plus an error.

pub mod config;
pub mod consumer;
pub mod error;
pub mod observer;
pub mod session;

pub use config::SessionConfig;
pub use consumer::StreamConsumer;
pub use error::SessionError;
pub use observer::{SessionObserver, SessionView};
pub use session::{PendingTurn, Session};
