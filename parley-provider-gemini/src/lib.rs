#![deny(missing_docs)]
//! Google Gemini chat provider for parley.
//!
//! Implements [`parley_provider::Provider`] against the Gemini
//! `streamGenerateContent` endpoint in SSE mode. Gemini streams text
//! deltas, so chats report [`FragmentMode::Incremental`](parley_provider::FragmentMode).
//! Each chat keeps its own history and sends it with every turn.

pub mod client;
pub(crate) mod error;
pub(crate) mod streaming;
pub(crate) mod types;

pub use client::{Gemini, GeminiChat};
