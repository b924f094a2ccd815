#![deny(missing_docs)]
//! Contract for the generation collaborator behind a chat session.
//!
//! Provides the [`Provider`] trait for opening a chat, the [`Chat`] trait
//! for sending one user turn and receiving a [`FragmentStream`], and the
//! [`Accumulator`] that turns fragments into cumulative reply text under
//! either [`FragmentMode`].

pub mod config;
pub mod fragment;
pub mod provider;
#[cfg(feature = "test-utils")]
pub mod test_utils;

// Re-exports
pub use config::{ChatConfig, DEFAULT_SYSTEM_INSTRUCTION};
pub use fragment::{Accumulator, FragmentMode, FragmentStream};
pub use provider::{Chat, Provider, ProviderError};
