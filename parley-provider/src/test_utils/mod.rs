//! Test implementations of the collaborator traits.
//!
//! Enabled with the `test-utils` feature. Lets session and UI code run
//! against scripted replies without a network.

mod scripted_provider;

pub use scripted_provider::{ScriptedChat, ScriptedProvider, ScriptedTurn};
