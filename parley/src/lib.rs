#![deny(missing_docs)]
//! # parley: umbrella crate
//!
//! Single import surface for the parley chat core. Re-exports the
//! transcript, provider contract, session controller and concrete
//! providers behind feature flags, plus a `prelude` for the happy path.

#[cfg(feature = "core")]
pub use parley_provider;
#[cfg(feature = "provider-gemini")]
pub use parley_provider_gemini;
#[cfg(feature = "core")]
pub use parley_session;
#[cfg(feature = "core")]
pub use parley_transcript;

/// Happy-path imports for wiring a chat session.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use parley_transcript::{Message, MessageId, Role, Transcript, TranscriptError};

    #[cfg(feature = "core")]
    pub use parley_provider::{Chat, ChatConfig, FragmentMode, Provider, ProviderError};

    #[cfg(feature = "core")]
    pub use parley_session::{
        PendingTurn, Session, SessionConfig, SessionError, SessionObserver, SessionView,
        StreamConsumer,
    };

    #[cfg(feature = "test-utils")]
    pub use parley_provider::test_utils::ScriptedProvider;

    #[cfg(feature = "provider-gemini")]
    pub use parley_provider_gemini::Gemini;
}
