//! Provider and chat traits for generation backends.
//!
//! The [`Chat`] trait uses RPITIT (return-position `impl Trait` in traits)
//! and is NOT object-safe. Consumers are generic over `C: Chat`.

use crate::config::ChatConfig;
use crate::fragment::{FragmentMode, FragmentStream};
use std::future::Future;
use thiserror::Error;

/// Errors from generation backends.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider is missing configuration it needs (API key, endpoint).
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// HTTP or network request failed.
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// Provider rate-limited the request.
    #[error("rate limited")]
    RateLimited,

    /// Authentication/authorization failed.
    #[error("auth failed: {0}")]
    AuthFailed(String),

    /// Could not parse the provider's response.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The provider refused to answer the prompt.
    #[error("blocked: {0}")]
    Blocked(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A generation backend that can open chats.
///
/// Opening a chat is where configuration is checked. A provider that
/// cannot work (no API key, bad config) fails here, before any turn is sent.
pub trait Provider: Send + Sync {
    /// The chat handle this provider hands out.
    type Chat: Chat;

    /// Open a new chat with the given configuration.
    fn start_chat(&self, config: &ChatConfig) -> Result<Self::Chat, ProviderError>;
}

/// An open, multi-turn chat.
///
/// The chat keeps prior turns as context. A turn becomes part of the
/// context only once its stream has completed without error.
pub trait Chat: Send + Sync {
    /// How the fragments of this chat's streams relate to each other.
    fn fragment_mode(&self) -> FragmentMode;

    /// Send one user turn and stream the reply.
    ///
    /// The outer future resolves once the backend accepted the request;
    /// errors after that arrive as items of the stream.
    fn send_message_stream(
        &self,
        message: String,
    ) -> impl Future<Output = Result<FragmentStream, ProviderError>> + Send;
}
