//! Configuration for a chat session.

use parley_provider::ChatConfig;

/// Greeting shown as the first assistant message of a new session.
pub const DEFAULT_GREETING: &str = "Hello! I'm your advanced NLP assistant powered by Gemini. I can help you with analysis, coding, creative writing, and more. How can I assist you today?";

/// Shown, permanently, when the backend refuses the configuration.
pub const DEFAULT_INIT_ERROR: &str =
    "Failed to initialize chat service. Please check your API key configuration.";

/// Shown, until dismissed or the next submission, when a reply fails.
pub const DEFAULT_GENERATION_ERROR: &str =
    "I encountered an error while processing your request. Please try again.";

/// Static configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Handed to the provider when the chat is opened.
    pub chat: ChatConfig,

    /// Id of the greeting message.
    pub greeting_id: String,

    /// Greeting text (None = start with an empty transcript).
    pub greeting: Option<String>,

    /// Error text for a failed initialization.
    pub init_error_message: String,

    /// Error text for a failed reply.
    pub generation_error_message: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            chat: ChatConfig::default(),
            greeting_id: "init-1".into(),
            greeting: Some(DEFAULT_GREETING.into()),
            init_error_message: DEFAULT_INIT_ERROR.into(),
            generation_error_message: DEFAULT_GENERATION_ERROR.into(),
        }
    }
}

impl SessionConfig {
    /// Override the chat configuration.
    #[must_use]
    pub fn chat(mut self, chat: ChatConfig) -> Self {
        self.chat = chat;
        self
    }

    /// Override the greeting; `None` disables it.
    #[must_use]
    pub fn greeting(mut self, greeting: Option<String>) -> Self {
        self.greeting = greeting;
        self
    }
}
