//! Configuration handed to a provider when a chat is opened.

/// System instruction used when none is configured.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a helpful, intelligent, and articulate NLP assistant. You are capable of complex reasoning, coding tasks, and maintaining long, multi-turn conversations with context awareness.";

/// Static configuration for one chat.
///
/// Fixed for the lifetime of the chat; a new configuration means a new chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// System instruction sent with every turn.
    pub system_instruction: String,

    /// Model identifier (None = provider default).
    pub model: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.into(),
            model: None,
        }
    }
}

impl ChatConfig {
    /// Override the system instruction.
    #[must_use]
    pub fn system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Override the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}
