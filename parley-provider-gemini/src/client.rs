//! Gemini API client struct, builder, and chat handle.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use parley_provider::{Chat, ChatConfig, FragmentMode, FragmentStream, Provider, ProviderError};

use crate::error::{map_http_status, map_reqwest_error};
use crate::streaming::stream_reply;
use crate::types::{Content, GenerateContentRequest};

/// Default model used when the chat config does not name one.
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default Gemini API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Environment variables checked for the API key, in order.
const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Client for the Gemini `streamGenerateContent` API.
///
/// Implements [`Provider`]; every [`GeminiChat`] it opens keeps its own
/// conversation history.
///
/// # Example
///
/// ```no_run
/// use parley_provider_gemini::Gemini;
///
/// let client = Gemini::new("AIza...")
///     .model("gemini-2.5-pro")
///     .base_url("https://generativelanguage.googleapis.com");
/// ```
pub struct Gemini {
    /// Gemini API key.
    pub(crate) api_key: String,
    /// Default model identifier used when the chat config does not specify one.
    pub(crate) model: String,
    /// API base URL (override for testing or proxies).
    pub(crate) base_url: String,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

impl Gemini {
    /// Create a new client with the given API key and sensible defaults.
    ///
    /// Default model: `gemini-2.5-flash`.
    /// Default base URL: `https://generativelanguage.googleapis.com`.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a client keyed from `GEMINI_API_KEY`, falling back to `API_KEY`.
    ///
    /// A missing key is not an error here: the client is built with an
    /// empty key and [`Provider::start_chat`] refuses to open a chat.
    #[must_use]
    pub fn from_env() -> Self {
        let api_key = key_from(|name| std::env::var(name).ok());
        if api_key.is_empty() {
            tracing::warn!(vars = ?API_KEY_VARS, "no Gemini API key in environment");
        }
        Self::new(api_key)
    }

    /// Override the default model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL.
    ///
    /// Useful for testing with a local mock server or an API proxy.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Build the streaming endpoint URL for a model.
    pub(crate) fn stream_url(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{model}:streamGenerateContent?alt=sse",
            self.base_url.trim_end_matches('/')
        )
    }
}

/// First non-blank value among [`API_KEY_VARS`].
fn key_from(lookup: impl Fn(&str) -> Option<String>) -> String {
    API_KEY_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
        .unwrap_or_default()
}

impl Provider for Gemini {
    type Chat = GeminiChat;

    /// Open a chat. Fails if no API key is configured.
    fn start_chat(&self, config: &ChatConfig) -> Result<GeminiChat, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(format!(
                "missing Gemini API key (set {} or {})",
                API_KEY_VARS[0], API_KEY_VARS[1]
            )));
        }
        let model = config.model.as_deref().unwrap_or(&self.model);
        let system_instruction = (!config.system_instruction.trim().is_empty())
            .then(|| Content::text(None, config.system_instruction.clone()));

        tracing::debug!(model = %model, "gemini chat started");

        Ok(GeminiChat {
            url: self.stream_url(model),
            api_key: self.api_key.clone(),
            client: self.client.clone(),
            system_instruction,
            history: Arc::new(Mutex::new(Vec::new())),
        })
    }
}

/// A multi-turn Gemini conversation.
///
/// Every turn sends the whole history plus the new user message. A turn
/// is added to the history only after its reply streamed to the end.
pub struct GeminiChat {
    url: String,
    api_key: String,
    client: reqwest::Client,
    system_instruction: Option<Content>,
    history: Arc<Mutex<Vec<Content>>>,
}

impl GeminiChat {
    /// Number of messages (user and model) retained as context.
    pub fn history_len(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Chat for GeminiChat {
    fn fragment_mode(&self) -> FragmentMode {
        FragmentMode::Incremental
    }

    /// Send one user turn to `streamGenerateContent` and stream the reply.
    fn send_message_stream(
        &self,
        message: String,
    ) -> impl Future<Output = Result<FragmentStream, ProviderError>> + Send {
        let url = self.url.clone();
        let api_key = self.api_key.clone();
        let http_client = self.client.clone();
        let history = Arc::clone(&self.history);
        let system_instruction = self.system_instruction.clone();

        async move {
            let user_turn = Content::user(message);
            let mut contents = history
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            contents.push(user_turn.clone());
            let body = GenerateContentRequest {
                contents,
                system_instruction,
            };

            tracing::debug!(url = %url, turns = body.contents.len(), "sending streaming request");

            let response = http_client
                .post(&url)
                .header("x-goog-api-key", &api_key)
                .header("content-type", "application/json")
                .json(&body)
                .send()
                .await
                .map_err(map_reqwest_error)?;

            let status = response.status();
            if !status.is_success() {
                let body_text = response.text().await.map_err(map_reqwest_error)?;
                tracing::debug!(status = %status, "gemini rejected request");
                return Err(map_http_status(status, &body_text));
            }

            Ok(stream_reply(response, move |reply| {
                let mut history = history.lock().unwrap_or_else(PoisonError::into_inner);
                history.push(user_turn);
                history.push(Content::model(reply));
            }))
        }
    }
}
