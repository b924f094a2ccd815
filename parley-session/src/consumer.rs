//! Stream consumer: one request/response exchange at a time.

use crate::error::SessionError;
use futures::StreamExt;
use parley_provider::{Accumulator, Chat, ChatConfig, Provider, ProviderError};

/// Drives exchanges with a [`Chat`] and relays cumulative reply text.
///
/// Generic over `C: Chat` (not object-safe). A consumer built without a
/// chat handle fails every exchange with
/// [`SessionError::UninitializedSession`] before touching the network.
pub struct StreamConsumer<C: Chat> {
    chat: Option<C>,
}

impl<C: Chat> StreamConsumer<C> {
    /// A consumer around an open chat.
    pub fn new(chat: C) -> Self {
        Self { chat: Some(chat) }
    }

    /// A consumer with no chat. Every exchange fails.
    pub fn uninitialized() -> Self {
        Self { chat: None }
    }

    /// Open a chat on `provider`; fall back to an uninitialized consumer.
    ///
    /// Returns the provider's refusal alongside so the caller can surface it.
    pub fn connect<P>(provider: &P, config: &ChatConfig) -> (Self, Option<ProviderError>)
    where
        P: Provider<Chat = C>,
    {
        match provider.start_chat(config) {
            Ok(chat) => (Self::new(chat), None),
            Err(e) => {
                tracing::warn!(error = %e, "chat initialization failed");
                (Self::uninitialized(), Some(e))
            }
        }
    }

    /// Whether a chat handle is present.
    pub fn is_initialized(&self) -> bool {
        self.chat.is_some()
    }

    /// The chat handle, if any.
    pub fn chat(&self) -> Option<&C> {
        self.chat.as_ref()
    }

    /// Send `prompt` as the next turn and stream the reply.
    ///
    /// `on_fragment` is called synchronously with the cumulative reply text
    /// once per fragment, in arrival order. An error from `on_fragment`
    /// abandons the stream and is returned as is. Returns the final text.
    /// On any failure no partial result is returned; undoing whatever
    /// `on_fragment` did is up to the caller.
    pub async fn send_and_stream<F>(
        &self,
        prompt: &str,
        mut on_fragment: F,
    ) -> Result<String, SessionError>
    where
        F: FnMut(&str) -> Result<(), SessionError>,
    {
        let chat = self.chat.as_ref().ok_or(SessionError::UninitializedSession)?;

        let mut stream = chat
            .send_message_stream(prompt.to_string())
            .await
            .map_err(SessionError::GenerationFailed)?;

        let mut acc = Accumulator::new(chat.fragment_mode());
        let mut fragments = 0usize;
        while let Some(item) = stream.receiver.next().await {
            let fragment = item.map_err(|e| {
                tracing::debug!(error = %e, fragments, "stream failed");
                SessionError::GenerationFailed(e)
            })?;
            fragments += 1;
            if let Some(text) = acc.push(&fragment) {
                if let Err(e) = on_fragment(text) {
                    tracing::debug!(error = %e, fragments, "stream abandoned");
                    return Err(e);
                }
            }
        }

        tracing::debug!(fragments, "stream finished");
        Ok(acc.into_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_provider::test_utils::{ScriptedChat, ScriptedProvider};
    use parley_transcript::{MessageId, TranscriptError};

    fn connect(provider: &ScriptedProvider) -> StreamConsumer<ScriptedChat> {
        let (consumer, err) = StreamConsumer::connect(provider, &ChatConfig::default());
        assert!(err.is_none());
        consumer
    }

    #[tokio::test]
    async fn cumulative_fragments_reported_in_order() {
        let provider = ScriptedProvider::cumulative().reply(["H", "He", "Hel"]);
        let consumer = connect(&provider);

        let mut seen = Vec::new();
        let text = consumer
            .send_and_stream("hi", |t| {
                seen.push(t.to_string());
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(seen, ["H", "He", "Hel"]);
        assert_eq!(text, "Hel");
        assert_eq!(provider.prompts(), ["hi"]);
    }

    #[tokio::test]
    async fn incremental_fragments_are_accumulated() {
        let provider = ScriptedProvider::incremental().reply(["H", "", "e", "l"]);
        let consumer = connect(&provider);

        let mut seen = Vec::new();
        let text = consumer
            .send_and_stream("hi", |t| {
                seen.push(t.to_string());
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(seen, ["H", "He", "Hel"]);
        assert_eq!(text, "Hel");
    }

    #[tokio::test]
    async fn uninitialized_fails_before_network() {
        let provider = ScriptedProvider::failing_start("no key").reply(["never"]);
        let (consumer, err) = StreamConsumer::connect(&provider, &ChatConfig::default());
        assert!(matches!(err, Some(ProviderError::NotConfigured(_))));
        assert!(!consumer.is_initialized());

        let mut called = false;
        let result = consumer
            .send_and_stream("hi", |_| {
                called = true;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(SessionError::UninitializedSession)));
        assert!(!called);
        assert!(provider.prompts().is_empty());
        assert_eq!(provider.remaining(), 1);
    }

    #[tokio::test]
    async fn mid_stream_failure_returns_no_partial_text() {
        let provider = ScriptedProvider::cumulative().fail_mid_stream(["H", "He"], "reset");
        let consumer = connect(&provider);

        let mut seen = Vec::new();
        let result = consumer
            .send_and_stream("hi", |t| {
                seen.push(t.to_string());
                Ok(())
            })
            .await;

        assert!(matches!(
            result,
            Err(SessionError::GenerationFailed(ProviderError::RequestFailed(_)))
        ));
        assert_eq!(seen, ["H", "He"]);
    }

    #[tokio::test]
    async fn rejected_request_is_generation_failure() {
        let provider = ScriptedProvider::cumulative().reject("503");
        let consumer = connect(&provider);

        let result = consumer.send_and_stream("hi", |_| Ok(())).await;
        assert!(matches!(result, Err(SessionError::GenerationFailed(_))));
    }

    #[tokio::test]
    async fn fragment_callback_error_abandons_exchange() {
        let provider = ScriptedProvider::cumulative().reply(["H", "He", "Hel"]);
        let consumer = connect(&provider);

        let mut seen = Vec::new();
        let result = consumer
            .send_and_stream("hi", |t| {
                seen.push(t.to_string());
                if seen.len() == 2 {
                    return Err(TranscriptError::Frozen(MessageId::new("reply")).into());
                }
                Ok(())
            })
            .await;

        assert!(matches!(
            result,
            Err(SessionError::Transcript(TranscriptError::Frozen(_)))
        ));
        assert_eq!(seen, ["H", "He"]);
        assert!(provider.history().is_empty(), "abandoned turn is not committed");
    }
}
