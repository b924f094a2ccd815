//! ScriptedProvider: replays canned fragment sequences, one per turn.

use crate::config::ChatConfig;
use crate::fragment::{FragmentMode, FragmentStream};
use crate::provider::{Chat, Provider, ProviderError};
use futures::StreamExt;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What a scripted chat does for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedTurn {
    /// Stream these fragments, then complete.
    Reply(Vec<String>),
    /// Stream these fragments, then fail with the message.
    FailMidStream {
        /// Fragments delivered before the failure.
        fragments: Vec<String>,
        /// Error message of the failure.
        error: String,
    },
    /// Refuse the request before any fragment.
    Reject(String),
}

#[derive(Debug, Default)]
struct Script {
    turns: VecDeque<ScriptedTurn>,
    prompts: Vec<String>,
    configs: Vec<ChatConfig>,
    history: Vec<(String, String)>,
}

fn lock(script: &Mutex<Script>) -> MutexGuard<'_, Script> {
    script.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A provider whose chats replay scripted turns in order.
///
/// All chats opened from one provider share the script and the record of
/// prompts, so a test can keep the provider and inspect it afterwards.
#[derive(Debug, Clone)]
pub struct ScriptedProvider {
    mode: FragmentMode,
    start_error: Option<String>,
    script: Arc<Mutex<Script>>,
}

impl ScriptedProvider {
    /// An empty script whose fragments follow `mode`.
    pub fn new(mode: FragmentMode) -> Self {
        Self {
            mode,
            start_error: None,
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    /// An empty script of cumulative fragments.
    pub fn cumulative() -> Self {
        Self::new(FragmentMode::Cumulative)
    }

    /// An empty script of incremental fragments.
    pub fn incremental() -> Self {
        Self::new(FragmentMode::Incremental)
    }

    /// A provider that refuses to open any chat.
    pub fn failing_start(reason: impl Into<String>) -> Self {
        let mut provider = Self::cumulative();
        provider.start_error = Some(reason.into());
        provider
    }

    /// Queue a turn.
    #[must_use]
    pub fn turn(self, turn: ScriptedTurn) -> Self {
        lock(&self.script).turns.push_back(turn);
        self
    }

    /// Queue a turn that streams `fragments` and completes.
    #[must_use]
    pub fn reply<I, S>(self, fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.turn(ScriptedTurn::Reply(
            fragments.into_iter().map(Into::into).collect(),
        ))
    }

    /// Queue a turn that streams `fragments` and then fails.
    #[must_use]
    pub fn fail_mid_stream<I, S>(self, fragments: I, error: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.turn(ScriptedTurn::FailMidStream {
            fragments: fragments.into_iter().map(Into::into).collect(),
            error: error.into(),
        })
    }

    /// Queue a turn that is refused outright.
    #[must_use]
    pub fn reject(self, error: impl Into<String>) -> Self {
        self.turn(ScriptedTurn::Reject(error.into()))
    }

    /// Every prompt sent so far, in order.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.script).prompts.clone()
    }

    /// Every configuration a chat was opened with.
    pub fn configs(&self) -> Vec<ChatConfig> {
        lock(&self.script).configs.clone()
    }

    /// Completed (prompt, reply) turns retained as context.
    pub fn history(&self) -> Vec<(String, String)> {
        lock(&self.script).history.clone()
    }

    /// Turns still queued.
    pub fn remaining(&self) -> usize {
        lock(&self.script).turns.len()
    }
}

impl Provider for ScriptedProvider {
    type Chat = ScriptedChat;

    fn start_chat(&self, config: &ChatConfig) -> Result<ScriptedChat, ProviderError> {
        if let Some(reason) = &self.start_error {
            return Err(ProviderError::NotConfigured(reason.clone()));
        }
        lock(&self.script).configs.push(config.clone());
        Ok(ScriptedChat {
            mode: self.mode,
            script: Arc::clone(&self.script),
        })
    }
}

/// A chat opened from a [`ScriptedProvider`].
#[derive(Debug, Clone)]
pub struct ScriptedChat {
    mode: FragmentMode,
    script: Arc<Mutex<Script>>,
}

impl ScriptedChat {
    fn reply_text(&self, fragments: &[String]) -> String {
        match self.mode {
            FragmentMode::Cumulative => fragments.last().cloned().unwrap_or_default(),
            FragmentMode::Incremental => fragments.concat(),
        }
    }
}

impl Chat for ScriptedChat {
    fn fragment_mode(&self) -> FragmentMode {
        self.mode
    }

    fn send_message_stream(
        &self,
        message: String,
    ) -> impl Future<Output = Result<FragmentStream, ProviderError>> + Send {
        let result = {
            let mut script = lock(&self.script);
            script.prompts.push(message.clone());
            match script.turns.pop_front() {
                None => Err(ProviderError::RequestFailed(
                    "ScriptedProvider: no more turns queued".into(),
                )),
                Some(ScriptedTurn::Reject(error)) => Err(ProviderError::RequestFailed(error)),
                Some(ScriptedTurn::Reply(fragments)) => {
                    // The turn joins the history only once the stream is drained.
                    let reply = self.reply_text(&fragments);
                    let shared = Arc::clone(&self.script);
                    let commit = futures::stream::once(async move {
                        lock(&shared).history.push((message, reply));
                        None::<Result<String, ProviderError>>
                    })
                    .filter_map(futures::future::ready);
                    Ok(FragmentStream::new(
                        futures::stream::iter(fragments.into_iter().map(Ok)).chain(commit),
                    ))
                }
                Some(ScriptedTurn::FailMidStream { fragments, error }) => {
                    let items = fragments
                        .into_iter()
                        .map(Ok)
                        .chain(std::iter::once(Err(ProviderError::RequestFailed(error))));
                    Ok(FragmentStream::new(futures::stream::iter(items)))
                }
            }
        };
        async move { result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    async fn collect(chat: &ScriptedChat, prompt: &str) -> Result<Vec<String>, ProviderError> {
        let stream = chat.send_message_stream(prompt.to_string()).await?;
        stream.receiver.collect::<Vec<_>>().await.into_iter().collect()
    }

    #[tokio::test]
    async fn replays_turns_in_order() {
        let provider = ScriptedProvider::cumulative()
            .reply(["H", "Hi"])
            .reply(["Y", "Yo"]);
        let chat = provider.start_chat(&ChatConfig::default()).unwrap();

        assert_eq!(collect(&chat, "one").await.unwrap(), ["H", "Hi"]);
        assert_eq!(collect(&chat, "two").await.unwrap(), ["Y", "Yo"]);
        assert_eq!(provider.prompts(), ["one", "two"]);
        assert_eq!(
            provider.history(),
            [
                ("one".to_string(), "Hi".to_string()),
                ("two".to_string(), "Yo".to_string())
            ]
        );
        assert_eq!(provider.remaining(), 0);
    }

    #[tokio::test]
    async fn mid_stream_failure_ends_with_error() {
        let provider = ScriptedProvider::incremental().fail_mid_stream(["a", "b"], "reset");
        let chat = provider.start_chat(&ChatConfig::default()).unwrap();

        let stream = chat.send_message_stream("x".into()).await.unwrap();
        let items: Vec<_> = stream.receiver.collect().await;
        assert_eq!(items.len(), 3);
        assert!(matches!(&items[2], Err(ProviderError::RequestFailed(m)) if m == "reset"));
        assert!(provider.history().is_empty());
    }

    #[tokio::test]
    async fn empty_script_fails_request() {
        let provider = ScriptedProvider::cumulative();
        let chat = provider.start_chat(&ChatConfig::default()).unwrap();
        assert!(chat.send_message_stream("x".into()).await.is_err());
    }

    #[test]
    fn failing_start_refuses_chat() {
        let provider = ScriptedProvider::failing_start("no key");
        let err = provider.start_chat(&ChatConfig::default()).unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
        assert!(provider.configs().is_empty());
    }
}
