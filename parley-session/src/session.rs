//! The session controller.

use crate::config::SessionConfig;
use crate::consumer::StreamConsumer;
use crate::error::SessionError;
use crate::observer::{SessionObserver, SessionView};
use parley_provider::{Chat, Provider};
use parley_transcript::{Message, MessageId, Role, Transcript, TranscriptStore};
use std::sync::Arc;

/// A submission whose user message and placeholder are already in the
/// transcript, waiting for its reply to be streamed.
///
/// Not `Clone`: a turn is completed at most once.
#[must_use = "a pending turn leaves the session loading until completed"]
#[derive(Debug, PartialEq, Eq)]
pub struct PendingTurn {
    prompt: String,
    user_id: MessageId,
    reply_id: MessageId,
}

impl PendingTurn {
    /// The submitted text.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Id of the optimistic user message.
    pub fn user_id(&self) -> &MessageId {
        &self.user_id
    }

    /// Id of the assistant placeholder.
    pub fn reply_id(&self) -> &MessageId {
        &self.reply_id
    }
}

/// One conversation: transcript, loading flag, error text, chat handle.
///
/// All mutation goes through `&mut self`, so there is a single writer.
/// At most one reply is in flight; submissions while loading are ignored.
pub struct Session<C: Chat> {
    config: SessionConfig,
    consumer: StreamConsumer<C>,
    store: TranscriptStore,
    /// Placeholder id of the reply in flight.
    pending: Option<MessageId>,
    error: Option<String>,
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl<C: Chat> Session<C> {
    /// Open a chat on `provider` and set up the session.
    ///
    /// If the provider refuses, the session starts uninitialized: the
    /// transcript stays empty, the configuration error is shown, and every
    /// submission is rejected.
    pub fn start<P>(provider: &P, config: SessionConfig) -> Self
    where
        P: Provider<Chat = C>,
    {
        let (consumer, failure) = StreamConsumer::connect(provider, &config.chat);
        let mut session = Self {
            consumer,
            store: TranscriptStore::new(),
            pending: None,
            error: None,
            observers: Vec::new(),
            config,
        };

        if failure.is_some() {
            session.error = Some(session.config.init_error_message.clone());
        } else if let Some(greeting) = session.config.greeting.clone() {
            let message = Message::assistant(greeting).with_id(session.config.greeting_id.clone());
            if let Err(e) = session.store.append(message) {
                tracing::warn!(error = %e, "greeting not added");
            }
        }
        session
    }

    /// Register an observer. It is called after every later change.
    pub fn observe(&mut self, observer: impl SessionObserver + 'static) {
        self.observers.push(Arc::new(observer));
    }

    /// The current state, as the presentation layer renders it.
    pub fn view(&self) -> SessionView {
        view_of(
            &self.store,
            self.is_loading(),
            &self.error,
            self.consumer.is_initialized(),
        )
    }

    /// The current transcript snapshot.
    pub fn transcript(&self) -> Transcript {
        self.store.snapshot()
    }

    /// Whether a reply is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Error text currently shown, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the backend accepted its configuration.
    pub fn is_initialized(&self) -> bool {
        self.consumer.is_initialized()
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The chat handle, if the session is initialized.
    pub fn chat(&self) -> Option<&C> {
        self.consumer.chat()
    }

    /// Submit `text` and stream the reply to the end.
    ///
    /// `Ok(None)` when the submission was ignored (blank text, or a reply
    /// already in flight).
    pub async fn submit(&mut self, text: &str) -> Result<Option<String>, SessionError> {
        match self.begin_submit(text)? {
            Some(turn) => self.complete_turn(turn).await.map(Some),
            None => Ok(None),
        }
    }

    /// The local, optimistic half of a submission.
    ///
    /// Appends the user message and an empty streaming assistant
    /// placeholder, clears any shown error, and marks the session loading.
    /// Nothing is sent yet. Rejected with [`SessionError::UninitializedSession`]
    /// (and no side effects) on an uninitialized session; ignored
    /// (`Ok(None)`) when `text` is blank or a reply is in flight.
    pub fn begin_submit(&mut self, text: &str) -> Result<Option<PendingTurn>, SessionError> {
        if !self.consumer.is_initialized() {
            return Err(SessionError::UninitializedSession);
        }
        if self.is_loading() {
            tracing::debug!("submission ignored: reply in flight");
            return Ok(None);
        }
        if text.trim().is_empty() {
            return Ok(None);
        }

        let user = Message::user(text);
        let turn = PendingTurn {
            prompt: text.to_string(),
            user_id: user.id.clone(),
            reply_id: MessageId::generate(),
        };
        self.store.append(user)?;
        self.store
            .append_placeholder(turn.reply_id.clone(), Role::Assistant)?;
        self.error = None;
        self.pending = Some(turn.reply_id.clone());
        self.notify();
        Ok(Some(turn))
    }

    /// The network half of a submission.
    ///
    /// Streams the reply into the placeholder. On success the placeholder
    /// is finalized and the reply text returned. On failure the
    /// placeholder is removed, the generation error is shown, and the
    /// error returned. Either way the session stops loading.
    ///
    /// A turn that is not the one in flight is rejected with
    /// [`SessionError::TurnNotInFlight`] and changes nothing.
    pub async fn complete_turn(&mut self, turn: PendingTurn) -> Result<String, SessionError> {
        if self.pending.as_ref() != Some(&turn.reply_id) {
            tracing::warn!(id = %turn.reply_id, "turn not in flight");
            return Err(SessionError::TurnNotInFlight(turn.reply_id));
        }

        let initialized = self.consumer.is_initialized();
        let Self {
            consumer,
            store,
            error,
            observers,
            ..
        } = self;

        let result = consumer
            .send_and_stream(&turn.prompt, |text| {
                store.update_content(&turn.reply_id, text)?;
                let view = view_of(store, true, error, initialized);
                for observer in observers.iter() {
                    observer.on_change(&view);
                }
                Ok(())
            })
            .await;

        let outcome = match result {
            Ok(text) => {
                tracing::info!(id = %turn.reply_id, chars = text.len(), "reply complete");
                self.store
                    .finalize(&turn.reply_id)
                    .map(|()| text)
                    .map_err(SessionError::from)
            }
            Err(e) => {
                tracing::warn!(id = %turn.reply_id, error = %e, "reply failed");
                if let Err(remove_err) = self.store.remove(&turn.reply_id) {
                    tracing::warn!(error = %remove_err, "placeholder already gone");
                }
                self.error = Some(self.config.generation_error_message.clone());
                Err(e)
            }
        };

        self.pending = None;
        self.notify();
        outcome
    }

    /// Hide a generation error. The configuration error cannot be dismissed.
    pub fn dismiss_error(&mut self) {
        if self.consumer.is_initialized() && self.error.take().is_some() {
            self.notify();
        }
    }

    fn notify(&self) {
        if self.observers.is_empty() {
            return;
        }
        let view = self.view();
        for observer in &self.observers {
            observer.on_change(&view);
        }
    }
}

fn view_of(
    store: &TranscriptStore,
    is_loading: bool,
    error: &Option<String>,
    initialized: bool,
) -> SessionView {
    SessionView {
        messages: store.snapshot(),
        is_loading,
        error: error.clone(),
        initialized,
    }
}
