//! What the presentation layer sees, and how it hears about changes.

use parley_transcript::Transcript;

/// Everything a renderer needs, as one immutable value.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    /// Messages in display order.
    pub messages: Transcript,
    /// A reply is in flight; new submissions are ignored.
    pub is_loading: bool,
    /// Error text to show, if any.
    pub error: Option<String>,
    /// The backend accepted its configuration. When false, input is disabled.
    pub initialized: bool,
}

impl SessionView {
    /// Whether the input box should accept text.
    pub fn input_enabled(&self) -> bool {
        self.initialized && !self.is_loading
    }
}

/// Called synchronously after every change to a [`Session`](crate::Session).
///
/// Observers run on the writer's turn of control, so every intermediate
/// state (each streamed fragment included) is seen exactly once.
pub trait SessionObserver: Send + Sync {
    /// The session changed; `view` is the new state.
    fn on_change(&self, view: &SessionView);
}

impl<F> SessionObserver for F
where
    F: Fn(&SessionView) + Send + Sync,
{
    fn on_change(&self, view: &SessionView) {
        self(view)
    }
}
