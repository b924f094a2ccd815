//! Fragment streams and accumulation.

use crate::provider::ProviderError;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

/// How successive fragments of one reply relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentMode {
    /// Every fragment is the whole reply so far.
    Cumulative,
    /// Every fragment is only the new text since the previous one.
    Incremental,
}

/// A lazy, finite stream of reply fragments.
///
/// An `Err` item ends the reply; nothing after it is read.
pub struct FragmentStream {
    /// The fragments. Consume with `StreamExt::next()`.
    pub receiver: Pin<Box<dyn Stream<Item = Result<String, ProviderError>> + Send>>,
}

impl FragmentStream {
    /// Wrap any fragment stream.
    pub fn new(stream: impl Stream<Item = Result<String, ProviderError>> + Send + 'static) -> Self {
        Self {
            receiver: Box::pin(stream),
        }
    }
}

impl std::fmt::Debug for FragmentStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FragmentStream").finish_non_exhaustive()
    }
}

/// Turns fragments into the cumulative reply text.
///
/// Cumulative fragments replace the text; incremental fragments are
/// appended. Either way [`Accumulator::push`] hands back the whole reply so
/// far.
#[derive(Debug, Clone)]
pub struct Accumulator {
    mode: FragmentMode,
    text: String,
}

impl Accumulator {
    /// Start an empty reply.
    pub fn new(mode: FragmentMode) -> Self {
        Self {
            mode,
            text: String::new(),
        }
    }

    /// Apply one fragment.
    ///
    /// Returns the cumulative text, or `None` for an empty incremental
    /// fragment, which carries no new text.
    pub fn push(&mut self, fragment: &str) -> Option<&str> {
        match self.mode {
            FragmentMode::Cumulative => {
                self.text.clear();
                self.text.push_str(fragment);
            }
            FragmentMode::Incremental => {
                if fragment.is_empty() {
                    return None;
                }
                self.text.push_str(fragment);
            }
        }
        Some(&self.text)
    }

    /// The reply so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Finish and take the reply.
    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn cumulative_fragments_replace() {
        let mut acc = Accumulator::new(FragmentMode::Cumulative);
        let seen: Vec<String> = ["H", "He", "Hel"]
            .into_iter()
            .filter_map(|f| acc.push(f).map(str::to_owned))
            .collect();
        assert_eq!(seen, ["H", "He", "Hel"]);
        assert_eq!(acc.into_text(), "Hel");
    }

    #[test]
    fn incremental_fragments_append() {
        let mut acc = Accumulator::new(FragmentMode::Incremental);
        let seen: Vec<String> = ["H", "e", "l"]
            .into_iter()
            .filter_map(|f| acc.push(f).map(str::to_owned))
            .collect();
        assert_eq!(seen, ["H", "He", "Hel"]);
        assert_eq!(acc.text(), "Hel");
    }

    #[test]
    fn empty_incremental_fragment_is_skipped() {
        let mut acc = Accumulator::new(FragmentMode::Incremental);
        assert_eq!(acc.push("Hi"), Some("Hi"));
        assert_eq!(acc.push(""), None);
        assert_eq!(acc.text(), "Hi");
    }

    #[test]
    fn empty_cumulative_fragment_clears() {
        let mut acc = Accumulator::new(FragmentMode::Cumulative);
        acc.push("draft");
        assert_eq!(acc.push(""), Some(""));
    }

    #[test]
    fn fragment_mode_serde() {
        assert_eq!(
            serde_json::to_string(&FragmentMode::Incremental).unwrap(),
            "\"incremental\""
        );
    }

    #[tokio::test]
    async fn fragment_stream_wraps_any_stream() {
        let stream = FragmentStream::new(futures::stream::iter(vec![
            Ok("a".to_string()),
            Err(ProviderError::RateLimited),
        ]));
        let items: Vec<_> = stream.receiver.collect().await;
        assert_eq!(items.len(), 2);
        assert!(matches!(items[1], Err(ProviderError::RateLimited)));
    }
}
