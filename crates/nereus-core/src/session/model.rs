//! Session domain model.

use super::message::Message;
use serde::{Deserialize, Serialize};

/// Maximum length of a session title/summary; longer text is truncated
/// with a trailing ellipsis, mirroring what the remote store does when it
/// derives summaries from message text.
pub const SUMMARY_LIMIT: usize = 100;

/// One conversation thread: an id, a display title, and an ordered,
/// append-only message list.
///
/// During normal operation the only in-place mutation is the last
/// message's `text`/`is_thinking` while a reveal is running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Session identifier. A locally generated UUID until the remote
    /// store confirms the create and the server id is spliced in.
    pub id: String,
    /// Human-readable session title.
    pub title: String,
    /// Ordered message history. Empty until lazily loaded on selection.
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ChatSession {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            messages: Vec::new(),
        }
    }
}

/// Truncates `text` to [`SUMMARY_LIMIT`] characters, appending `...` when
/// anything was cut.
pub fn summarize(text: &str) -> String {
    let mut summary: String = text.chars().take(SUMMARY_LIMIT).collect();
    if text.chars().count() > SUMMARY_LIMIT {
        summary.push_str("...");
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_passes_short_text_through() {
        assert_eq!(summarize("hello"), "hello");
    }

    #[test]
    fn summarize_truncates_long_text() {
        let long = "x".repeat(150);
        let summary = summarize(&long);
        assert_eq!(summary.chars().count(), SUMMARY_LIMIT + 3);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn summarize_counts_chars_not_bytes() {
        let long = "é".repeat(SUMMARY_LIMIT);
        assert_eq!(summarize(&long), long);
    }
}
