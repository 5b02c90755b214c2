//! Conversation message types.

use serde::{Deserialize, Serialize};

/// Author id the remote store reserves for assistant-authored messages.
pub const RESERVED_ASSISTANT_ID: &str = "-1";

/// Who a message is attributed to, as seen by the caller.
///
/// This is derived, not stored verbatim: any remote record not authored by
/// the caller themselves renders on the assistant side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// Message typed by the caller.
    User,
    /// Assistant reply, or any remote-authored record that is not the caller's.
    Ai,
}

impl Sender {
    /// Classifies a remote record's author id relative to the caller.
    ///
    /// The reserved assistant id is `Ai`; the caller's own id is `User`;
    /// every other author id is also `Ai` (remote-authored, non-caller).
    pub fn classify(author_id: &str, caller_id: &str) -> Self {
        if author_id == RESERVED_ASSISTANT_ID {
            Sender::Ai
        } else if author_id == caller_id {
            Sender::User
        } else {
            Sender::Ai
        }
    }
}

/// A single message in a conversation.
///
/// Server-assigned fields (`id`, `timestamp`) are absent on optimistic
/// local appends and reconciled in place after a successful create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned message id, once persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Which side of the conversation the message belongs to.
    pub sender: Sender,
    /// Message text. Mutated in place during a reveal.
    pub text: String,
    /// Placeholder flag while an answer is still being fetched.
    #[serde(default)]
    pub is_thinking: bool,
    /// Owning session id, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Remote author id, when loaded from the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    /// Server-assigned timestamp (RFC 3339), once persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Caller feedback: -1, 0, or 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
}

impl Message {
    /// A caller-authored message.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: None,
            sender: Sender::User,
            text: text.into(),
            is_thinking: false,
            session_id: None,
            author_id: None,
            timestamp: None,
            rating: None,
        }
    }

    /// An assistant-authored message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            id: None,
            sender: Sender::Ai,
            text: text.into(),
            is_thinking: false,
            session_id: None,
            author_id: Some(RESERVED_ASSISTANT_ID.to_string()),
            timestamp: None,
            rating: None,
        }
    }

    /// The transient placeholder shown while an answer is being fetched.
    /// Never persisted.
    pub fn thinking() -> Self {
        Self {
            is_thinking: true,
            ..Self::assistant("")
        }
    }
}

/// Partial update merged into the last message of the selected session.
///
/// Used by the reveal loop and by server-id reconciliation; `None` fields
/// are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePatch {
    pub id: Option<String>,
    pub text: Option<String>,
    pub is_thinking: Option<bool>,
    pub timestamp: Option<String>,
}

impl MessagePatch {
    /// Merges the set fields into `message`, leaving the rest untouched.
    pub fn apply(self, message: &mut Message) {
        if let Some(id) = self.id {
            message.id = Some(id);
        }
        if let Some(text) = self.text {
            message.text = text;
        }
        if let Some(is_thinking) = self.is_thinking {
            message.is_thinking = is_thinking;
        }
        if let Some(timestamp) = self.timestamp {
            message.timestamp = Some(timestamp);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_reserved_id_as_ai() {
        assert_eq!(Sender::classify("-1", "alice"), Sender::Ai);
    }

    #[test]
    fn classify_caller_id_as_user() {
        assert_eq!(Sender::classify("alice", "alice"), Sender::User);
    }

    #[test]
    fn classify_foreign_id_as_ai() {
        assert_eq!(Sender::classify("bob", "alice"), Sender::Ai);
    }

    #[test]
    fn patch_merges_only_set_fields() {
        let mut message = Message::thinking();
        MessagePatch {
            text: Some("Hel".to_string()),
            is_thinking: Some(false),
            ..Default::default()
        }
        .apply(&mut message);

        assert_eq!(message.text, "Hel");
        assert!(!message.is_thinking);
        assert_eq!(message.id, None);
        assert_eq!(message.sender, Sender::Ai);
    }
}
