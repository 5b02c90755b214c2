//! Conversation backend trait.
//!
//! Defines the typed boundary to the remote conversation store. The HTTP
//! implementation lives in `nereus-sync`; tests substitute in-memory mocks.

use crate::error::Result;
use crate::session::{ChatSession, Message};
use async_trait::async_trait;

/// An abstract boundary to the remote conversation store.
///
/// Implementations convert wire records to local entity shape and collapse
/// every failure (transport, non-success status, decode) into
/// [`NereusError::Sync`](crate::NereusError::Sync) — callers only observe
/// success or failure. No retries happen at this layer; retry/fallback
/// policy belongs to the session store.
#[async_trait]
pub trait ConversationBackend: Send + Sync {
    /// Lists the caller's sessions, most recent first. Message lists come
    /// back empty; they are loaded lazily per session.
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>>;

    /// Creates a session and returns the server-confirmed record.
    async fn create_session(&self, summary: &str, user_id: &str) -> Result<ChatSession>;

    /// Deletes a session (and, server-side, its messages).
    async fn delete_session(&self, session_id: &str) -> Result<()>;

    /// Updates a session's summary/title.
    async fn rename_session(&self, session_id: &str, summary: &str) -> Result<()>;

    /// Lists a session's messages in timestamp order, classified against
    /// `caller_id` (see [`Sender::classify`](crate::session::Sender::classify)).
    async fn list_messages(&self, session_id: &str, caller_id: &str) -> Result<Vec<Message>>;

    /// Persists one message and returns the server-confirmed record.
    async fn create_message(
        &self,
        text: &str,
        session_id: &str,
        author_id: &str,
    ) -> Result<Message>;

    /// Updates a persisted message's rating (-1, 0, or 1).
    async fn rate_message(&self, message_id: &str, rating: i32) -> Result<()>;

    /// Asks the assistant-answer endpoint for a completed reply.
    async fn fetch_answer(&self, question: &str) -> Result<String>;
}
