//! HTTP implementation of the conversation backend.
//!
//! The only component aware of wire shapes and auth header construction.
//! Every failure — transport, non-success status, decode — is collapsed
//! into `NereusError::Sync`; retry and fallback policy live in the
//! session store, not here.

use async_trait::async_trait;
use nereus_core::backend::ConversationBackend;
use nereus_core::error::{NereusError, Result};
use nereus_core::session::{ChatSession, Message, RESERVED_ASSISTANT_ID, Sender};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::SyncConfig;

/// Reqwest-backed client for the remote conversation store.
///
/// Attaches `Authorization: Bearer <credential>` only when a credential
/// is present. The caller's user id is passed per call where the wire
/// contract needs it (listing sessions, classifying message records).
#[derive(Clone)]
pub struct HttpConversationBackend {
    client: Client,
    config: SyncConfig,
    credential: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionRecord {
    id: String,
    summary: String,
    #[serde(default)]
    #[allow(dead_code)]
    user_id: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    last_timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessageRecord {
    id: String,
    text: String,
    #[serde(default)]
    chat_id: Option<String>,
    user_id: String,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    rating: Option<i32>,
}

/// POST responses carry the assigned id plus a human-readable note.
#[derive(Debug, Deserialize)]
struct CreatedRecord {
    id: String,
    #[serde(default)]
    #[allow(dead_code)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateChatRequest<'a> {
    summary: &'a str,
    user_id: &'a str,
}

#[derive(Debug, Serialize)]
struct RenameChatRequest<'a> {
    summary: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateMessageRequest<'a> {
    text: &'a str,
    chat_id: &'a str,
    user_id: &'a str,
}

#[derive(Debug, Serialize)]
struct RateMessageRequest {
    rating: i32,
}

#[derive(Debug, Serialize)]
struct AnswerRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnswerResponse {
    response: String,
}

impl SessionRecord {
    fn into_session(self) -> ChatSession {
        ChatSession::new(self.id, self.summary)
    }
}

impl MessageRecord {
    fn into_message(self, caller_id: &str) -> Message {
        Message {
            id: Some(self.id),
            sender: Sender::classify(&self.user_id, caller_id),
            text: self.text,
            is_thinking: false,
            session_id: self.chat_id,
            author_id: Some(self.user_id),
            timestamp: self.timestamp,
            rating: self.rating,
        }
    }
}

impl HttpConversationBackend {
    pub fn new(config: SyncConfig, credential: Option<String>) -> Self {
        Self {
            client: Client::new(),
            config,
            credential,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Applies the per-request timeout and, when a credential is present,
    /// the bearer header.
    fn prepare(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.timeout(self.config.timeout);
        match &self.credential {
            Some(credential) => request.header("Authorization", format!("Bearer {credential}")),
            None => request,
        }
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(NereusError::sync(format!("{what} failed ({status}): {body}")));
        }
        Ok(response)
    }
}

#[async_trait]
impl ConversationBackend for HttpConversationBackend {
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<ChatSession>> {
        let response = self
            .prepare(self.client.get(self.url("/api/chat-histories")))
            .query(&[("user_id", user_id)])
            .send()
            .await
            .map_err(|e| NereusError::sync(format!("session listing failed: {e}")))?;
        let records: Vec<SessionRecord> = Self::check(response, "session listing")
            .await?
            .json()
            .await
            .map_err(|e| NereusError::sync(format!("session listing decode failed: {e}")))?;
        Ok(records.into_iter().map(SessionRecord::into_session).collect())
    }

    async fn create_session(&self, summary: &str, user_id: &str) -> Result<ChatSession> {
        let response = self
            .prepare(self.client.post(self.url("/api/chat-histories")))
            .json(&CreateChatRequest { summary, user_id })
            .send()
            .await
            .map_err(|e| NereusError::sync(format!("session create failed: {e}")))?;
        let record: CreatedRecord = Self::check(response, "session create")
            .await?
            .json()
            .await
            .map_err(|e| NereusError::sync(format!("session create decode failed: {e}")))?;
        // The create response carries only the id; the rest is what we sent.
        Ok(ChatSession::new(record.id, summary))
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let response = self
            .prepare(
                self.client
                    .delete(self.url(&format!("/api/chat-histories/{session_id}"))),
            )
            .send()
            .await
            .map_err(|e| NereusError::sync(format!("session delete failed: {e}")))?;
        Self::check(response, "session delete").await?;
        Ok(())
    }

    async fn rename_session(&self, session_id: &str, summary: &str) -> Result<()> {
        let response = self
            .prepare(
                self.client
                    .put(self.url(&format!("/api/chat-histories/{session_id}"))),
            )
            .json(&RenameChatRequest { summary })
            .send()
            .await
            .map_err(|e| NereusError::sync(format!("session rename failed: {e}")))?;
        Self::check(response, "session rename").await?;
        Ok(())
    }

    async fn list_messages(&self, session_id: &str, caller_id: &str) -> Result<Vec<Message>> {
        let response = self
            .prepare(self.client.get(self.url("/api/messages")))
            .query(&[("chat_id", session_id)])
            .send()
            .await
            .map_err(|e| NereusError::sync(format!("message listing failed: {e}")))?;
        let records: Vec<MessageRecord> = Self::check(response, "message listing")
            .await?
            .json()
            .await
            .map_err(|e| NereusError::sync(format!("message listing decode failed: {e}")))?;
        Ok(records
            .into_iter()
            .map(|record| record.into_message(caller_id))
            .collect())
    }

    async fn create_message(
        &self,
        text: &str,
        session_id: &str,
        author_id: &str,
    ) -> Result<Message> {
        let response = self
            .prepare(self.client.post(self.url("/api/messages")))
            .json(&CreateMessageRequest {
                text,
                chat_id: session_id,
                user_id: author_id,
            })
            .send()
            .await
            .map_err(|e| NereusError::sync(format!("message create failed: {e}")))?;
        let record: CreatedRecord = Self::check(response, "message create")
            .await?
            .json()
            .await
            .map_err(|e| NereusError::sync(format!("message create decode failed: {e}")))?;
        Ok(Message {
            id: Some(record.id),
            sender: if author_id == RESERVED_ASSISTANT_ID {
                Sender::Ai
            } else {
                Sender::User
            },
            text: text.to_string(),
            is_thinking: false,
            session_id: Some(session_id.to_string()),
            author_id: Some(author_id.to_string()),
            // The create response omits the server timestamp; stamp locally.
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            rating: Some(0),
        })
    }

    async fn rate_message(&self, message_id: &str, rating: i32) -> Result<()> {
        let response = self
            .prepare(
                self.client
                    .put(self.url(&format!("/api/messages/{message_id}/rating"))),
            )
            .json(&RateMessageRequest { rating })
            .send()
            .await
            .map_err(|e| NereusError::sync(format!("rating update failed: {e}")))?;
        Self::check(response, "rating update").await?;
        Ok(())
    }

    async fn fetch_answer(&self, question: &str) -> Result<String> {
        let response = self
            .prepare(self.client.post(&self.config.answer_url))
            .json(&AnswerRequest { text: question })
            .send()
            .await
            .map_err(|e| NereusError::sync(format!("answer fetch failed: {e}")))?;
        let answer: AnswerResponse = Self::check(response, "answer fetch")
            .await?
            .json()
            .await
            .map_err(|e| NereusError::sync(format!("answer decode failed: {e}")))?;
        Ok(answer.response)
    }
}
