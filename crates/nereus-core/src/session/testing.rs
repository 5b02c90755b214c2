//! In-memory [`ConversationBackend`] mock shared by the store and
//! streamer tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::message::{Message, RESERVED_ASSISTANT_ID, Sender};
use super::model::ChatSession;
use crate::backend::ConversationBackend;
use crate::error::{NereusError, Result};

/// Per-operation call counters.
#[derive(Default)]
pub struct CallCounts {
    pub list_sessions: AtomicUsize,
    pub create_session: AtomicUsize,
    pub delete_session: AtomicUsize,
    pub rename_session: AtomicUsize,
    pub list_messages: AtomicUsize,
    pub create_message: AtomicUsize,
    pub rate_message: AtomicUsize,
    pub fetch_answer: AtomicUsize,
    /// Subset of `create_message` calls authored by the assistant id.
    pub assistant_creates: AtomicUsize,
}

impl CallCounts {
    /// Every remote call except answer fetches.
    pub fn total(&self) -> usize {
        self.list_sessions.load(Ordering::SeqCst)
            + self.create_session.load(Ordering::SeqCst)
            + self.delete_session.load(Ordering::SeqCst)
            + self.rename_session.load(Ordering::SeqCst)
            + self.list_messages.load(Ordering::SeqCst)
            + self.create_message.load(Ordering::SeqCst)
            + self.rate_message.load(Ordering::SeqCst)
    }
}

pub struct MockBackend {
    pub counts: CallCounts,
    pub answer: Mutex<String>,
    pub fail_list_sessions: AtomicBool,
    pub fail_create_session: AtomicBool,
    pub fail_delete_session: AtomicBool,
    pub fail_create_message: AtomicBool,
    pub fail_fetch_answer: AtomicBool,
    remote_sessions: Mutex<Vec<ChatSession>>,
    remote_messages: Mutex<HashMap<String, Vec<Message>>>,
    answer_gate: Mutex<Option<Arc<Semaphore>>>,
    next_id: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            counts: CallCounts::default(),
            answer: Mutex::new("the tide is high".to_string()),
            fail_list_sessions: AtomicBool::new(false),
            fail_create_session: AtomicBool::new(false),
            fail_delete_session: AtomicBool::new(false),
            fail_create_message: AtomicBool::new(false),
            fail_fetch_answer: AtomicBool::new(false),
            remote_sessions: Mutex::new(Vec::new()),
            remote_messages: Mutex::new(HashMap::new()),
            answer_gate: Mutex::new(None),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Registers a remote session and its stored messages.
    pub fn seed_session(&self, id: &str, title: &str, messages: Vec<Message>) {
        self.remote_sessions
            .lock()
            .unwrap()
            .push(ChatSession::new(id, title));
        self.remote_messages
            .lock()
            .unwrap()
            .insert(id.to_string(), messages);
    }

    /// Makes answer fetches block until a permit is added to the returned
    /// semaphore, so tests can interleave work mid-request.
    pub fn gate_answers(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.answer_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    fn next(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl ConversationBackend for MockBackend {
    async fn list_sessions(&self, _user_id: &str) -> Result<Vec<ChatSession>> {
        self.counts.list_sessions.fetch_add(1, Ordering::SeqCst);
        if self.fail_list_sessions.load(Ordering::SeqCst) {
            return Err(NereusError::sync("listing unavailable"));
        }
        Ok(self.remote_sessions.lock().unwrap().clone())
    }

    async fn create_session(&self, summary: &str, _user_id: &str) -> Result<ChatSession> {
        self.counts.create_session.fetch_add(1, Ordering::SeqCst);
        if self.fail_create_session.load(Ordering::SeqCst) {
            return Err(NereusError::sync("create unavailable"));
        }
        Ok(ChatSession::new(self.next("srv"), summary))
    }

    async fn delete_session(&self, _session_id: &str) -> Result<()> {
        self.counts.delete_session.fetch_add(1, Ordering::SeqCst);
        if self.fail_delete_session.load(Ordering::SeqCst) {
            return Err(NereusError::sync("delete unavailable"));
        }
        Ok(())
    }

    async fn rename_session(&self, _session_id: &str, _summary: &str) -> Result<()> {
        self.counts.rename_session.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_messages(&self, session_id: &str, _caller_id: &str) -> Result<Vec<Message>> {
        self.counts.list_messages.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .remote_messages
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_message(
        &self,
        text: &str,
        session_id: &str,
        author_id: &str,
    ) -> Result<Message> {
        self.counts.create_message.fetch_add(1, Ordering::SeqCst);
        if author_id == RESERVED_ASSISTANT_ID {
            self.counts.assistant_creates.fetch_add(1, Ordering::SeqCst);
        }
        if self.fail_create_message.load(Ordering::SeqCst) {
            return Err(NereusError::sync("persist unavailable"));
        }
        Ok(Message {
            id: Some(self.next("msg")),
            sender: if author_id == RESERVED_ASSISTANT_ID {
                Sender::Ai
            } else {
                Sender::User
            },
            text: text.to_string(),
            is_thinking: false,
            session_id: Some(session_id.to_string()),
            author_id: Some(author_id.to_string()),
            timestamp: Some("2026-01-01T00:00:00Z".to_string()),
            rating: Some(0),
        })
    }

    async fn rate_message(&self, _message_id: &str, _rating: i32) -> Result<()> {
        self.counts.rate_message.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_answer(&self, _question: &str) -> Result<String> {
        self.counts.fetch_answer.fetch_add(1, Ordering::SeqCst);
        let gate = self.answer_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|e| NereusError::internal(e.to_string()))?;
        }
        if self.fail_fetch_answer.load(Ordering::SeqCst) {
            return Err(NereusError::sync("answer endpoint unreachable"));
        }
        Ok(self.answer.lock().unwrap().clone())
    }
}

/// Lets spawned reconciliation tasks run to completion on the
/// current-thread test runtime.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
