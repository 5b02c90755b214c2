//! Simulated token-by-token reveal of a completed assistant answer.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::message::{Message, MessagePatch};
use super::store::SessionStore;
use crate::backend::ConversationBackend;

/// Answer text substituted when the answer fetch fails. Revealed through
/// the normal path, so a failure looks like any other (short) answer.
pub const FALLBACK_ANSWER: &str =
    "Sorry, something went wrong while answering. Please try again.";

/// Default delay between reveal ticks; one character per tick.
const DEFAULT_REVEAL_INTERVAL: Duration = Duration::from_millis(30);

/// Phases of one send/reveal cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    Requesting,
    Revealing,
    Settled,
}

/// Drives a fixed-cadence reveal of a completed assistant reply into the
/// last message of the active session.
///
/// A send appends the user message and a thinking placeholder, fetches the
/// full answer, then patches the placeholder with ever-longer prefixes on
/// a fixed timer. Once fully revealed, the message is persisted under the
/// reserved assistant author id (authenticated callers only).
///
/// Each send bumps a generation counter and records its target session; a
/// tick that observes a newer generation or a moved selection stops
/// patching immediately, so a re-send or a session switch cannot corrupt
/// another session's last message.
pub struct ResponseStreamer {
    store: Arc<SessionStore>,
    backend: Arc<dyn ConversationBackend>,
    interval: Duration,
    generation: AtomicU64,
    phase: Mutex<StreamPhase>,
}

impl ResponseStreamer {
    pub fn new(store: Arc<SessionStore>, backend: Arc<dyn ConversationBackend>) -> Self {
        Self {
            store,
            backend,
            interval: DEFAULT_REVEAL_INTERVAL,
            generation: AtomicU64::new(0),
            phase: Mutex::new(StreamPhase::Idle),
        }
    }

    /// Sets the delay between reveal ticks.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Current phase of the streamer.
    pub fn phase(&self) -> StreamPhase {
        *self.phase.lock().unwrap()
    }

    /// Sends a question through the full cycle: append, fetch, reveal,
    /// settle. Fetch failures reveal [`FALLBACK_ANSWER`] instead.
    pub async fn send(&self, question: impl Into<String>) {
        let question = question.into();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.set_phase(StreamPhase::Requesting);

        self.store.append_message(Message::user(question.clone())).await;
        self.store.append_message(Message::thinking()).await;
        let target = self.store.selected_id().await;

        let answer = match self.backend.fetch_answer(&question).await {
            Ok(answer) => answer,
            Err(err) => {
                tracing::warn!("answer fetch failed: {err}");
                FALLBACK_ANSWER.to_string()
            }
        };

        self.set_phase(StreamPhase::Revealing);
        let mut ticker = tokio::time::interval(self.interval);
        for prefix in reveal_prefixes(&answer) {
            ticker.tick().await;
            if self.generation.load(Ordering::SeqCst) != generation {
                tracing::debug!("reveal for session {target} superseded, stopping");
                self.set_phase(StreamPhase::Idle);
                return;
            }
            // Selection is re-checked under the store lock, so a switch
            // racing this tick cannot receive the stale patch.
            let applied = self
                .store
                .patch_last_message_if_selected(
                    &target,
                    MessagePatch {
                        text: Some(prefix),
                        is_thinking: Some(false),
                        ..Default::default()
                    },
                )
                .await;
            if !applied {
                tracing::debug!("selection moved off session {target}, stopping reveal");
                self.set_phase(StreamPhase::Idle);
                return;
            }
        }

        self.set_phase(StreamPhase::Settled);
        self.store.persist_last_message().await;
        self.set_phase(StreamPhase::Idle);
    }

    fn set_phase(&self, phase: StreamPhase) {
        *self.phase.lock().unwrap() = phase;
    }
}

/// Character prefixes of `answer`, one per reveal tick: lengths strictly
/// increasing from 1 to the full character count. An empty answer yields
/// one empty prefix so the thinking flag still clears.
fn reveal_prefixes(answer: &str) -> Vec<String> {
    let chars: Vec<char> = answer.chars().collect();
    if chars.is_empty() {
        return vec![String::new()];
    }
    (1..=chars.len())
        .map(|n| chars[..n].iter().collect())
        .collect()
}
