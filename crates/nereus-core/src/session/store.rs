use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{RwLock, watch};
use uuid::Uuid;

use super::message::{Message, MessagePatch, RESERVED_ASSISTANT_ID, Sender};
use super::model::{ChatSession, summarize};
use crate::backend::ConversationBackend;
use crate::identity::{Identity, IdentityProvider};

/// Title given to sessions created without an identity.
const DEFAULT_TITLE: &str = "New chat";

struct StoreState {
    sessions: Vec<ChatSession>,
    selected_id: String,
}

/// Single source of truth for the session set and the selection.
///
/// Every mutation applies to local state first and reconciles with the
/// remote conversation store in the background. Persistence is strictly
/// best-effort: remote failures are logged and never roll back local
/// state, and unauthenticated callers never produce remote calls at all.
///
/// Constructed once per user session with an explicit identity; there is
/// no ambient auth state. State changes are observable through the
/// revision channel returned by [`subscribe`](Self::subscribe).
pub struct SessionStore {
    state: Arc<RwLock<StoreState>>,
    backend: Arc<dyn ConversationBackend>,
    identity: Arc<dyn IdentityProvider>,
    initialized: AtomicBool,
    revision: Arc<watch::Sender<u64>>,
}

impl SessionStore {
    pub fn new(
        backend: Arc<dyn ConversationBackend>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            state: Arc::new(RwLock::new(StoreState {
                sessions: Vec::new(),
                selected_id: String::new(),
            })),
            backend,
            identity,
            initialized: AtomicBool::new(false),
            revision: Arc::new(revision),
        }
    }

    /// Loads the session set. Runs at most once per store; re-invocation
    /// (including before a first call completes) is a no-op.
    ///
    /// Unauthenticated callers get a single synthesized local session and
    /// no remote calls. Authenticated callers adopt the remote listing,
    /// selecting the first session; an empty listing synthesizes one
    /// session and attempts to persist it; a failed listing falls back to
    /// a synthesized local-only session.
    pub async fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return;
        }

        let Some(identity) = self.authenticated_identity() else {
            self.install_local_session(DEFAULT_TITLE.to_string()).await;
            return;
        };

        match self.backend.list_sessions(&identity.name).await {
            Ok(sessions) if !sessions.is_empty() => {
                let first_id = sessions[0].id.clone();
                {
                    let mut state = self.state.write().await;
                    state.sessions = sessions;
                    state.selected_id = first_id;
                }
                self.bump();
                self.hydrate_selected().await;
            }
            Ok(_) => {
                let title = owned_title(&identity.name);
                let temp_id = self.install_local_session(title.clone()).await;
                match self.backend.create_session(&title, &identity.name).await {
                    Ok(record) => {
                        Self::splice_created(&self.state, &self.revision, &temp_id, record).await;
                    }
                    Err(err) => {
                        tracing::warn!("failed to persist initial session: {err}");
                    }
                }
            }
            Err(err) => {
                tracing::warn!("session listing failed, falling back to a local session: {err}");
                self.install_local_session(owned_title(&identity.name))
                    .await;
            }
        }
    }

    /// Optimistically prepends a new session and selects it. Returns the
    /// session id as of creation time; when authenticated, the temporary
    /// id is later spliced out for the server-confirmed one.
    pub async fn create_session(&self) -> String {
        let identity = self.authenticated_identity();
        let title = match &identity {
            Some(identity) => owned_title(&identity.name),
            None => DEFAULT_TITLE.to_string(),
        };
        let session = ChatSession::new(Uuid::new_v4().to_string(), title.clone());
        let temp_id = session.id.clone();
        {
            let mut state = self.state.write().await;
            state.sessions.insert(0, session);
            state.selected_id = temp_id.clone();
        }
        self.bump();

        if let Some(identity) = identity {
            let backend = self.backend.clone();
            let state = self.state.clone();
            let revision = self.revision.clone();
            let temp = temp_id.clone();
            tokio::spawn(async move {
                match backend.create_session(&title, &identity.name).await {
                    Ok(record) => Self::splice_created(&state, &revision, &temp, record).await,
                    Err(err) => {
                        // The temporary session stays as the record of truth.
                        tracing::warn!("session create failed, keeping local session {temp}: {err}");
                    }
                }
            });
        }
        temp_id
    }

    /// Removes a session. Refused silently when it would empty the set.
    /// If the removed session was selected, selection moves to the first
    /// remaining session. The remote delete is best-effort.
    pub async fn delete_session(&self, session_id: &str) {
        {
            let mut state = self.state.write().await;
            if state.sessions.len() <= 1 {
                return;
            }
            let Some(pos) = state.sessions.iter().position(|s| s.id == session_id) else {
                return;
            };
            state.sessions.remove(pos);
            if state.selected_id == session_id {
                state.selected_id = state.sessions[0].id.clone();
            }
        }
        self.bump();

        if self.authenticated_identity().is_some() {
            let backend = self.backend.clone();
            let id = session_id.to_string();
            tokio::spawn(async move {
                if let Err(err) = backend.delete_session(&id).await {
                    // Local removal is authoritative for the UI.
                    tracing::warn!("session delete failed for {id}: {err}");
                }
            });
        }
    }

    /// Updates the selection and lazily loads the session's messages the
    /// first time it is selected with an empty cache.
    pub async fn select_session(&self, session_id: &str) {
        {
            let mut state = self.state.write().await;
            if !state.sessions.iter().any(|s| s.id == session_id) {
                tracing::warn!("select of unknown session {session_id} ignored");
                return;
            }
            state.selected_id = session_id.to_string();
        }
        self.bump();
        self.hydrate_selected().await;
    }

    /// Appends a message to the selected session, synchronously for local
    /// readers. Thinking placeholders and anonymous appends are never
    /// persisted; everything else issues a best-effort create call whose
    /// server id/timestamp are patched back into the appended message.
    pub async fn append_message(&self, message: Message) {
        let is_thinking = message.is_thinking;
        let sender = message.sender;
        let (session_id, text) = {
            let mut state = self.state.write().await;
            let selected = state.selected_id.clone();
            let Some(session) = state.sessions.iter_mut().find(|s| s.id == selected) else {
                tracing::warn!("append with no selected session dropped");
                return;
            };
            let mut message = message;
            message.session_id = Some(selected.clone());
            let text = message.text.clone();
            session.messages.push(message);
            (selected, text)
        };
        self.bump();

        if is_thinking {
            return;
        }
        let Some(identity) = self.authenticated_identity() else {
            return;
        };
        let author_id = author_for(sender, &identity);
        let backend = self.backend.clone();
        let state = self.state.clone();
        let revision = self.revision.clone();
        tokio::spawn(async move {
            match backend.create_message(&text, &session_id, &author_id).await {
                Ok(record) => {
                    Self::reconcile_message(&state, &revision, &session_id, record).await;
                }
                Err(err) => {
                    tracing::warn!("message persist failed for session {session_id}: {err}");
                }
            }
        });
    }

    /// Merges a partial update into the last message of the selected
    /// session. Purely local; never touches the remote store.
    pub async fn patch_last_message(&self, patch: MessagePatch) {
        {
            let mut state = self.state.write().await;
            let selected = state.selected_id.clone();
            let Some(session) = state.sessions.iter_mut().find(|s| s.id == selected) else {
                return;
            };
            let Some(last) = session.messages.last_mut() else {
                return;
            };
            patch.apply(last);
        }
        self.bump();
    }

    /// Like [`patch_last_message`](Self::patch_last_message), but applies
    /// only while `session_id` is still the selection. The check and the
    /// merge happen under one lock, so a selection change racing the patch
    /// cannot land it on another session's last message. Returns whether
    /// the patch was applied.
    pub async fn patch_last_message_if_selected(
        &self,
        session_id: &str,
        patch: MessagePatch,
    ) -> bool {
        {
            let mut state = self.state.write().await;
            if state.selected_id != session_id {
                return false;
            }
            let Some(session) = state.sessions.iter_mut().find(|s| s.id == session_id) else {
                return false;
            };
            let Some(last) = session.messages.last_mut() else {
                return false;
            };
            patch.apply(last);
        }
        self.bump();
        true
    }

    /// Persists the last message of the selected session as-is, tagged
    /// with the caller id or the reserved assistant id depending on the
    /// sender. Used by the streamer once a reveal completes.
    pub async fn persist_last_message(&self) {
        let Some(identity) = self.authenticated_identity() else {
            return;
        };
        let (session_id, text, author_id) = {
            let state = self.state.read().await;
            let Some(session) = state.sessions.iter().find(|s| s.id == state.selected_id) else {
                return;
            };
            let Some(last) = session.messages.last() else {
                return;
            };
            if last.is_thinking {
                return;
            }
            (
                session.id.clone(),
                last.text.clone(),
                author_for(last.sender, &identity),
            )
        };
        match self.backend.create_message(&text, &session_id, &author_id).await {
            Ok(record) => {
                Self::reconcile_message(&self.state, &self.revision, &session_id, record).await;
            }
            Err(err) => {
                tracing::warn!("message persist failed for session {session_id}: {err}");
            }
        }
    }

    /// Renames a session: optimistic local title update (truncated to the
    /// summary limit), best-effort remote rename.
    pub async fn rename_session(&self, session_id: &str, title: &str) {
        let title = summarize(title);
        {
            let mut state = self.state.write().await;
            let Some(session) = state.sessions.iter_mut().find(|s| s.id == session_id) else {
                return;
            };
            session.title = title.clone();
        }
        self.bump();

        if self.authenticated_identity().is_some() {
            let backend = self.backend.clone();
            let id = session_id.to_string();
            tokio::spawn(async move {
                if let Err(err) = backend.rename_session(&id, &title).await {
                    tracing::warn!("session rename failed for {id}: {err}");
                }
            });
        }
    }

    /// Records caller feedback on a persisted message of the selected
    /// session. Ratings outside -1..=1 are ignored.
    pub async fn rate_message(&self, message_id: &str, rating: i32) {
        if !(-1..=1).contains(&rating) {
            tracing::warn!("rating {rating} out of range, ignored");
            return;
        }
        let found = {
            let mut state = self.state.write().await;
            let selected = state.selected_id.clone();
            let Some(session) = state.sessions.iter_mut().find(|s| s.id == selected) else {
                return;
            };
            match session
                .messages
                .iter_mut()
                .find(|m| m.id.as_deref() == Some(message_id))
            {
                Some(message) => {
                    message.rating = Some(rating);
                    true
                }
                None => false,
            }
        };
        if !found {
            return;
        }
        self.bump();

        if self.authenticated_identity().is_some() {
            let backend = self.backend.clone();
            let id = message_id.to_string();
            tokio::spawn(async move {
                if let Err(err) = backend.rate_message(&id, rating).await {
                    tracing::warn!("rating update failed for message {id}: {err}");
                }
            });
        }
    }

    /// Snapshot of the session set.
    pub async fn sessions(&self) -> Vec<ChatSession> {
        self.state.read().await.sessions.clone()
    }

    /// Id of the selected session. Empty only before initialization.
    pub async fn selected_id(&self) -> String {
        self.state.read().await.selected_id.clone()
    }

    /// Snapshot of the selected session.
    pub async fn selected_session(&self) -> Option<ChatSession> {
        let state = self.state.read().await;
        state
            .sessions
            .iter()
            .find(|s| s.id == state.selected_id)
            .cloned()
    }

    /// Revision channel; the value bumps on every observable state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Loads messages for the selected session when its cache is empty.
    /// Anonymous callers have nothing to load.
    async fn hydrate_selected(&self) {
        let Some(identity) = self.authenticated_identity() else {
            return;
        };
        let session_id = {
            let state = self.state.read().await;
            match state.sessions.iter().find(|s| s.id == state.selected_id) {
                Some(session) if session.messages.is_empty() => session.id.clone(),
                _ => return,
            }
        };
        match self.backend.list_messages(&session_id, &identity.name).await {
            Ok(messages) if !messages.is_empty() => {
                let mut state = self.state.write().await;
                if let Some(session) = state.sessions.iter_mut().find(|s| s.id == session_id) {
                    // An append may have raced the fetch; loaded history loses.
                    if session.messages.is_empty() {
                        session.messages = messages;
                    }
                }
                drop(state);
                self.bump();
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!("message load failed for session {session_id}: {err}");
            }
        }
    }

    /// Replaces the temporary session entry with the server-confirmed
    /// record, keeping any messages appended in the meantime and moving
    /// the selection along with it.
    async fn splice_created(
        state: &RwLock<StoreState>,
        revision: &watch::Sender<u64>,
        temp_id: &str,
        record: ChatSession,
    ) {
        let mut state = state.write().await;
        let Some(pos) = state.sessions.iter().position(|s| s.id == temp_id) else {
            // Deleted before the create call landed; nothing to reconcile.
            return;
        };
        let server_id = record.id.clone();
        let messages = std::mem::take(&mut state.sessions[pos].messages);
        state.sessions[pos] = ChatSession {
            id: record.id,
            title: record.title,
            messages,
        };
        if state.selected_id == temp_id {
            state.selected_id = server_id.clone();
        }
        drop(state);
        revision.send_modify(|r| *r += 1);
        tracing::debug!("session {temp_id} reconciled to {server_id}");
    }

    /// Patches the server-assigned id/timestamp into the optimistically
    /// appended message. Matched by text among unconfirmed messages, so a
    /// thinking placeholder appended right behind it is never mistaken
    /// for the persisted one.
    async fn reconcile_message(
        state: &RwLock<StoreState>,
        revision: &watch::Sender<u64>,
        session_id: &str,
        record: Message,
    ) {
        let mut state = state.write().await;
        let Some(session) = state.sessions.iter_mut().find(|s| s.id == session_id) else {
            return;
        };
        let Some(message) = session
            .messages
            .iter_mut()
            .rev()
            .find(|m| m.id.is_none() && !m.is_thinking && m.text == record.text)
        else {
            return;
        };
        message.id = record.id;
        message.timestamp = record.timestamp;
        drop(state);
        revision.send_modify(|r| *r += 1);
    }

    fn authenticated_identity(&self) -> Option<Identity> {
        if self.identity.is_authenticated() {
            self.identity.identity()
        } else {
            None
        }
    }

    /// Installs a single synthesized local session and selects it.
    /// Returns its (temporary) id.
    async fn install_local_session(&self, title: String) -> String {
        let session = ChatSession::new(Uuid::new_v4().to_string(), title);
        let id = session.id.clone();
        {
            let mut state = self.state.write().await;
            state.sessions = vec![session];
            state.selected_id = id.clone();
        }
        self.bump();
        id
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }
}

fn owned_title(name: &str) -> String {
    summarize(&format!("{name}'s chat"))
}

fn author_for(sender: Sender, identity: &Identity) -> String {
    match sender {
        Sender::User => identity.name.clone(),
        Sender::Ai => RESERVED_ASSISTANT_ID.to_string(),
    }
}
