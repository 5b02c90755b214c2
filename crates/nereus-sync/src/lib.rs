//! Nereus sync client.
//!
//! Reqwest-backed implementation of the
//! [`ConversationBackend`](nereus_core::backend::ConversationBackend)
//! boundary: the typed wrapper over the remote conversation store's REST
//! contract and the assistant-answer endpoint.

mod config;
mod http_backend;

pub use config::SyncConfig;
pub use http_backend::HttpConversationBackend;
