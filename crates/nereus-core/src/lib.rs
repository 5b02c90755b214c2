//! Nereus domain layer.
//!
//! Keeps a user's conversation state consistent between an in-memory
//! cache and an authoritative remote conversation store. Local mutations
//! apply optimistically; persistence is best-effort and never rolls back
//! local state. The remote store itself is reached through the
//! [`ConversationBackend`](backend::ConversationBackend) trait, whose
//! HTTP implementation lives in the `nereus-sync` crate.

pub mod backend;
pub mod error;
pub mod identity;
pub mod session;

// Re-export common error type
pub use error::{NereusError, Result};
