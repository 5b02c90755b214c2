//! Error types for the Nereus session layer.

use thiserror::Error;

/// A shared error type for the Nereus crates.
///
/// Remote failures of any kind (transport, non-success status, decode) are
/// collapsed into the single `Sync` variant at the sync-client boundary;
/// callers only distinguish success from failure.
#[derive(Error, Debug, Clone)]
pub enum NereusError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Remote conversation store failure (network, status, or decode)
    #[error("Sync error: {0}")]
    Sync(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NereusError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Sync error
    pub fn sync(message: impl Into<String>) -> Self {
        Self::Sync(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a Sync error
    pub fn is_sync(&self) -> bool {
        matches!(self, Self::Sync(_))
    }
}

impl From<serde_json::Error> for NereusError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// A type alias for `Result<T, NereusError>`.
pub type Result<T> = std::result::Result<T, NereusError>;
