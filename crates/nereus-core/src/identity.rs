//! Caller identity boundary.
//!
//! The session layer never issues or mutates credentials; it only reads
//! them. Identity is passed explicitly into the store's constructor and
//! lives exactly as long as one user session.

use serde::{Deserialize, Serialize};

/// The caller as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Display name, also used as the remote store's `user_id`.
    pub name: String,
    /// Role label (e.g. "user", "admin"); carried for display only.
    pub role: String,
}

/// Read-only view of the authentication state.
///
/// Implementations supply the caller identity and bearer credential.
/// An unauthenticated provider returns `false` / `None` across the board,
/// which switches the session layer into local-only mode: optimistic state
/// is kept in memory and no persistence calls are ever attempted.
pub trait IdentityProvider: Send + Sync {
    /// Whether a caller identity is present.
    fn is_authenticated(&self) -> bool;

    /// The caller identity, if authenticated.
    fn identity(&self) -> Option<Identity>;

    /// Bearer credential for authenticated remote calls, if any.
    fn credential(&self) -> Option<String>;
}

/// Provider for anonymous callers. Never authenticated.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousIdentity;

impl IdentityProvider for AnonymousIdentity {
    fn is_authenticated(&self) -> bool {
        false
    }

    fn identity(&self) -> Option<Identity> {
        None
    }

    fn credential(&self) -> Option<String> {
        None
    }
}

/// Provider backed by a fixed identity, constructed once after login.
#[derive(Debug, Clone)]
pub struct StaticIdentity {
    identity: Identity,
    credential: Option<String>,
}

impl StaticIdentity {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            identity: Identity {
                name: name.into(),
                role: role.into(),
            },
            credential: None,
        }
    }

    /// Attaches a bearer credential.
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        self.credential = Some(credential.into());
        self
    }
}

impl IdentityProvider for StaticIdentity {
    fn is_authenticated(&self) -> bool {
        true
    }

    fn identity(&self) -> Option<Identity> {
        Some(self.identity.clone())
    }

    fn credential(&self) -> Option<String> {
        self.credential.clone()
    }
}
