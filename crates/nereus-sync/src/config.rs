//! Endpoint configuration for the sync client.

use std::env;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the remote conversation store and the assistant-answer endpoint
/// live, and how long to wait for them.
///
/// Defaults point at a local backend. Environment variables override:
/// `NEREUS_API_URL`, `NEREUS_ANSWER_URL`, `NEREUS_TIMEOUT_SECS`.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the conversation store (`/api/...` routes).
    pub base_url: String,
    /// Full URL of the assistant-answer endpoint.
    pub answer_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            answer_url: format!("{DEFAULT_BASE_URL}/query"),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl SyncConfig {
    /// Loads configuration from environment variables, falling back to
    /// the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup("NEREUS_API_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let answer_url =
            lookup("NEREUS_ANSWER_URL").unwrap_or_else(|| format!("{base_url}/query"));
        let timeout = lookup("NEREUS_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Self {
            base_url,
            answer_url,
            timeout,
        }
    }

    /// Sets the base URL, keeping the answer endpoint in step unless it
    /// was customized separately.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.answer_url = format!("{base_url}/query");
        self.base_url = base_url;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
