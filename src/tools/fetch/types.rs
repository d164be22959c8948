use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// How pages are requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Sent on every request after the built-in browser headers, replacing
    /// any header of the same name.
    pub extra_headers: Vec<(String, String)>,
    pub timeout_ms: u64,
    /// Pause between consecutive pages of a run.
    pub think_time_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            extra_headers: Vec::new(),
            timeout_ms: 30_000,
            think_time_ms: 500,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn think_time(&self) -> Duration {
        Duration::from_millis(self.think_time_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("timed out fetching {0}")]
    Timeout(String),
    #[error("request to {url} failed: {reason}")]
    Http { url: String, reason: String },
    #[error("status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("unusable page at {url}: {reason}")]
    Invalid { url: String, reason: String },
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout(_))
    }

    /// Worth another attempt: timeouts, connection failures, throttling and
    /// server errors. Client errors and unusable pages are final.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout(_) | FetchError::Http { .. } => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Invalid { .. } => false,
        }
    }

    pub(super) fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(url.to_string())
        } else {
            FetchError::Http {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

/// A fetched page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    pub html: String,
    /// URL after redirects.
    pub final_url: String,
    pub duration_ms: u64,
}

impl FetchResult {
    pub fn into_html(self) -> String {
        self.html
    }
}
