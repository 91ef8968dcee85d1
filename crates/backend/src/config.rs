//! Backend connection settings.

use std::time::Duration;

/// Default backend base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Where the backend lives and how long a request may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL every endpoint path is appended to, e.g. `http://host/api`.
    pub base_url: String,
    /// Timeout applied to every request.
    pub request_timeout: Duration,
}

impl BackendConfig {
    /// Creates a configuration for `base_url` with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Sets the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Joins `path` onto the base URL.
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(15),
        }
    }
}
