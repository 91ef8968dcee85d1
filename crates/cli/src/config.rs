//! Application configuration loaded from environment variables.

use std::time::Duration;

use backend::{BackendConfig, DEFAULT_BASE_URL};
use common::AuthToken;
use saga::{CheckoutConfig, Session};

/// Driver configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `CHECKOUT_API_URL`: backend base URL (default: `"http://localhost:5000/api"`)
/// - `CHECKOUT_TOKEN`: bearer token of the signed-in customer
/// - `CHECKOUT_USER_ID`: id of the signed-in customer
/// - `CHECKOUT_CURRENCY`: payment currency (default: `"usd"`)
/// - `CHECKOUT_REQUEST_TIMEOUT_SECS`: per-request timeout (default: `15`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub token: Option<String>,
    pub user_id: Option<String>,
    pub currency: String,
    pub request_timeout: Duration,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            api_url: lookup("CHECKOUT_API_URL").unwrap_or(defaults.api_url),
            token: lookup("CHECKOUT_TOKEN").filter(|token| !token.trim().is_empty()),
            user_id: lookup("CHECKOUT_USER_ID").filter(|id| !id.trim().is_empty()),
            currency: lookup("CHECKOUT_CURRENCY").unwrap_or(defaults.currency),
            request_timeout: lookup("CHECKOUT_REQUEST_TIMEOUT_SECS")
                .and_then(|secs| secs.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// The signed-in customer, if both a user id and a token are set.
    pub fn session(&self) -> Option<Session> {
        match (&self.user_id, &self.token) {
            (Some(user_id), Some(token)) => {
                Some(Session::new(user_id.as_str(), AuthToken::new(token.as_str())))
            }
            _ => None,
        }
    }

    /// Connection settings for the backend client.
    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig::new(self.api_url.as_str()).with_request_timeout(self.request_timeout)
    }

    /// Tunables for the checkout coordinator.
    pub fn checkout_config(&self) -> CheckoutConfig {
        CheckoutConfig::default().with_currency(self.currency.as_str())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            user_id: None,
            currency: "usd".to_string(),
            request_timeout: Duration::from_secs(15),
            log_level: "info".to_string(),
        }
    }
}
