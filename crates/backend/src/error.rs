//! Backend client errors and response mapping.

use reqwest::StatusCode;
use saga::ServiceError;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while constructing the client.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    /// The base URL is not an http(s) URL.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
}

/// Maps a transport-level failure.
pub(crate) fn transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        ServiceError::Timeout
    } else if err.is_decode() {
        ServiceError::Malformed(err.to_string())
    } else {
        ServiceError::Transport(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

/// Maps a non-success response to an error carrying the server's message.
pub(crate) fn status_error(status: StatusCode, body: &str) -> ServiceError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message.or(body.error))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        });

    ServiceError::Http {
        status: status.as_u16(),
        message,
    }
}
