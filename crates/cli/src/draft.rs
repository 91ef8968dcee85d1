//! Checkout drafts: the checkout screen's state saved as JSON.

use std::path::{Path, PathBuf};

use saga::{CheckoutInput, Session};
use thiserror::Error;

/// Errors loading a draft.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("failed to read draft {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid draft: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parses a draft.
pub fn parse_draft(json: &str) -> Result<CheckoutInput, DraftError> {
    Ok(serde_json::from_str(json)?)
}

/// Reads and parses the draft at `path`.
pub async fn read_draft(path: &Path) -> Result<CheckoutInput, DraftError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DraftError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    parse_draft(&json)
}

/// Fills in the session from the environment when the draft has none.
pub fn with_session(mut input: CheckoutInput, session: Option<Session>) -> CheckoutInput {
    if input.session.is_none() {
        input.session = session;
    }
    input
}
