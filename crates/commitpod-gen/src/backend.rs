//! The seam to whatever produces commit message text

use crate::prompt::ChatMessage;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned error status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Missing API key for {0}")]
    MissingApiKey(String),

    #[error("{0}")]
    Other(String),
}

/// Turns a prompt into commit message text.
///
/// Calls for different chunks of one diff may run concurrently, so
/// implementations must not rely on call order.
#[async_trait]
pub trait CommitBackend: Send + Sync {
    async fn generate_commit_message(&self, messages: &[ChatMessage])
        -> Result<String, BackendError>;
}
