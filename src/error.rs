//! Error types for the layered graph store.

use thiserror::Error;

/// Errors surfaced by store reads, writes, and sync orchestration.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing required parameter: {0}")]
    MissingParam(&'static str),

    #[error("Invalid parameter {param}: {reason}")]
    InvalidParam { param: &'static str, reason: String },

    #[error("Store not configured: {0}")]
    Configuration(String),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),
}

/// Transport-level errors from the remote push/pull/upload API.
///
/// Per-item failures returned inside a successful push response are not
/// transport failures; they are routed to the error partition instead.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote authentication failed: {0}")]
    AuthFailed(String),

    #[error("Remote rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Remote endpoint not found: {0}")]
    NotFound(String),

    #[error("Remote request failed: {0}")]
    RequestFailed(String),

    #[error("Malformed remote response: {0}")]
    MalformedResponse(String),

    #[error("Upload failed for {node_id}.{prop}: {reason}")]
    UploadFailed {
        node_id: String,
        prop: String,
        reason: String,
    },
}

impl From<config::ConfigError> for StoreError {
    fn from(err: config::ConfigError) -> Self {
        StoreError::Configuration(err.to_string())
    }
}
