//! Error types for the ZacAI core.

use thiserror::Error;

/// Result type alias for knowledge persistence operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by the persistent store collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported document: {0}")]
    Document(String),
}

/// Errors raised by lookup collaborators (dictionary, encyclopedia).
///
/// Every variant is converted to a pathway miss at the pathway boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("network error: {0}")]
    Network(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("lookup timed out after {0} ms")]
    Timeout(u64),

    #[error("parse error: {0}")]
    Parse(String),
}
