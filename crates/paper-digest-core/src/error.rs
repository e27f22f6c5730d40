//! Error types shared by every store backend.

use thiserror::Error;

/// Failure of a paper-store operation.
///
/// Callers can distinguish a record that disappeared ([`StoreError::NotFound`])
/// from an engine failure ([`StoreError::Io`]) and pick their recovery
/// accordingly.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No metadata record exists for the requested id.
    #[error("paper not found: {0}")]
    NotFound(String),
    /// The underlying storage engine failed to read or write.
    #[error("store I/O failed: {0}")]
    Io(String),
    /// A stored record could not be encoded or decoded.
    #[error("store record could not be decoded: {0}")]
    Codec(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Codec(e.to_string())
    }
}
