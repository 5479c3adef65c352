//! Storage-specific error types.
//!
//! Converted to `tallyfolio_core::Error` before leaving the crate.

use thiserror::Error;
use tallyfolio_core::errors::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Duplicate transaction id: {0}")]
    DuplicateId(String),

    #[error("Transactions not found: {0:?}")]
    NotFound(Vec<String>),

    #[error("Failed to read quotes: {0}")]
    QuoteFile(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::QuoteFile(e) => Error::ConfigIO(e),
            other => Error::Repository(other.to_string()),
        }
    }
}
