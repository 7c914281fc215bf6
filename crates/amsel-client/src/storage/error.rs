//! Storage error types.
//!
//! - `Serialization`: a stored entry or key could not be encoded or decoded
//! - `Io`: the underlying database or filesystem failed

use amsel_proto::ProtocolError;
use thiserror::Error;

/// Errors that can occur during log store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error (file system, database, etc.)
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<ProtocolError> for StorageError {
    fn from(err: ProtocolError) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}
