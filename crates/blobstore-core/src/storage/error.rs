//! Storage error types

use thiserror::Error;

/// Errors that can occur during blob store operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The host environment has no storage engine
    #[error("storage engine unsupported: {0}")]
    Unsupported(String),

    /// Opening or upgrading the database failed
    #[error("connection error: {0}")]
    Connection(String),

    /// A read, write, cursor, count or clear request failed
    #[error("transaction error: {0}")]
    Transaction(String),

    /// Converting a blob or buffer failed
    #[error("read error: {0}")]
    Read(String),

    /// A stored value did not have the record shape
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
