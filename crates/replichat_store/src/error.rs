//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store cannot be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The SQLite backend reported an error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored row violates the schema's invariants.
    #[error("store corrupted: {0}")]
    Corrupted(String),
}
