//! Error types for the conversation log.

use thiserror::Error;

/// Persistence error: connectivity or query failure from the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// `SQLite` storage error (sync).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` storage error (async).
    #[error("tokio-rusqlite error: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
    /// A stored row could not be decoded into its typed record.
    #[error("invalid stored record: {0}")]
    InvalidRecord(String),
}

/// Convenience result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
