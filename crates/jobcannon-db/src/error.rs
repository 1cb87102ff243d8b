//! Error types for the snapshot layer.
//!
//! All errors are propagated via [`StorageError`] which wraps the underlying
//! I/O, [`fred`] and [`serde_json`] errors. None of them are recoverable
//! within a run: a missing or corrupt snapshot aborts it.

/// Errors that can occur while reading or writing snapshots.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested object does not exist in the bucket.
    #[error("object not found: {bucket}/{key}")]
    NotFound {
        /// Bucket that was searched.
        bucket: String,
        /// Key that was requested.
        key: String,
    },

    /// A filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A `Dragonfly`/Redis operation failed.
    #[error("Dragonfly error: {0}")]
    Dragonfly(#[from] fred::error::Error),

    /// The snapshot is not valid JSON or has the wrong shape.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value could not be represented by the backend.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A configuration error (bad URL, invalid bucket or key name).
    #[error("Configuration error: {0}")]
    Config(String),
}
