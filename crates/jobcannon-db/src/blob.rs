//! Blob storage: named byte objects grouped into buckets.
//!
//! Uses enum dispatch instead of trait objects because async methods are
//! not dyn-compatible. Every backend exposes the same two operations:
//! `get(bucket, key)` and `put(bucket, key, bytes)`. `put` always replaces
//! the whole object; there is no versioning or locking.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::dragonfly::DragonflyBlobStore;
use crate::error::StorageError;

/// A blob store backend.
pub enum BlobStore {
    /// Local directory tree.
    Fs(FsBlobStore),
    /// `Dragonfly`/Redis server.
    Dragonfly(DragonflyBlobStore),
}

impl BlobStore {
    /// Read the full contents of `bucket/key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the object does not exist, or
    /// the backend's transport error.
    pub async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        match self {
            Self::Fs(store) => store.get(bucket, key).await,
            Self::Dragonfly(store) => store.get(bucket, key).await,
        }
    }

    /// Replace `bucket/key` with `bytes`.
    ///
    /// # Errors
    ///
    /// Returns the backend's transport or encoding error.
    pub async fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        match self {
            Self::Fs(store) => store.put(bucket, key, bytes).await,
            Self::Dragonfly(store) => store.put(bucket, key, bytes).await,
        }
    }

    /// Human-readable backend name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Fs(_) => "fs",
            Self::Dragonfly(_) => "dragonfly",
        }
    }
}

impl From<FsBlobStore> for BlobStore {
    fn from(store: FsBlobStore) -> Self {
        Self::Fs(store)
    }
}

impl From<DragonflyBlobStore> for BlobStore {
    fn from(store: DragonflyBlobStore) -> Self {
        Self::Dragonfly(store)
    }
}

// ---------------------------------------------------------------------------
// Filesystem backend
// ---------------------------------------------------------------------------

/// Blob store rooted at a local directory.
///
/// A bucket is a subdirectory of the root and a key is a file inside it:
/// `get("jobs", "previous_results.json")` reads
/// `{root}/jobs/previous_results.json`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a store rooted at `root`. The directory need not exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                tracing::debug!(path = %path.display(), len = bytes.len(), "Read blob");
                Ok(bytes)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.object_path(bucket, key)?;
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(path = %path.display(), len = bytes.len(), "Wrote blob");
        Ok(())
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        validate_segment("bucket", bucket)?;
        validate_segment("key", key)?;
        Ok(self.root.join(bucket).join(key))
    }
}

/// Bucket and key names must be a single plain path component.
fn validate_segment(kind: &str, name: &str) -> Result<(), StorageError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\']);
    if invalid {
        return Err(StorageError::Config(format!("invalid {kind} name: {name:?}")));
    }
    Ok(())
}
