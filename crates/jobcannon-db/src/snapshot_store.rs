//! Persistence of the last observed [`EventSet`].
//!
//! The snapshot is a single JSON array of records stored at one fixed
//! bucket/key. It is read once at the start of a run and overwritten (not
//! merged) with that run's scrape at the end, so an event that disappears
//! from the listing is forgotten.
//!
//! A missing snapshot is an error, not an empty baseline: treating it as
//! empty would announce every listed event at once.

use jobcannon_types::EventSet;

use crate::blob::BlobStore;
use crate::error::StorageError;

/// Object key used when none is configured.
pub const DEFAULT_SNAPSHOT_KEY: &str = "previous_results.json";

/// Reads and overwrites the snapshot object.
pub struct SnapshotStore {
    blobs: BlobStore,
    bucket: String,
    key: String,
}

impl SnapshotStore {
    /// Create a snapshot store for `bucket/key` on the given backend.
    pub fn new(blobs: BlobStore, bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            blobs,
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Bucket holding the snapshot.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Key of the snapshot object.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the previous run's event set.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if no snapshot exists,
    /// [`StorageError::Serialization`] if it is not a JSON array of records,
    /// or the backend's transport error.
    pub async fn load(&self) -> Result<EventSet, StorageError> {
        tracing::debug!(bucket = %self.bucket, key = %self.key, "Reading snapshot");
        let bytes = self.blobs.get(&self.bucket, &self.key).await?;
        let events: EventSet = serde_json::from_slice(&bytes)?;

        tracing::info!(
            backend = self.blobs.name(),
            bucket = %self.bucket,
            key = %self.key,
            events = events.len(),
            "Loaded snapshot"
        );
        Ok(events)
    }

    /// Overwrite the snapshot with `events`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if encoding fails or the
    /// backend's transport error.
    pub async fn save(&self, events: &EventSet) -> Result<(), StorageError> {
        let json = serde_json::to_vec(events)?;
        self.blobs.put(&self.bucket, &self.key, &json).await?;

        tracing::info!(
            backend = self.blobs.name(),
            bucket = %self.bucket,
            key = %self.key,
            events = events.len(),
            "Saved snapshot"
        );
        Ok(())
    }
}
