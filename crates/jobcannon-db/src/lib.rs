//! Snapshot persistence for the event watcher.
//!
//! The previous run's [`EventSet`](jobcannon_types::EventSet) lives as one
//! JSON document in a blob store. This crate provides the blob backends and
//! the [`SnapshotStore`] that reads and overwrites that single object.
//!
//! # Architecture
//!
//! ```text
//! SnapshotStore (bucket, key, JSON codec)
//!     |
//!     +-- BlobStore::Fs        (directory per bucket, file per key)
//!     +-- BlobStore::Dragonfly (Redis-compatible, `{bucket}:{key}`)
//! ```
//!
//! # Modules
//!
//! - [`blob`] -- Backend-agnostic `get`/`put` of raw bytes
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) blob backend
//! - [`snapshot_store`] -- Load/save of the last observed event set
//! - [`error`] -- Shared error types

pub mod blob;
pub mod dragonfly;
pub mod error;
pub mod snapshot_store;

// Re-export primary types for convenience.
pub use blob::{BlobStore, FsBlobStore};
pub use dragonfly::DragonflyBlobStore;
pub use error::StorageError;
pub use snapshot_store::{SnapshotStore, DEFAULT_SNAPSHOT_KEY};
