//! Error types for the scrape-and-notify pipeline.
//!
//! Uses `thiserror` for typed errors that surface through the entire run:
//! SSO handshake, page fetches, HTML extraction, snapshot storage and chat
//! delivery. Nothing in the pipeline catches or retries them; any error
//! aborts the run and reaches `main`.

use jobcannon_db::StorageError;

/// Errors that can occur during a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The SSO pages did not have the expected form shape.
    #[error("authentication error: {0}")]
    Auth(String),

    /// An HTTP request failed in transport or returned an error status.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// A page could not be processed into event records.
    #[error("parse error: {0}")]
    Parse(String),

    /// The snapshot could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A chat notification could not be delivered.
    #[error("notify error: {0}")]
    Notify(String),

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),
}
