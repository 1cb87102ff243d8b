//! Career-portal watcher: logs in, reads the event listing and announces
//! new events in Slack.
//!
//! # Architecture
//!
//! ```text
//! SSO login --> listing fetch --> EventParser --> diff vs snapshot --> Slack
//!                                                      |
//!                                       SnapshotStore <+ (overwrite)
//! ```
//!
//! # Modules
//!
//! - [`config`] -- Environment-derived configuration
//! - [`error`] -- Error taxonomy for a run
//! - [`session`] -- SSO handshake and the authenticated HTTP session
//! - [`parse`] -- Listing HTML to [`EventSet`](jobcannon_types::EventSet)
//! - [`notify`] -- Diff and chat delivery
//! - [`runner`] -- Orchestration of one run and the optional scheduler

pub mod config;
pub mod error;
pub mod notify;
pub mod parse;
pub mod runner;
pub mod session;

// Re-export primary types for convenience.
pub use config::JobCannonConfig;
pub use error::RunnerError;
pub use notify::{notify_new_events, Notifier, SlackNotifier};
pub use parse::{parse_events, EventParser};
pub use runner::{JobRunner, RunSummary};
pub use session::{login, AuthenticatedSession};
