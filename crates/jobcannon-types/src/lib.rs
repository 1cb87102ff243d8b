//! Shared event record types.
//!
//! Every crate in the workspace speaks in terms of these types: the parser
//! produces an [`EventSet`], the snapshot store persists one, and the
//! notifier formats each new [`EventRecord`] into a chat message.
//!
//! # Modules
//!
//! - [`record`] -- A single listing entry and its notification text
//! - [`set`] -- Ordered, duplicate-free collection of records

pub mod record;
pub mod set;

// Re-export all public types at crate root for convenience.
pub use record::{EventRecord, MISSING_FIELD_TEXT};
pub use set::EventSet;
