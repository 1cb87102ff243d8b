//! A single event row scraped from the career-portal listing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Text rendered in place of a field the listing row did not provide.
pub const MISSING_FIELD_TEXT: &str = "N/A";

/// One listing entry, identified only by its three text fields.
///
/// Two records are the same event exactly when all three fields are equal.
/// There is no other identifier, so two real-world events with identical
/// strings collapse into one.
///
/// On the wire the fields are `title`, `eventType` and `datetime`. A missing
/// title is written as `null`, while a missing event type omits the
/// `eventType` key altogether. Both shapes read back as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event name, taken from the row's title element.
    #[serde(default)]
    pub title: Option<String>,
    /// Event category (info session, career fair, ...).
    #[serde(
        rename = "eventType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub event_type: Option<String>,
    /// Raw date/time text as shown on the listing.
    #[serde(default)]
    pub datetime: Option<String>,
}

impl EventRecord {
    /// Build a record from its three fields.
    pub fn new(
        title: Option<impl Into<String>>,
        event_type: Option<impl Into<String>>,
        datetime: Option<impl Into<String>>,
    ) -> Self {
        Self {
            title: title.map(Into::into),
            event_type: event_type.map(Into::into),
            datetime: datetime.map(Into::into),
        }
    }

    /// Chat message announcing this record as a newly seen event.
    ///
    /// Format: `*New Event*\n{title} | {eventType} | {datetime}`.
    pub fn notification_text(&self) -> String {
        format!("*New Event*\n{self}")
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {}",
            field_text(self.title.as_deref()),
            field_text(self.event_type.as_deref()),
            field_text(self.datetime.as_deref()),
        )
    }
}

fn field_text(field: Option<&str>) -> &str {
    field.unwrap_or(MISSING_FIELD_TEXT)
}
