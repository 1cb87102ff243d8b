//! Ordered, duplicate-free collection of [`EventRecord`]s.
//!
//! An [`EventSet`] is a sequence, not a hash set: records keep the order
//! they were inserted in (document order for a fresh scrape) and a record
//! structurally equal to one already present is dropped on insertion.
//! Listings hold a few hundred rows at most, so membership is a linear scan.

use serde::{Deserialize, Deserializer, Serialize};

use crate::record::EventRecord;

/// Ordered sequence of distinct event records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EventSet {
    records: Vec<EventRecord>,
}

impl EventSet {
    /// Create an empty set.
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append `record` unless an equal record is already present.
    ///
    /// Returns `true` if the record was added.
    pub fn insert(&mut self, record: EventRecord) -> bool {
        if self.contains(&record) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Whether a structurally equal record is present.
    pub fn contains(&self, record: &EventRecord) -> bool {
        self.records.iter().any(|r| r == record)
    }

    /// Number of records.
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set holds no records.
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, EventRecord> {
        self.records.iter()
    }

    /// Records as a slice, in insertion order.
    pub const fn as_slice(&self) -> &[EventRecord] {
        self.records.as_slice()
    }

    /// Records of `self` that do not appear anywhere in `previous`.
    ///
    /// Yields in `self` order, which for a scrape is document order.
    pub fn new_since<'a>(
        &'a self,
        previous: &'a Self,
    ) -> impl Iterator<Item = &'a EventRecord> + 'a {
        self.records.iter().filter(|r| !previous.contains(r))
    }

    /// Whether both sets hold the same records, ignoring order.
    pub fn same_records(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|r| other.contains(r))
    }
}

impl FromIterator<EventRecord> for EventSet {
    fn from_iter<I: IntoIterator<Item = EventRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<EventRecord> for EventSet {
    fn extend<I: IntoIterator<Item = EventRecord>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl IntoIterator for EventSet {
    type Item = EventRecord;
    type IntoIter = std::vec::IntoIter<EventRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventSet {
    type Item = &'a EventRecord;
    type IntoIter = std::slice::Iter<'a, EventRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// Deserializing goes through `FromIterator` so a stored snapshot with
// repeated entries still yields a duplicate-free set.
impl<'de> Deserialize<'de> for EventSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = Vec::<EventRecord>::deserialize(deserializer)?;
        Ok(records.into_iter().collect())
    }
}
