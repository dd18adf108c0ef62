//! Seen-set tracking: which monitor-log entries have already been observed

use std::collections::HashSet;

use crate::model::{LogEntry, RecordId};

/// Remembers the ids of the last fetched log collection
///
/// The first fetch of a session only seeds the set; nothing in it is
/// reported as new.
#[derive(Debug, Default)]
pub struct SeenSetTracker {
    seen: HashSet<RecordId>,
    seeded: bool,
}

impl SeenSetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in `fresh` not yet seen, in source order, without touching the set
    pub fn pending(&self, fresh: &[LogEntry]) -> Vec<LogEntry> {
        if !self.seeded {
            return Vec::new();
        }
        let mut reported = HashSet::new();
        fresh
            .iter()
            .filter(|entry| !self.seen.contains(&entry.id) && reported.insert(&entry.id))
            .cloned()
            .collect()
    }

    /// Replace the set with the ids of `fresh`
    pub fn commit(&mut self, fresh: &[LogEntry]) {
        self.seen = fresh.iter().map(|entry| entry.id.clone()).collect();
        self.seeded = true;
    }

    /// Compute the delta against the set, then absorb `fresh` as the new baseline
    pub fn reconcile(&mut self, fresh: &[LogEntry]) -> Vec<LogEntry> {
        let delta = self.pending(fresh);
        self.commit(fresh);
        delta
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
