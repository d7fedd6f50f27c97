//! Active-set tracking.
//!
//! Records observed while still in flight are held here, keyed by natural
//! key, until a targeted re-fetch classifies them terminal. Per key:
//!
//! ```text
//! Unseen ──Active──► Active ──Active──► Active (snapshot replaced)
//!   │                  │
//!   └────Terminal──────┴──Terminal──► Persisted (removed exactly once)
//! ```
//!
//! There is no way back from persisted to active: callers must check the
//! store before [`ActiveSet::observe`] for keys that may already be
//! persisted.

use crate::classify::Classification;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use sync_types::{RawRecord, Sid};

/// What to do with an observed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Unseen → Active: start tracking.
    Activate,
    /// Active → Active: replace the snapshot.
    Refresh,
    /// → Terminal: hand to the persistence path.
    Persist,
}

/// Decide the transition for a record given whether it is already tracked.
pub fn transition(tracked: bool, classification: Classification) -> Transition {
    match (classification, tracked) {
        (Classification::Terminal, _) => Transition::Persist,
        (Classification::Active, false) => Transition::Activate,
        (Classification::Active, true) => Transition::Refresh,
    }
}

/// Per-type map of natural key → latest snapshot of an in-flight record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActiveSet {
    entries: BTreeMap<Sid, RawRecord>,
}

impl ActiveSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `record`, replacing any earlier snapshot with the same key.
    ///
    /// Returns the transition that took place.
    pub fn observe(&mut self, record: RawRecord) -> Transition {
        match self.entries.insert(record.sid().clone(), record) {
            Some(_) => Transition::Refresh,
            None => Transition::Activate,
        }
    }

    /// Stop tracking `sid`, returning its last snapshot.
    pub fn remove(&mut self, sid: &Sid) -> Option<RawRecord> {
        self.entries.remove(sid)
    }

    /// Whether `sid` is tracked.
    pub fn contains(&self, sid: &Sid) -> bool {
        self.entries.contains_key(sid)
    }

    /// Last snapshot of `sid`.
    pub fn get(&self, sid: &Sid) -> Option<&RawRecord> {
        self.entries.get(sid)
    }

    /// Tracked keys, in key order.
    ///
    /// Returned as an owned list so the set can be mutated while iterating.
    pub fn sids(&self) -> Vec<Sid> {
        self.entries.keys().cloned().collect()
    }

    /// Number of tracked records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sync_types::ResourceType;

    fn call(sid: &str, status: &str) -> RawRecord {
        RawRecord::from_json(ResourceType::Call, json!({"sid": sid, "status": status})).unwrap()
    }

    #[test]
    fn transition_table() {
        assert_eq!(
            transition(false, Classification::Active),
            Transition::Activate
        );
        assert_eq!(transition(true, Classification::Active), Transition::Refresh);
        assert_eq!(
            transition(false, Classification::Terminal),
            Transition::Persist
        );
        assert_eq!(transition(true, Classification::Terminal), Transition::Persist);
    }

    #[test]
    fn observe_then_refresh_replaces_snapshot() {
        let mut set = ActiveSet::new();
        assert_eq!(set.observe(call("CA1", "ringing")), Transition::Activate);
        assert_eq!(set.observe(call("CA1", "in-progress")), Transition::Refresh);

        assert_eq!(set.len(), 1);
        assert_eq!(
            set.get(&Sid::new("CA1")).unwrap().status(),
            Some("in-progress")
        );
    }

    #[test]
    fn remove_happens_once() {
        let mut set = ActiveSet::new();
        set.observe(call("CA1", "queued"));

        assert!(set.remove(&Sid::new("CA1")).is_some());
        assert!(set.remove(&Sid::new("CA1")).is_none());
        assert!(set.is_empty());
    }

    #[test]
    fn sids_are_sorted() {
        let mut set = ActiveSet::new();
        set.observe(call("CA3", "queued"));
        set.observe(call("CA1", "queued"));
        set.observe(call("CA2", "queued"));

        assert_eq!(
            set.sids(),
            vec![Sid::new("CA1"), Sid::new("CA2"), Sid::new("CA3")]
        );
    }

    #[test]
    fn serializes_as_map() {
        let mut set = ActiveSet::new();
        set.observe(call("CA1", "ringing"));

        let json = serde_json::to_value(&set).unwrap();
        assert!(json.get("CA1").is_some());

        let restored: ActiveSet = serde_json::from_value(json).unwrap();
        assert_eq!(restored, set);
    }
}
