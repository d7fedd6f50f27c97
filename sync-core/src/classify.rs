//! Terminal-state classification.
//!
//! A record may only be persisted once the remote side is done with it.
//! Types whose descriptor is flagged `can_be_active` report progress through
//! their `status` field; everything else is final on first sight.

use sync_types::{RawRecord, ResourceType};

/// Status values meaning "still in flight remotely".
pub const ACTIVE_STATUSES: [&str; 5] = ["queued", "ringing", "in-progress", "init", "sending"];

/// Whether a record is still progressing remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Still changing remotely; keep re-polling.
    Active,
    /// No further remote change expected; safe to persist.
    Terminal,
}

impl Classification {
    /// True for [`Classification::Active`].
    pub fn is_active(&self) -> bool {
        matches!(self, Classification::Active)
    }
}

/// Classify a record of the given type.
///
/// Unknown or missing status values classify as terminal: a record is
/// persisted rather than left in the active set forever.
pub fn classify(resource_type: ResourceType, record: &RawRecord) -> Classification {
    if !resource_type.descriptor().can_be_active {
        return Classification::Terminal;
    }
    match record.status() {
        Some(status) if ACTIVE_STATUSES.contains(&status) => Classification::Active,
        _ => Classification::Terminal,
    }
}
