//! Offset cursors for new-item discovery.
//!
//! The remote listing is ordered with new items appended at a stable
//! position, so "what is new" is expressed as an offset: the number of
//! items already committed from the head of the full ordered result.
//!
//! Each cycle a sweep starts at page 0 and walks every item. The
//! [`OffsetScan`] tells the engine which positions were already handled in
//! earlier cycles, and accumulates how far the committed prefix extends:
//! - commits extend the prefix only while they are contiguous
//! - the first deferred position freezes the prefix for the rest of the sweep
//!
//! A frozen prefix means items after a gap are re-scanned next cycle. That
//! is safe because persistence skips records already in the store.

use serde::{Deserialize, Serialize};

/// Per-type discovery cursor carried across cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCursor {
    /// Records committed from the head of the listing. Only increases.
    total_seen: u64,
    /// Last continuation token observed; `None` once a sweep reached the end.
    page_token: Option<String>,
}

impl SyncCursor {
    /// Create a cursor at offset 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cursor resuming at a known offset.
    pub fn with_total_seen(total_seen: u64) -> Self {
        Self {
            total_seen,
            page_token: None,
        }
    }

    /// Records committed from the head of the listing.
    pub fn total_seen(&self) -> u64 {
        self.total_seen
    }

    /// Last continuation token observed.
    pub fn page_token(&self) -> Option<&str> {
        self.page_token.as_deref()
    }

    /// Record the continuation token returned by the latest page.
    pub fn set_page_token(&mut self, token: Option<String>) {
        self.page_token = token;
    }

    /// Whether a listing reporting `total` items holds anything uncommitted.
    pub fn has_uncommitted(&self, total: u64) -> bool {
        total > self.total_seen
    }

    /// Start a sweep from page 0.
    pub fn begin_scan(&self) -> OffsetScan {
        OffsetScan {
            start: self.total_seen,
            position: 0,
            committed: self.total_seen,
            gap: None,
        }
    }

    /// Fold a finished sweep back into the cursor.
    ///
    /// Returns the new `total_seen`. The offset never moves backwards.
    pub fn finish_scan(&mut self, scan: &OffsetScan) -> u64 {
        if scan.committed > self.total_seen {
            self.total_seen = scan.committed;
        }
        self.total_seen
    }
}

/// Position bookkeeping for one sweep over the ordered listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetScan {
    /// Offset the sweep started from.
    start: u64,
    /// Absolute position of the next item to observe.
    position: u64,
    /// End of the contiguous committed prefix.
    committed: u64,
    /// First deferred position, if any.
    gap: Option<u64>,
}

impl OffsetScan {
    /// Observe the next item of the listing.
    ///
    /// Returns `None` if the item was committed by an earlier cycle and must
    /// be skipped, or `Some(position)` if it must be processed.
    pub fn observe(&mut self) -> Option<u64> {
        let position = self.position;
        self.position += 1;
        if position < self.start {
            None
        } else {
            Some(position)
        }
    }

    /// Mark the item at `position` as committed (persisted, already present,
    /// or moved to the active set).
    pub fn commit(&mut self, position: u64) {
        if self.gap.is_none() && position == self.committed {
            self.committed += 1;
        }
    }

    /// Mark the item at `position` as deferred to the next cycle.
    pub fn defer(&mut self, position: u64) {
        if self.gap.is_none() {
            self.gap = Some(position);
        }
    }

    /// End of the contiguous committed prefix so far.
    pub fn committed(&self) -> u64 {
        self.committed
    }

    /// First deferred position, if any.
    pub fn gap(&self) -> Option<u64> {
        self.gap
    }

    /// Number of items observed (including skipped ones).
    pub fn observed(&self) -> u64 {
        self.position
    }
}
