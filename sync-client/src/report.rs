//! Per-cycle outcome counters.

use sync_types::ResourceType;

/// What happened to one resource type during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceReport {
    /// The processed type.
    pub resource_type: ResourceType,
    /// Records inserted into the store.
    pub inserted: u64,
    /// Records skipped because the store already held them.
    pub duplicates: u64,
    /// Records deferred to a later cycle (missing parent or store failure).
    pub deferred: u64,
    /// Records newly added to the active set.
    pub activated: u64,
    /// Active records re-checked and still in flight.
    pub still_active: u64,
    /// Active records dropped because they vanished remotely.
    pub dropped: u64,
    /// Page or single-record fetch failures.
    pub fetch_errors: u64,
    /// Store failures (lookups or inserts).
    pub store_errors: u64,
    /// Dependent actions that failed.
    pub actions_failed: u64,
    /// Listing entries that could not be decoded.
    pub skipped: u64,
    /// Committed offset after the cycle.
    pub total_seen: u64,
}

impl ResourceReport {
    /// Empty report for `resource_type`.
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            inserted: 0,
            duplicates: 0,
            deferred: 0,
            activated: 0,
            still_active: 0,
            dropped: 0,
            fetch_errors: 0,
            store_errors: 0,
            actions_failed: 0,
            skipped: 0,
            total_seen: 0,
        }
    }
}

/// Outcome of one full cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// One entry per processed type, in processing order.
    pub resources: Vec<ResourceReport>,
    /// Whether shutdown interrupted the cycle before every type ran.
    pub interrupted: bool,
}

impl CycleReport {
    /// Report of `resource_type`, if it was processed.
    pub fn resource(&self, resource_type: ResourceType) -> Option<&ResourceReport> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type)
    }

    /// Records inserted across all types.
    pub fn inserted(&self) -> u64 {
        self.sum(|r| r.inserted)
    }

    /// Duplicates skipped across all types.
    pub fn duplicates(&self) -> u64 {
        self.sum(|r| r.duplicates)
    }

    /// Deferred records across all types.
    pub fn deferred(&self) -> u64 {
        self.sum(|r| r.deferred)
    }

    /// Dropped active records across all types.
    pub fn dropped(&self) -> u64 {
        self.sum(|r| r.dropped)
    }

    /// Fetch failures across all types.
    pub fn fetch_errors(&self) -> u64 {
        self.sum(|r| r.fetch_errors)
    }

    /// Store failures across all types.
    pub fn store_errors(&self) -> u64 {
        self.sum(|r| r.store_errors)
    }

    /// Failed dependent actions across all types.
    pub fn actions_failed(&self) -> u64 {
        self.sum(|r| r.actions_failed)
    }

    fn sum(&self, f: impl Fn(&ResourceReport) -> u64) -> u64 {
        self.resources.iter().map(f).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_sum_over_types() {
        let mut call = ResourceReport::new(ResourceType::Call);
        call.inserted = 3;
        call.deferred = 1;
        let mut recording = ResourceReport::new(ResourceType::Recording);
        recording.inserted = 2;
        recording.fetch_errors = 1;

        let report = CycleReport {
            resources: vec![call, recording],
            interrupted: false,
        };

        assert_eq!(report.inserted(), 5);
        assert_eq!(report.deferred(), 1);
        assert_eq!(report.fetch_errors(), 1);
        assert_eq!(report.duplicates(), 0);
        assert_eq!(
            report.resource(ResourceType::Recording).map(|r| r.inserted),
            Some(2)
        );
        assert!(report.resource(ResourceType::Account).is_none());
    }
}
