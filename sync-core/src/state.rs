//! Engine-owned synchronization state.
//!
//! All mutable state carried between cycles lives here: one discovery
//! cursor and one active set per resource type. The engine owns a single
//! [`EngineState`]; nothing else aliases it. It serializes to JSON so a
//! long-running process can resume without rediscovering in-flight records.

use crate::active::ActiveSet;
use crate::cursor::SyncCursor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use sync_types::ResourceType;

/// State of one resource type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Discovery cursor.
    pub cursor: SyncCursor,
    /// In-flight records awaiting a terminal status.
    pub active: ActiveSet,
}

/// State of every resource type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    resources: BTreeMap<ResourceType, ResourceState>,
}

impl EngineState {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// State of `resource_type`, if it was ever touched.
    pub fn resource(&self, resource_type: ResourceType) -> Option<&ResourceState> {
        self.resources.get(&resource_type)
    }

    /// Mutable state of `resource_type`, created empty on first access.
    pub fn resource_mut(&mut self, resource_type: ResourceType) -> &mut ResourceState {
        self.resources.entry(resource_type).or_default()
    }

    /// Committed offset of `resource_type` (0 if never synchronized).
    pub fn total_seen(&self, resource_type: ResourceType) -> u64 {
        self.resource(resource_type)
            .map(|s| s.cursor.total_seen())
            .unwrap_or(0)
    }

    /// Number of in-flight records of `resource_type`.
    pub fn active_count(&self, resource_type: ResourceType) -> usize {
        self.resource(resource_type)
            .map(|s| s.active.len())
            .unwrap_or(0)
    }

    /// Number of in-flight records across all types.
    pub fn total_active(&self) -> usize {
        self.resources.values().map(|s| s.active.len()).sum()
    }

    /// Drop state of types that are no longer synchronized.
    pub fn retain_types(&mut self, enabled: &[ResourceType]) {
        self.resources.retain(|t, _| enabled.contains(t));
    }
}
