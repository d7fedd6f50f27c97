//! Local store abstraction.
//!
//! The store keeps one row per resource instance, keyed by natural key,
//! and assigns local ids used for foreign-key links between types.
//!
//! Implementations must enforce natural-key uniqueness: inserting a key
//! that is already present fails with [`StoreError::ConstraintViolation`],
//! which the engine treats as "already persisted".

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use sync_types::{LocalId, ResolvedRecord, ResourceType, Sid};
use thiserror::Error;

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same natural key already exists.
    #[error("{resource_type} {sid} already stored")]
    ConstraintViolation {
        /// Type of the rejected record.
        resource_type: ResourceType,
        /// Natural key of the rejected record.
        sid: Sid,
    },

    /// Backend failure (I/O, SQL, schema).
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Local persistent store of resource records.
#[async_trait]
pub trait Store: Send + Sync {
    /// Whether a record of `resource_type` with natural key `sid` is stored.
    async fn exists(&self, resource_type: ResourceType, sid: &Sid) -> Result<bool, StoreError>;

    /// Insert a resolved record, returning its new local id.
    async fn insert(&self, record: &ResolvedRecord) -> Result<LocalId, StoreError>;

    /// Local id of the stored record with natural key `sid`, if any.
    async fn find_id(
        &self,
        resource_type: ResourceType,
        sid: &Sid,
    ) -> Result<Option<LocalId>, StoreError>;
}
