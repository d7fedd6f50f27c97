//! In-memory store for testing.

use super::{Store, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use sync_types::{LocalId, ResolvedRecord, ResourceType, Sid};

/// In-memory store.
///
/// Clones share state. Every successful insert is appended to a log so
/// tests can check insertion order across types.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    next_id: i64,
    tables: HashMap<ResourceType, BTreeMap<Sid, (LocalId, ResolvedRecord)>>,
    log: Vec<(ResourceType, Sid)>,
    fail_next_insert: Option<String>,
    fail_next_exists: Option<String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored record with natural key `sid`.
    pub fn get(&self, resource_type: ResourceType, sid: &Sid) -> Option<(LocalId, ResolvedRecord)> {
        let inner = self.inner.lock().unwrap();
        inner
            .tables
            .get(&resource_type)
            .and_then(|t| t.get(sid))
            .cloned()
    }

    /// Number of stored records of `resource_type`.
    pub fn count(&self, resource_type: ResourceType) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.tables.get(&resource_type).map_or(0, BTreeMap::len)
    }

    /// Every successful insert so far, in order.
    pub fn insert_log(&self) -> Vec<(ResourceType, Sid)> {
        let inner = self.inner.lock().unwrap();
        inner.log.clone()
    }

    /// Cause the next insert to fail with a backend error.
    pub fn fail_next_insert(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_insert = Some(error.to_string());
    }

    /// Cause the next existence check to fail with a backend error.
    pub fn fail_next_exists(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_exists = Some(error.to_string());
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn exists(&self, resource_type: ResourceType, sid: &Sid) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_exists.take() {
            return Err(StoreError::Backend(error));
        }
        Ok(inner
            .tables
            .get(&resource_type)
            .is_some_and(|t| t.contains_key(sid)))
    }

    async fn insert(&self, record: &ResolvedRecord) -> Result<LocalId, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_next_insert.take() {
            return Err(StoreError::Backend(error));
        }

        let resource_type = record.resource_type;
        let sid = record.sid().clone();
        if inner
            .tables
            .get(&resource_type)
            .is_some_and(|t| t.contains_key(&sid))
        {
            return Err(StoreError::ConstraintViolation { resource_type, sid });
        }

        inner.next_id += 1;
        let id = LocalId::new(inner.next_id);
        inner
            .tables
            .entry(resource_type)
            .or_default()
            .insert(sid.clone(), (id, record.clone()));
        inner.log.push((resource_type, sid));
        Ok(id)
    }

    async fn find_id(
        &self,
        resource_type: ResourceType,
        sid: &Sid,
    ) -> Result<Option<LocalId>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .tables
            .get(&resource_type)
            .and_then(|t| t.get(sid))
            .map(|(id, _)| *id))
    }
}
