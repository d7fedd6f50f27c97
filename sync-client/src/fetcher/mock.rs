//! Mock fetcher for testing.
//!
//! Holds an ordered in-memory listing per resource type and serves it in
//! pages. Records can be updated or removed between cycles to simulate
//! remote progress, and failures can be injected. Undecodable entries can
//! be listed too; they count towards `total` but yield no record.

use super::{FetchError, Page, PageFetcher, PageRequest};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use sync_types::{RawRecord, ResourceType, Sid};

/// Mock fetcher for testing.
///
/// Clones share state, so a test can keep a handle while the engine owns
/// another.
#[derive(Debug, Clone)]
pub struct MockFetcher {
    inner: Arc<Mutex<MockFetcherInner>>,
}

#[derive(Debug)]
struct MockFetcherInner {
    page_size: usize,
    listings: HashMap<ResourceType, Vec<Option<RawRecord>>>,
    unsupported: HashSet<ResourceType>,
    fail_next_page: HashMap<ResourceType, String>,
    fail_next_fetch_one: HashMap<Sid, String>,
    page_requests: Vec<(ResourceType, PageRequest)>,
    fetch_one_requests: Vec<(ResourceType, Sid)>,
}

impl MockFetcher {
    /// Create a mock serving pages of `page_size` records.
    pub fn new(page_size: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockFetcherInner {
                page_size: page_size.max(1),
                listings: HashMap::new(),
                unsupported: HashSet::new(),
                fail_next_page: HashMap::new(),
                fail_next_fetch_one: HashMap::new(),
                page_requests: Vec::new(),
                fetch_one_requests: Vec::new(),
            })),
        }
    }

    /// Append a record to the end of the listing of `resource_type`.
    pub fn push(&self, resource_type: ResourceType, record: RawRecord) {
        let mut inner = self.inner.lock().unwrap();
        inner.listings.entry(resource_type).or_default().push(Some(record));
    }

    /// Append an entry that cannot be decoded into a record.
    pub fn push_malformed(&self, resource_type: ResourceType) {
        let mut inner = self.inner.lock().unwrap();
        inner.listings.entry(resource_type).or_default().push(None);
    }

    /// Replace the record with the same natural key, keeping its position.
    ///
    /// Returns false if no such record is listed.
    pub fn update(&self, resource_type: ResourceType, record: RawRecord) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let listing = inner.listings.entry(resource_type).or_default();
        match listing.iter_mut().flatten().find(|r| r.sid() == record.sid()) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Remove a record from the listing (the resource vanished remotely).
    pub fn remove(&self, resource_type: ResourceType, sid: &Sid) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(listing) = inner.listings.get_mut(&resource_type) {
            listing.retain(|r| r.as_ref().map_or(true, |r| r.sid() != sid));
        }
    }

    /// Report `resource_type` as unsupported.
    pub fn mark_unsupported(&self, resource_type: ResourceType) {
        let mut inner = self.inner.lock().unwrap();
        inner.unsupported.insert(resource_type);
    }

    /// Cause the next page fetch of `resource_type` to fail.
    pub fn fail_next_page(&self, resource_type: ResourceType, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_page.insert(resource_type, error.to_string());
    }

    /// Cause the next single-record fetch of `sid` to fail with a transport error.
    pub fn fail_next_fetch_one(&self, sid: &Sid, error: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_fetch_one.insert(sid.clone(), error.to_string());
    }

    /// Page requests received so far for `resource_type`.
    pub fn page_requests(&self, resource_type: ResourceType) -> Vec<PageRequest> {
        let inner = self.inner.lock().unwrap();
        inner
            .page_requests
            .iter()
            .filter(|(t, _)| *t == resource_type)
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Single-record fetches received so far.
    pub fn fetch_one_requests(&self) -> Vec<(ResourceType, Sid)> {
        let inner = self.inner.lock().unwrap();
        inner.fetch_one_requests.clone()
    }

    /// Forget recorded requests.
    pub fn clear_requests(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.page_requests.clear();
        inner.fetch_one_requests.clear();
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new(50)
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    fn supports(&self, resource_type: ResourceType) -> bool {
        let inner = self.inner.lock().unwrap();
        !inner.unsupported.contains(&resource_type)
    }

    async fn fetch_page(
        &self,
        resource_type: ResourceType,
        request: &PageRequest,
    ) -> Result<Page, FetchError> {
        let mut inner = self.inner.lock().unwrap();
        inner.page_requests.push((resource_type, request.clone()));

        // Check for forced failure
        if let Some(error) = inner.fail_next_page.remove(&resource_type) {
            return Err(FetchError::Transport(error));
        }

        let page_size = inner.page_size;
        let listing = inner
            .listings
            .get(&resource_type)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let start = (request.index as usize).saturating_mul(page_size);
        let end = start.saturating_add(page_size).min(listing.len());
        let slice = listing.get(start..end).unwrap_or_default();
        let items: Vec<RawRecord> = slice.iter().flatten().cloned().collect();
        let skipped = (slice.len() - items.len()) as u64;
        let next_page_token = (end < listing.len())
            .then(|| format!("{}?Page={}", resource_type, request.index + 1));

        Ok(Page {
            items,
            total: listing.len() as u64,
            next_page_token,
            skipped,
        })
    }

    async fn fetch_one(
        &self,
        resource_type: ResourceType,
        sid: &Sid,
    ) -> Result<RawRecord, FetchError> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .fetch_one_requests
            .push((resource_type, sid.clone()));

        if let Some(error) = inner.fail_next_fetch_one.remove(sid) {
            return Err(FetchError::Transport(error));
        }

        inner
            .listings
            .get(&resource_type)
            .and_then(|listing| listing.iter().flatten().find(|r| r.sid() == sid))
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                resource_type,
                sid: sid.clone(),
            })
    }
}
