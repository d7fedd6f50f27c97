//! Page fetcher abstraction.
//!
//! The engine reads the remote collection through this trait and never
//! sees the transport (HTTP, authentication, JSON envelopes).
//!
//! # Design
//!
//! The fetcher is async and stateless from the engine's point of view:
//! - `fetch_page()` returns one page of the ordered listing of a type
//! - `fetch_one()` re-fetches a single record by natural key
//! - `supports()` lets an adapter declare types it cannot list
//!
//! Ordering must be stable across calls within one cycle; the engine's
//! offset bookkeeping depends on it.
//!
//! # Example
//!
//! ```ignore
//! let fetcher = MockFetcher::new(50);
//! fetcher.push(ResourceType::Call, call_record);
//! let page = fetcher.fetch_page(ResourceType::Call, &PageRequest::first()).await?;
//! ```

mod mock;

pub use mock::MockFetcher;

use async_trait::async_trait;
use sync_types::{RawRecord, ResourceType, Sid};
use thiserror::Error;

/// Fetch errors.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transient transport failure; retried next cycle.
    #[error("transport error: {0}")]
    Transport(String),

    /// The resource no longer exists remotely.
    #[error("{resource_type} {sid} not found")]
    NotFound {
        /// Type of the missing resource.
        resource_type: ResourceType,
        /// Natural key of the missing resource.
        sid: Sid,
    },

    /// The response could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Position of a page in the ordered listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page index.
    pub index: u32,
    /// Continuation token returned with the previous page, if any.
    pub token: Option<String>,
}

impl PageRequest {
    /// Request for page 0.
    pub fn first() -> Self {
        Self::default()
    }

    /// Request for the page following this one.
    pub fn next(&self, token: String) -> Self {
        Self {
            index: self.index + 1,
            token: Some(token),
        }
    }
}

/// One page of the ordered listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Records of this page, in listing order.
    pub items: Vec<RawRecord>,
    /// Total number of records in the whole listing.
    pub total: u64,
    /// Continuation marker; `None` on the last page.
    pub next_page_token: Option<String>,
    /// Listing entries on this page that could not be decoded.
    ///
    /// They still occupy positions counted in `total`.
    pub skipped: u64,
}

/// Remote source of resource records.
///
/// Implementations handle the underlying transport (REST API, mock, etc).
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Whether this fetcher can list `resource_type`.
    fn supports(&self, _resource_type: ResourceType) -> bool {
        true
    }

    /// Fetch one page of the listing of `resource_type`.
    async fn fetch_page(
        &self,
        resource_type: ResourceType,
        request: &PageRequest,
    ) -> Result<Page, FetchError>;

    /// Fetch a single record by natural key.
    async fn fetch_one(&self, resource_type: ResourceType, sid: &Sid)
        -> Result<RawRecord, FetchError>;
}
