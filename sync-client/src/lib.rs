//! # sync-client
//!
//! Synchronization engine for telephony resource records.
//!
//! This is the library the daemon drives: it pulls records from a remote
//! listing and persists each one exactly once, in a terminal state, after
//! its parents.
//!
//! ## Features
//!
//! - **Active tracking**: in-flight calls and messages are re-checked every
//!   cycle until they reach a terminal status
//! - **Offset discovery**: new records are found by a committed offset that
//!   never skips a deferred record
//! - **Dependency ordering**: types are processed parents-first, and a child
//!   whose parent is missing waits for the next cycle
//! - **Pluggable collaborators**: [`PageFetcher`], [`Store`] and
//!   [`DependentAction`] traits, with in-memory doubles for tests
//!
//! ## Example
//!
//! ```ignore
//! use sync_client::{MemoryStore, MockFetcher, SyncEngine};
//! use sync_types::ResourceType;
//!
//! let fetcher = MockFetcher::new(50);
//! let store = MemoryStore::new();
//! let mut engine = SyncEngine::new(fetcher, store, &[ResourceType::Account, ResourceType::Call])?;
//!
//! let report = engine.run_cycle().await;
//! println!("inserted {}", report.inserted());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dispatch;
pub mod engine;
pub mod fetcher;
pub mod report;
pub mod resolver;
pub mod store;

pub use dispatch::{ActionDispatcher, ActionError, DependentAction, DispatchSummary};
pub use engine::{persist, EngineError, PersistOutcome, SyncEngine};
pub use fetcher::{FetchError, MockFetcher, Page, PageFetcher, PageRequest};
pub use report::{CycleReport, ResourceReport};
pub use resolver::{DependencyResolver, ResolveError};
pub use store::{MemoryStore, Store, StoreError};
