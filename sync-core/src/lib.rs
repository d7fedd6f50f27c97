//! # sync-core
//!
//! Pure synchronization logic (no I/O, instant tests).
//!
//! This crate implements the decisions the sync engine makes for every
//! record without performing any network or store access:
//! - [`classify`] - active vs terminal status of a record
//! - [`cursor`] - offset bookkeeping for new-item discovery
//! - [`active`] - in-flight record tracking and state transitions
//! - [`order`] - topological processing order of resource types
//! - [`state`] - per-type state carried between cycles
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. The actual I/O (remote fetches, store writes) is
//! performed by `sync-client`, which drives these components.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod active;
pub mod classify;
pub mod cursor;
pub mod order;
pub mod state;

pub use active::{transition, ActiveSet, Transition};
pub use classify::{classify, Classification, ACTIVE_STATUSES};
pub use cursor::{OffsetScan, SyncCursor};
pub use order::{resource_order, topological_order, OrderError};
pub use state::{EngineState, ResourceState};
