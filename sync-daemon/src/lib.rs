//! # sync-daemon
//!
//! Long-running process that mirrors a telephony account into SQLite.
//!
//! This crate wires the sync engine to real adapters:
//! - A REST fetcher for the vendor API (basic auth, paged listings)
//! - A SQLite store with one table per resource type
//! - A recording downloader run after each new recording row
//! - Optional health and Prometheus endpoints
//!
//! ## Architecture
//!
//! ```text
//!  vendor REST API
//!        │  GET …/Calls.json?PageSize=50&Page=N
//!        ▼
//!  ┌─────────────┐   run_cycle   ┌──────────────┐
//!  │ HttpFetcher │──────────────►│  SyncEngine  │
//!  └─────────────┘               └──────┬───────┘
//!                                       │ insert / find_id
//!                          ┌────────────┼────────────┐
//!                          ▼            ▼            ▼
//!                    SqliteStore   state.json   recordings/
//! ```
//!
//! The engine itself lives in `sync-client`; this crate only assembles
//! and drives it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod config;
pub mod daemon;
pub mod error;
pub mod http;
pub mod recordings;
pub mod runner;
pub mod state;
pub mod storage;

pub use config::Config;
pub use error::{DaemonError, Result};
