//! # sync-types
//!
//! Data model for telephony resource synchronization.
//!
//! This crate provides the foundational types used across all workspace crates:
//! - [`ResourceType`], [`ResourceDescriptor`] - Static per-type schema and dependency table
//! - [`Sid`], [`LocalId`] - Natural keys and local row ids
//! - [`RawRecord`], [`ResolvedRecord`], [`PersistedRecord`] - Record pipeline stages
//! - [`SchemaError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod ids;
mod record;
mod resource;

pub use error::SchemaError;
pub use ids::{LocalId, Sid};
pub use record::{ParentRef, PersistedRecord, RawRecord, ResolvedRecord};
pub use resource::{Dependency, Field, FieldKind, ResourceDescriptor, ResourceType};
