//! Foreign-key resolution.
//!
//! Turns the raw parent natural keys of a record (`call_sid`, ...) into the
//! local ids the store assigned to those parents. A record whose parent is
//! not stored yet cannot be resolved: persisting it would leave an orphan.

use crate::store::{Store, StoreError};
use sync_types::{ParentRef, RawRecord, ResolvedRecord, ResourceType, Sid};
use thiserror::Error;
use tracing::trace;

/// Resolution errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The referenced parent is not in the store yet.
    #[error("missing parent {parent} {sid}")]
    MissingParent {
        /// Type of the missing parent.
        parent: ResourceType,
        /// Natural key of the missing parent.
        sid: Sid,
    },

    /// Store lookup failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolves foreign natural keys against a store.
pub struct DependencyResolver<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> DependencyResolver<'a, S> {
    /// Create a resolver reading from `store`.
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolve every dependency declared for `resource_type`.
    ///
    /// A foreign field that is absent, null, or empty means the record has
    /// no such parent and resolves to `None`.
    pub async fn resolve(
        &self,
        resource_type: ResourceType,
        record: &RawRecord,
    ) -> Result<ResolvedRecord, ResolveError> {
        let dependencies = resource_type.descriptor().dependencies;
        let mut parents = Vec::with_capacity(dependencies.len());

        for dep in dependencies {
            let id = match record.get_str(dep.foreign_field).filter(|s| !s.is_empty()) {
                None => None,
                Some(key) => {
                    let sid = Sid::new(key);
                    match self.store.find_id(dep.parent, &sid).await? {
                        Some(id) => Some(id),
                        None => {
                            return Err(ResolveError::MissingParent {
                                parent: dep.parent,
                                sid,
                            })
                        }
                    }
                }
            };
            trace!(
                resource_type = %resource_type,
                sid = %record.sid(),
                parent = %dep.parent,
                ?id,
                "Resolved dependency"
            );
            parents.push(ParentRef {
                local_key: dep.local_key,
                parent: dep.parent,
                id,
            });
        }

        Ok(ResolvedRecord {
            resource_type,
            raw: record.clone(),
            parents,
        })
    }
}
