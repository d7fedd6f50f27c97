//! Record shapes flowing through the synchronization pipeline.
//!
//! ```text
//! RawRecord ──resolve──► ResolvedRecord ──insert──► PersistedRecord
//! ```

use crate::error::SchemaError;
use crate::ids::{LocalId, Sid};
use crate::resource::ResourceType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One resource instance exactly as delivered by the remote source.
///
/// Immutable once built. Construction checks that the natural key for the
/// given type is present, so [`RawRecord::sid`] never fails afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    sid: Sid,
    fields: Map<String, Value>,
}

impl RawRecord {
    /// Build a record of `resource_type` from a JSON object.
    pub fn from_json(resource_type: ResourceType, value: Value) -> Result<Self, SchemaError> {
        match value {
            Value::Object(fields) => Self::from_fields(resource_type, fields),
            _ => Err(SchemaError::NotAnObject { resource_type }),
        }
    }

    /// Build a record of `resource_type` from a field map.
    pub fn from_fields(
        resource_type: ResourceType,
        fields: Map<String, Value>,
    ) -> Result<Self, SchemaError> {
        let key_field = resource_type.descriptor().natural_key;
        let sid = match fields.get(key_field) {
            Some(Value::String(s)) if !s.is_empty() => Sid::new(s.as_str()),
            _ => {
                return Err(SchemaError::MissingNaturalKey {
                    resource_type,
                    field: key_field,
                })
            }
        };
        Ok(Self { sid, fields })
    }

    /// Natural key of this record.
    pub fn sid(&self) -> &Sid {
        &self.sid
    }

    /// Raw value of a field, if present.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// String value of a field; `None` when absent, null, or not a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Remote `status` field, if any.
    pub fn status(&self) -> Option<&str> {
        self.get_str("status")
    }

    /// All fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Resolved foreign key of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentRef {
    /// Local column name (e.g. `call_id`).
    pub local_key: &'static str,
    /// Parent resource type.
    pub parent: ResourceType,
    /// Local id of the parent; `None` when the raw foreign field was empty.
    pub id: Option<LocalId>,
}

/// A raw record whose foreign natural keys were resolved to local ids.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRecord {
    /// Type of the record.
    pub resource_type: ResourceType,
    /// The raw record.
    pub raw: RawRecord,
    /// One entry per dependency declaration, in declaration order.
    pub parents: Vec<ParentRef>,
}

impl ResolvedRecord {
    /// Natural key of the record.
    pub fn sid(&self) -> &Sid {
        self.raw.sid()
    }

    /// Resolved parent id for a local foreign-key column.
    pub fn parent_id(&self, local_key: &str) -> Option<LocalId> {
        self.parents
            .iter()
            .find(|p| p.local_key == local_key)
            .and_then(|p| p.id)
    }
}

/// A resolved record after insertion into the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedRecord {
    /// Locally assigned id.
    pub local_id: LocalId,
    /// The record as inserted.
    pub record: ResolvedRecord,
}

impl PersistedRecord {
    /// Type of the record.
    pub fn resource_type(&self) -> ResourceType {
        self.record.resource_type
    }

    /// Natural key of the record.
    pub fn sid(&self) -> &Sid {
        self.record.sid()
    }
}
