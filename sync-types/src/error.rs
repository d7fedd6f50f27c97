//! Error types for resource schema handling.

use crate::resource::ResourceType;
use thiserror::Error;

/// Errors raised when a remote payload does not fit the resource schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Unknown resource type tag
    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),

    /// Payload is not a JSON object
    #[error("{resource_type} payload is not a JSON object")]
    NotAnObject {
        /// Type the payload was decoded as.
        resource_type: ResourceType,
    },

    /// Natural key missing, null or empty
    #[error("{resource_type} record has no natural key field `{field}`")]
    MissingNaturalKey {
        /// Type the payload was decoded as.
        resource_type: ResourceType,
        /// Expected key field.
        field: &'static str,
    },
}
