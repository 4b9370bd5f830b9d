/// Error catalog for entity construction, validation and persistence
///
/// Every failure a caller can observe is one of these variants. Validators build
/// them through the constructor functions below so messages stay uniform.

use thiserror::Error;

/// Failures raised by a backend collaborator
#[derive(Debug, Error)]
pub enum BackendError {
    /// No record with this id exists in the class
    #[error("record \"{id}\" not found in class \"{class_name}\"")]
    NotFound { class_name: String, id: String },

    /// Storage layer failure (connection, query, constraint)
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Stored record fields could not be encoded or decoded
    #[error("record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// Any other backend-specific failure
    #[error("backend error: {0}")]
    Other(String),
}

/// Failures surfaced by entity construction, property access and save
#[derive(Debug, Error)]
pub enum EntityError {
    /// No entity implementation is registered for a class name
    #[error("no entity implementation registered for class \"{class_name}\"")]
    InterfaceNotImplemented { class_name: String },

    /// Input string is not a JSON object
    #[error("JSON schema not valid")]
    InvalidJson,

    #[error("could not find field \"{field}\" for class \"{class_name}\"")]
    FieldNotPresent { field: String, class_name: String },

    #[error("incorrect type for field \"{field}\" of class \"{class_name}\": expected \"{expected}\" but found \"{found}\"")]
    TypeMismatch {
        field: String,
        class_name: String,
        found: String,
        expected: String,
    },

    #[error("record with id \"{id}\" for class \"{class_name}\" not found")]
    ReferenceNotFound { id: String, class_name: String },

    /// A record of one class was handed to an entity of another
    #[error("expected a record of class \"{expected}\" but got \"{actual}\"")]
    ClassMismatch { expected: String, actual: String },

    /// Stored id field disagrees with the record's own id
    #[error("field \"{field}\" of \"{class_name}\" holds id \"{stored}\" but the record id is \"{record_id}\"")]
    IdMismatch {
        field: String,
        class_name: String,
        record_id: String,
        stored: String,
    },

    #[error("property \"{property}\" of \"{class_name}\" cannot be set")]
    ImmutableWrite { class_name: String, property: String },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl EntityError {
    /// No entity registered for `class_name`
    pub fn interface_not_implemented(class_name: &str) -> Self {
        Self::InterfaceNotImplemented {
            class_name: class_name.to_string(),
        }
    }

    /// Required `field` is absent from the payload
    pub fn field_not_present(field: &str, class_name: &str) -> Self {
        Self::FieldNotPresent {
            field: field.to_string(),
            class_name: class_name.to_string(),
        }
    }

    /// `field` holds a `found` JSON type where `expected` was required
    pub fn type_mismatch(field: &str, class_name: &str, found: &str, expected: &str) -> Self {
        Self::TypeMismatch {
            field: field.to_string(),
            class_name: class_name.to_string(),
            found: found.to_string(),
            expected: expected.to_string(),
        }
    }

    /// Referenced `id` does not exist in the target class
    pub fn reference_not_found(id: &str, class_name: &str) -> Self {
        Self::ReferenceNotFound {
            id: id.to_string(),
            class_name: class_name.to_string(),
        }
    }

    /// Record of class `actual` handed to an entity of class `expected`
    pub fn class_mismatch(expected: &str, actual: &str) -> Self {
        Self::ClassMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Stored id `field` disagrees with the record's id
    pub fn id_mismatch(field: &str, class_name: &str, record_id: &str, stored: &str) -> Self {
        Self::IdMismatch {
            field: field.to_string(),
            class_name: class_name.to_string(),
            record_id: record_id.to_string(),
            stored: stored.to_string(),
        }
    }

    /// Write attempted on a read-only `property`
    pub fn immutable_write(class_name: &str, property: &str) -> Self {
        Self::ImmutableWrite {
            class_name: class_name.to_string(),
            property: property.to_string(),
        }
    }
}

/// Convenience alias used across entity code
pub type EntityResult<T> = Result<T, EntityError>;
