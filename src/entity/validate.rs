/// Validators shared by all entities
///
/// Each validator checks presence, then type, then (for references) existence,
/// and returns the first failing condition.

use crate::{
    backend::{Backend, Record},
    error::{BackendError, EntityError, EntityResult},
    json,
};
use serde_json::{Map, Value};

/// Parsed JSON payload an entity is validated from
pub type RawObject = Map<String, Value>;

/// Validate a field holding the id of a record in `target_class`
///
/// Null is valid and yields None. Non-string values fail before any backend
/// lookup is made.
pub async fn validate_reference_field(
    object: &RawObject,
    field: &str,
    class_name: &str,
    target_class: &str,
    backend: &dyn Backend,
) -> EntityResult<Option<Record>> {
    let id = match object.get(field) {
        None => return Err(EntityError::field_not_present(field, class_name)),
        Some(Value::Null) => return Ok(None),
        Some(Value::String(id)) => id,
        Some(other) => {
            return Err(EntityError::type_mismatch(
                field,
                class_name,
                json::type_name(other),
                "string",
            ))
        }
    };

    match backend.lookup_by_id(target_class, id).await {
        Ok(record) => Ok(Some(record)),
        Err(BackendError::NotFound { .. }) => Err(EntityError::reference_not_found(id, target_class)),
        Err(e) => {
            tracing::error!("❌ Lookup of {}/{} failed: {}", target_class, id, e);
            Err(e.into())
        }
    }
}

pub fn validate_boolean_field(object: &RawObject, field: &str, class_name: &str) -> EntityResult<bool> {
    match object.get(field) {
        None => Err(EntityError::field_not_present(field, class_name)),
        Some(Value::Bool(value)) => Ok(*value),
        Some(other) => Err(EntityError::type_mismatch(
            field,
            class_name,
            json::type_name(other),
            "boolean",
        )),
    }
}
