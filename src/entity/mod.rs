/// Entity contract shared by every backend-mapped type
///
/// An entity is built either from a JSON payload, which must pass the entity's
/// validation chain, or from a record already stored in the backend, which is
/// trusted and only decoded. Once built, its fields are read-only; `save` is the
/// only way state flows back to the backend.

pub mod registry;
pub mod validate;

pub use registry::{AnyEntity, EntityRegistry};
pub use validate::{validate_boolean_field, validate_reference_field, RawObject};

use crate::{
    backend::{Backend, Record},
    config::ModelsConfig,
    error::{EntityError, EntityResult},
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Shared collaborators handed to entity construction
#[derive(Debug, Clone)]
pub struct EntityContext {
    backend: Arc<dyn Backend>,
    models: Arc<ModelsConfig>,
}

impl EntityContext {
    pub fn new(backend: Arc<dyn Backend>, models: Arc<ModelsConfig>) -> Self {
        Self { backend, models }
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn models(&self) -> &ModelsConfig {
        &self.models
    }
}

/// What an entity is constructed from
#[derive(Debug, Clone)]
pub enum Source {
    /// Untrusted serialized JSON, validated field by field
    Json(String),
    /// Record already materialized by the backend, copied without re-validation
    Record(Record),
}

impl From<&str> for Source {
    fn from(json_string: &str) -> Self {
        Source::Json(json_string.to_string())
    }
}

impl From<String> for Source {
    fn from(json_string: String) -> Self {
        Source::Json(json_string)
    }
}

impl From<Record> for Source {
    fn from(record: Record) -> Self {
        Source::Record(record)
    }
}

/// Construction and persistence states of an entity
///
/// Construction walks Uninitialized -> ParsingJson -> ValidatingFields -> Validated.
/// A failure in either middle state ends in Rejected and no entity is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    ParsingJson,
    ValidatingFields,
    Validated,
    Saved,
    Rejected,
}

/// Capabilities every backend-mapped entity provides
#[async_trait]
pub trait Entity: Sized + Send + Sync {
    /// Backend class this entity maps to
    fn class_name(models: &ModelsConfig) -> &str;

    /// Decode a trusted backend record. No existence lookups are made.
    fn construct_from_record(record: Record, models: &ModelsConfig) -> EntityResult<Self>;

    /// Parse and validate a JSON payload. The first failing field aborts construction.
    async fn construct_from_json(json_string: &str, ctx: &EntityContext) -> EntityResult<Self>;

    /// Backing record handle
    fn raw_object(&self) -> &Record;

    /// JSON with references as id strings
    fn serialize_with_ids(&self) -> Value;

    /// JSON with resolved references expanded to their records
    fn serialize_with_objects(&self) -> Value;

    /// Write every field into the backing record and persist it
    async fn save(&mut self, backend: &dyn Backend) -> EntityResult<Record>;

    fn lifecycle(&self) -> Lifecycle;
}

/// Build an entity from either source
///
/// Records must belong to the entity's class; a record of another class is
/// refused with `ClassMismatch` before any decoding happens.
pub async fn initialize<E: Entity>(source: impl Into<Source>, ctx: &EntityContext) -> EntityResult<E> {
    let class_name = E::class_name(ctx.models());

    let result = match source.into() {
        Source::Json(json_string) => {
            tracing::debug!("📥 Constructing {} from JSON payload", class_name);
            E::construct_from_json(&json_string, ctx).await
        }
        Source::Record(record) => {
            if record.class_name() != class_name {
                Err(EntityError::class_mismatch(class_name, record.class_name()))
            } else {
                tracing::debug!("📥 Constructing {} from record {}", class_name, record.id());
                E::construct_from_record(record, ctx.models())
            }
        }
    };

    if let Err(e) = &result {
        tracing::warn!("❌ {} construction rejected: {}", class_name, e);
    }
    result
}
