/// Backend collaborator interface
///
/// Entities never talk to a datastore directly. They read and write `Record`
/// handles and go through a `Backend` for existence lookups and persistence.
/// Two implementations ship with the crate: an in-memory store and a SQLite
/// store backed by sqlx.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;

use crate::error::BackendError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// One persisted object in a backend class
///
/// Generic get/set over named fields. `created_at`/`updated_at` are assigned
/// by the backend on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    class_name: String,
    id: String,
    fields: Map<String, Value>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Record {
    /// Create an unsaved record with no fields
    pub fn new(class_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            id: id.into(),
            fields: Map::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Builder-style `set`
    pub fn with_field(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Backend class this record belongs to
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Record id, unique within its class
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Value of a field, None when absent
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Set a field, replacing any previous value
    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.fields.insert(field.to_string(), value.into());
    }

    /// All fields as a JSON object
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// First save time, None until saved
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Last save time, None until saved
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Whether a backend has persisted this record at least once
    pub fn is_saved(&self) -> bool {
        self.created_at.is_some()
    }

    pub(crate) fn stamp(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
    }

    /// JSON view used when expanding references during serialization
    pub fn to_json(&self) -> Value {
        json!({
            "class_name": self.class_name,
            "id": self.id,
            "fields": self.fields,
        })
    }
}

/// Capability set consumed from the datastore
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Fetch a record by class and id
    ///
    /// Returns `BackendError::NotFound` when no such record exists.
    async fn lookup_by_id(&self, class_name: &str, id: &str) -> Result<Record, BackendError>;

    /// Persist a record (insert or update) and return the stored copy
    async fn save(&self, record: &Record) -> Result<Record, BackendError>;
}
