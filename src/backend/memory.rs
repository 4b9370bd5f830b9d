/// In-memory record store
///
/// Keeps every class in its own map behind a tokio RwLock. Counts lookups so
/// callers can assert how many round-trips a validation made.

use crate::backend::{Backend, Record};
use crate::error::BackendError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct MemoryBackend {
    /// class_name -> (id -> record)
    tables: RwLock<HashMap<String, HashMap<String, Record>>>,
    /// Number of `lookup_by_id` calls served
    lookups: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record, stamping it as saved
    pub async fn insert(&self, record: Record) -> Record {
        let mut record = record;
        let now = chrono::Utc::now();
        record.stamp(now, now);

        let mut tables = self.tables.write().await;
        tables
            .entry(record.class_name().to_string())
            .or_default()
            .insert(record.id().to_string(), record.clone());
        record
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of records stored in a class
    pub async fn count(&self, class_name: &str) -> usize {
        self.tables
            .read()
            .await
            .get(class_name)
            .map(HashMap::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn lookup_by_id(&self, class_name: &str, id: &str) -> Result<Record, BackendError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);

        let tables = self.tables.read().await;
        tables
            .get(class_name)
            .and_then(|table| table.get(id))
            .cloned()
            .ok_or_else(|| BackendError::NotFound {
                class_name: class_name.to_string(),
                id: id.to_string(),
            })
    }

    async fn save(&self, record: &Record) -> Result<Record, BackendError> {
        let mut tables = self.tables.write().await;
        let table = tables.entry(record.class_name().to_string()).or_default();

        let now = chrono::Utc::now();
        let created_at = table
            .get(record.id())
            .and_then(Record::created_at)
            .unwrap_or(now);

        let mut stored = record.clone();
        stored.stamp(created_at, now);
        table.insert(stored.id().to_string(), stored.clone());

        tracing::debug!("💾 Saved {}/{} to memory backend", stored.class_name(), stored.id());
        Ok(stored)
    }
}
