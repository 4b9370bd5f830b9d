/// SQLite record store
///
/// Every backend class lives in one `records` table keyed by (class_name, id).
/// Record fields are stored as a JSON document so any entity shape fits without
/// schema changes.

use crate::backend::{Backend, Record};
use crate::error::BackendError;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    Row,
};
use std::str::FromStr;

/// SQLite-based record store
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Wrap an existing pool (schema must already exist, see `init_schema`)
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a database URL, creating the file and schema if missing
    pub async fn connect(url: &str) -> Result<Self> {
        tracing::info!("🗄️ Opening record store: {}", url);

        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| anyhow::anyhow!("Invalid database url '{}': {}", url, e))?
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let backend = Self::new(pool);
        backend.init_schema().await?;

        tracing::info!("✅ Record store ready: {}", url);
        Ok(backend)
    }

    /// Private in-memory database on a single connection
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let backend = Self::new(pool);
        backend.init_schema().await?;
        Ok(backend)
    }

    /// Create the records table. Safe to call multiple times.
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS records (
                class_name TEXT NOT NULL,
                id TEXT NOT NULL,
                fields JSON NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (class_name, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_records_updated ON records(class_name, updated_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// All records of a class, most recently updated first
    pub async fn list_records(&self, class_name: &str) -> Result<Vec<Record>, BackendError> {
        let rows = sqlx::query(
            "SELECT class_name, id, fields, created_at, updated_at FROM records WHERE class_name = ? ORDER BY updated_at DESC",
        )
        .bind(class_name)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    /// Delete a record, returning whether it existed
    pub async fn delete_record(&self, class_name: &str, id: &str) -> Result<bool, BackendError> {
        let result = sqlx::query("DELETE FROM records WHERE class_name = ? AND id = ?")
            .bind(class_name)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn record_from_row(row: &SqliteRow) -> Result<Record, BackendError> {
    let class_name: String = row.try_get("class_name")?;
    let id: String = row.try_get("id")?;
    let fields_json: String = row.try_get("fields")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    let fields: Map<String, Value> = serde_json::from_str(&fields_json)?;
    let mut record = Record::new(class_name, id);
    for (field, value) in fields {
        record.set(&field, value);
    }
    record.stamp(parse_timestamp(&created_at)?, parse_timestamp(&updated_at)?);
    Ok(record)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, BackendError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| BackendError::Other(format!("bad timestamp '{}': {}", raw, e)))
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn lookup_by_id(&self, class_name: &str, id: &str) -> Result<Record, BackendError> {
        let row = sqlx::query(
            "SELECT class_name, id, fields, created_at, updated_at FROM records WHERE class_name = ? AND id = ?",
        )
        .bind(class_name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => record_from_row(&row),
            None => Err(BackendError::NotFound {
                class_name: class_name.to_string(),
                id: id.to_string(),
            }),
        }
    }

    /// Uses UPSERT so both insert and update keep the original created_at
    async fn save(&self, record: &Record) -> Result<Record, BackendError> {
        let fields_json = serde_json::to_string(record.fields())?;
        let now = Utc::now().to_rfc3339();

        let row = sqlx::query(
            r#"
            INSERT INTO records (class_name, id, fields, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(class_name, id) DO UPDATE SET
                fields = excluded.fields,
                updated_at = excluded.updated_at
            RETURNING class_name, id, fields, created_at, updated_at
            "#,
        )
        .bind(record.class_name())
        .bind(record.id())
        .bind(&fields_json)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("💾 Saved {}/{} to record store", record.class_name(), record.id());
        record_from_row(&row)
    }
}
