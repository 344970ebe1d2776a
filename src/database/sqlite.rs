//! SQLite implementation of the ResponseStore trait
//!
//! This module provides a SQLite-based implementation of the ResponseStore
//! trait using rusqlite and tokio-rusqlite for async operations.

use async_trait::async_trait;
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use super::migrations::CREATE_SCHEMA;
use super::ResponseStore;
use crate::error::StoreError;
use crate::models::{ResponseRecord, ResponseStatus};

/// Columns selected for every record read, in `map_record_row` order
const RECORD_COLUMNS: &str =
    "id, farmer_id, created_at, answers_json, status, retry_count, last_attempt_at, media_paths";

/// SQLite response store implementation
pub struct SqliteResponseStore {
    conn: Connection,
}

impl SqliteResponseStore {
    /// Create a new SQLite store
    ///
    /// Use `:memory:` for an in-memory database or a file path for
    /// persistent storage.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path).await?;

        // Run migrations
        conn.call(|conn| {
            conn.execute_batch(CREATE_SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    /// Create a new in-memory store (useful for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:").await
    }
}

#[async_trait]
impl ResponseStore for SqliteResponseStore {
    async fn insert_or_replace(&self, record: &ResponseRecord) -> Result<(), StoreError> {
        let id = record.id.clone();
        let farmer_id = record.farmer_id.clone();
        let created_at = record.created_at;
        let answers_json = record.answers_json.clone();
        let status = record.status.to_string();
        let retry_count = record.retry_count;
        let last_attempt_at = record.last_attempt_at;
        let media_paths =
            serde_json::to_string(&record.media_paths).unwrap_or_else(|_| "[]".to_string());

        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT OR REPLACE INTO survey_responses
                    (id, farmer_id, created_at, answers_json, status, retry_count, last_attempt_at, media_paths)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                    rusqlite::params![
                        id,
                        farmer_id,
                        created_at,
                        answers_json,
                        status,
                        retry_count,
                        last_attempt_at,
                        media_paths
                    ],
                )?;
                Ok(())
            })
            .await?;

        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<ResponseRecord>, StoreError> {
        let id = id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {RECORD_COLUMNS} FROM survey_responses WHERE id = ?1"
                ))?;

                let result = stmt.query_row([&id], map_record_row).optional()?;

                Ok(result)
            })
            .await
            .map_err(Into::into)
    }

    async fn get_pending(&self) -> Result<Vec<ResponseRecord>, StoreError> {
        self.conn
            .call(|conn| {
                let mut stmt = conn.prepare(&format!(
                    r#"
                    SELECT {RECORD_COLUMNS}
                    FROM survey_responses
                    WHERE status IN ('pending', 'failed_retryable')
                    ORDER BY created_at ASC, id ASC
                    "#
                ))?;

                let records = stmt
                    .query_map([], map_record_row)?
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(records)
            })
            .await
            .map_err(Into::into)
    }

    async fn update_status(
        &self,
        id: &str,
        status: ResponseStatus,
        retry_count: u32,
        last_attempt_at: Option<i64>,
    ) -> Result<(), StoreError> {
        let id = id.to_string();
        let status = status.to_string();

        self.conn
            .call(move |conn| {
                // No-op when the id is missing
                conn.execute(
                    r#"
                    UPDATE survey_responses
                    SET status = ?1, retry_count = ?2, last_attempt_at = ?3
                    WHERE id = ?4
                    "#,
                    rusqlite::params![status, retry_count, last_attempt_at, id],
                )?;
                Ok(())
            })
            .await?;

        Ok(())
    }

    async fn mark_synced(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        let status = ResponseStatus::Synced.to_string();

        self.conn
            .call(move |conn| {
                // Status change and media clearing commit together
                conn.execute(
                    "UPDATE survey_responses SET status = ?1, media_paths = '[]' WHERE id = ?2",
                    rusqlite::params![status, id],
                )?;
                Ok(())
            })
            .await?;

        Ok(())
    }

    async fn delete_synced_before(&self, cutoff_ms: i64) -> Result<u64, StoreError> {
        let status = ResponseStatus::Synced.to_string();

        self.conn
            .call(move |conn| {
                let count = conn.execute(
                    "DELETE FROM survey_responses WHERE status = ?1 AND created_at < ?2",
                    rusqlite::params![status, cutoff_ms],
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Into::into)
    }

    async fn count(&self) -> Result<u64, StoreError> {
        self.conn
            .call(|conn| {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM survey_responses", [], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Into::into)
    }
}

/// Map a row in `RECORD_COLUMNS` order to a ResponseRecord
fn map_record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ResponseRecord> {
    let status: ResponseStatus = row.get::<_, String>(4)?.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
    })?;

    let media_paths: Vec<String> =
        serde_json::from_str(&row.get::<_, String>(7)?).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(ResponseRecord {
        id: row.get(0)?,
        farmer_id: row.get(1)?,
        created_at: row.get(2)?,
        answers_json: row.get(3)?,
        status,
        retry_count: row.get(5)?,
        last_attempt_at: row.get(6)?,
        media_paths,
    })
}
