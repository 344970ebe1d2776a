//! Durable response queue for survey-sync
//!
//! This module defines the response store trait and its SQLite implementation.

pub mod migrations;
pub mod sqlite;

pub use sqlite::SqliteResponseStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{ResponseRecord, ResponseStatus};

/// Store trait for durable response persistence
///
/// All operations are transactional with at most one writer at a time per
/// id; committed writes are observable after process restart. The sync
/// engine is the only mutator of `status`, `retry_count`,
/// `last_attempt_at`, and `media_paths`; cleanup is the only deleter.
///
/// It uses `async_trait` for async methods and `mockall::automock` for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Insert a response record, replacing any existing row with the same id
    async fn insert_or_replace(&self, record: &ResponseRecord) -> Result<(), StoreError>;

    /// Get a response record by id
    async fn get_by_id(&self, id: &str) -> Result<Option<ResponseRecord>, StoreError>;

    /// Get all records awaiting upload
    ///
    /// Returns records with status `pending` or `failed_retryable`, ordered
    /// by `created_at` ascending with ties broken by `id`.
    async fn get_pending(&self) -> Result<Vec<ResponseRecord>, StoreError>;

    /// Atomically update a record's sync fields
    ///
    /// No-op when the id does not exist.
    async fn update_status(
        &self,
        id: &str,
        status: ResponseStatus,
        retry_count: u32,
        last_attempt_at: Option<i64>,
    ) -> Result<(), StoreError>;

    /// Atomically mark a record synced and clear its media paths
    async fn mark_synced(&self, id: &str) -> Result<(), StoreError>;

    /// Delete synced records created before the cutoff timestamp
    ///
    /// Returns the number of deleted rows.
    async fn delete_synced_before(&self, cutoff_ms: i64) -> Result<u64, StoreError>;

    /// Get the total number of rows across all statuses
    async fn count(&self) -> Result<u64, StoreError>;
}
