//! Response store integration tests
//!
//! Tests the SQLite store contract including:
//! - Durability across a reopen
//! - Pending queue ordering
//! - Atomicity of the synced transition

mod common;

use common::{create_test_store, seed_responses};
use survey_sync::database::{ResponseStore, SqliteResponseStore};
use survey_sync::models::{ResponseRecord, ResponseStatus};

/// Test 1: Committed writes survive a reopen of the same file
#[tokio::test]
async fn test_durability_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("responses.db");
    let path = path.to_str().unwrap();

    {
        let store = SqliteResponseStore::new(path).await.unwrap();
        store
            .insert_or_replace(
                &ResponseRecord::new("response-1", "farmer-1", 1000, r#"{"q1":"yes"}"#)
                    .with_media_paths(vec!["/sdcard/photo-1.jpg".to_string()]),
            )
            .await
            .unwrap();
        store
            .update_status("response-1", ResponseStatus::FailedRetryable, 2, Some(5000))
            .await
            .unwrap();
    }

    // A fresh connection sees the committed state
    let reopened = SqliteResponseStore::new(path).await.unwrap();
    let record = reopened.get_by_id("response-1").await.unwrap().unwrap();

    assert_eq!(record.farmer_id, "farmer-1");
    assert_eq!(record.answers_json, r#"{"q1":"yes"}"#);
    assert_eq!(record.status, ResponseStatus::FailedRetryable);
    assert_eq!(record.retry_count, 2);
    assert_eq!(record.last_attempt_at, Some(5000));
    assert_eq!(record.media_paths, vec!["/sdcard/photo-1.jpg"]);
}

/// Test 2: The pending queue orders by capture time with id tie-breaks
#[tokio::test]
async fn test_pending_queue_ordering() {
    let store = create_test_store().await;

    for (id, created_at) in [
        ("response-b", 10_i64),
        ("response-a", 10),
        ("response-z", 5),
        ("response-m", 20),
    ] {
        store
            .insert_or_replace(&ResponseRecord::new(id, "farmer-1", created_at, "{}"))
            .await
            .unwrap();
    }

    let pending = store.get_pending().await.unwrap();
    let ids: Vec<&str> = pending.iter().map(|r| r.id.as_str()).collect();

    assert_eq!(
        ids,
        vec!["response-z", "response-a", "response-b", "response-m"]
    );
}

/// Test 3: Upsert keeps exactly one row per id
#[tokio::test]
async fn test_upsert_single_row_per_id() {
    let store = create_test_store().await;

    let record = ResponseRecord::new("response-1", "farmer-1", 1000, "{}");
    store.insert_or_replace(&record).await.unwrap();
    store.insert_or_replace(&record).await.unwrap();
    store
        .insert_or_replace(&record.clone().with_retry_count(2))
        .await
        .unwrap();

    assert_eq!(store.count().await.unwrap(), 1);
    let fetched = store.get_by_id("response-1").await.unwrap().unwrap();
    assert_eq!(fetched.retry_count, 2);
}

/// Test 4: mark_synced flips status and clears media in one step
#[tokio::test]
async fn test_mark_synced_is_atomic() {
    let store = create_test_store().await;
    store
        .insert_or_replace(
            &ResponseRecord::new("response-1", "farmer-1", 1000, "{}").with_media_paths(vec![
                "/sdcard/photo-1.jpg".to_string(),
                "/sdcard/audio-1.ogg".to_string(),
            ]),
        )
        .await
        .unwrap();

    store.mark_synced("response-1").await.unwrap();

    let record = store.get_by_id("response-1").await.unwrap().unwrap();
    assert_eq!(record.status, ResponseStatus::Synced);
    assert!(record.media_paths.is_empty());

    // A synced record never reappears in the queue
    assert!(store.get_pending().await.unwrap().is_empty());
}

/// Test 5: Cleanup deletion is restricted to old synced rows
#[tokio::test]
async fn test_delete_synced_before_partition() {
    let store = create_test_store().await;
    seed_responses(&store, 3).await;
    store.mark_synced("response-1").await.unwrap();
    store.mark_synced("response-2").await.unwrap();

    // Cutoff between the two synced rows
    let deleted = store.delete_synced_before(2).await.unwrap();
    assert_eq!(deleted, 1);

    assert!(store.get_by_id("response-1").await.unwrap().is_none());
    assert!(store.get_by_id("response-2").await.unwrap().is_some());
    assert!(store.get_by_id("response-3").await.unwrap().is_some());
    assert_eq!(store.count().await.unwrap(), 2);
}

/// Test 6: Concurrent readers and writers see consistent rows
#[tokio::test]
async fn test_concurrent_access_is_consistent() {
    let store = create_test_store().await;
    seed_responses(&store, 20).await;

    let writer_store = store.clone();
    let writer = tokio::spawn(async move {
        for i in 1..=20 {
            writer_store
                .update_status(
                    &format!("response-{}", i),
                    ResponseStatus::FailedRetryable,
                    1,
                    Some(1000),
                )
                .await
                .unwrap();
        }
    });

    let reader_store = store.clone();
    let reader = tokio::spawn(async move {
        for _ in 0..20 {
            for record in reader_store.get_pending().await.unwrap() {
                // Either pre-state or post-state, never torn values
                match record.status {
                    ResponseStatus::Pending => {
                        assert_eq!(record.retry_count, 0);
                        assert!(record.last_attempt_at.is_none());
                    }
                    ResponseStatus::FailedRetryable => {
                        assert_eq!(record.retry_count, 1);
                        assert_eq!(record.last_attempt_at, Some(1000));
                    }
                    other => panic!("Unexpected status: {}", other),
                }
            }
        }
    });

    writer.await.unwrap();
    reader.await.unwrap();
}
