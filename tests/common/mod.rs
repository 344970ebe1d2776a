//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use survey_sync::config::SyncConfig;
use survey_sync::database::{ResponseStore, SqliteResponseStore};
use survey_sync::error::UploadError;
use survey_sync::models::ResponseRecord;
use survey_sync::sync::{FileSink, SyncEngine, TimeProvider, Uploader};

/// Create an in-memory store for testing
pub async fn create_test_store() -> Arc<SqliteResponseStore> {
    Arc::new(
        SqliteResponseStore::in_memory()
            .await
            .expect("Failed to create test store"),
    )
}

/// Seed `count` pending records named response-1..count with created_at 1..count
pub async fn seed_responses(store: &SqliteResponseStore, count: usize) {
    for i in 1..=count {
        store
            .insert_or_replace(&ResponseRecord::new(
                format!("response-{}", i),
                format!("farmer-{}", i),
                i as i64,
                r#"{"q1":"yes"}"#,
            ))
            .await
            .expect("Failed to seed record");
    }
}

/// Ids response-1..=n
pub fn response_ids(range: std::ops::RangeInclusive<usize>) -> Vec<String> {
    range.map(|i| format!("response-{}", i)).collect()
}

/// Scriptable uploader tracking call counts and upload order
///
/// Failures can be scripted per record id or from a call index onward;
/// unscripted uploads succeed.
pub struct ScriptedUploader {
    fail_for: HashMap<String, UploadError>,
    fail_from_call: Option<(u32, UploadError)>,
    delay: Option<Duration>,
    calls: AtomicU32,
    seen: Mutex<Vec<String>>,
}

impl ScriptedUploader {
    pub fn ok() -> Self {
        Self {
            fail_for: HashMap::new(),
            fail_from_call: None,
            delay: None,
            calls: AtomicU32::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_for(mut self, id: &str, err: UploadError) -> Self {
        self.fail_for.insert(id.to_string(), err);
        self
    }

    pub fn fail_from_call(mut self, call: u32, err: UploadError) -> Self {
        self.fail_from_call = Some((call, err));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Uploader for ScriptedUploader {
    async fn upload(&self, record: &ResponseRecord) -> Result<(), UploadError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().unwrap().push(record.id.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some((from, err)) = &self.fail_from_call {
            if call >= *from {
                return Err(err.clone());
            }
        }
        if let Some(err) = self.fail_for.get(&record.id) {
            return Err(err.clone());
        }

        Ok(())
    }
}

/// File sink recording every deletion request
#[derive(Default)]
pub struct RecordingFileSink {
    deleted: Mutex<Vec<String>>,
}

impl RecordingFileSink {
    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileSink for RecordingFileSink {
    async fn delete_files(&self, paths: &[String]) -> usize {
        self.deleted.lock().unwrap().extend_from_slice(paths);
        paths.len()
    }
}

/// Clock returning a scripted instant
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn at(millis: i64) -> Self {
        Self(AtomicI64::new(millis))
    }

    pub fn advance(&self, millis: i64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl TimeProvider for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Wire a test engine around scripted collaborators
pub fn create_test_engine(
    store: Arc<SqliteResponseStore>,
    uploader: Arc<ScriptedUploader>,
    config: SyncConfig,
) -> (SyncEngine, Arc<RecordingFileSink>, Arc<ManualClock>) {
    let sink = Arc::new(RecordingFileSink::default());
    let clock = Arc::new(ManualClock::at(100_000));
    let engine = SyncEngine::new(store, uploader, sink.clone(), clock.clone(), config);
    (engine, sink, clock)
}
