//! Sync engine for draining the response queue
//!
//! This module provides the orchestrator that reads the pending snapshot,
//! uploads records one by one in capture order, applies the per-record
//! state machine, and decides when a degraded network makes further
//! attempts pointless.
//!
//! Concurrent `sync()` callers are coalesced onto a single in-progress
//! drain through a short critical section guarding a shared drain handle;
//! every caller receives the identical result.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use super::backoff;
use super::clock::{SystemTimeProvider, TimeProvider};
use super::media::{FileSink, FilesystemFileSink};
use super::uploader::Uploader;
use crate::config::SyncConfig;
use crate::database::ResponseStore;
use crate::error::{RetryableError, UploadError};
use crate::models::ResponseStatus;

/// Outcome of one drain
///
/// The three id lists partition the pending snapshot taken at drain start:
/// every snapshotted id lands in exactly one of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncResult {
    /// Ids uploaded and marked synced during this drain
    pub succeeded: Vec<String>,
    /// Ids whose upload failed during this drain
    pub failed: Vec<String>,
    /// Ids left unattempted (early stop, cancellation, or store failure)
    pub pending: Vec<String>,
    /// Why the drain ended before exhausting the snapshot, if it did
    pub stop_reason: Option<StopReason>,
}

impl SyncResult {
    /// Result of a drain that had nothing to do
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Why a drain surrendered before exhausting its snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// Too many back-to-back retryable failures; carries the count
    NetworkDegradation(u32),
    /// An error that makes further attempts pointless this run
    FatalError(UploadError),
    /// The hosting context cancelled the drain
    Cancelled,
}

/// Handle for cancelling an in-flight drain
///
/// Cancellation takes effect at the engine's suspension points; the record
/// whose upload is interrupted keeps its prior status.
#[derive(Clone)]
pub struct CancelHandle {
    tx: broadcast::Sender<()>,
}

impl CancelHandle {
    /// Cancel the drain currently in flight, if any
    pub fn cancel(&self) {
        let _ = self.tx.send(());
    }
}

type SharedDrain = Shared<BoxFuture<'static, SyncResult>>;

struct EngineInner {
    store: Arc<dyn ResponseStore>,
    uploader: Arc<dyn Uploader>,
    file_sink: Arc<dyn FileSink>,
    clock: Arc<dyn TimeProvider>,
    config: SyncConfig,
    cancel_tx: broadcast::Sender<()>,
}

/// Sync engine draining captured responses to the remote service
///
/// Cheap to clone; clones share the same single-flight gate.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
    in_flight: Arc<Mutex<Option<SharedDrain>>>,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// All collaborators are taken by construction; the engine holds no
    /// process-wide state.
    pub fn new(
        store: Arc<dyn ResponseStore>,
        uploader: Arc<dyn Uploader>,
        file_sink: Arc<dyn FileSink>,
        clock: Arc<dyn TimeProvider>,
        config: SyncConfig,
    ) -> Self {
        let (cancel_tx, _) = broadcast::channel(1);

        Self {
            inner: Arc::new(EngineInner {
                store,
                uploader,
                file_sink,
                clock,
                config,
                cancel_tx,
            }),
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Create a sync engine with the filesystem file sink and system clock
    pub fn with_system_defaults(
        store: Arc<dyn ResponseStore>,
        uploader: Arc<dyn Uploader>,
        config: SyncConfig,
    ) -> Self {
        Self::new(
            store,
            uploader,
            Arc::new(FilesystemFileSink),
            Arc::new(SystemTimeProvider),
            config,
        )
    }

    /// Get a handle for cancelling in-flight drains
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: self.inner.cancel_tx.clone(),
        }
    }

    /// Get the engine configuration
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Suggested delay before re-attempting a record, for external schedulers
    ///
    /// The drain itself never sleeps; see [`backoff::backoff_delay`].
    pub fn backoff_delay(&self, retry_count: u32) -> Duration {
        backoff::backoff_delay(&self.inner.config, retry_count)
    }

    /// Drain the pending queue once
    ///
    /// If a drain is already in flight this call attaches to it and returns
    /// the same result as every other attached caller, without issuing any
    /// additional uploads.
    pub async fn sync(&self) -> SyncResult {
        let drain = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.as_ref() {
                // Join the drain still in progress
                Some(existing) if existing.peek().is_none() => existing.clone(),
                // Start a fresh drain; also covers a completed handle not
                // yet cleared by its awaiters
                _ => {
                    debug!("Starting new sync drain");
                    let shared = Self::drain(Arc::clone(&self.inner)).boxed().shared();
                    *in_flight = Some(shared.clone());
                    shared
                }
            }
        };

        // Await outside the gate so attached callers never hold it
        let result = drain.await;

        // Clear the slot only when the drain occupying it has completed;
        // a newer in-progress drain is left alone
        let mut in_flight = self.in_flight.lock().await;
        if in_flight
            .as_ref()
            .is_some_and(|current| current.peek().is_some())
        {
            *in_flight = None;
        }

        result
    }

    async fn drain(inner: Arc<EngineInner>) -> SyncResult {
        let mut cancel_rx = inner.cancel_tx.subscribe();

        let pending = match inner.store.get_pending().await {
            Ok(pending) => pending,
            Err(err) => {
                error!(error = %err, "Failed to read the pending queue");
                return SyncResult {
                    stop_reason: Some(StopReason::FatalError(UploadError::Unknown(
                        err.to_string(),
                    ))),
                    ..SyncResult::empty()
                };
            }
        };

        if pending.is_empty() {
            debug!("No pending responses to sync");
            return SyncResult::empty();
        }

        info!(count = pending.len(), "Starting sync drain");

        let mut succeeded: Vec<String> = Vec::new();
        let mut failed: Vec<String> = Vec::new();
        let mut remaining: VecDeque<String> = pending.iter().map(|r| r.id.clone()).collect();
        let mut consecutive: u32 = 0;
        let mut stop_reason: Option<StopReason> = None;

        for record in &pending {
            // The id leaves the pending set before the attempt is issued
            let Some(id) = remaining.pop_front() else {
                break;
            };

            let outcome = tokio::select! {
                biased;
                _ = cancel_rx.recv() => {
                    // The interrupted record keeps its prior status
                    remaining.push_front(id);
                    stop_reason = Some(StopReason::Cancelled);
                    info!("Sync drain cancelled");
                    break;
                }
                outcome = inner.uploader.upload(record) => outcome,
            };

            match outcome {
                Ok(()) => {
                    if let Err(err) = inner.store.mark_synced(&id).await {
                        error!(id = id.as_str(), error = %err, "Store write failed, aborting drain");
                        remaining.push_front(id);
                        stop_reason = Some(StopReason::FatalError(UploadError::Unknown(
                            err.to_string(),
                        )));
                        break;
                    }

                    if !record.media_paths.is_empty() {
                        // Best-effort; a leftover file never fails the sync
                        let removed = inner.file_sink.delete_files(&record.media_paths).await;
                        debug!(
                            id = id.as_str(),
                            removed,
                            total = record.media_paths.len(),
                            "Deleted synced media"
                        );
                    }

                    debug!(id = id.as_str(), "Response synced");
                    succeeded.push(id);
                    consecutive = 0;
                }
                Err(err) => {
                    let attempted_at = inner.clock.now_millis();
                    let retry_count = record.retry_count + 1;
                    let status = if err.is_retryable() && retry_count < inner.config.max_retry_count
                    {
                        ResponseStatus::FailedRetryable
                    } else {
                        ResponseStatus::FailedPermanent
                    };

                    if let Err(store_err) = inner
                        .store
                        .update_status(&id, status, retry_count, Some(attempted_at))
                        .await
                    {
                        error!(id = id.as_str(), error = %store_err, "Store write failed, aborting drain");
                        remaining.push_front(id);
                        stop_reason = Some(StopReason::FatalError(UploadError::Unknown(
                            store_err.to_string(),
                        )));
                        break;
                    }

                    warn!(
                        id = id.as_str(),
                        error = %err,
                        retry_count,
                        status = %status,
                        "Upload failed"
                    );
                    failed.push(id);

                    if err.is_retryable() {
                        consecutive += 1;
                    } else {
                        consecutive = 0;
                    }

                    if let Some(reason) = evaluate_early_stop(
                        &err,
                        consecutive,
                        inner.config.consecutive_failure_threshold,
                    ) {
                        info!(reason = ?reason, "Early stop triggered");
                        stop_reason = Some(reason);
                        break;
                    }
                }
            }
        }

        let result = SyncResult {
            succeeded,
            failed,
            pending: remaining.into_iter().collect(),
            stop_reason,
        };

        info!(
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            pending = result.pending.len(),
            "Sync drain finished"
        );

        result
    }
}

/// Decide whether the drain should surrender after a failed attempt
///
/// `NoInternet` is evidence that nothing can succeed this run and stops
/// immediately. Timeouts and 5xx responses might be isolated, so they are
/// granted `threshold` consecutive attempts before the drain concedes.
fn evaluate_early_stop(
    err: &UploadError,
    consecutive: u32,
    threshold: u32,
) -> Option<StopReason> {
    match err {
        UploadError::NoInternet => Some(StopReason::FatalError(UploadError::NoInternet)),
        UploadError::Timeout if consecutive >= threshold => {
            Some(StopReason::NetworkDegradation(consecutive))
        }
        UploadError::ServerError { code, .. }
            if (500..=599).contains(code) && consecutive >= threshold =>
        {
            Some(StopReason::NetworkDegradation(consecutive))
        }
        _ => None,
    }
}
