//! Retention cleanup for synced responses
//!
//! Synced rows are kept for a retention window so field staff can review
//! recent submissions, then deleted to reclaim storage. Cleanup touches
//! only the `synced` partition and therefore never races the drain, which
//! selects from the other statuses.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::SyncConfig;
use crate::database::ResponseStore;
use crate::error::StoreError;
use crate::sync::clock::TimeProvider;

/// Retention policy deleting old synced responses
pub struct CleanupPolicy {
    store: Arc<dyn ResponseStore>,
    clock: Arc<dyn TimeProvider>,
    config: SyncConfig,
}

impl CleanupPolicy {
    /// Create a new cleanup policy
    pub fn new(
        store: Arc<dyn ResponseStore>,
        clock: Arc<dyn TimeProvider>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Delete synced responses older than the retention window
    ///
    /// Returns the number of deleted rows.
    pub async fn cleanup_old_synced(&self) -> Result<u64, StoreError> {
        let cutoff = self.clock.now_millis() - self.config.retention_window_ms;
        let deleted = self.store.delete_synced_before(cutoff).await?;

        if deleted > 0 {
            info!(deleted, cutoff, "Deleted old synced responses");
        } else {
            debug!(cutoff, "No synced responses past retention");
        }

        Ok(deleted)
    }

    /// Whether the caller should run cleanup given the current queue size
    pub fn should_trigger_cleanup(&self, pending_count: u64) -> bool {
        pending_count >= self.config.cleanup_threshold
    }
}
