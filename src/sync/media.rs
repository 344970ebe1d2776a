//! Media file deletion for synced responses
//!
//! Once a response reaches the server its captured media (photos, audio) is
//! dead weight on a storage-constrained device. Deletion is best-effort and
//! never fails the enclosing sync.

use async_trait::async_trait;
use tracing::debug;

/// Batch file deletion sink
#[async_trait]
pub trait FileSink: Send + Sync {
    /// Delete the given files, returning how many were actually removed
    ///
    /// Per-file errors (missing file, permissions) are absorbed by the
    /// implementation.
    async fn delete_files(&self, paths: &[String]) -> usize;
}

/// File sink backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FilesystemFileSink;

#[async_trait]
impl FileSink for FilesystemFileSink {
    async fn delete_files(&self, paths: &[String]) -> usize {
        let mut removed = 0;

        for path in paths {
            match tokio::fs::remove_file(path).await {
                Ok(()) => removed += 1,
                Err(err) => {
                    debug!(path = path.as_str(), error = %err, "Failed to delete media file");
                }
            }
        }

        removed
    }
}
