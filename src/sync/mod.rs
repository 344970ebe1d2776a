//! Response synchronization infrastructure
//!
//! This module provides the sync engine that drains captured responses to
//! the remote service, together with its collaborators and policies.
//!
//! # Components
//!
//! - [`engine`]: The drain orchestrator with its single-flight gate
//! - [`uploader`]: Upload transport trait and the default HTTP implementation
//! - [`media`]: Best-effort deletion of media files for synced responses
//! - [`cleanup`]: Retention cleanup of old synced rows
//! - [`backoff`]: Advisory retry schedule for external schedulers
//! - [`clock`]: Injected time source
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use survey_sync::config::Config;
//! use survey_sync::database::SqliteResponseStore;
//! use survey_sync::sync::{HttpUploader, SyncEngine};
//!
//! let config = Config::from_file("survey-sync.yaml")?;
//! let store = Arc::new(SqliteResponseStore::new(&config.database.path).await?);
//! let uploader = Arc::new(HttpUploader::from_config(&config.uploader)?);
//!
//! let engine = SyncEngine::with_system_defaults(store, uploader, config.sync);
//! let result = engine.sync().await;
//! ```

pub mod backoff;
pub mod cleanup;
pub mod clock;
pub mod engine;
pub mod media;
pub mod uploader;

// Re-export main types for convenience
pub use backoff::backoff_delay;
pub use cleanup::CleanupPolicy;
pub use clock::{SystemTimeProvider, TimeProvider};
pub use engine::{CancelHandle, StopReason, SyncEngine, SyncResult};
pub use media::{FileSink, FilesystemFileSink};
pub use uploader::{HttpUploader, Uploader};
