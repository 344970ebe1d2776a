//! Survey response domain models
//!
//! This module defines the response record captured on-device and its
//! sync lifecycle status.

use serde::{Deserialize, Serialize};

/// Sync lifecycle status of a response record
///
/// `Synced` and `FailedPermanent` are terminal; the engine never selects
/// them for upload again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// Captured but not yet uploaded
    #[default]
    Pending,
    /// Uploaded successfully
    Synced,
    /// Last upload failed with a retryable error; eligible for another attempt
    FailedRetryable,
    /// Retries exhausted or the last error was non-retryable
    FailedPermanent,
}

impl ResponseStatus {
    /// Returns true for statuses that permit no further transition
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ResponseStatus::Synced | ResponseStatus::FailedPermanent
        )
    }
}

impl std::fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseStatus::Pending => write!(f, "pending"),
            ResponseStatus::Synced => write!(f, "synced"),
            ResponseStatus::FailedRetryable => write!(f, "failed_retryable"),
            ResponseStatus::FailedPermanent => write!(f, "failed_permanent"),
        }
    }
}

impl std::str::FromStr for ResponseStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ResponseStatus::Pending),
            "synced" => Ok(ResponseStatus::Synced),
            "failed_retryable" => Ok(ResponseStatus::FailedRetryable),
            "failed_permanent" => Ok(ResponseStatus::FailedPermanent),
            _ => Err(format!("Invalid response status: {}", s)),
        }
    }
}

/// One survey submission captured on-device
///
/// `id`, `farmer_id`, `created_at`, and `answers_json` are immutable after
/// insert. The engine mutates only `status`, `retry_count`,
/// `last_attempt_at`, and `media_paths`. The answers payload is opaque to
/// the engine and uploaded verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// Unique response identifier
    pub id: String,

    /// Identifier of the surveyed subject; opaque to the engine
    pub farmer_id: String,

    /// Capture timestamp in milliseconds; queue ordering key
    pub created_at: i64,

    /// Raw answers payload as UTF-8 JSON text
    pub answers_json: String,

    /// Sync lifecycle status
    pub status: ResponseStatus,

    /// Number of past upload attempts
    pub retry_count: u32,

    /// Wall-clock of the most recent attempt in milliseconds
    pub last_attempt_at: Option<i64>,

    /// Paths of captured media files; cleared when the record syncs
    pub media_paths: Vec<String>,
}

impl ResponseRecord {
    /// Create a new pending response record
    pub fn new(
        id: impl Into<String>,
        farmer_id: impl Into<String>,
        created_at: i64,
        answers_json: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            farmer_id: farmer_id.into(),
            created_at,
            answers_json: answers_json.into(),
            status: ResponseStatus::Pending,
            retry_count: 0,
            last_attempt_at: None,
            media_paths: Vec::new(),
        }
    }

    /// Set the media paths
    pub fn with_media_paths(mut self, paths: Vec<String>) -> Self {
        self.media_paths = paths;
        self
    }

    /// Set the retry count
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Set the status
    pub fn with_status(mut self, status: ResponseStatus) -> Self {
        self.status = status;
        self
    }
}
