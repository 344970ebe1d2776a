//! Advisory backoff schedule for external schedulers
//!
//! The drain itself never sleeps between records; hosts that schedule
//! re-sync attempts (WorkManager-style periodic jobs, connectivity
//! triggers) use this schedule to space retries of a failed record.

use std::time::Duration;

use crate::config::SyncConfig;

/// Suggested delay before the next attempt of a record
///
/// `retry_count` is the record's post-attempt retry count. Pure function:
/// `min(initial_backoff_ms * 2^min(n, max_backoff_exponent), max_backoff_ms)`.
pub fn backoff_delay(config: &SyncConfig, retry_count: u32) -> Duration {
    // Exponent is capped by config and by the u64 shift width
    let exponent = retry_count.min(config.max_backoff_exponent).min(63);
    let delay_ms = config
        .initial_backoff_ms
        .saturating_mul(1u64 << exponent)
        .min(config.max_backoff_ms);

    Duration::from_millis(delay_ms)
}
