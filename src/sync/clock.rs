//! Time source abstraction for the sync engine
//!
//! The engine and cleanup policy read time through an injected provider so
//! tests can script attempt timestamps and retention cutoffs.

use chrono::Utc;

/// Millisecond time source
///
/// Monotonicity within a process is sufficient; wall-clock alignment is not
/// required.
pub trait TimeProvider: Send + Sync {
    /// Current time in milliseconds
    fn now_millis(&self) -> i64;
}

/// System clock provider
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}
