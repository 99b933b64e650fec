//! Clock port for obtaining the current time and sleeping.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Provides the current time and blocking sleeps.
///
/// Abstracting time access keeps watermark stamping deterministic in tests
/// and lets retry-backoff tests run without actually sleeping.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;

    /// Blocks the current thread for the given duration.
    fn sleep(&self, duration: Duration);
}
