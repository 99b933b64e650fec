//! Live clock adapter.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::ports::Clock;

/// System clock: real time, real sleeps.
pub struct LiveClock;

impl Clock for LiveClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
