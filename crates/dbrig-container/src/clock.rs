//! Injected clock so the synchronous verification path can be tested
//! without wall-clock delay.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Time source for the blocking verification path.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;

    /// Blocks for the given duration.
    fn sleep(&self, duration: Duration);
}

/// Real wall-clock implementation.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
