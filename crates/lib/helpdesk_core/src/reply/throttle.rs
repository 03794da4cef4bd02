//! Minimum-interval gate for external completion calls.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default spacing between external calls.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Process-wide load-shedding gate.
///
/// Callers that lose never wait; they are told to take the cheap path instead.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Claim the next call slot. Returns `false` if the previous claim was
    /// less than `min_interval` ago; the timestamp is only updated on success.
    pub async fn try_acquire(&self) -> bool {
        let now = Instant::now();
        let mut last = self.last_call.lock().await;
        match *last {
            Some(prev) if now.duration_since(prev) < self.min_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
