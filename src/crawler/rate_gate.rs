//! Fixed-interval politeness gate.
//!
//! Every outbound request waits here before hitting the wire, which keeps the
//! spacing rule out of the fetch loops entirely. The lock is held across the
//! sleep so concurrent callers serialize and the minimum gap holds even if a
//! future walker fans out across branches.

use rand::RngExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub struct RateGate {
    interval: Duration,
    jitter: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(interval: Duration, jitter: Duration) -> Self {
        Self {
            interval,
            jitter,
            last: Mutex::new(None),
        }
    }

    /// Block until at least `interval` (+ random jitter) has passed since the
    /// previous request. The first call passes immediately.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;

        if let Some(prev) = *last {
            let jitter_ms = self.jitter.as_millis() as u64;
            let jitter = if jitter_ms > 0 {
                Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
            } else {
                Duration::ZERO
            };
            tokio::time::sleep_until(prev + self.interval + jitter).await;
        }

        *last = Some(Instant::now());
    }
}
