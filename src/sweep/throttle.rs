//! Counter-based throttle for the assistant's request budget.
//!
//! The service allows a fixed number of operations per window. After
//! `limit` ticks the throttle sleeps for the whole window and starts over.

use std::time::Duration;
use tracing::warn;

use crate::telemetry::metrics;

#[derive(Debug)]
pub struct Throttle {
    limit: u32,
    window: Duration,
    count: u32,
    pauses: u32,
}

impl Throttle {
    /// `limit` must be at least 1.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit: limit.max(1),
            window,
            count: 0,
            pauses: 0,
        }
    }

    /// Count one operation. Sleeps out the window when the limit is hit.
    ///
    /// Returns `true` if this tick paused.
    pub async fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count < self.limit {
            return false;
        }

        warn!(
            limit = self.limit,
            window_secs = self.window.as_secs(),
            "rate limit reached, sleeping to reset the window"
        );
        metrics::throttle_pauses().add(1, &[]);
        tokio::time::sleep(self.window).await;
        self.count = 0;
        self.pauses += 1;
        true
    }

    /// Operations counted in the current window. Always below `limit`.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// How many times the throttle has slept.
    pub fn pauses(&self) -> u32 {
        self.pauses
    }
}
