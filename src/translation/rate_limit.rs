/*!
 * Call-rate limiting for backend requests.
 *
 * A sliding-window token bucket: at most `count` calls may start within any
 * `window` span. One limiter instance is shared by every in-flight request
 * to a backend, across all files of a run.
 */

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Sliding-window rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    /// Calls allowed per window; zero disables limiting
    count: usize,
    /// Window length
    window: Duration,
    /// Start instants of the calls inside the current window
    stamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing `count` calls per `window_ms` milliseconds
    pub fn new(count: u32, window_ms: u64) -> Self {
        Self {
            count: count as usize,
            window: Duration::from_millis(window_ms),
            stamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Create a limiter that never delays
    pub fn unlimited() -> Self {
        Self {
            count: 0,
            window: Duration::from_millis(0),
            stamps: Mutex::new(VecDeque::new()),
        }
    }

    /// Wait until a call slot is available, then consume it
    pub async fn acquire(&self) {
        if self.count == 0 {
            return;
        }

        loop {
            let wait = {
                let mut stamps = self.stamps.lock().await;
                let now = Instant::now();

                while let Some(front) = stamps.front() {
                    if now.duration_since(*front) >= self.window {
                        stamps.pop_front();
                    } else {
                        break;
                    }
                }

                if stamps.len() < self.count {
                    stamps.push_back(now);
                    return;
                }

                // Oldest stamp decides when the next slot frees up
                self.window - now.duration_since(*stamps.front().expect("non-empty"))
            };

            tokio::time::sleep(wait).await;
        }
    }
}
