//! Client-side request throttle built on governor.
//!
//! Keeps a shell that refreshes aggressively from flooding the scoring
//! service. Requests over budget wait for the next free cell instead of
//! failing.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

pub struct RequestThrottle {
    limiter: DefaultDirectRateLimiter,
    requests_per_second: u32,
    /// Number of requests that had to wait for budget
    delayed: AtomicU64,
}

impl RequestThrottle {
    /// Create a throttle allowing `requests_per_second` (minimum 1).
    pub fn new(requests_per_second: u32) -> Self {
        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);

        Self {
            limiter: RateLimiter::direct(Quota::per_second(per_second)),
            requests_per_second: per_second.get(),
            delayed: AtomicU64::new(0),
        }
    }

    /// Wait until a request may be sent.
    pub async fn acquire(&self) {
        if self.limiter.check().is_ok() {
            return;
        }

        let delayed = self.delayed.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            "Request budget of {}/s exhausted, waiting for capacity ({} delayed so far)",
            self.requests_per_second, delayed
        );
        self.limiter.until_ready().await;
    }

    /// Take a permit if one is free right now.
    #[cfg(test)]
    fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    #[cfg(test)]
    fn requests_per_second(&self) -> u32 {
        self.requests_per_second
    }

    #[cfg(test)]
    fn delayed_requests(&self) -> u64 {
        self.delayed.load(Ordering::Relaxed)
    }
}
