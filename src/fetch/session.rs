//! Session budget and rate limiting
//!
//! A session is one logical analysis run. It owns a hard ceiling on physical
//! requests and a jittered delay between them. Neither is shared: a fresh
//! session starts with a zero counter and no pending delay.

use crate::fetch::FetchError;
use rand::Rng;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

/// Monotonic request counter with a hard ceiling
#[derive(Debug)]
pub struct SessionBudget {
    requests_made: AtomicU32,
    max_requests: u32,
}

impl SessionBudget {
    pub fn new(max_requests: u32) -> Self {
        Self {
            requests_made: AtomicU32::new(0),
            max_requests,
        }
    }

    /// Claims one request slot, failing fast once the ceiling has been reached
    ///
    /// The claim is a single compare-and-swap, so concurrent callers can never
    /// push the counter past `max_requests`. Returns the count including this
    /// claim.
    pub fn try_reserve(&self) -> Result<u32, FetchError> {
        self.requests_made
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |made| {
                (made < self.max_requests).then_some(made + 1)
            })
            .map(|previous| previous + 1)
            .map_err(|_| FetchError::BudgetExceeded {
                max_requests: self.max_requests,
            })
    }

    /// Returns a slot claimed by a request that did not succeed
    pub fn release(&self) {
        let _ = self
            .requests_made
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |made| made.checked_sub(1));
    }

    pub fn requests_made(&self) -> u32 {
        self.requests_made.load(Ordering::SeqCst)
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn remaining(&self) -> u32 {
        self.max_requests.saturating_sub(self.requests_made())
    }

    pub fn is_exhausted(&self) -> bool {
        self.requests_made() >= self.max_requests
    }
}

/// Jittered delay between physical requests
///
/// The first slot of a session is granted immediately; every later slot
/// suspends for a duration drawn uniformly from `[min_delay, max_delay]`.
#[derive(Debug)]
pub struct RateLimiter {
    min_delay: Duration,
    max_delay: Duration,
    primed: AtomicBool,
}

impl RateLimiter {
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay: min_delay.min(max_delay),
            max_delay,
            primed: AtomicBool::new(false),
        }
    }

    /// Draws the delay for a non-first request
    pub fn next_delay(&self) -> Duration {
        let min = self.min_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        if min == max {
            return self.min_delay;
        }
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    /// Waits for the next request slot and returns how long it waited
    pub async fn await_slot(&self) -> Duration {
        if !self.primed.swap(true, Ordering::SeqCst) {
            return Duration::ZERO;
        }

        let delay = self.next_delay();
        tracing::debug!(delay_ms = delay.as_millis() as u64, "Waiting before next request");
        tokio::time::sleep(delay).await;
        delay
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }
}

/// Snapshot of a session's counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    pub requests_made: u32,
    pub requests_remaining: u32,
    pub max_requests: u32,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub cache_enabled: bool,
}

/// Budget plus rate limiter for one analysis run
#[derive(Debug)]
pub struct Session {
    budget: SessionBudget,
    limiter: RateLimiter,
    cache_enabled: bool,
}

impl Session {
    pub fn new(max_requests: u32, min_delay: Duration, max_delay: Duration, cache_enabled: bool) -> Self {
        Self {
            budget: SessionBudget::new(max_requests),
            limiter: RateLimiter::new(min_delay, max_delay),
            cache_enabled,
        }
    }

    pub fn budget(&self) -> &SessionBudget {
        &self.budget
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            requests_made: self.budget.requests_made(),
            requests_remaining: self.budget.remaining(),
            max_requests: self.budget.max_requests(),
            min_delay_ms: self.limiter.min_delay().as_millis() as u64,
            max_delay_ms: self.limiter.max_delay().as_millis() as u64,
            cache_enabled: self.cache_enabled,
        }
    }
}
