//! Retry policy and error classification
//!
//! | Condition | Classification |
//! |-----------|----------------|
//! | HTTP 2xx | success |
//! | HTTP 429 | Transient |
//! | HTTP 5xx | Transient |
//! | Other HTTP status | PermanentHttp |
//! | Timeout | Transient |
//! | Connection refused / reset | Transient |
//! | Malformed request | InvalidUrl |

use crate::fetch::FetchError;
use reqwest::StatusCode;
use std::time::Duration;

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base: Duration,
    pub max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base: Duration::from_secs(4),
            max: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base: Duration, max: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base,
            max,
        }
    }

    /// Delay before retry number `retry` (1-based): `min(base * 2^(retry-1), max)`
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max)
            .min(self.max)
    }

    /// Whether another attempt may follow attempt number `attempt`
    pub fn should_retry(&self, error: &FetchError, attempt: u32) -> bool {
        error.is_retryable() && attempt < self.max_attempts
    }
}

/// Maps a non-success HTTP status to a fetch error
pub fn classify_status(status: StatusCode) -> FetchError {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        FetchError::Transient(format!("HTTP {}", status.as_u16()))
    } else {
        FetchError::PermanentHttp {
            status: status.as_u16(),
        }
    }
}

/// Maps a client error to a fetch error
pub fn classify_request_error(e: &reqwest::Error) -> FetchError {
    if e.is_builder() {
        FetchError::InvalidUrl(e.to_string())
    } else if e.is_timeout() {
        FetchError::Transient("Request timeout".to_string())
    } else if e.is_connect() {
        FetchError::Transient(format!("Connection failed: {}", e))
    } else {
        FetchError::Transient(e.to_string())
    }
}
