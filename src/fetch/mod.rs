//! Resilient fetch layer
//!
//! This module turns a URL into raw page content, including:
//! - Cache lookup before any network activity
//! - Session request budget and jittered inter-request delay
//! - Static HTTP fetching with rotated user agents and browser-like headers
//! - Bounded retry with exponential backoff for transient failures
//! - Browser-rendered fetching through the [`Renderer`] seam
//!
//! [`Fetcher::fetch`] never returns `Err`: every outcome is a [`FetchResult`].

#[cfg(feature = "chrome")]
mod chrome;
mod client;
mod fetcher;
mod render;
mod retry;
mod session;

#[cfg(feature = "chrome")]
pub use chrome::ChromeRenderer;
pub use client::{browser_headers, build_http_client, UserAgentRotator, DEFAULT_USER_AGENTS};
pub use fetcher::Fetcher;
pub use render::{RenderError, RenderRequest, RenderedPage, Renderer};
pub use retry::{classify_request_error, classify_status, RetryPolicy};
pub use session::{RateLimiter, Session, SessionBudget, SessionStats};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// How a page is fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Plain HTTP GET of the raw markup
    #[default]
    Static,
    /// Headless browser navigation with scripts executed
    Rendered,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static => f.write_str("static"),
            Self::Rendered => f.write_str("rendered"),
        }
    }
}

/// Per-call fetch options
///
/// `wait_for`, `script` and `screenshot` only apply to the rendered strategy.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub strategy: Strategy,
    /// CSS selector that must appear before the DOM is captured
    pub wait_for: Option<String>,
    /// Script evaluated after load; its JSON result is returned with the page
    pub script: Option<String>,
    /// Capture a full-page PNG screenshot
    pub screenshot: bool,
}

impl FetchOptions {
    pub fn with_strategy(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Outputs that only a live render can produce and the cache does not hold
    fn needs_live_render(&self) -> bool {
        self.strategy == Strategy::Rendered && (self.script.is_some() || self.screenshot)
    }
}

/// Fetch failure taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Session budget exceeded ({max_requests} requests)")]
    BudgetExceeded { max_requests: u32 },

    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("HTTP {status}")]
    PermanentHttp { status: u16 },

    #[error("Render failure: {0}")]
    RenderFailure(String),
}

impl FetchError {
    /// Only transient failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL as requested (fragment dropped); normalization only keys the cache
    pub url: String,
    pub content: String,
    pub fetched_at: DateTime<Utc>,
    pub from_cache: bool,
    /// Physical attempts made; 0 for a cache hit
    pub attempts: u32,
    pub retries: u32,
    /// Total time spent in backoff sleeps
    pub backoff_total: Duration,
    pub script_result: Option<serde_json::Value>,
    pub screenshot_path: Option<PathBuf>,
}

/// A terminal fetch failure
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub error: FetchError,
    pub is_retryable: bool,
    pub attempts: u32,
}

impl FetchFailure {
    pub fn new(error: FetchError, attempts: u32) -> Self {
        Self {
            is_retryable: error.is_retryable(),
            error,
            attempts,
        }
    }

    pub fn reason(&self) -> String {
        self.error.to_string()
    }
}

/// Tagged outcome of a fetch
#[derive(Debug, Clone)]
pub enum FetchResult {
    Success(FetchedPage),
    Failure(FetchFailure),
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn page(&self) -> Option<&FetchedPage> {
        match self {
            Self::Success(page) => Some(page),
            Self::Failure(_) => None,
        }
    }

    pub fn into_page(self) -> Option<FetchedPage> {
        match self {
            Self::Success(page) => Some(page),
            Self::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(&failure.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(FetchError::Transient("timeout".into()).is_retryable());
        assert!(!FetchError::InvalidUrl("x".into()).is_retryable());
        assert!(!FetchError::BudgetExceeded { max_requests: 5 }.is_retryable());
        assert!(!FetchError::PermanentHttp { status: 404 }.is_retryable());
        assert!(!FetchError::RenderFailure("selector".into()).is_retryable());
    }

    #[test]
    fn test_failure_carries_retryable_flag() {
        let failure = FetchFailure::new(FetchError::Transient("HTTP 503".into()), 3);
        assert!(failure.is_retryable);
        assert_eq!(failure.reason(), "Transient failure: HTTP 503");

        let result = FetchResult::Failure(failure);
        assert!(!result.is_success());
        assert!(result.page().is_none());
        assert!(result.error().is_some());
    }

    #[test]
    fn test_strategy_parses_lowercase() {
        let strategy: Strategy = serde_json::from_str("\"rendered\"").unwrap();
        assert_eq!(strategy, Strategy::Rendered);
        assert_eq!(Strategy::default(), Strategy::Static);
        assert_eq!(Strategy::Static.to_string(), "static");
    }

    #[test]
    fn test_live_render_only_for_rendered_extras() {
        let mut options = FetchOptions::with_strategy(Strategy::Rendered);
        assert!(!options.needs_live_render());
        options.screenshot = true;
        assert!(options.needs_live_render());

        let static_options = FetchOptions {
            screenshot: true,
            ..FetchOptions::default()
        };
        assert!(!static_options.needs_live_render());
    }
}
