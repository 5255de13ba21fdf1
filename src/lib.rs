//! Rivalscope: resilient competitor intelligence
//!
//! This crate fetches a target site (static HTTP or browser-rendered), extracts
//! structured signals from it and derives an insight report. Fetching is
//! cached, budgeted, rate limited and optionally routed through rotating proxies.
//! Two reports for the same site taken at different times can be diffed.

pub mod analysis;
pub mod cache;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod monitor;
pub mod proxy;
pub mod url;

use thiserror::Error;

/// Main error type for Rivalscope operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Rivalscope operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use analysis::{Analyzer, SiteReport};
pub use config::Config;
pub use fetch::{FetchError, FetchOptions, FetchResult, Fetcher, Strategy};
pub use monitor::{diff_reports, ChangeReport, MonitorOutcome};
pub use proxy::{ProxyEndpoint, ProxyPool};
pub use crate::url::{fetch_key, normalize_url};
