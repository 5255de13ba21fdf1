//! Headless rendering seam
//!
//! The rendered strategy needs something that can drive a browser: navigate,
//! wait for network idle and an optional selector, evaluate a script, then
//! hand back the serialized DOM. [`Renderer`] is that capability. The crate
//! ships a Chrome implementation behind the `chrome` feature; tests plug in
//! their own.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// What to render and how
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub url: String,
    pub wait_for: Option<String>,
    pub script: Option<String>,
    pub screenshot: bool,
    /// Proxy server URL (`scheme://host:port`) for the browser, if any; never
    /// carries credentials
    pub proxy_server: Option<String>,
    pub user_agent: Option<String>,
    /// Budget for the whole render, from launch to capture
    pub timeout: Duration,
}

/// Output of one render
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    pub html: String,
    pub script_result: Option<serde_json::Value>,
    /// PNG bytes of a full-page capture
    pub screenshot: Option<Vec<u8>>,
}

/// Render-specific failures; none are retried
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Selector '{0}' never appeared")]
    SelectorTimeout(String),

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("Render deadline of {0:?} exceeded")]
    Deadline(Duration),
}

/// Capability to render a page in a headless browser
///
/// Implementations must release every browser resource they acquire before
/// `render` returns, whether it succeeds, fails or its future is dropped.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, request: &RenderRequest) -> Result<RenderedPage, RenderError>;
}
