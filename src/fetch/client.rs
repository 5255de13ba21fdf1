//! HTTP client construction and user-agent rotation

use crate::proxy::ProxyEndpoint;
use rand::seq::SliceRandom;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL,
    UPGRADE_INSECURE_REQUESTS,
};
use reqwest::Client;
use std::time::Duration;

/// Realistic desktop browser user agents
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

/// Picks a user agent at random for each request
#[derive(Debug, Clone)]
pub struct UserAgentRotator {
    agents: Vec<String>,
}

impl Default for UserAgentRotator {
    fn default() -> Self {
        Self {
            agents: DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
        }
    }
}

impl UserAgentRotator {
    /// Uses `agents`, or the built-in list when empty
    pub fn new(agents: &[String]) -> Self {
        if agents.is_empty() {
            Self::default()
        } else {
            Self {
                agents: agents.to_vec(),
            }
        }
    }

    pub fn pick(&self) -> &str {
        self.agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_USER_AGENTS[0])
    }

    pub fn agents(&self) -> &[String] {
        &self.agents
    }
}

/// Header set a desktop browser sends on a top-level navigation
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("none"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers
}

/// Builds an HTTP client, optionally bound to a proxy endpoint
///
/// # Arguments
///
/// * `endpoint` - Proxy to route all traffic through, or None for direct
/// * `timeout` - Per-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(String)` - The proxy URL was rejected or the client failed to build
pub fn build_http_client(endpoint: Option<&ProxyEndpoint>, timeout: Duration) -> Result<Client, String> {
    let mut builder = Client::builder()
        .default_headers(browser_headers())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true);

    builder = match endpoint {
        Some(endpoint) => builder.proxy(endpoint.to_reqwest_proxy()?),
        None => builder.no_proxy(),
    };

    builder
        .build()
        .map_err(|e| format!("Failed to build HTTP client: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::ProxyProtocol;

    #[test]
    fn test_build_direct_client() {
        assert!(build_http_client(None, Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_build_proxied_client() {
        let endpoint = ProxyEndpoint::new(ProxyProtocol::Socks5, "127.0.0.1", 1080)
            .with_credentials("user", "secret");
        assert!(build_http_client(Some(&endpoint), Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_rotator_falls_back_to_defaults() {
        let rotator = UserAgentRotator::new(&[]);
        assert_eq!(rotator.agents().len(), DEFAULT_USER_AGENTS.len());
        assert!(DEFAULT_USER_AGENTS.contains(&rotator.pick()));
    }

    #[test]
    fn test_rotator_uses_configured_agents() {
        let rotator = UserAgentRotator::new(&["AgentA/1.0".to_string()]);
        assert_eq!(rotator.pick(), "AgentA/1.0");
    }

    #[test]
    fn test_browser_headers_present() {
        let headers = browser_headers();
        assert_eq!(headers.get(ACCEPT_LANGUAGE).unwrap(), "en-US,en;q=0.9");
        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "navigate");
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), "max-age=0");
    }
}
