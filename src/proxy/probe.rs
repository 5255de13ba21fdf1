//! Live proxy reachability checks
//!
//! A probe sends one GET to an IP-echo service (a JSON body carrying `ip` or
//! `origin`) through the endpoint under test and times it. Probing is purely
//! diagnostic: timeouts and connection errors end up in the report, never as
//! an error returned to the caller.

use crate::config::ProbeConfig;
use crate::fetch::build_http_client;
use crate::proxy::{ProxyEndpoint, ProxyProtocol};
use reqwest::Client;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Outcome of probing one endpoint (or the direct connection)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReport {
    /// Endpoint display name, or "direct"
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<ProxyProtocol>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProbeReport {
    fn failed(name: String, protocol: Option<ProxyProtocol>, error: String) -> Self {
        Self {
            name,
            protocol,
            success: false,
            observed_ip: None,
            latency_ms: None,
            error: Some(error),
        }
    }
}

/// Probe settings: where to ask "what is my IP" and how patiently
#[derive(Debug, Clone)]
pub struct ProxyProbe {
    echo_url: String,
    timeout: Duration,
    delay_between_tests: Duration,
}

impl ProxyProbe {
    pub fn new(echo_url: impl Into<String>, timeout: Duration, delay_between_tests: Duration) -> Self {
        Self {
            echo_url: echo_url.into(),
            timeout,
            delay_between_tests,
        }
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(
            config.ip_echo_url.clone(),
            Duration::from_secs(config.timeout_secs),
            Duration::from_millis(config.delay_between_tests_ms),
        )
    }

    pub fn echo_url(&self) -> &str {
        &self.echo_url
    }

    pub fn delay_between_tests(&self) -> Duration {
        self.delay_between_tests
    }

    /// Probes through `endpoint`, or directly when None
    pub async fn check(&self, endpoint: Option<&ProxyEndpoint>) -> ProbeReport {
        let name = endpoint
            .map(|e| e.display_name().to_string())
            .unwrap_or_else(|| "direct".to_string());
        let protocol = endpoint.map(|e| e.protocol());

        let client = match build_http_client(endpoint, self.timeout) {
            Ok(client) => client,
            Err(e) => return ProbeReport::failed(name, protocol, e),
        };

        match self.observe(&client).await {
            Ok((ip, latency_ms)) => {
                tracing::debug!("Probe via {} observed {} in {:.2}ms", name, ip, latency_ms);
                ProbeReport {
                    name,
                    protocol,
                    success: true,
                    observed_ip: Some(ip),
                    latency_ms: Some(latency_ms),
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("Probe via {} failed: {}", name, e);
                ProbeReport::failed(name, protocol, e)
            }
        }
    }

    /// Asks the echo service for the egress IP using an existing client
    ///
    /// Returns the IP and the round-trip latency in milliseconds.
    pub async fn observe(&self, client: &Client) -> Result<(String, f64), String> {
        let started = Instant::now();

        let response = client
            .get(&self.echo_url)
            .send()
            .await
            .map_err(|e| describe_request_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read echo body: {}", e))?;
        let latency_ms = round2(started.elapsed().as_secs_f64() * 1000.0);

        let ip = parse_echo_ip(&body).ok_or_else(|| "echo body has no ip/origin field".to_string())?;
        Ok((ip, latency_ms))
    }
}

/// Extracts the `ip` (or `origin`) field from an IP-echo JSON body
///
/// ```
/// use rivalscope::proxy::parse_echo_ip;
///
/// assert_eq!(parse_echo_ip(r#"{"ip":"203.0.113.7"}"#), Some("203.0.113.7".to_string()));
/// assert_eq!(parse_echo_ip(r#"{"origin":"198.51.100.2"}"#), Some("198.51.100.2".to_string()));
/// assert_eq!(parse_echo_ip("<html>"), None);
/// ```
pub fn parse_echo_ip(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["ip", "origin"]
        .iter()
        .find_map(|field| value.get(field).and_then(|v| v.as_str()))
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

fn describe_request_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "probe timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::ProxyPool;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn probe_for(server: &MockServer) -> ProxyProbe {
        ProxyProbe::new(
            format!("{}/ip", server.uri()),
            Duration::from_secs(2),
            Duration::from_millis(10),
        )
    }

    #[tokio::test]
    async fn test_direct_probe_reads_origin() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"origin": "198.51.100.2"}"#),
            )
            .mount(&server)
            .await;

        let report = probe_for(&server).check(None).await;
        assert!(report.success);
        assert_eq!(report.name, "direct");
        assert_eq!(report.observed_ip.as_deref(), Some("198.51.100.2"));
        assert!(report.latency_ms.unwrap() >= 0.0);
        assert!(report.error.is_none());
    }

    #[tokio::test]
    async fn test_probe_reports_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let report = probe_for(&server).check(None).await;
        assert!(!report.success);
        assert_eq!(report.error.as_deref(), Some("HTTP 502"));
    }

    #[tokio::test]
    async fn test_probe_reports_bad_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let report = probe_for(&server).check(None).await;
        assert!(!report.success);
        assert!(report.observed_ip.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_proxy_is_reported_not_raised() {
        let probe = ProxyProbe::new(
            "http://echo.invalid/ip",
            Duration::from_secs(2),
            Duration::from_millis(10),
        );
        // Nothing listens on port 9 locally
        let dead = ProxyEndpoint::new(ProxyProtocol::Http, "127.0.0.1", 9).with_name("dead");

        let report = probe.check(Some(&dead)).await;
        assert!(!report.success);
        assert_eq!(report.name, "dead");
        assert_eq!(report.protocol, Some(ProxyProtocol::Http));
        assert!(report.error.is_some());
    }

    #[tokio::test]
    async fn test_test_all_preserves_order() {
        let probe = ProxyProbe::new(
            "http://echo.invalid/ip",
            Duration::from_secs(2),
            Duration::from_millis(5),
        );
        let pool = ProxyPool::from_endpoints(vec![
            ProxyEndpoint::new(ProxyProtocol::Http, "127.0.0.1", 9).with_name("first"),
            ProxyEndpoint::new(ProxyProtocol::Http, "127.0.0.1", 9).with_name("second"),
        ]);

        let reports = pool.test_all(&probe).await;
        let names: Vec<&str> = reports.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert!(reports.iter().all(|r| !r.success));
    }

    #[test]
    fn test_parse_echo_ip_prefers_ip() {
        assert_eq!(
            parse_echo_ip(r#"{"ip":"1.1.1.1","origin":"2.2.2.2"}"#),
            Some("1.1.1.1".to_string())
        );
        assert_eq!(parse_echo_ip(r#"{"ip":""}"#), None);
    }
}
