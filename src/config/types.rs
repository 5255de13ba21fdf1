use serde::Deserialize;

use crate::fetch::Strategy;
use crate::proxy::ProxyProtocol;

/// Main configuration structure for Rivalscope
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default, rename = "proxy")]
    pub proxies: Vec<ProxyEntry>,
}

/// Fetch behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FetchConfig {
    /// Default fetch strategy for analyses
    pub strategy: Strategy,

    /// Lower bound of the jittered delay between physical requests (milliseconds)
    pub min_delay_ms: u64,

    /// Upper bound of the jittered delay between physical requests (milliseconds)
    pub max_delay_ms: u64,

    /// Maximum number of physical requests per session
    pub max_requests: u32,

    /// Per-attempt network timeout (seconds)
    pub timeout_secs: u64,

    /// Per-attempt render timeout (seconds)
    pub render_timeout_secs: u64,

    /// Total attempts for the static strategy, including the first
    pub max_attempts: u32,

    /// Base of the exponential backoff (milliseconds)
    pub backoff_base_ms: u64,

    /// Ceiling of the exponential backoff (milliseconds)
    pub backoff_max_ms: u64,

    /// Advance the proxy pool after a transient failure
    pub rotate_proxy_on_failure: bool,

    /// Where rendered screenshots are written
    pub screenshot_dir: String,

    /// User agents to rotate through; empty means the built-in list
    pub user_agents: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Static,
            min_delay_ms: 5_000,
            max_delay_ms: 10_000,
            max_requests: 50,
            timeout_secs: 30,
            render_timeout_secs: 30,
            max_attempts: 3,
            backoff_base_ms: 4_000,
            backoff_max_ms: 10_000,
            rotate_proxy_on_failure: false,
            screenshot_dir: "./screenshots".to_string(),
            user_agents: Vec::new(),
        }
    }
}

/// Response cache configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CacheConfig {
    pub enabled: bool,

    /// SQLite file backing the cache; in-memory when absent
    pub path: Option<String>,

    /// Entries older than this are treated as misses
    pub ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
            ttl_hours: 24,
        }
    }
}

/// What an analysis does beyond the main page
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AnalysisConfig {
    pub probe_pricing: bool,
    pub probe_features: bool,
    pub report_egress_ip: bool,

    /// Overall analysis deadline in seconds; 0 disables it
    pub deadline_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            probe_pricing: true,
            probe_features: true,
            report_egress_ip: false,
            deadline_secs: 0,
        }
    }
}

/// Proxy reachability probe configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProbeConfig {
    /// IP-echo endpoint returning JSON with an `ip` or `origin` field
    pub ip_echo_url: String,
    pub timeout_secs: u64,
    pub delay_between_tests_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ip_echo_url: "https://httpbin.org/ip".to_string(),
            timeout_secs: 10,
            delay_between_tests_ms: 1_000,
        }
    }
}

/// One `[[proxy]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyEntry {
    pub name: String,
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}
