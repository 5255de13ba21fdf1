//! Proxy handling module
//!
//! This module holds the proxy endpoints a session may route through:
//! - `ProxyEndpoint`: one immutable upstream proxy
//! - `ProxyPool`: ordered endpoints with a round-robin cursor
//! - `ProxyProbe`: live reachability and latency checks against an IP-echo service
//!
//! An empty pool is not an error; it means "connect directly".

mod pool;
mod probe;

pub use pool::ProxyPool;
pub use probe::{parse_echo_ip, ProbeReport, ProxyProbe};

use crate::config::ProxyEntry;
use crate::UrlError;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Proxy protocols accepted in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks4,
    Socks5,
}

impl ProxyProtocol {
    /// URL scheme understood by the HTTP client
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
            Self::Socks4 => "socks4",
            Self::Socks5 => "socks5",
        }
    }
}

impl fmt::Display for ProxyProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// A single upstream proxy
///
/// Endpoints are immutable once constructed. Credentials are never printed by
/// the `Debug` implementation.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    protocol: ProxyProtocol,
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    display_name: String,
    enabled: bool,
}

impl ProxyEndpoint {
    /// Creates an enabled endpoint without credentials
    pub fn new(protocol: ProxyProtocol, host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        let display_name = format!("{}:{}", host, port);
        Self {
            protocol,
            host,
            port,
            credentials: None,
            display_name,
            enabled: true,
        }
    }

    /// Returns a copy carrying the given credentials
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Returns a copy with a human-readable name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn protocol(&self) -> ProxyProtocol {
        self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    /// Builds the proxy URL, credentials included
    pub fn proxy_url(&self) -> Result<Url, UrlError> {
        let mut url = self.server_url()?;
        if let Some((username, password)) = &self.credentials {
            url.set_username(username)
                .map_err(|_| UrlError::Malformed(format!("cannot set username on {}", self)))?;
            url.set_password(Some(password))
                .map_err(|_| UrlError::Malformed(format!("cannot set password on {}", self)))?;
        }
        Ok(url)
    }

    /// Builds the proxy URL without credentials
    pub fn server_url(&self) -> Result<Url, UrlError> {
        let raw = format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port);
        Url::parse(&raw).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))
    }

    /// Converts the endpoint into a client proxy routing all traffic
    pub fn to_reqwest_proxy(&self) -> Result<reqwest::Proxy, String> {
        let url = self.proxy_url().map_err(|e| e.to_string())?;
        reqwest::Proxy::all(url.as_str())
            .map_err(|e| format!("unsupported proxy {}: {}", self.display_name, e))
    }
}

impl From<&ProxyEntry> for ProxyEndpoint {
    fn from(entry: &ProxyEntry) -> Self {
        let credentials = entry
            .username
            .as_ref()
            .map(|user| (user.clone(), entry.password.clone().unwrap_or_default()));

        Self {
            protocol: entry.protocol,
            host: entry.host.clone(),
            port: entry.port,
            credentials,
            display_name: entry.name.clone(),
            enabled: entry.enabled,
        }
    }
}

impl fmt::Display for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}://{}:{})",
            self.display_name, self.protocol, self.host, self.port
        )
    }
}

impl fmt::Debug for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyEndpoint")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("credentials", &self.credentials.as_ref().map(|_| "<redacted>"))
            .field("display_name", &self.display_name)
            .field("enabled", &self.enabled)
            .finish()
    }
}
