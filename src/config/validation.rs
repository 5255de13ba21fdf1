use crate::config::types::{CacheConfig, Config, FetchConfig, ProbeConfig, ProxyEntry};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetch_config(&config.fetch)?;
    validate_cache_config(&config.cache)?;
    validate_probe_config(&config.probe)?;
    validate_proxies(&config.proxies)?;
    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.min_delay_ms > config.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "min_delay_ms ({}) must not exceed max_delay_ms ({})",
            config.min_delay_ms, config.max_delay_ms
        )));
    }

    if config.max_requests < 1 {
        return Err(ConfigError::Validation(format!(
            "max_requests must be >= 1, got {}",
            config.max_requests
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.backoff_base_ms > config.backoff_max_ms {
        return Err(ConfigError::Validation(format!(
            "backoff_base_ms ({}) must not exceed backoff_max_ms ({})",
            config.backoff_base_ms, config.backoff_max_ms
        )));
    }

    if config.timeout_secs == 0 || config.render_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeouts must be at least one second".to_string(),
        ));
    }

    if config.user_agents.iter().any(|ua| ua.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "user_agents cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates cache configuration
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.ttl_hours < 1 {
        return Err(ConfigError::Validation(format!(
            "ttl_hours must be >= 1, got {}",
            config.ttl_hours
        )));
    }

    if matches!(config.path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "cache path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates probe configuration
fn validate_probe_config(config: &ProbeConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.ip_echo_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid ip_echo_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "ip_echo_url must use HTTP or HTTPS, got '{}'",
            config.ip_echo_url
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "probe timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates proxy entries
fn validate_proxies(entries: &[ProxyEntry]) -> Result<(), ConfigError> {
    for entry in entries {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "proxy name cannot be empty".to_string(),
            ));
        }

        if entry.host.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "proxy '{}' has an empty host",
                entry.name
            )));
        }

        if entry.port == 0 {
            return Err(ConfigError::Validation(format!(
                "proxy '{}' has port 0",
                entry.name
            )));
        }

        if entry.password.is_some() && entry.username.is_none() {
            return Err(ConfigError::Validation(format!(
                "proxy '{}' has a password but no username",
                entry.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::ProxyProtocol;

    fn proxy_entry(name: &str, host: &str, port: u16) -> ProxyEntry {
        ProxyEntry {
            name: name.to_string(),
            protocol: ProxyProtocol::Http,
            host: host.to_string(),
            port,
            username: None,
            password: None,
            enabled: true,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_fetch_bounds() {
        let mut config = FetchConfig::default();
        config.max_requests = 0;
        assert!(validate_fetch_config(&config).is_err());

        let mut config = FetchConfig::default();
        config.max_attempts = 0;
        assert!(validate_fetch_config(&config).is_err());

        let mut config = FetchConfig::default();
        config.max_attempts = 11;
        assert!(validate_fetch_config(&config).is_err());

        let mut config = FetchConfig::default();
        config.backoff_base_ms = 20_000;
        assert!(validate_fetch_config(&config).is_err());

        let mut config = FetchConfig::default();
        config.min_delay_ms = 0;
        config.max_delay_ms = 0;
        assert!(validate_fetch_config(&config).is_ok());
    }

    #[test]
    fn test_validate_probe_url() {
        let mut config = ProbeConfig::default();
        config.ip_echo_url = "ftp://example.com/ip".to_string();
        assert!(matches!(
            validate_probe_config(&config),
            Err(ConfigError::InvalidUrl(_))
        ));

        config.ip_echo_url = "not a url".to_string();
        assert!(validate_probe_config(&config).is_err());
    }

    #[test]
    fn test_validate_proxies() {
        assert!(validate_proxies(&[proxy_entry("ok", "proxy.example.com", 8080)]).is_ok());
        assert!(validate_proxies(&[proxy_entry("", "proxy.example.com", 8080)]).is_err());
        assert!(validate_proxies(&[proxy_entry("no-host", " ", 8080)]).is_err());
        assert!(validate_proxies(&[proxy_entry("no-port", "proxy.example.com", 0)]).is_err());

        let mut half_credentials = proxy_entry("half", "proxy.example.com", 8080);
        half_credentials.password = Some("secret".to_string());
        assert!(validate_proxies(&[half_credentials]).is_err());
    }
}
