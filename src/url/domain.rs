use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use rivalscope::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true when both URLs carry exactly the same host
pub fn same_host(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

/// Returns true when `host` is `domain` or one of its subdomains
///
/// ```
/// use rivalscope::url::host_matches;
///
/// assert!(host_matches("www.facebook.com", "facebook.com"));
/// assert!(host_matches("x.com", "x.com"));
/// assert!(!host_matches("dropbox.com", "x.com"));
/// ```
pub fn host_matches(host: &str, domain: &str) -> bool {
    let host = host.trim_end_matches('.').to_lowercase();
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Resolves a well-known path against the origin of `base`
///
/// ```
/// use url::Url;
/// use rivalscope::url::origin_join;
///
/// let base = Url::parse("https://example.com/en/home?x=1").unwrap();
/// assert_eq!(origin_join(&base, "/pricing").unwrap().as_str(), "https://example.com/pricing");
/// ```
pub fn origin_join(base: &Url, path: &str) -> Option<Url> {
    let mut origin = base.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    origin.join(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_same_host_is_exact() {
        let base = Url::parse("https://example.com/").unwrap();
        let inner = Url::parse("https://example.com/about").unwrap();
        let sub = Url::parse("https://blog.example.com/").unwrap();
        assert!(same_host(&base, &inner));
        assert!(!same_host(&base, &sub));
    }

    #[test]
    fn test_host_matches_subdomains_only_on_label_boundary() {
        assert!(host_matches("m.youtube.com", "youtube.com"));
        assert!(host_matches("LinkedIn.com", "linkedin.com"));
        assert!(!host_matches("notyoutube.com", "youtube.com"));
        assert!(!host_matches("youtube.com.evil.net", "youtube.com"));
    }

    #[test]
    fn test_origin_join_keeps_port() {
        let base = Url::parse("http://127.0.0.1:8080/landing").unwrap();
        let joined = origin_join(&base, "/plans").unwrap();
        assert_eq!(joined.as_str(), "http://127.0.0.1:8080/plans");
    }
}
