use crate::UrlError;
use sha2::{Digest, Sha256};
use url::Url;

/// Tracking query parameters that never change page content
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid"];

/// Normalizes a URL so that equivalent spellings share one fetch key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an HTTP or HTTPS scheme and a host
/// 3. Lowercase the host (the parser also lowercases the scheme and drops default ports)
/// 4. Normalize path:
///    - Remove dot segments and repeated slashes
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 5. Remove fragment
/// 6. Remove tracking query parameters
/// 7. Sort remaining query parameters by key (stable for repeated keys)
/// 8. Remove empty query string
///
/// # Examples
///
/// ```
/// use rivalscope::url::normalize_url;
///
/// let url = normalize_url("HTTP://Example.COM:80/a/../b/?z=1&a=2#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/b?a=2&z=1");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = parse_http_url(url_str)?;

    if let Some(host) = url.host_str() {
        let normalized_host = host.to_lowercase();
        url.set_host(Some(&normalized_host))
            .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut()
                .clear()
                .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
    }

    Ok(url)
}

/// Parses an HTTP(S) URL exactly as written, minus its fragment
///
/// Applies the same acceptance rules as [`normalize_url`] without touching
/// the path or query, so the result is the address to actually request.
///
/// ```
/// use rivalscope::url::parse_http_url;
///
/// let url = parse_http_url("https://example.com/docs/?b=2&a=1#intro").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs/?b=2&a=1");
/// ```
pub fn parse_http_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingDomain),
    }

    url.set_fragment(None);
    Ok(url)
}

/// Derives the cache key for a URL: SHA-256 of its normalized form, hex encoded
///
/// Equivalent spellings of the same URL always hash identically.
///
/// ```
/// use rivalscope::url::fetch_key;
///
/// let a = fetch_key("https://example.com/page?b=2&a=1").unwrap();
/// let b = fetch_key("https://EXAMPLE.com/page/?a=1&b=2#frag").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn fetch_key(url_str: &str) -> Result<String, UrlError> {
    let normalized = normalize_url(url_str)?;
    Ok(key_for_normalized(&normalized))
}

/// Hashes an already-normalized URL
pub fn key_for_normalized(normalized: &Url) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", normalized_segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
