use crate::extract::select_all;
use crate::url::same_host;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

/// An image reference with its accessibility attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Absolute source URL
    pub src: String,
    /// `alt` as written; empty when missing
    pub alt: String,
    /// `title` as written; empty when missing
    pub title: String,
}

impl ImageRef {
    pub fn has_alt(&self) -> bool {
        !self.alt.is_empty()
    }
}

/// Extracts every anchor target, resolved against `base_url`
///
/// The result is de-duplicated and keeps first-seen document order.
///
/// # Link Extraction Rules
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` and `data:` hrefs
/// - Fragment-only hrefs (same page anchors)
/// - Anything that is not HTTP(S) after resolution
pub fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    select_all(document, "a[href]")
        .into_iter()
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

/// Keeps links whose host is exactly the base URL's host
pub fn filter_internal(links: &[String], base_url: &Url) -> Vec<String> {
    links
        .iter()
        .filter(|link| {
            Url::parse(link)
                .map(|parsed| same_host(&parsed, base_url))
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Extracts `<img>` sources resolved against `base_url`
///
/// Images without a resolvable `src` are skipped.
pub fn extract_images(document: &Html, base_url: &Url) -> Vec<ImageRef> {
    select_all(document, "img")
        .into_iter()
        .filter_map(|img| {
            let element = img.value();
            let src = element.attr("src").map(str::trim).filter(|s| !s.is_empty())?;
            let src = base_url.join(src).ok()?;
            Some(ImageRef {
                src: src.to_string(),
                alt: element.attr("alt").unwrap_or_default().to_string(),
                title: element.attr("title").unwrap_or_default().to_string(),
            })
        })
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute.to_string()),
        _ => None,
    }
}
