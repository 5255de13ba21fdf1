//! Extraction module
//!
//! Pure functions over a parsed HTML document. Nothing here performs I/O and
//! nothing fails: a missing element yields an absent value or an empty list.
//! Running any extractor twice over the same document gives identical output.
//!
//! `scraper::Html` is not `Send`, so documents are parsed and consumed inside
//! synchronous helpers and never held across an `.await`.

mod links;
mod metadata;
mod signals;
mod structured;
mod text;

pub use links::{extract_images, extract_links, filter_internal, resolve_link, ImageRef};
pub use metadata::{extract_metadata, PageMetadata};
pub use signals::{
    categorize_technologies, count_elements, detect_technologies, extract_contact_info,
    extract_ctas, extract_headings, extract_list_items, extract_social_links, ContactInfo,
    HeadingCounts, SocialPlatform, TechnologyCategories,
};
pub use structured::{extract_structured_data, StructuredData, StructuredDataError};
pub use text::{extract_full_text, extract_text_content, STRIPPED_TAGS};

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

/// Everything the generic extractors derive from one page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedDocument {
    pub metadata: PageMetadata,
    pub links: Vec<String>,
    pub internal_links: Vec<String>,
    pub images: Vec<ImageRef>,
    pub text_content: String,
    /// Absent when the page carries neither JSON-LD nor Open Graph data
    pub structured_data: Option<StructuredData>,
}

/// Parses `html` as a full document
pub fn parse_document(html: &str) -> Html {
    Html::parse_document(html)
}

/// Runs the generic extractors over an already-parsed document
pub fn extract(document: &Html, base_url: &Url) -> ExtractedDocument {
    let links = extract_links(document, base_url);
    let internal_links = filter_internal(&links, base_url);
    let structured = extract_structured_data(document);

    ExtractedDocument {
        metadata: extract_metadata(document),
        internal_links,
        links,
        images: extract_images(document, base_url),
        text_content: extract_text_content(document),
        structured_data: (!structured.is_empty()).then_some(structured),
    }
}

/// Parses `html` and runs the generic extractors
///
/// # Example
///
/// ```
/// use rivalscope::extract::extract_document;
/// use url::Url;
///
/// let html = r#"<html><head><title>Acme</title></head>
///     <body><a href="/pricing">Pricing</a><script>var x;</script></body></html>"#;
/// let base = Url::parse("https://acme.test/").unwrap();
/// let doc = extract_document(html, &base);
///
/// assert_eq!(doc.metadata.title.as_deref(), Some("Acme"));
/// assert_eq!(doc.internal_links, vec!["https://acme.test/pricing"]);
/// assert_eq!(doc.text_content, "Acme Pricing");
/// ```
pub fn extract_document(html: &str, base_url: &Url) -> ExtractedDocument {
    extract(&parse_document(html), base_url)
}

/// Selects every element matching `css`; an invalid selector selects nothing
pub(crate) fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => {
            tracing::debug!("Ignoring invalid selector {}", css);
            Vec::new()
        }
    }
}

/// Selects the first element matching `css`
pub(crate) fn select_first<'a>(document: &'a Html, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    document.select(&selector).next()
}

/// Text of an element with whitespace collapsed to single spaces
pub(crate) fn element_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(element.text())
}

/// Joins text fragments, collapsing every whitespace run to one space
pub(crate) fn collapse_whitespace<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for word in fragments.flat_map(str::split_whitespace) {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
