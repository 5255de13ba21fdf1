use crate::extract::{element_text, select_first};
use scraper::Html;
use serde::{Deserialize, Serialize};

/// Page-level metadata from `<head>` and the root element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Comma-split, trimmed, empty entries dropped
    pub keywords: Vec<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub canonical_url: Option<String>,
    pub language: Option<String>,
    pub author: Option<String>,
}

impl PageMetadata {
    pub fn has_og_tags(&self) -> bool {
        self.og_title.is_some() || self.og_description.is_some()
    }
}

/// Extracts title, description, keywords, Open Graph basics, canonical, lang and author
pub fn extract_metadata(document: &Html) -> PageMetadata {
    PageMetadata {
        title: select_first(document, "title")
            .map(|title| element_text(&title))
            .filter(|title| !title.is_empty()),
        description: meta_content(document, r#"meta[name="description"]"#),
        keywords: meta_content(document, r#"meta[name="keywords"]"#)
            .map(|raw| split_keywords(&raw))
            .unwrap_or_default(),
        og_title: meta_content(document, r#"meta[property="og:title"]"#),
        og_description: meta_content(document, r#"meta[property="og:description"]"#),
        og_image: meta_content(document, r#"meta[property="og:image"]"#),
        canonical_url: attr_value(document, r#"link[rel="canonical"]"#, "href"),
        language: attr_value(document, "html", "lang"),
        author: meta_content(document, r#"meta[name="author"]"#),
    }
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    attr_value(document, css, "content")
}

fn attr_value(document: &Html, css: &str, attr: &str) -> Option<String> {
    select_first(document, css)
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn split_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .map(str::to_string)
        .collect()
}
