//! Structured data: JSON-LD blocks and Open Graph properties

use crate::extract::select_all;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Machine-readable annotations found on a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredData {
    /// Every JSON-LD block that parsed, in document order
    pub json_ld: Vec<serde_json::Value>,
    /// Open Graph properties keyed without the `og:` prefix
    pub open_graph: BTreeMap<String, String>,
}

impl StructuredData {
    pub fn is_empty(&self) -> bool {
        self.json_ld.is_empty() && self.open_graph.is_empty()
    }

    pub fn has_json_ld(&self) -> bool {
        !self.json_ld.is_empty()
    }

    pub fn has_open_graph(&self) -> bool {
        !self.open_graph.is_empty()
    }
}

/// A structured-data block that could not be used
///
/// These never abort extraction; the block is dropped and the error logged.
#[derive(Debug, Error)]
pub enum StructuredDataError {
    #[error("JSON-LD block {index} is not valid JSON: {source}")]
    InvalidJsonLd {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Collects JSON-LD blocks and Open Graph properties
pub fn extract_structured_data(document: &Html) -> StructuredData {
    let mut json_ld = Vec::new();
    for (index, script) in select_all(document, r#"script[type="application/ld+json"]"#)
        .into_iter()
        .enumerate()
    {
        let body: String = script.text().collect();
        match parse_json_ld(index, &body) {
            Ok(value) => json_ld.push(value),
            Err(e) => tracing::debug!("Dropping structured data block: {}", e),
        }
    }

    let mut open_graph = BTreeMap::new();
    for meta in select_all(document, r#"meta[property^="og:"]"#) {
        let element = meta.value();
        let (Some(property), Some(content)) = (element.attr("property"), element.attr("content"))
        else {
            continue;
        };
        let Some(key) = property.strip_prefix("og:").filter(|key| !key.is_empty()) else {
            continue;
        };
        // First occurrence wins
        open_graph
            .entry(key.to_string())
            .or_insert_with(|| content.trim().to_string());
    }

    StructuredData {
        json_ld,
        open_graph,
    }
}

fn parse_json_ld(index: usize, body: &str) -> Result<serde_json::Value, StructuredDataError> {
    serde_json::from_str(body.trim()).map_err(|source| StructuredDataError::InvalidJsonLd { index, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_json_ld_block_is_dropped() {
        let document = Html::parse_document(
            r#"<head>
            <script type="application/ld+json">{"@type": "Product", "name": "Widget"}</script>
            <script type="application/ld+json">{ not json </script>
            <script type="application/ld+json">[{"@type": "FAQPage"}]</script>
            </head>"#,
        );
        let data = extract_structured_data(&document);

        assert_eq!(data.json_ld.len(), 2);
        assert_eq!(data.json_ld[0]["name"], "Widget");
        assert!(data.json_ld[1].is_array());
    }

    #[test]
    fn test_open_graph_prefix_stripped() {
        let document = Html::parse_document(
            r#"<head>
            <meta property="og:title" content="First">
            <meta property="og:title" content="Second">
            <meta property="og:type" content="website">
            <meta property="twitter:card" content="summary">
            <meta property="og:" content="empty key">
            </head>"#,
        );
        let data = extract_structured_data(&document);

        assert_eq!(data.open_graph.len(), 2);
        assert_eq!(data.open_graph["title"], "First");
        assert_eq!(data.open_graph["type"], "website");
        assert!(data.has_open_graph());
        assert!(!data.has_json_ld());
    }

    #[test]
    fn test_no_structured_data() {
        let data = extract_structured_data(&Html::parse_document("<p>plain</p>"));
        assert!(data.is_empty());
    }
}
