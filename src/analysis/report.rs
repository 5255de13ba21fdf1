//! Report types produced by an analysis

use crate::extract::{ContactInfo, HeadingCounts, PageMetadata, TechnologyCategories};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Length check for a tag with an optimal range
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthCheck {
    pub text: Option<String>,
    pub present: bool,
    /// Length in characters
    pub length: usize,
    pub optimal: bool,
}

/// On-page SEO signals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoAnalysis {
    pub title: LengthCheck,
    pub description: LengthCheck,
    pub has_keywords: bool,
    pub keyword_count: usize,
    pub has_canonical: bool,
    pub has_og_tags: bool,
    pub has_json_ld: bool,
    pub has_open_graph: bool,
    pub heading_structure: HeadingCounts,
    /// Percentage of images with non-empty alt text, two decimals
    pub image_alt_ratio: f64,
}

/// Volume of visible content and links
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub word_count: usize,
    pub character_count: usize,
    pub paragraph_count: usize,
    pub link_count: usize,
    pub internal_link_count: usize,
    pub external_link_count: usize,
    pub image_count: usize,
}

/// A plan name with the price paired to it by position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPlan {
    pub name: String,
    pub price: Option<String>,
}

/// What the pricing probe found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingInfo {
    pub has_pricing_page: bool,
    pub pricing_url: Option<String>,
    pub detected_plans: Vec<PricingPlan>,
    pub price_points: Vec<String>,
}

/// Rule-derived observations about the site
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insights {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub recommendations: Vec<String>,
}

/// One analysis of one site at one point in time
///
/// Sections that were never computed (fetch failure, deadline, disabled
/// probe) are absent rather than empty. A failed analysis carries only
/// `error` besides its url and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteReport {
    pub url: String,
    pub captured_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic_info: Option<PageMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_analysis: Option<SeoAnalysis>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_analysis: Option<ContentAnalysis>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology_stack: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technology_categories: Option<TechnologyCategories>,

    /// Platform key → first profile link found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_presence: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_to_actions: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<ContactInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing_info: Option<PricingInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insights: Option<Insights>,

    /// Public IP the analysis was fetched from, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub egress_ip: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SiteReport {
    /// An empty report stamped with the current time
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            captured_at: Utc::now(),
            basic_info: None,
            seo_analysis: None,
            content_analysis: None,
            technology_stack: None,
            technology_categories: None,
            social_presence: None,
            call_to_actions: None,
            contact_info: None,
            pricing_info: None,
            features: None,
            insights: None,
            egress_ip: None,
            error: None,
        }
    }

    /// A report carrying only an error
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(url)
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_report_serializes_error_only() {
        let report = SiteReport::failed("https://acme.test/", "HTTP 404");
        let value = serde_json::to_value(&report).unwrap();
        let object = value.as_object().unwrap();

        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["captured_at", "error", "url"]);
        assert_eq!(object["error"], "HTTP 404");
        assert!(report.is_error());
    }

    #[test]
    fn test_report_survives_json() {
        let mut report = SiteReport::new("https://acme.test/");
        report.pricing_info = Some(PricingInfo {
            has_pricing_page: true,
            pricing_url: Some("https://acme.test/pricing".to_string()),
            detected_plans: vec![PricingPlan {
                name: "Pro".to_string(),
                price: Some("$29/mo".to_string()),
            }],
            price_points: vec!["$29/mo".to_string()],
        });
        report.technology_stack = Some(vec!["React".to_string()]);

        let json = serde_json::to_string(&report).unwrap();
        let back: SiteReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
