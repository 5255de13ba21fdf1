//! Competitor analysis
//!
//! Turns one fetched main page (plus optional pricing and feature probes)
//! into a [`SiteReport`]:
//! - `seo`: title/description length checks, heading structure, alt coverage, content volume
//! - `probes`: well-known pricing and feature paths, budgeted like any other fetch
//! - `insights`: a fixed rule table over the computed sections
//! - `analyzer`: the per-session orchestration

mod analyzer;
mod insights;
mod probes;
mod report;
mod seo;

pub use analyzer::Analyzer;
pub use insights::generate_insights;
pub use probes::{
    parse_pricing_page, probe_features, probe_pricing, FEATURE_PATHS, PRICING_PATHS,
};
pub use report::{
    ContentAnalysis, Insights, LengthCheck, PricingInfo, PricingPlan, SeoAnalysis, SiteReport,
};
pub use seo::{
    image_alt_ratio, inspect_page, length_check, score_content, score_seo, PageSections,
    DESCRIPTION_OPTIMAL, TITLE_OPTIMAL,
};
