//! Insight rule table
//!
//! Rules only fire for sections that were actually computed: a report cut
//! short by a deadline, or with probing disabled, gets no verdict on the
//! missing parts.

use crate::analysis::report::{Insights, SiteReport};

const RICH_CONTENT_WORDS: usize = 1000;
const THIN_CONTENT_WORDS: usize = 300;
const STRONG_SOCIAL_PLATFORMS: usize = 3;
const LIMITED_SOCIAL_PLATFORMS: usize = 2;
const MIN_ALT_RATIO: f64 = 80.0;

impl Insights {
    fn strength(&mut self, text: &str) {
        self.strengths.push(text.to_string());
    }

    fn weakness(&mut self, text: &str, recommendation: Option<&str>) {
        self.weaknesses.push(text.to_string());
        if let Some(recommendation) = recommendation {
            self.recommendations.push(recommendation.to_string());
        }
    }

    fn opportunity(&mut self, text: &str) {
        self.opportunities.push(text.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty()
            && self.weaknesses.is_empty()
            && self.opportunities.is_empty()
            && self.recommendations.is_empty()
    }
}

/// Applies the rule table to a report
pub fn generate_insights(report: &SiteReport) -> Insights {
    let mut insights = Insights::default();

    if let Some(seo) = &report.seo_analysis {
        if seo.title.optimal {
            insights.strength("Well-optimized title tag");
        } else {
            insights.weakness(
                "Title tag needs optimization",
                Some("Optimize title tag to 30-60 characters"),
            );
        }

        if seo.description.optimal {
            insights.strength("Well-optimized meta description");
        } else {
            insights.weakness(
                "Meta description needs optimization",
                Some("Optimize meta description to 120-160 characters"),
            );
        }

        if seo.heading_structure.h1_count == 0 {
            insights.weakness(
                "Missing H1 heading",
                Some("Add a single descriptive H1 heading to the page"),
            );
        }

        let has_images = report
            .content_analysis
            .is_some_and(|content| content.image_count > 0);
        if has_images && seo.image_alt_ratio < MIN_ALT_RATIO {
            insights.weakness(
                "Many images are missing alt text",
                Some("Add descriptive alt text to all images"),
            );
        }
    }

    if let Some(content) = &report.content_analysis {
        if content.word_count > RICH_CONTENT_WORDS {
            insights.strength("Rich content with good depth");
        } else if content.word_count < THIN_CONTENT_WORDS {
            insights.weakness(
                "Thin content, lacks depth",
                Some("Add more comprehensive content (aim for 1000+ words)"),
            );
        }
    }

    if let Some(social) = &report.social_presence {
        if social.len() >= STRONG_SOCIAL_PLATFORMS {
            insights.strength("Strong social media presence");
        } else if social.len() < LIMITED_SOCIAL_PLATFORMS {
            insights.weakness(
                "Limited social media presence",
                Some("Expand social media presence across more platforms"),
            );
        }
    }

    if let Some(pricing) = &report.pricing_info {
        if pricing.has_pricing_page {
            insights.strength("Clear pricing page available");
            insights.opportunity("Analyze pricing strategy for competitive positioning");
        } else {
            insights.weakness("No clear pricing information", None);
        }
    }

    insights
}
