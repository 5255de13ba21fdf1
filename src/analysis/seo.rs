//! Main-page scoring
//!
//! Everything here runs synchronously over a parsed document and returns
//! owned data, so no `Html` is ever held across an await point.

use crate::analysis::report::{ContentAnalysis, LengthCheck, SeoAnalysis, SiteReport};
use crate::extract::{
    categorize_technologies, count_elements, detect_technologies, extract, extract_contact_info,
    extract_ctas, extract_full_text, extract_headings, extract_social_links, parse_document,
    ContactInfo, ExtractedDocument, PageMetadata, TechnologyCategories,
};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use url::Url;

/// Optimal title length in characters
pub const TITLE_OPTIMAL: RangeInclusive<usize> = 30..=60;

/// Optimal meta description length in characters
pub const DESCRIPTION_OPTIMAL: RangeInclusive<usize> = 120..=160;

/// Every main-page section of a report
#[derive(Debug, Clone)]
pub struct PageSections {
    pub basic_info: PageMetadata,
    pub seo_analysis: SeoAnalysis,
    pub content_analysis: ContentAnalysis,
    pub technology_stack: Vec<String>,
    pub technology_categories: TechnologyCategories,
    pub social_presence: BTreeMap<String, String>,
    pub call_to_actions: Vec<String>,
    pub contact_info: ContactInfo,
}

impl PageSections {
    /// Moves the sections into `report`
    pub fn apply_to(self, report: &mut SiteReport) {
        report.basic_info = Some(self.basic_info);
        report.seo_analysis = Some(self.seo_analysis);
        report.content_analysis = Some(self.content_analysis);
        report.technology_stack = Some(self.technology_stack);
        report.technology_categories = Some(self.technology_categories);
        report.social_presence = Some(self.social_presence);
        report.call_to_actions = Some(self.call_to_actions);
        report.contact_info = Some(self.contact_info);
    }
}

/// Parses `html` and computes every main-page section
pub fn inspect_page(html: &str, base_url: &Url) -> PageSections {
    let document = parse_document(html);
    let extracted = extract(&document, base_url);
    let technology_stack = detect_technologies(&document);

    let mut seo_analysis = score_seo(&extracted);
    seo_analysis.heading_structure = extract_headings(&document);

    let mut content_analysis = score_content(&extracted);
    content_analysis.paragraph_count = count_elements(&document, "p");

    PageSections {
        seo_analysis,
        content_analysis,
        technology_categories: categorize_technologies(&technology_stack),
        technology_stack,
        social_presence: extract_social_links(&document, base_url),
        call_to_actions: extract_ctas(&document),
        contact_info: extract_contact_info(&extract_full_text(&document)),
        basic_info: extracted.metadata,
    }
}

/// SEO signals derivable from the extracted document
///
/// Heading counts need the parsed document and are left at zero here.
pub fn score_seo(doc: &ExtractedDocument) -> SeoAnalysis {
    let metadata = &doc.metadata;
    let structured = doc.structured_data.as_ref();

    SeoAnalysis {
        title: length_check(metadata.title.as_deref(), TITLE_OPTIMAL),
        description: length_check(metadata.description.as_deref(), DESCRIPTION_OPTIMAL),
        has_keywords: !metadata.keywords.is_empty(),
        keyword_count: metadata.keywords.len(),
        has_canonical: metadata.canonical_url.is_some(),
        has_og_tags: metadata.has_og_tags(),
        has_json_ld: structured.is_some_and(|data| data.has_json_ld()),
        has_open_graph: structured.is_some_and(|data| data.has_open_graph()),
        heading_structure: Default::default(),
        image_alt_ratio: image_alt_ratio(doc),
    }
}

/// Content volume derivable from the extracted document
///
/// Paragraphs need the parsed document and are left at zero here.
pub fn score_content(doc: &ExtractedDocument) -> ContentAnalysis {
    let link_count = doc.links.len();
    let internal_link_count = doc.internal_links.len();

    ContentAnalysis {
        word_count: doc.text_content.split_whitespace().count(),
        character_count: doc.text_content.chars().count(),
        paragraph_count: 0,
        link_count,
        internal_link_count,
        external_link_count: link_count.saturating_sub(internal_link_count),
        image_count: doc.images.len(),
    }
}

pub fn length_check(text: Option<&str>, optimal: RangeInclusive<usize>) -> LengthCheck {
    let length = text.map(|t| t.chars().count()).unwrap_or(0);
    LengthCheck {
        text: text.map(str::to_string),
        present: text.is_some(),
        length,
        optimal: optimal.contains(&length),
    }
}

/// Percentage of images carrying alt text, rounded to two decimals; 0 without images
pub fn image_alt_ratio(doc: &ExtractedDocument) -> f64 {
    if doc.images.is_empty() {
        return 0.0;
    }
    let with_alt = doc.images.iter().filter(|image| image.has_alt()).count();
    let percent = with_alt as f64 / doc.images.len() as f64 * 100.0;
    (percent * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://acme.test/").unwrap()
    }

    #[test]
    fn test_title_optimal_range() {
        assert!(!length_check(Some("Short"), TITLE_OPTIMAL).optimal);

        let title = "Acme Analytics | Dashboards for every team ".to_string() + "xx";
        assert_eq!(title.chars().count(), 45);
        let check = length_check(Some(&title), TITLE_OPTIMAL);
        assert!(check.optimal);
        assert_eq!(check.length, 45);
        assert!(check.present);

        let missing = length_check(None, TITLE_OPTIMAL);
        assert!(!missing.present);
        assert!(!missing.optimal);
    }

    #[test]
    fn test_alt_ratio_rounds_to_two_decimals() {
        let sections = inspect_page(
            r#"<img src="/a.png" alt="A"><img src="/b.png" alt="B"><img src="/c.png">"#,
            &base(),
        );
        assert_eq!(sections.seo_analysis.image_alt_ratio, 66.67);
        assert_eq!(sections.content_analysis.image_count, 3);
    }

    #[test]
    fn test_alt_ratio_without_images() {
        let sections = inspect_page("<p>No pictures</p>", &base());
        assert_eq!(sections.seo_analysis.image_alt_ratio, 0.0);
    }

    #[test]
    fn test_inspect_page_sections() {
        let html = r#"<html><head>
            <title>Acme</title>
            <meta name="keywords" content="a, b">
            <link rel="canonical" href="https://acme.test/">
            <script src="/static/jquery.min.js"></script>
            </head><body>
            <h1>Hello</h1><h2>One</h2><h2>Two</h2>
            <p>First paragraph here.</p><p>Second.</p>
            <a href="/pricing">Pricing</a>
            <a href="https://www.youtube.com/@acme">Video</a>
            <button>Get started</button>
            <footer>hello@acme.test</footer>
            </body></html>"#;
        let sections = inspect_page(html, &base());

        let seo = &sections.seo_analysis;
        assert_eq!(seo.title.text.as_deref(), Some("Acme"));
        assert!(!seo.description.present);
        assert_eq!(seo.keyword_count, 2);
        assert!(seo.has_canonical);
        assert!(!seo.has_og_tags);
        assert_eq!(seo.heading_structure.h1_count, 1);
        assert_eq!(seo.heading_structure.h2_count, 2);

        let content = &sections.content_analysis;
        assert_eq!(content.paragraph_count, 2);
        assert_eq!(content.link_count, 2);
        assert_eq!(content.internal_link_count, 1);
        assert_eq!(content.external_link_count, 1);

        assert_eq!(sections.technology_stack, vec!["jQuery"]);
        assert_eq!(sections.technology_categories.frontend, vec!["jQuery"]);
        assert_eq!(sections.social_presence.len(), 1);
        assert_eq!(sections.call_to_actions, vec!["Get started"]);
        assert_eq!(sections.contact_info.emails, vec!["hello@acme.test"]);
    }

    #[test]
    fn test_word_and_character_counts() {
        let sections = inspect_page("<body><p>one two  three</p><nav>menu</nav></body>", &base());
        assert_eq!(sections.content_analysis.word_count, 3);
        assert_eq!(sections.content_analysis.character_count, "one two three".len());
    }
}
