//! Competitive signals: technology fingerprints, social presence, contact
//! details, calls to action, heading structure and list items

use crate::extract::{element_text, select_all, select_first};
use crate::url::host_matches;
use regex::Regex;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use url::Url;

const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";
const PHONE_PATTERN: &str = r"\b\d{3}[-.]?\d{3}[-.]?\d{4}\b";

static EMAIL_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(EMAIL_PATTERN).ok());
static PHONE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(PHONE_PATTERN).ok());

/// Contact lists are capped at this many entries each
pub const MAX_CONTACTS: usize = 5;

/// At most this many distinct calls to action are kept
pub const MAX_CTAS: usize = 20;

const CTA_SELECTORS: &[&str] = &[
    "button",
    "a.btn",
    "a.button",
    r#"[role="button"]"#,
    r#"input[type="submit"]"#,
];

/// Substring of a script `src` and the technology it reveals
const SCRIPT_FINGERPRINTS: &[(&str, &str)] = &[
    ("react", "React"),
    ("vue", "Vue.js"),
    ("angular", "Angular"),
    ("jquery", "jQuery"),
    ("bootstrap", "Bootstrap"),
    ("/_next/", "Next.js"),
    ("google-analytics.com", "Google Analytics"),
    ("googletagmanager.com", "Google Analytics"),
    ("mixpanel", "Mixpanel"),
    ("cdn.segment.com", "Segment"),
    ("hotjar", "Hotjar"),
    ("hubspot", "HubSpot"),
    ("hs-scripts.com", "HubSpot"),
    ("mailchimp", "Mailchimp"),
    ("chimpstatic.com", "Mailchimp"),
    ("intercom", "Intercom"),
    ("drift", "Drift"),
];

const FRONTEND_TECH: &[&str] = &["React", "Vue.js", "Angular", "jQuery", "Next.js"];
const ANALYTICS_TECH: &[&str] = &["Google Analytics", "Mixpanel", "Segment", "Hotjar"];
const MARKETING_TECH: &[&str] = &["HubSpot", "Mailchimp", "Intercom", "Drift"];

/// Detects technologies from script sources and the generator meta tag
///
/// Returns each technology once, in the order first seen.
pub fn detect_technologies(document: &Html) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();

    for script in select_all(document, "script[src]") {
        let src = script.value().attr("src").unwrap_or_default().to_lowercase();
        for (needle, name) in SCRIPT_FINGERPRINTS {
            if src.contains(needle) && seen.insert(*name) {
                found.push(name.to_string());
            }
        }
    }

    let generator = select_first(document, r#"meta[name="generator"]"#)
        .and_then(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|content| !content.is_empty());
    if let Some(generator) = generator {
        if !found.iter().any(|tech| tech == generator) {
            found.push(generator.to_string());
        }
    }

    found
}

/// Technologies grouped by role; anything unrecognized lands in `frameworks`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnologyCategories {
    pub frontend: Vec<String>,
    pub analytics: Vec<String>,
    pub marketing: Vec<String>,
    pub frameworks: Vec<String>,
}

/// Sorts detected technologies into categories by substring membership
pub fn categorize_technologies(technologies: &[String]) -> TechnologyCategories {
    let mut categories = TechnologyCategories::default();
    let mentions = |tech: &str, list: &[&str]| list.iter().any(|known| tech.contains(known));

    for tech in technologies {
        let bucket = if mentions(tech, FRONTEND_TECH) {
            &mut categories.frontend
        } else if mentions(tech, ANALYTICS_TECH) {
            &mut categories.analytics
        } else if mentions(tech, MARKETING_TECH) {
            &mut categories.marketing
        } else {
            &mut categories.frameworks
        };
        bucket.push(tech.clone());
    }

    categories
}

/// Social platforms recognized in anchors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SocialPlatform {
    Facebook,
    Twitter,
    Linkedin,
    Instagram,
    Youtube,
}

impl SocialPlatform {
    pub const ALL: [SocialPlatform; 5] = [
        Self::Facebook,
        Self::Twitter,
        Self::Linkedin,
        Self::Instagram,
        Self::Youtube,
    ];

    /// Key used in reports
    pub fn key(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
            Self::Linkedin => "linkedin",
            Self::Instagram => "instagram",
            Self::Youtube => "youtube",
        }
    }

    fn domains(&self) -> &'static [&'static str] {
        match self {
            Self::Facebook => &["facebook.com"],
            Self::Twitter => &["twitter.com", "x.com"],
            Self::Linkedin => &["linkedin.com"],
            Self::Instagram => &["instagram.com"],
            Self::Youtube => &["youtube.com"],
        }
    }

    /// Classifies a host, e.g. `www.linkedin.com` → LinkedIn
    pub fn classify(host: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|platform| platform.domains().iter().any(|domain| host_matches(host, domain)))
    }
}

/// Maps each platform found to the first profile link pointing at it
///
/// Platforms without a link are omitted.
pub fn extract_social_links(document: &Html, base_url: &Url) -> BTreeMap<String, String> {
    let mut profiles = BTreeMap::new();

    for anchor in select_all(document, "a[href]") {
        let Some(href) = anchor.value().attr("href").map(str::trim) else {
            continue;
        };
        let Ok(target) = base_url.join(href) else {
            continue;
        };
        let Some(platform) = target.host_str().and_then(SocialPlatform::classify) else {
            continue;
        };
        profiles
            .entry(platform.key().to_string())
            .or_insert_with(|| href.to_string());
    }

    profiles
}

/// Emails and phone numbers found in page text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
}

/// Regex-extracts contact details; each list is de-duplicated and capped
pub fn extract_contact_info(text: &str) -> ContactInfo {
    ContactInfo {
        emails: find_unique(EMAIL_RE.as_ref(), text, MAX_CONTACTS),
        phones: find_unique(PHONE_RE.as_ref(), text, MAX_CONTACTS),
    }
}

fn find_unique(re: Option<&Regex>, text: &str, cap: usize) -> Vec<String> {
    let Some(re) = re else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    re.find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|found| seen.insert(found.clone()))
        .take(cap)
        .collect()
}

/// Text of call-to-action elements, de-duplicated and capped
pub fn extract_ctas(document: &Html) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ctas = Vec::new();

    for css in CTA_SELECTORS {
        for element in select_all(document, css) {
            let text = match element.value().attr("value") {
                // Submit inputs carry their label in `value`
                Some(value) if element.value().name() == "input" => value.trim().to_string(),
                _ => element_text(&element),
            };
            if !text.is_empty() && seen.insert(text.clone()) {
                ctas.push(text);
                if ctas.len() == MAX_CTAS {
                    return ctas;
                }
            }
        }
    }

    ctas
}

/// Count of each heading level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingCounts {
    pub h1_count: usize,
    pub h2_count: usize,
    pub h3_count: usize,
    pub h4_count: usize,
    pub h5_count: usize,
    pub h6_count: usize,
}

pub fn extract_headings(document: &Html) -> HeadingCounts {
    HeadingCounts {
        h1_count: count_elements(document, "h1"),
        h2_count: count_elements(document, "h2"),
        h3_count: count_elements(document, "h3"),
        h4_count: count_elements(document, "h4"),
        h5_count: count_elements(document, "h5"),
        h6_count: count_elements(document, "h6"),
    }
}

/// Number of elements matching `css`
pub fn count_elements(document: &Html, css: &str) -> usize {
    select_all(document, css).len()
}

/// Text of list items (`ul li`, `ol li`) longer than `min_len` characters
pub fn extract_list_items(document: &Html, min_len: usize, cap: usize) -> Vec<String> {
    select_all(document, "ul li, ol li")
        .iter()
        .map(element_text)
        .filter(|text| text.chars().count() > min_len)
        .take(cap)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn test_detects_script_fingerprints_and_generator() {
        let document = doc(
            r#"<head>
            <meta name="generator" content="WordPress 6.4">
            <script src="https://cdn.test/react.production.min.js"></script>
            <script src="https://cdn.test/react-dom.min.js"></script>
            <script src="/js/jquery-3.7.1.min.js"></script>
            <script src="https://www.googletagmanager.com/gtag/js?id=G-1"></script>
            <script>inline()</script>
            </head>"#,
        );
        assert_eq!(
            detect_technologies(&document),
            vec!["React", "jQuery", "Google Analytics", "WordPress 6.4"]
        );
    }

    #[test]
    fn test_categorize_with_fallback() {
        let techs: Vec<String> = ["React", "Hotjar", "Intercom", "WordPress 6.4", "Next.js"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        let categories = categorize_technologies(&techs);

        assert_eq!(categories.frontend, vec!["React", "Next.js"]);
        assert_eq!(categories.analytics, vec!["Hotjar"]);
        assert_eq!(categories.marketing, vec!["Intercom"]);
        assert_eq!(categories.frameworks, vec!["WordPress 6.4"]);
    }

    #[test]
    fn test_social_links_first_match_per_platform() {
        let base = Url::parse("https://acme.test/").unwrap();
        let document = doc(
            r#"<a href="https://www.facebook.com/acme">fb</a>
            <a href="https://facebook.com/other">fb2</a>
            <a href="https://x.com/acme">x</a>
            <a href="https://www.dropbox.com/s/file">not x</a>
            <a href="https://www.linkedin.com/company/acme">li</a>
            <a href="/about">about</a>"#,
        );
        let social = extract_social_links(&document, &base);

        assert_eq!(social.len(), 3);
        assert_eq!(social["facebook"], "https://www.facebook.com/acme");
        assert_eq!(social["twitter"], "https://x.com/acme");
        assert_eq!(social["linkedin"], "https://www.linkedin.com/company/acme");
        assert!(!social.contains_key("youtube"));
    }

    #[test]
    fn test_contact_info_deduplicated_and_capped() {
        let text = "Write sales@acme.test or sales@acme.test, call 555-123-4567 or 555.123.4567. \
                    a1@x.io a2@x.io a3@x.io a4@x.io a5@x.io";
        let info = extract_contact_info(text);

        assert_eq!(info.emails.len(), MAX_CONTACTS);
        assert_eq!(info.emails[0], "sales@acme.test");
        assert_eq!(info.phones, vec!["555-123-4567", "555.123.4567"]);
    }

    #[test]
    fn test_ctas_from_all_selectors() {
        let document = doc(
            r#"<button>Start free trial</button>
            <a class="btn primary" href="/demo">Book a demo</a>
            <a class="button" href="/x">Start free trial</a>
            <div role="button">Contact sales</div>
            <input type="submit" value="Subscribe">
            <a href="/plain">Not a CTA</a>"#,
        );
        assert_eq!(
            extract_ctas(&document),
            vec!["Start free trial", "Book a demo", "Contact sales", "Subscribe"]
        );
    }

    #[test]
    fn test_ctas_capped() {
        let html: String = (0..30).map(|i| format!("<button>Action {}</button>", i)).collect();
        assert_eq!(extract_ctas(&doc(&html)).len(), MAX_CTAS);
    }

    #[test]
    fn test_heading_counts() {
        let document = doc("<h1>A</h1><h2>B</h2><h2>C</h2><h6>D</h6>");
        let headings = extract_headings(&document);
        assert_eq!(headings.h1_count, 1);
        assert_eq!(headings.h2_count, 2);
        assert_eq!(headings.h3_count, 0);
        assert_eq!(headings.h6_count, 1);
    }

    #[test]
    fn test_list_items_filtered_by_length() {
        let document = doc(
            "<ul><li>Short</li><li>Unlimited projects for every team</li></ul>\
             <ol><li>Single sign-on with SAML</li></ol>",
        );
        assert_eq!(
            extract_list_items(&document, 10, 20),
            vec!["Unlimited projects for every team", "Single sign-on with SAML"]
        );
    }
}
