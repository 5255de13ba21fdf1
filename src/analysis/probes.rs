//! Well-known path probing for pricing and feature pages
//!
//! Each probe is an ordinary fetch, so it is cached, rate limited and counted
//! against the session budget. Probing stops at the first path that fetches
//! successfully, or as soon as the budget runs out.

use crate::analysis::report::{PricingInfo, PricingPlan};
use crate::extract::{extract_full_text, extract_list_items, parse_document};
use crate::fetch::{FetchError, FetchOptions, FetchResult, Fetcher};
use crate::url::origin_join;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

/// Pricing candidates in priority order
pub const PRICING_PATHS: &[&str] = &["/pricing", "/plans", "/pricing-plans", "/buy"];

/// Feature candidates in priority order
pub const FEATURE_PATHS: &[&str] = &["/features", "/product", "/solutions"];

/// List items must be longer than this to count as a feature
pub const MIN_FEATURE_LEN: usize = 10;

pub const MAX_FEATURES: usize = 20;

pub const MAX_PRICE_POINTS: usize = 10;

const PRICE_PATTERN: &str = r"\$\d+(?:\.\d{2})?(?:/(?:mo|month|yr|year|user))?";
const PLAN_PATTERN: &str =
    r"(?i)\b(Free|Starter|Basic|Pro|Professional|Business|Enterprise|Premium|Plus)\b";

static PRICE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(PRICE_PATTERN).ok());
static PLAN_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(PLAN_PATTERN).ok());

/// Outcome of walking a list of candidate paths
enum ProbeOutcome {
    Found { url: String, content: String },
    /// Every candidate was tried and none succeeded
    NotFound,
    /// The budget ran out before every candidate could be tried
    NotProbed,
}

async fn probe_paths(
    fetcher: &Fetcher,
    base_url: &Url,
    paths: &[&str],
    options: &FetchOptions,
) -> ProbeOutcome {
    for path in paths {
        let Some(target) = origin_join(base_url, path) else {
            continue;
        };
        tracing::debug!("Probing {}", target);

        match fetcher.fetch(target.as_str(), options).await {
            FetchResult::Success(page) => {
                return ProbeOutcome::Found {
                    url: page.url,
                    content: page.content,
                }
            }
            FetchResult::Failure(failure) => {
                if let FetchError::BudgetExceeded { .. } = failure.error {
                    tracing::warn!("Session budget exhausted, stopping probes at {}", target);
                    return ProbeOutcome::NotProbed;
                }
                tracing::debug!("No page at {}: {}", target, failure.reason());
            }
        }
    }

    ProbeOutcome::NotFound
}

/// Looks for a pricing page and reads plans and prices off the first one found
///
/// Returns None when the budget ran out before every candidate was tried.
pub async fn probe_pricing(
    fetcher: &Fetcher,
    base_url: &Url,
    options: &FetchOptions,
) -> Option<PricingInfo> {
    match probe_paths(fetcher, base_url, PRICING_PATHS, options).await {
        ProbeOutcome::Found { url, content } => {
            tracing::info!("Found pricing page at {}", url);
            Some(parse_pricing_page(&content, url))
        }
        ProbeOutcome::NotFound => Some(PricingInfo::default()),
        ProbeOutcome::NotProbed => None,
    }
}

/// Collects feature list items from the first feature page found
///
/// Returns None when the budget ran out before every candidate was tried.
pub async fn probe_features(
    fetcher: &Fetcher,
    base_url: &Url,
    options: &FetchOptions,
) -> Option<Vec<String>> {
    match probe_paths(fetcher, base_url, FEATURE_PATHS, options).await {
        ProbeOutcome::Found { url, content } => {
            let features = extract_list_items(&parse_document(&content), MIN_FEATURE_LEN, MAX_FEATURES);
            tracing::info!("Found {} features at {}", features.len(), url);
            Some(features)
        }
        ProbeOutcome::NotFound => Some(Vec::new()),
        ProbeOutcome::NotProbed => None,
    }
}

/// Reads plan names and price points from a pricing page
///
/// Plans are paired with prices by position: the i-th distinct plan name
/// gets the i-th price found on the page.
pub fn parse_pricing_page(html: &str, pricing_url: String) -> PricingInfo {
    let text = extract_full_text(&parse_document(html));

    let prices: Vec<String> = PRICE_RE
        .as_ref()
        .map(|re| re.find_iter(&text).map(|m| m.as_str().to_string()).collect())
        .unwrap_or_default();

    let mut seen = HashSet::new();
    let plan_names: Vec<String> = PLAN_RE
        .as_ref()
        .map(|re| {
            re.find_iter(&text)
                .map(|m| canonical_plan_name(m.as_str()))
                .filter(|name| seen.insert(name.clone()))
                .collect()
        })
        .unwrap_or_default();

    let detected_plans = plan_names
        .into_iter()
        .enumerate()
        .map(|(i, name)| PricingPlan {
            name,
            price: prices.get(i).cloned(),
        })
        .collect();

    let mut seen_prices = HashSet::new();
    let price_points = prices
        .into_iter()
        .filter(|price| seen_prices.insert(price.clone()))
        .take(MAX_PRICE_POINTS)
        .collect();

    PricingInfo {
        has_pricing_page: true,
        pricing_url: Some(pricing_url),
        detected_plans,
        price_points,
    }
}

/// "PRO" and "pro" both become "Pro"
fn canonical_plan_name(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
