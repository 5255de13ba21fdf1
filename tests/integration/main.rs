//! Integration tests for Rivalscope
//!
//! These tests use wiremock to stand in for competitor sites and run the
//! analyzer, fetcher and change detector end-to-end.

mod analysis_tests;
mod fetch_tests;
mod monitor_tests;

use rivalscope::config::{AnalysisConfig, Config, FetchConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration with no delays, single attempts and no probing
pub fn test_config() -> Config {
    Config {
        fetch: FetchConfig {
            min_delay_ms: 0,
            max_delay_ms: 0,
            max_attempts: 1,
            timeout_secs: 5,
            backoff_base_ms: 10,
            backoff_max_ms: 50,
            ..FetchConfig::default()
        },
        analysis: AnalysisConfig {
            probe_pricing: false,
            probe_features: false,
            ..AnalysisConfig::default()
        },
        ..Config::default()
    }
}

/// Mounts an HTML page at `route`
pub async fn mount_page(server: &MockServer, route: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// A landing page with a bit of every signal the analyzer looks for
pub const LANDING_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <title>Acme Analytics | Dashboards for every team</title>
  <meta name="description" content="Acme turns raw product events into dashboards your whole team understands. Connect a source, pick a template and share insights in minutes.">
  <meta name="keywords" content="analytics, dashboards, product metrics">
  <meta name="generator" content="Webflow">
  <meta property="og:title" content="Acme Analytics">
  <meta property="og:description" content="Dashboards for every team">
  <link rel="canonical" href="https://acme.test/">
  <script src="https://cdn.acme.test/react.production.min.js"></script>
  <script src="https://js.hs-scripts.com/123.js"></script>
  <script type="application/ld+json">{"@type": "Organization", "name": "Acme"}</script>
</head>
<body>
  <header><a href="/">Acme</a><a class="btn" href="/signup">Start free trial</a></header>
  <main>
    <h1>Know your numbers</h1>
    <p>Acme gives every team a live view of the metrics that matter.</p>
    <p>No SQL required.</p>
    <a href="/pricing">Pricing</a>
    <img src="/hero.png" alt="Dashboard screenshot">
    <img src="/chart.png">
    <button>Book a demo</button>
  </main>
  <footer>
    <a href="https://twitter.com/acme">Twitter</a>
    <a href="https://www.linkedin.com/company/acme">LinkedIn</a>
    <a href="https://www.youtube.com/@acme">YouTube</a>
    Questions? sales@acme.test or 555-010-2030
  </footer>
</body>
</html>"#;
