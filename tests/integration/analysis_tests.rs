//! End-to-end analyzer tests

use crate::{mount_page, test_config, LANDING_PAGE};
use rivalscope::Analyzer;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRICING_PAGE: &str = r#"<html><body>
    <div><h3>Starter</h3><span>$19/mo</span></div>
    <div><h3>Business</h3><span>$79/mo</span></div>
    <div><h3>Enterprise</h3><span>Talk to us</span></div>
    </body></html>"#;

const FEATURES_PAGE: &str = r#"<html><body><ul>
    <li>SSO</li>
    <li>Unlimited dashboards and viewers</li>
    <li>Scheduled email reports</li>
    </ul></body></html>"#;

#[tokio::test]
async fn test_full_site_analysis() {
    let server = MockServer::start().await;
    mount_page(&server, "/", LANDING_PAGE).await;

    // First pricing candidate is missing, the second one exists
    Mock::given(method("GET"))
        .and(path("/pricing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_page(&server, "/plans", PRICING_PAGE).await;
    mount_page(&server, "/features", FEATURES_PAGE).await;

    let mut config = test_config();
    config.analysis.probe_pricing = true;
    config.analysis.probe_features = true;
    let analyzer = Analyzer::new(config).expect("Failed to build analyzer");

    let report = analyzer.analyze_site(&format!("{}/", server.uri())).await;
    assert!(report.error.is_none(), "unexpected error: {:?}", report.error);

    // Metadata and SEO
    let basic = report.basic_info.as_ref().expect("basic info missing");
    assert_eq!(basic.language.as_deref(), Some("en"));
    let seo = report.seo_analysis.as_ref().expect("seo missing");
    assert!(seo.title.optimal);
    assert!(seo.description.optimal);
    assert!(seo.has_canonical);
    assert!(seo.has_og_tags);
    assert!(seo.has_json_ld);
    assert_eq!(seo.heading_structure.h1_count, 1);
    assert_eq!(seo.image_alt_ratio, 50.0);

    // Content
    let content = report.content_analysis.expect("content missing");
    assert_eq!(content.paragraph_count, 2);
    assert_eq!(content.image_count, 2);
    assert_eq!(content.external_link_count, 3);

    // Technology
    assert_eq!(
        report.technology_stack.as_deref().unwrap(),
        ["React", "HubSpot", "Webflow"]
    );
    let categories = report.technology_categories.as_ref().unwrap();
    assert_eq!(categories.frontend, vec!["React"]);
    assert_eq!(categories.marketing, vec!["HubSpot"]);
    assert_eq!(categories.frameworks, vec!["Webflow"]);

    // Social, CTAs, contacts
    let social = report.social_presence.as_ref().unwrap();
    assert_eq!(
        social.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["linkedin", "twitter", "youtube"]
    );
    assert_eq!(
        report.call_to_actions.as_deref().unwrap(),
        ["Book a demo", "Start free trial"]
    );
    let contacts = report.contact_info.as_ref().unwrap();
    assert_eq!(contacts.emails, vec!["sales@acme.test"]);
    assert_eq!(contacts.phones, vec!["555-010-2030"]);

    // Probes
    let pricing = report.pricing_info.as_ref().expect("pricing missing");
    assert!(pricing.has_pricing_page);
    assert!(pricing.pricing_url.as_deref().unwrap().ends_with("/plans"));
    let plans: Vec<(&str, Option<&str>)> = pricing
        .detected_plans
        .iter()
        .map(|plan| (plan.name.as_str(), plan.price.as_deref()))
        .collect();
    assert_eq!(
        plans,
        vec![
            ("Starter", Some("$19/mo")),
            ("Business", Some("$79/mo")),
            ("Enterprise", None)
        ]
    );
    assert_eq!(
        report.features.as_deref().unwrap(),
        ["Unlimited dashboards and viewers", "Scheduled email reports"]
    );

    // Insights
    let insights = report.insights.as_ref().expect("insights missing");
    assert!(insights.strengths.contains(&"Well-optimized title tag".to_string()));
    assert!(insights.strengths.contains(&"Strong social media presence".to_string()));
    assert!(insights.strengths.contains(&"Clear pricing page available".to_string()));
    assert!(insights.weaknesses.contains(&"Thin content, lacks depth".to_string()));
    assert!(insights
        .weaknesses
        .contains(&"Many images are missing alt text".to_string()));
}

#[tokio::test]
async fn test_unreachable_site_reports_error_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let analyzer = Analyzer::new(test_config()).expect("Failed to build analyzer");
    let report = analyzer.analyze_site(&server.uri()).await;

    let json = serde_json::to_value(&report).unwrap();
    let mut keys: Vec<&String> = json.as_object().unwrap().keys().collect();
    keys.sort();
    assert_eq!(keys, ["captured_at", "error", "url"]);
    assert_eq!(json["error"], "HTTP 403");
}

#[tokio::test]
async fn test_sqlite_cache_survives_analyzer_restart() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LANDING_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config();
    config.cache.path = Some(dir.path().join("cache.db").to_string_lossy().to_string());

    let url = format!("{}/", server.uri());
    let first = Analyzer::new(config.clone())
        .expect("Failed to build analyzer")
        .analyze_site(&url)
        .await;
    let second = Analyzer::new(config)
        .expect("Failed to build analyzer")
        .analyze_site(&url)
        .await;

    assert!(first.error.is_none());
    assert_eq!(first.basic_info, second.basic_info);
    assert_eq!(first.seo_analysis, second.seo_analysis);
}

#[tokio::test]
async fn test_budget_stops_probing() {
    let server = MockServer::start().await;
    mount_page(&server, "/", LANDING_PAGE).await;
    Mock::given(method("GET"))
        .and(path("/pricing"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.fetch.max_requests = 1;
    config.analysis.probe_pricing = true;
    config.analysis.probe_features = true;
    let analyzer = Analyzer::new(config).expect("Failed to build analyzer");

    let report = analyzer.analyze_site(&server.uri()).await;
    assert!(report.seo_analysis.is_some());
    assert!(report.pricing_info.is_none());
    assert!(report.features.is_none());

    // No pricing section means no pricing verdict either way
    let insights = report.insights.unwrap();
    assert!(!insights
        .weaknesses
        .contains(&"No clear pricing information".to_string()));
}
