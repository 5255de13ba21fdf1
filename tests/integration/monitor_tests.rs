//! Monitoring a site across two captures

use crate::{mount_page, test_config, LANDING_PAGE};
use rivalscope::{Analyzer, SiteReport};
use tempfile::TempDir;
use wiremock::MockServer;

#[tokio::test]
async fn test_first_capture_has_no_baseline() {
    let server = MockServer::start().await;
    mount_page(&server, "/", LANDING_PAGE).await;

    let analyzer = Analyzer::new(test_config()).expect("Failed to build analyzer");
    let outcome = analyzer.monitor_changes(&server.uri(), None).await;

    assert_eq!(outcome.changes_detected(), None);
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["message"], "No previous data for comparison");
    assert!(json.get("changes_detected").is_none());
    assert!(json["current_data"]["seo_analysis"].is_object());
}

#[tokio::test]
async fn test_title_change_detected_against_saved_baseline() {
    let dir = TempDir::new().unwrap();
    let baseline_path = dir.path().join("baseline.json");

    // First capture, saved to disk the way the CLI does it
    let before = MockServer::start().await;
    mount_page(&before, "/", "<html><head><title>Acme</title></head></html>").await;
    let analyzer = Analyzer::new(test_config()).expect("Failed to build analyzer");
    let baseline = analyzer.analyze_site(&before.uri()).await;
    std::fs::write(&baseline_path, serde_json::to_string_pretty(&baseline).unwrap()).unwrap();

    // Second capture of a redesigned site
    let after = MockServer::start().await;
    mount_page(&after, "/", "<html><head><title>Acme 2.0</title></head></html>").await;
    let loaded: SiteReport =
        serde_json::from_str(&std::fs::read_to_string(&baseline_path).unwrap()).unwrap();
    let outcome = analyzer.monitor_changes(&after.uri(), Some(&loaded)).await;

    assert_eq!(outcome.changes_detected(), Some(true));
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["changes"][0]["field"], "title");
    assert_eq!(json["changes"][0]["old_value"], "Acme");
    assert_eq!(json["changes"][0]["new_value"], "Acme 2.0");
}

#[tokio::test]
async fn test_unchanged_site_reports_no_changes() {
    let server = MockServer::start().await;
    mount_page(&server, "/", LANDING_PAGE).await;

    let analyzer = Analyzer::new(test_config()).expect("Failed to build analyzer");
    let baseline = analyzer.analyze_site(&server.uri()).await;
    let outcome = analyzer.monitor_changes(&server.uri(), Some(&baseline)).await;

    assert_eq!(outcome.changes_detected(), Some(false));
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["changes"].as_array().unwrap().len(), 0);
}
