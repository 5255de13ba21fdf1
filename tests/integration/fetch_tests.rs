//! Fetcher behavior shared across analyses

use crate::{mount_page, test_config};
use rivalscope::cache::ResponseCache;
use rivalscope::fetch::{FetchError, FetchOptions, Fetcher};
use rivalscope::proxy::ProxyPool;
use rivalscope::Analyzer;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_concurrent_analyses_have_independent_budgets() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<title>Home</title>").await;

    let mut config = test_config();
    config.fetch.max_requests = 1;
    config.cache.enabled = false;
    let analyzer = Analyzer::new(config).expect("Failed to build analyzer");

    let url = server.uri();
    let (a, b) = tokio::join!(analyzer.analyze_site(&url), analyzer.analyze_site(&url));
    assert!(a.error.is_none());
    assert!(b.error.is_none());
}

#[tokio::test]
async fn test_shared_cache_spares_budget_across_sessions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("cached body"))
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config().fetch;
    let cache = ResponseCache::in_memory(chrono::Duration::hours(24));
    let pool = Arc::new(ProxyPool::new());
    let url = format!("{}/page", server.uri());

    let first = Fetcher::new(&config, Some(cache.clone()), Arc::clone(&pool));
    assert!(first.fetch(&url, &FetchOptions::default()).await.is_success());

    let second = Fetcher::new(&config, Some(cache), pool);
    let page = second
        .fetch(&url, &FetchOptions::default())
        .await
        .into_page()
        .expect("cached fetch failed");
    assert!(page.from_cache);
    assert_eq!(page.content, "cached body");
    assert_eq!(second.stats().requests_made, 0);
}

#[tokio::test]
async fn test_budget_exceeded_after_ceiling() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(2)
        .mount(&server)
        .await;

    let mut config = test_config().fetch;
    config.max_requests = 2;
    let fetcher = Fetcher::new(&config, None, Arc::new(ProxyPool::new()));

    for route in ["/a", "/b"] {
        let result = fetcher
            .fetch(&format!("{}{}", server.uri(), route), &FetchOptions::default())
            .await;
        assert!(result.is_success());
    }

    let third = fetcher
        .fetch(&format!("{}/c", server.uri()), &FetchOptions::default())
        .await;
    assert_eq!(
        third.error(),
        Some(&FetchError::BudgetExceeded { max_requests: 2 })
    );
    assert_eq!(fetcher.stats().requests_remaining, 0);
}
