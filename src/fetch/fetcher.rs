//! Fetch orchestration
//!
//! # Request Flow
//!
//! 1. Parse the URL → `InvalidUrl` without any network call
//! 2. Cache lookup by the normalized URL's key → hit returns immediately, no budget, no delay
//! 3. Reserve a budget slot → `BudgetExceeded` fails fast
//! 4. Await the rate-limit slot
//! 5. Physical request for the URL as given, through the pool's active proxy (direct if none)
//!    - static: GET with retry/backoff on transient failures
//!    - rendered: one render through the configured [`Renderer`]
//! 6. On success: keep the slot, store in cache, write any screenshot.
//!    On failure: release the slot.
//!
//! The normalized URL is cache identity only. The request and the returned
//! page URL keep the caller's path and query, so relative links resolve
//! against the page the server actually served.

use crate::cache::ResponseCache;
use crate::config::FetchConfig;
use crate::fetch::client::{build_http_client, UserAgentRotator};
use crate::fetch::render::{RenderRequest, Renderer};
use crate::fetch::retry::{classify_request_error, classify_status, RetryPolicy};
use crate::fetch::session::{Session, SessionStats};
use crate::fetch::{FetchError, FetchFailure, FetchOptions, FetchResult, FetchedPage, Strategy};
use crate::proxy::{ProxyEndpoint, ProxyPool};
use crate::url::{key_for_normalized, normalize_url, parse_http_url};
use chrono::Utc;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use url::Url;

/// Result of the physical part of a fetch, before bookkeeping
struct PhysicalFetch {
    content: String,
    attempts: u32,
    backoff_total: Duration,
    script_result: Option<serde_json::Value>,
    screenshot: Option<Vec<u8>>,
}

/// A terminal physical failure and the attempts spent on it
type PhysicalFailure = (FetchError, u32);

/// Fetches pages for one session
///
/// The session (budget and rate limiter) belongs to the fetcher; the cache
/// and proxy pool are shared handles that may outlive it.
pub struct Fetcher {
    config: FetchConfig,
    session: Session,
    policy: RetryPolicy,
    user_agents: UserAgentRotator,
    cache: Option<ResponseCache>,
    pool: Arc<ProxyPool>,
    renderer: Option<Arc<dyn Renderer>>,
    clients: Mutex<HashMap<Option<String>, Client>>,
}

impl Fetcher {
    /// Creates a fetcher with a fresh session
    ///
    /// # Arguments
    ///
    /// * `config` - Fetch configuration (delays, budget, retry policy, timeouts)
    /// * `cache` - Shared response cache, or None to always go to the network
    /// * `pool` - Shared proxy pool; an empty pool means direct connections
    pub fn new(config: &FetchConfig, cache: Option<ResponseCache>, pool: Arc<ProxyPool>) -> Self {
        let session = Session::new(
            config.max_requests,
            Duration::from_millis(config.min_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            cache.is_some(),
        );
        let policy = RetryPolicy::new(
            config.max_attempts,
            Duration::from_millis(config.backoff_base_ms),
            Duration::from_millis(config.backoff_max_ms),
        );

        Self {
            config: config.clone(),
            session,
            policy,
            user_agents: UserAgentRotator::new(&config.user_agents),
            cache,
            pool,
            renderer: None,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Attaches the renderer used by the rendered strategy
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn stats(&self) -> SessionStats {
        self.session.stats()
    }

    pub fn pool(&self) -> &Arc<ProxyPool> {
        &self.pool
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Options carrying the configured default strategy
    pub fn default_options(&self) -> FetchOptions {
        FetchOptions::with_strategy(self.config.strategy)
    }

    /// Fetches `url`; never fails past this boundary
    pub async fn fetch(&self, url: &str, options: &FetchOptions) -> FetchResult {
        let parsed = parse_http_url(url).and_then(|target| {
            let normalized = normalize_url(target.as_str())?;
            Ok((target, normalized))
        });
        let (target, normalized) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Rejected URL {}: {}", url, e);
                return FetchResult::Failure(FetchFailure::new(
                    FetchError::InvalidUrl(e.to_string()),
                    0,
                ));
            }
        };
        let key = key_for_normalized(&normalized);

        if !options.needs_live_render() {
            if let Some(content) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
                tracing::info!("Using cached response for {}", target);
                return FetchResult::Success(FetchedPage {
                    url: target.to_string(),
                    content,
                    fetched_at: Utc::now(),
                    from_cache: true,
                    attempts: 0,
                    retries: 0,
                    backoff_total: Duration::ZERO,
                    script_result: None,
                    screenshot_path: None,
                });
            }
        }

        let made = match self.session.budget().try_reserve() {
            Ok(made) => made,
            Err(e) => {
                tracing::warn!("Not fetching {}: {}", target, e);
                return FetchResult::Failure(FetchFailure::new(e, 0));
            }
        };

        self.session.limiter().await_slot().await;

        let outcome = match options.strategy {
            Strategy::Static => self.fetch_static(&target).await,
            Strategy::Rendered => self.fetch_rendered(&target, options).await,
        };

        match outcome {
            Ok(physical) => {
                tracing::info!(
                    url = %target,
                    attempts = physical.attempts,
                    requests_made = made,
                    "Fetched page"
                );

                if let Some(cache) = &self.cache {
                    cache.put(&key, normalized.as_str(), &physical.content);
                }

                let screenshot_path = match &physical.screenshot {
                    Some(png) => self.write_screenshot(&target, png).await,
                    None => None,
                };

                FetchResult::Success(FetchedPage {
                    url: target.to_string(),
                    content: physical.content,
                    fetched_at: Utc::now(),
                    from_cache: false,
                    attempts: physical.attempts,
                    retries: physical.attempts.saturating_sub(1),
                    backoff_total: physical.backoff_total,
                    script_result: physical.script_result,
                    screenshot_path,
                })
            }
            Err((error, attempts)) => {
                self.session.budget().release();
                tracing::warn!(url = %target, attempts, "Fetch failed: {}", error);
                FetchResult::Failure(FetchFailure::new(error, attempts))
            }
        }
    }

    async fn fetch_static(&self, url: &Url) -> Result<PhysicalFetch, PhysicalFailure> {
        let mut attempt = 0;
        let mut backoff_total = Duration::ZERO;

        loop {
            attempt += 1;
            let proxy = self.pool.active();

            match self.get_once(url, proxy.as_ref()).await {
                Ok(content) => {
                    return Ok(PhysicalFetch {
                        content,
                        attempts: attempt,
                        backoff_total,
                        script_result: None,
                        screenshot: None,
                    })
                }
                Err(error) if self.policy.should_retry(&error, attempt) => {
                    let delay = self.policy.backoff(attempt);
                    tracing::warn!(
                        url = %url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Transient failure, retrying: {}",
                        error
                    );

                    if self.config.rotate_proxy_on_failure {
                        self.pool.rotate();
                    }

                    tokio::time::sleep(delay).await;
                    backoff_total += delay;
                }
                Err(error) => return Err((error, attempt)),
            }
        }
    }

    async fn get_once(&self, url: &Url, proxy: Option<&ProxyEndpoint>) -> Result<String, FetchError> {
        let client = self.client_for(proxy).map_err(FetchError::Transient)?;

        let response = client
            .get(url.as_str())
            .header(USER_AGENT, self.user_agents.pick())
            .send()
            .await
            .map_err(|e| classify_request_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status(status));
        }

        response.text().await.map_err(|e| classify_request_error(&e))
    }

    async fn fetch_rendered(
        &self,
        url: &Url,
        options: &FetchOptions,
    ) -> Result<PhysicalFetch, PhysicalFailure> {
        let Some(renderer) = &self.renderer else {
            return Err((
                FetchError::RenderFailure("no renderer configured".to_string()),
                1,
            ));
        };

        // Chrome's --proxy-server flag has no slot for credentials
        let proxy_server = match self.pool.active() {
            Some(proxy) if proxy.has_credentials() => {
                return Err((
                    FetchError::RenderFailure(format!(
                        "proxy {} requires credentials, which the browser cannot supply",
                        proxy.display_name()
                    )),
                    1,
                ));
            }
            Some(proxy) => match proxy.server_url() {
                Ok(server) => Some(server.to_string()),
                Err(e) => return Err((FetchError::RenderFailure(e.to_string()), 1)),
            },
            None => None,
        };

        let timeout = Duration::from_secs(self.config.render_timeout_secs);
        let request = RenderRequest {
            url: url.to_string(),
            wait_for: options.wait_for.clone(),
            script: options.script.clone(),
            screenshot: options.screenshot,
            proxy_server,
            user_agent: Some(self.user_agents.pick().to_string()),
            timeout,
        };

        match tokio::time::timeout(timeout, renderer.render(&request)).await {
            Ok(Ok(page)) => Ok(PhysicalFetch {
                content: page.html,
                attempts: 1,
                backoff_total: Duration::ZERO,
                script_result: page.script_result,
                screenshot: page.screenshot,
            }),
            Ok(Err(e)) => Err((FetchError::RenderFailure(e.to_string()), 1)),
            Err(_) => Err((
                FetchError::RenderFailure(format!(
                    "render timed out after {}s",
                    timeout.as_secs()
                )),
                1,
            )),
        }
    }

    /// Returns a client bound to `proxy`, building it on first use
    fn client_for(&self, proxy: Option<&ProxyEndpoint>) -> Result<Client, String> {
        let cache_key = match proxy {
            Some(endpoint) => Some(endpoint.proxy_url().map_err(|e| e.to_string())?.to_string()),
            None => None,
        };

        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = clients.get(&cache_key) {
            return Ok(client.clone());
        }

        let client = build_http_client(proxy, Duration::from_secs(self.config.timeout_secs))?;
        clients.insert(cache_key, client.clone());
        Ok(client)
    }

    async fn write_screenshot(&self, url: &Url, png: &[u8]) -> Option<PathBuf> {
        let dir = Path::new(&self.config.screenshot_dir);
        let host = url.host_str().unwrap_or("page").replace('.', "_");
        let path = dir.join(format!(
            "{}_{}.png",
            host,
            Utc::now().format("%Y%m%d_%H%M%S%3f")
        ));

        let written = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, png).await
        }
        .await;

        match written {
            Ok(()) => {
                tracing::info!("Screenshot saved to {}", path.display());
                Some(path)
            }
            Err(e) => {
                tracing::warn!("Failed to write screenshot {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("strategy", &self.config.strategy)
            .field("session", &self.session)
            .field("policy", &self.policy)
            .field("cache", &self.cache)
            .field("proxies", &self.pool.len())
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}
