//! Site analysis orchestration
//!
//! Each `analyze_site` call runs in its own session: a fresh budget and rate
//! limiter, while the cache and proxy pool are the analyzer's shared handles.
//! Concurrent analyses therefore never spend each other's budget.

use crate::analysis::insights::generate_insights;
use crate::analysis::probes::{probe_features, probe_pricing};
use crate::analysis::report::SiteReport;
use crate::analysis::seo::inspect_page;
use crate::cache::ResponseCache;
use crate::config::Config;
use crate::fetch::{FetchOptions, FetchResult, Fetcher, Renderer};
use crate::monitor::{compare_reports, MonitorOutcome};
use crate::proxy::{ProxyPool, ProxyProbe};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Runs full competitor analyses
pub struct Analyzer {
    config: Config,
    cache: Option<ResponseCache>,
    pool: Arc<ProxyPool>,
    renderer: Option<Arc<dyn Renderer>>,
    probe: ProxyProbe,
}

impl Analyzer {
    /// Builds an analyzer from configuration
    ///
    /// Opens the SQLite cache when a path is configured, otherwise an
    /// in-memory one; loads the enabled proxies in file order.
    pub fn new(config: Config) -> crate::Result<Self> {
        let cache = if config.cache.enabled {
            let ttl = chrono::Duration::hours(config.cache.ttl_hours as i64);
            let cache = match &config.cache.path {
                Some(path) => ResponseCache::open(Path::new(path), ttl)?,
                None => ResponseCache::in_memory(ttl),
            };
            Some(cache)
        } else {
            None
        };
        let pool = Arc::new(ProxyPool::from_entries(&config.proxies));

        Ok(Self::with_parts(config, cache, pool))
    }

    /// Builds an analyzer around an explicitly shared cache and pool
    pub fn with_parts(config: Config, cache: Option<ResponseCache>, pool: Arc<ProxyPool>) -> Self {
        let probe = ProxyProbe::from_config(&config.probe);
        Self {
            config,
            cache,
            pool,
            renderer: None,
            probe,
        }
    }

    /// Attaches the renderer used when the rendered strategy is selected
    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    pub fn pool(&self) -> &Arc<ProxyPool> {
        &self.pool
    }

    /// A fetcher with a fresh session over the shared cache and pool
    pub fn session_fetcher(&self) -> Fetcher {
        let fetcher = Fetcher::new(&self.config.fetch, self.cache.clone(), Arc::clone(&self.pool));
        match &self.renderer {
            Some(renderer) => fetcher.with_renderer(Arc::clone(renderer)),
            None => fetcher,
        }
    }

    /// Analyzes one site; never fails
    ///
    /// A failed main-page fetch yields a report carrying only `error`. When
    /// the configured deadline passes, the report keeps the sections that
    /// were complete and leaves the rest absent.
    pub async fn analyze_site(&self, url: &str) -> SiteReport {
        let fetcher = self.session_fetcher();
        let mut report = SiteReport::new(url);
        tracing::info!("Analyzing {} ({} strategy)", url, self.config.fetch.strategy);

        let deadline_secs = self.config.analysis.deadline_secs;
        if deadline_secs == 0 {
            self.populate(&fetcher, &mut report).await;
        } else {
            let deadline = Duration::from_secs(deadline_secs);
            if tokio::time::timeout(deadline, self.populate(&fetcher, &mut report))
                .await
                .is_err()
            {
                tracing::warn!("Analysis of {} hit the {}s deadline", url, deadline_secs);
                if report.seo_analysis.is_none() && report.error.is_none() {
                    report.error = Some(format!("Analysis deadline of {}s exceeded", deadline_secs));
                }
            }
        }

        if !report.is_error() {
            report.insights = Some(generate_insights(&report));
        }

        let stats = fetcher.stats();
        tracing::info!(
            requests_made = stats.requests_made,
            requests_remaining = stats.requests_remaining,
            max_requests = stats.max_requests,
            cache_enabled = stats.cache_enabled,
            "Finished analysis of {}",
            url
        );

        report
    }

    /// Analyzes `url` and compares the result with `previous`
    pub async fn monitor_changes(&self, url: &str, previous: Option<&SiteReport>) -> MonitorOutcome {
        let current = self.analyze_site(url).await;
        compare_reports(url, previous, current)
    }

    /// Fills `report` section by section
    ///
    /// Each section is assigned whole, so cancelling this future leaves
    /// only complete sections behind.
    async fn populate(&self, fetcher: &Fetcher, report: &mut SiteReport) {
        let options = fetcher.default_options();

        let page = match fetcher.fetch(&report.url, &options).await {
            FetchResult::Success(page) => page,
            FetchResult::Failure(failure) => {
                tracing::warn!("Failed to fetch {}: {}", report.url, failure.reason());
                report.error = Some(failure.reason());
                return;
            }
        };

        let base_url = match Url::parse(&page.url) {
            Ok(base_url) => base_url,
            Err(e) => {
                report.error = Some(format!("Unusable page URL {}: {}", page.url, e));
                return;
            }
        };

        inspect_page(&page.content, &base_url).apply_to(report);

        if self.config.analysis.report_egress_ip {
            let active = self.pool.active();
            let probe = self.probe.check(active.as_ref()).await;
            match probe.observed_ip {
                Some(ip) => report.egress_ip = Some(ip),
                None => tracing::warn!(
                    "Could not determine egress IP: {}",
                    probe.error.unwrap_or_default()
                ),
            }
        }

        let probe_options = probe_options(&options);

        if self.config.analysis.probe_pricing {
            report.pricing_info = probe_pricing(fetcher, &base_url, &probe_options).await;
        }

        if self.config.analysis.probe_features {
            report.features = probe_features(fetcher, &base_url, &probe_options).await;
        }
    }
}

/// Probes reuse the strategy but never run scripts or take screenshots
fn probe_options(options: &FetchOptions) -> FetchOptions {
    FetchOptions::with_strategy(options.strategy)
}

impl std::fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Analyzer")
            .field("strategy", &self.config.fetch.strategy)
            .field("cache", &self.cache)
            .field("proxies", &self.pool.len())
            .field("renderer", &self.renderer.is_some())
            .finish()
    }
}
