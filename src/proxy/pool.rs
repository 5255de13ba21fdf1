use crate::config::ProxyEntry;
use crate::proxy::probe::{ProbeReport, ProxyProbe};
use crate::proxy::ProxyEndpoint;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Ordered proxy endpoints plus a round-robin cursor
///
/// The pool is safe to share between fetchers (`Arc<ProxyPool>`): the cursor
/// sits behind a mutex so a rotation is a single atomic step and two callers
/// can never compute the same "next" endpoint.
#[derive(Debug, Default)]
pub struct ProxyPool {
    state: Mutex<PoolState>,
}

#[derive(Debug, Default)]
struct PoolState {
    endpoints: Vec<ProxyEndpoint>,
    cursor: usize,
}

impl ProxyPool {
    /// Creates an empty pool (direct connections)
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pool from configuration entries
    pub fn from_entries(entries: &[ProxyEntry]) -> Self {
        let pool = Self::new();
        pool.load(entries);
        pool
    }

    /// Creates a pool from already-built endpoints, skipping disabled ones
    pub fn from_endpoints(endpoints: Vec<ProxyEndpoint>) -> Self {
        let endpoints = endpoints.into_iter().filter(|e| e.enabled()).collect();
        Self {
            state: Mutex::new(PoolState {
                endpoints,
                cursor: 0,
            }),
        }
    }

    /// Replaces the pool with the enabled entries, in file order
    ///
    /// The cursor resets to the first endpoint. Returns the number loaded.
    pub fn load(&self, entries: &[ProxyEntry]) -> usize {
        let endpoints: Vec<ProxyEndpoint> = entries
            .iter()
            .filter(|entry| entry.enabled)
            .map(ProxyEndpoint::from)
            .collect();
        let loaded = endpoints.len();

        let mut state = self.lock();
        state.endpoints = endpoints;
        state.cursor = 0;

        match state.endpoints.first() {
            Some(first) => tracing::info!(
                "Loaded {} proxy endpoints, active: {}",
                loaded,
                first.display_name()
            ),
            None => tracing::info!("No proxy endpoints configured, using direct connection"),
        }

        loaded
    }

    /// Returns the endpoint under the cursor, or None for a direct connection
    pub fn active(&self) -> Option<ProxyEndpoint> {
        let state = self.lock();
        state.endpoints.get(state.cursor).cloned()
    }

    /// Advances the cursor circularly and returns the new active endpoint
    ///
    /// Returns None when the pool is empty; that is not an error.
    pub fn rotate(&self) -> Option<ProxyEndpoint> {
        let mut state = self.lock();
        if state.endpoints.is_empty() {
            return None;
        }

        state.cursor = (state.cursor + 1) % state.endpoints.len();
        let next = state.endpoints[state.cursor].clone();
        tracing::info!("Rotated to proxy: {}", next.display_name());
        Some(next)
    }

    /// Snapshot of all endpoints, in order
    pub fn endpoints(&self) -> Vec<ProxyEndpoint> {
        self.lock().endpoints.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().endpoints.is_empty()
    }

    /// Probes one endpoint; failures are reported, never raised
    pub async fn test(&self, endpoint: &ProxyEndpoint, probe: &ProxyProbe) -> ProbeReport {
        probe.check(Some(endpoint)).await
    }

    /// Probes every endpoint sequentially, pausing between probes
    ///
    /// One report per endpoint, in pool order.
    pub async fn test_all(&self, probe: &ProxyProbe) -> Vec<ProbeReport> {
        let endpoints = self.endpoints();
        let mut reports = Vec::with_capacity(endpoints.len());

        for (index, endpoint) in endpoints.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(probe.delay_between_tests()).await;
            }
            tracing::info!("Testing proxy: {}", endpoint.display_name());
            reports.push(self.test(endpoint, probe).await);
        }

        let successful = reports.iter().filter(|r| r.success).count();
        tracing::info!(
            "Proxy test results: {}/{} successful",
            successful,
            reports.len()
        );

        reports
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
