use super::{ProxyEndpoint, SelectedProxy};
use crate::config::ProxyConfig;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// The set of egress endpoints and their health state
///
/// # Selection rules
///
/// | Call | Candidates | When none qualify |
/// |------|------------|-------------------|
/// | `select` | not blacklisted | reset every endpoint, draw again |
/// | `select_preferred` | not blacklisted, failures ≤ preferred limit | `select` |
///
/// An empty pool selects nothing and callers go direct.
pub struct ProxyPool {
    endpoints: Vec<ProxyEndpoint>,
    failure_threshold: u32,
    preferred_max_failures: u32,
    current: Option<usize>,
    rng: StdRng,
}

impl ProxyPool {
    pub fn new(endpoints: Vec<ProxyEndpoint>, config: &ProxyConfig) -> Self {
        Self::with_rng(endpoints, config, StdRng::from_entropy())
    }

    /// Creates a pool with a caller-supplied random source
    pub fn with_rng(endpoints: Vec<ProxyEndpoint>, config: &ProxyConfig, rng: StdRng) -> Self {
        Self {
            endpoints,
            failure_threshold: config.failure_threshold,
            preferred_max_failures: config.preferred_max_failures,
            current: None,
            rng,
        }
    }

    /// A pool with no endpoints; every request goes direct
    pub fn empty() -> Self {
        Self::new(Vec::new(), &ProxyConfig::default())
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn endpoints(&self) -> &[ProxyEndpoint] {
        &self.endpoints
    }

    /// Number of endpoints that are not blacklisted
    pub fn available_count(&self) -> usize {
        self.endpoints.iter().filter(|e| !e.blacklisted).count()
    }

    /// Whether switching away from the current endpoint can land somewhere else
    pub fn has_healthy_alternative(&self) -> bool {
        self.available_count() > 1
    }

    /// The endpoint returned by the most recent selection
    pub fn current(&self) -> Option<SelectedProxy> {
        self.current
            .and_then(|i| self.endpoints.get(i).map(|e| SelectedProxy::from_endpoint(i, e)))
    }

    /// Picks an endpoint uniformly at random among the non-blacklisted ones
    ///
    /// When every endpoint is blacklisted the pool is reset first.
    pub fn select(&mut self) -> Option<SelectedProxy> {
        if self.endpoints.is_empty() {
            return None;
        }

        let mut candidates = self.indices_where(|e| !e.blacklisted);
        if candidates.is_empty() {
            tracing::warn!(
                "All {} proxies are blacklisted, resetting proxy health",
                self.endpoints.len()
            );
            self.reset_all();
            candidates = (0..self.endpoints.len()).collect();
        }

        self.pick(&candidates)
    }

    /// Picks among endpoints with few recent failures, else behaves like `select`
    pub fn select_preferred(&mut self) -> Option<SelectedProxy> {
        let limit = self.preferred_max_failures;
        let candidates = self.indices_where(|e| !e.blacklisted && e.failure_count <= limit);
        if candidates.is_empty() {
            return self.select();
        }
        self.pick(&candidates)
    }

    /// Records a failure against an endpoint
    ///
    /// The endpoint is blacklisted once its failures reach the threshold.
    /// Failures reported against an already blacklisted endpoint are ignored.
    pub fn mark_failed(&mut self, proxy: &SelectedProxy) {
        let threshold = self.failure_threshold;
        let Some(endpoint) = self.endpoints.get_mut(proxy.index) else {
            tracing::warn!("Ignoring failure for unknown proxy {}", proxy);
            return;
        };

        if endpoint.address != proxy.address || endpoint.port != proxy.port {
            tracing::warn!("Ignoring failure for stale proxy handle {}", proxy);
            return;
        }

        if endpoint.blacklisted {
            tracing::debug!("Proxy {} is already blacklisted", endpoint);
            return;
        }

        endpoint.failure_count += 1;
        if endpoint.failure_count >= threshold {
            endpoint.blacklisted = true;
            tracing::warn!(
                "Proxy {} blacklisted after {} failures",
                endpoint,
                endpoint.failure_count
            );
        } else {
            tracing::debug!(
                "Proxy {} failure {}/{}",
                endpoint,
                endpoint.failure_count,
                threshold
            );
        }
    }

    /// Clears failure counts and blacklist flags on every endpoint
    pub fn reset_all(&mut self) {
        for endpoint in &mut self.endpoints {
            endpoint.failure_count = 0;
            endpoint.blacklisted = false;
        }
        tracing::info!("Proxy pool reset ({} endpoints)", self.endpoints.len());
    }

    fn indices_where<F: Fn(&ProxyEndpoint) -> bool>(&self, predicate: F) -> Vec<usize> {
        self.endpoints
            .iter()
            .enumerate()
            .filter(|(_, e)| predicate(e))
            .map(|(i, _)| i)
            .collect()
    }

    fn pick(&mut self, candidates: &[usize]) -> Option<SelectedProxy> {
        let index = *candidates.choose(&mut self.rng)?;
        self.current = Some(index);
        let endpoint = &self.endpoints[index];
        tracing::debug!(
            "Using proxy {} ({} failures, {} available)",
            endpoint,
            endpoint.failure_count,
            self.available_count()
        );
        Some(SelectedProxy::from_endpoint(index, endpoint))
    }
}
