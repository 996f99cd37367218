//! Crawler module for review harvesting
//!
//! This module contains the core harvesting logic, including:
//! - Classification of page attempts into explicit outcomes
//! - The per-page retry state machine with proxy and identity rotation
//! - Per-item pagination with empty-streak termination
//! - Orchestration across items, and listing discovery
//! - Cancellable pacing for every deliberate wait

mod context;
mod coordinator;
mod discovery;
mod fetcher;
mod outcome;
mod pacer;
mod pagination;

pub use context::CrawlSession;
pub use coordinator::CrawlOrchestrator;
pub use discovery::discover_targets;
pub use fetcher::{PageFetch, PageFetcher, PageResult};
pub use outcome::{classify, ClassifyPolicy, FetchOutcome, TransientReason};
pub use pacer::Pacer;
pub use pagination::{ItemReport, PaginationController, StopReason};

use crate::config::Config;
use crate::extract::ReviewExtractor;
use crate::output::{write_target_list, RunStatistics};
use crate::proxy::{ProxyEndpoint, ProxyPool};
use crate::session::{
    check_proxies, BrowserBootstrap, HttpBootstrap, HttpSessionClient, Transport,
};
use crate::InputError;
use crate::state::TargetItem;
use crate::storage::SqliteSink;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Picks the session bootstrap for this build and configuration
///
/// Chromium is used when `browser.enabled` is set and the `browser` feature
/// is compiled in; otherwise warm-up runs over plain HTTP.
pub fn build_bootstrap(
    config: &Config,
    client: &Arc<HttpSessionClient>,
    pacer: Pacer,
) -> Box<dyn BrowserBootstrap> {
    if config.browser.enabled {
        return browser_bootstrap(config, client, pacer);
    }
    http_bootstrap(config, client, pacer)
}

fn http_bootstrap(
    config: &Config,
    client: &Arc<HttpSessionClient>,
    pacer: Pacer,
) -> Box<dyn BrowserBootstrap> {
    Box::new(HttpBootstrap::new(
        Arc::clone(client) as Arc<dyn Transport>,
        &config.target,
        config.browser.warm_up_delay,
        pacer,
    ))
}

#[cfg(feature = "browser")]
fn browser_bootstrap(
    config: &Config,
    client: &Arc<HttpSessionClient>,
    pacer: Pacer,
) -> Box<dyn BrowserBootstrap> {
    Box::new(crate::session::ChromiumBootstrap::new(
        &config.browser,
        &config.target,
        Arc::clone(client),
        pacer,
    ))
}

#[cfg(not(feature = "browser"))]
fn browser_bootstrap(
    config: &Config,
    client: &Arc<HttpSessionClient>,
    pacer: Pacer,
) -> Box<dyn BrowserBootstrap> {
    tracing::warn!(
        "browser.enabled is set but browser support is not compiled in, using HTTP warm-up"
    );
    http_bootstrap(config, client, pacer)
}

/// Runs a complete harvest
///
/// This is the main entry point for a harvest. It will:
/// 1. Open the database and start a run
/// 2. Build the shared HTTP session and the session bootstrap
/// 3. Harvest every item in order
/// 4. Close the run with its statistics
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `config_hash` - Hash of the configuration file, stored with the run
/// * `items` - Items to harvest, in order
/// * `proxies` - Egress proxies; an empty pool means direct connections
/// * `cancel` - Cancelled on a shutdown request
///
/// # Returns
///
/// * `Ok(RunStatistics)` - Harvest finished or was interrupted cleanly
/// * `Err(HarvestError)` - Setup failed or the run could not be closed
pub async fn run_harvest(
    config: Config,
    config_hash: &str,
    items: Vec<TargetItem>,
    proxies: ProxyPool,
    cancel: CancellationToken,
) -> crate::Result<RunStatistics> {
    let sink = SqliteSink::open(Path::new(&config.output.database_path), config_hash)?;
    let client = Arc::new(HttpSessionClient::new(&config.http));
    let pacer = Pacer::new(cancel);
    let bootstrap = build_bootstrap(&config, &client, pacer.fork());
    let extractor = ReviewExtractor::storefront()?;
    let session = CrawlSession::from_config(&config, proxies, pacer);

    let mut orchestrator = CrawlOrchestrator::new(
        config,
        client,
        Box::new(extractor),
        bootstrap,
        Box::new(sink),
        session,
    );
    orchestrator.run(items).await
}

/// Drops proxies that fail the connectivity check when `proxy.preflight` is set
///
/// Without preflight the endpoints are returned unchanged. When every
/// endpoint fails, the run goes direct unless `proxy.required` is set.
///
/// # Returns
///
/// * `Ok(Vec<ProxyEndpoint>)` - The endpoints to harvest through
/// * `Err(InputError::NoWorkingProxies)` - Proxies are required and none work
pub async fn preflight_proxies(
    config: &Config,
    transport: &dyn Transport,
    endpoints: Vec<ProxyEndpoint>,
) -> Result<Vec<ProxyEndpoint>, InputError> {
    if !config.proxy.preflight || endpoints.is_empty() {
        return Ok(endpoints);
    }

    let total = endpoints.len();
    tracing::info!(
        "Checking {} proxies against {}",
        total,
        config.proxy.preflight_url
    );
    let check = check_proxies(transport, endpoints, &config.proxy.preflight_url).await;

    if check.working.is_empty() {
        if config.proxy.required {
            return Err(InputError::NoWorkingProxies(total));
        }
        tracing::warn!("None of the {} proxies is working, using direct connections", total);
    }
    Ok(check.working)
}

/// Discovers targets from listing pages and writes them as a target list
///
/// # Returns
///
/// The number of unique targets written to `output`.
pub async fn run_discovery(
    config: &Config,
    output: &Path,
    cancel: CancellationToken,
) -> crate::Result<usize> {
    let client = Arc::new(HttpSessionClient::new(&config.http));
    let mut pacer = Pacer::new(cancel);
    let mut bootstrap = build_bootstrap(config, &client, pacer.fork());

    let entries = discover_targets(config, bootstrap.as_mut(), &mut pacer).await?;
    write_target_list(output, &entries)
}
