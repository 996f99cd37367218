//! Harvest orchestration
//!
//! This module contains the outer loop of a harvest:
//! - Warming up a session before each item
//! - Running pagination for each item in input order
//! - Pausing between items
//! - Stopping cleanly on a shutdown request
//! - Accumulating and persisting run statistics

use super::{CrawlSession, PageFetcher, PaginationController, StopReason};
use crate::config::Config;
use crate::extract::DocumentExtractor;
use crate::output::RunStatistics;
use crate::session::{BrowserBootstrap, Transport};
use crate::state::TargetItem;
use crate::storage::PersistenceSink;
use std::sync::Arc;
use std::time::Instant;

/// Runs items one after another against shared session state
pub struct CrawlOrchestrator {
    config: Config,
    transport: Arc<dyn Transport>,
    extractor: Box<dyn DocumentExtractor>,
    bootstrap: Box<dyn BrowserBootstrap>,
    sink: Box<dyn PersistenceSink>,
    session: CrawlSession,
}

impl CrawlOrchestrator {
    pub fn new(
        config: Config,
        transport: Arc<dyn Transport>,
        extractor: Box<dyn DocumentExtractor>,
        bootstrap: Box<dyn BrowserBootstrap>,
        sink: Box<dyn PersistenceSink>,
        session: CrawlSession,
    ) -> Self {
        Self {
            config,
            transport,
            extractor,
            bootstrap,
            sink,
            session,
        }
    }

    /// Session state, for inspection after a run
    pub fn session(&self) -> &CrawlSession {
        &self.session
    }

    /// Harvests every item in order
    ///
    /// This method:
    /// 1. Checks for a shutdown request before each item
    /// 2. Warms up a session for the item (a failure is only logged)
    /// 3. Paginates the item, persisting records page by page
    /// 4. Waits the inter-item delay, except after the last item
    ///
    /// A storage failure abandons the current item and the run moves on.
    ///
    /// # Returns
    ///
    /// * `Ok(RunStatistics)` - Statistics, also after an interrupt
    /// * `Err(HarvestError)` - The run could not be closed in storage
    pub async fn run(&mut self, mut items: Vec<TargetItem>) -> crate::Result<RunStatistics> {
        let start_time = Instant::now();
        let mut stats = RunStatistics::default();
        let total = items.len();

        tracing::info!("Starting harvest of {} items", total);

        for (index, item) in items.iter_mut().enumerate() {
            if self.session.pacer.is_cancelled() {
                tracing::warn!("Shutdown requested, stopping before item {}", item.id);
                stats.interrupted = true;
                break;
            }

            tracing::info!(
                "Progress: item {}/{} - {} ({})",
                index + 1,
                total,
                item.name,
                item.id
            );
            stats.items_attempted += 1;

            let identity = self.session.current_identity();
            let proxy = self.session.proxies.select_preferred();
            if !self
                .bootstrap
                .warm_up(&item.id, &identity, proxy.as_ref())
                .await
            {
                tracing::warn!("Continuing item {} without a warmed-up session", item.id);
            }

            let fetcher = PageFetcher::new(
                self.transport.as_ref(),
                self.extractor.as_ref(),
                &self.config,
            );
            let mut controller =
                PaginationController::new(&fetcher, self.sink.as_mut(), &self.config.crawler);

            match controller.run(&mut self.session, item).await {
                Ok(report) => {
                    stats.pages_fetched += u64::from(report.pages_succeeded);
                    stats.records_written += report.records_written as u64;
                    if report.succeeded() {
                        stats.items_succeeded += 1;
                    } else {
                        tracing::warn!("Item {} yielded no records", item.id);
                        stats.items_failed += 1;
                    }
                    if report.stop_reason == StopReason::Interrupted {
                        stats.interrupted = true;
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Abandoning item {}: {}", item.id, e);
                    stats.items_failed += 1;
                }
            }

            if index + 1 < total && !self.session.pacer.pause(&self.config.crawler.item_delay).await
            {
                stats.interrupted = true;
                break;
            }
        }

        stats.cooldowns = self.session.timeouts.cooldowns();
        stats.elapsed = start_time.elapsed();
        self.sink.finish(&stats)?;

        tracing::info!(
            "Harvest {}: {}/{} items succeeded, {} records in {:?}",
            if stats.interrupted { "interrupted" } else { "completed" },
            stats.items_succeeded,
            stats.items_attempted,
            stats.records_written,
            stats.elapsed
        );

        Ok(stats)
    }
}
