use super::{CrawlSession, PageFetcher, PageResult};
use crate::config::CrawlerConfig;
use crate::state::TargetItem;
use crate::storage::{PersistenceSink, StorageResult};

/// Why pagination stopped for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Too many consecutive pages without records
    EmptyPageLimit,

    /// The page cap was reached
    PageLimit,

    /// Shutdown was requested
    Interrupted,
}

/// Summary of one item's pagination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub item_id: String,
    pub pages_succeeded: u32,
    pub pages_attempted: u32,
    pub records_written: usize,
    /// Cursor position when pagination stopped
    pub final_page: u32,
    pub stop_reason: StopReason,
}

impl ItemReport {
    /// An item succeeds when at least one page yielded records
    pub fn succeeded(&self) -> bool {
        self.pages_succeeded > 0
    }
}

/// Walks an item's pages in order and hands records to the sink
pub struct PaginationController<'a> {
    fetcher: &'a PageFetcher<'a>,
    sink: &'a mut dyn PersistenceSink,
    crawler: &'a CrawlerConfig,
}

impl<'a> PaginationController<'a> {
    pub fn new(
        fetcher: &'a PageFetcher<'a>,
        sink: &'a mut dyn PersistenceSink,
        crawler: &'a CrawlerConfig,
    ) -> Self {
        Self {
            fetcher,
            sink,
            crawler,
        }
    }

    /// Paginates `item` until a stop condition holds
    ///
    /// Empty, blocked, abandoned and failed pages all count towards the
    /// empty streak. From the second empty page in a row the current proxy
    /// is swapped and the same page retried, within `proxy-change-budget`;
    /// otherwise the cursor moves on.
    ///
    /// # Returns
    ///
    /// * `Ok(ItemReport)` - Pagination finished or was interrupted
    /// * `Err(StorageError)` - Records could not be persisted
    pub async fn run(
        &mut self,
        session: &mut CrawlSession,
        item: &mut TargetItem,
    ) -> StorageResult<ItemReport> {
        let mut pages_succeeded = 0;
        let mut pages_attempted = 0;
        let mut records_written = 0;

        let stop_reason = loop {
            if session.pacer.is_cancelled() {
                break StopReason::Interrupted;
            }
            if item.cursor.consecutive_empty_pages >= self.crawler.max_empty_pages {
                tracing::info!(
                    "Item {}: {} empty pages in a row, stopping",
                    item.id,
                    item.cursor.consecutive_empty_pages
                );
                break StopReason::EmptyPageLimit;
            }
            let page = item.cursor.current_page;
            if page > self.crawler.max_pages {
                tracing::info!("Item {}: reached page limit {}", item.id, self.crawler.max_pages);
                break StopReason::PageLimit;
            }

            let fetch = self.fetcher.fetch_page(session, item, page).await;
            pages_attempted += 1;

            match fetch.result {
                PageResult::Records(records) => {
                    records_written += self.sink.append(item, page, &records)?;
                    pages_succeeded += 1;
                    item.cursor.record_success();
                    if !session.pacer.pause(&self.crawler.page_delay).await {
                        break StopReason::Interrupted;
                    }
                }
                PageResult::Interrupted => break StopReason::Interrupted,
                other => {
                    tracing::debug!("Item {} page {}: {:?}", item.id, page, other);
                    item.cursor.record_empty();
                    if !self.try_proxy_change(session, item) {
                        item.cursor.advance();
                    }
                }
            }
        };

        let report = ItemReport {
            item_id: item.id.clone(),
            pages_succeeded,
            pages_attempted,
            records_written,
            final_page: item.cursor.current_page,
            stop_reason,
        };
        tracing::info!(
            "Item {} finished: {} records from {}/{} pages ({:?})",
            report.item_id,
            report.records_written,
            report.pages_succeeded,
            report.pages_attempted,
            report.stop_reason
        );
        Ok(report)
    }

    /// Retires the current proxy so the same page is retried elsewhere
    fn try_proxy_change(&self, session: &mut CrawlSession, item: &mut TargetItem) -> bool {
        let cursor = &mut item.cursor;
        if cursor.consecutive_empty_pages < 2
            || cursor.proxy_change_attempts >= self.crawler.proxy_change_budget
            || !session.proxies.has_healthy_alternative()
        {
            return false;
        }
        let Some(current) = session.proxies.current() else {
            return false;
        };

        session.proxies.mark_failed(&current);
        cursor.proxy_change_attempts += 1;
        tracing::info!(
            "Item {}: {} empty pages, changing proxy away from {} ({}/{})",
            item.id,
            cursor.consecutive_empty_pages,
            current,
            cursor.proxy_change_attempts,
            self.crawler.proxy_change_budget
        );
        true
    }
}
