//! Page fetcher
//!
//! Fetches one page of reviews for one item, retrying within a fixed attempt
//! budget. Each attempt picks an identity and a proxy, issues the request,
//! classifies what came back and updates proxy health and the crawl-wide
//! timeout streak accordingly.

use super::outcome::{classify, ClassifyPolicy, FetchOutcome, TransientReason};
use super::CrawlSession;
use crate::config::{Config, DelayRange};
use crate::extract::{DocumentExtractor, ExtractContext, Record};
use crate::proxy::SelectedProxy;
use crate::session::{PageRequest, Transport, TransportError};
use crate::state::TargetItem;
use std::time::Duration;

/// Final result of fetching one page
#[derive(Debug, Clone, PartialEq)]
pub enum PageResult {
    /// The page yielded records
    Records(Vec<Record>),

    /// A valid page with nothing on it
    Empty,

    /// The first page still looked blocked on the last attempt
    Blocked,

    /// Every attempt failed
    GaveUp,

    /// The response could not be processed
    Failed(String),

    /// Shutdown was requested
    Interrupted,
}

impl PageResult {
    pub fn has_records(&self) -> bool {
        matches!(self, PageResult::Records(_))
    }
}

/// A page result and the number of attempts spent on it
#[derive(Debug, Clone, PartialEq)]
pub struct PageFetch {
    pub result: PageResult,
    pub attempts: u32,
}

/// Retry state machine for one page
pub struct PageFetcher<'a> {
    transport: &'a dyn Transport,
    extractor: &'a dyn DocumentExtractor,
    config: &'a Config,
    policy: ClassifyPolicy,
}

impl<'a> PageFetcher<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        extractor: &'a dyn DocumentExtractor,
        config: &'a Config,
    ) -> Self {
        Self {
            transport,
            extractor,
            config,
            policy: ClassifyPolicy::from_config(&config.crawler),
        }
    }

    /// The review request for one page of an item
    pub fn review_request(&self, item: &TargetItem, page: u32) -> PageRequest {
        let target = &self.config.target;
        let mut request = PageRequest::get(target.review_endpoint.clone())
            .with_referer(target.item_url(&item.id));
        request.query = vec![
            ("productId".to_string(), item.id.clone()),
            ("page".to_string(), page.to_string()),
            ("size".to_string(), target.page_size.to_string()),
            ("sortBy".to_string(), target.sort_by.clone()),
            ("ratings".to_string(), String::new()),
            ("q".to_string(), String::new()),
            ("viRoleCode".to_string(), "2".to_string()),
            ("ratingSummary".to_string(), "false".to_string()),
        ];
        request
    }

    /// Fetches one page, retrying up to the configured attempt budget
    ///
    /// # Arguments
    ///
    /// * `session` - Run-wide proxy, identity and timeout state
    /// * `item` - The item being harvested; its timeout counter is updated
    /// * `page` - 1-based page number
    ///
    /// # Returns
    ///
    /// The page result together with the attempts used, never more than
    /// `crawler.retry-attempts`.
    pub async fn fetch_page(
        &self,
        session: &mut CrawlSession,
        item: &mut TargetItem,
        page: u32,
    ) -> PageFetch {
        let budget = self.config.crawler.retry_attempts;
        let request = self.review_request(item, page);

        for attempt in 1..=budget {
            if session.pacer.is_cancelled() {
                return PageFetch {
                    result: PageResult::Interrupted,
                    attempts: attempt - 1,
                };
            }

            let identity = session.identity_for_attempt(attempt);
            let proxy = session.proxies.select_preferred();
            tracing::debug!(
                "Item {} page {} attempt {}/{} via {}",
                item.id,
                page,
                attempt,
                budget,
                proxy
                    .as_ref()
                    .map(|p| p.label())
                    .unwrap_or_else(|| "direct".to_string())
            );

            let reason = match self.transport.get(&request, &identity, proxy.as_ref()).await {
                Err(error) => {
                    match self
                        .handle_network_error(session, item, proxy.as_ref(), &error)
                        .await
                    {
                        Some(reason) => reason,
                        None => {
                            return PageFetch {
                                result: PageResult::Interrupted,
                                attempts: attempt,
                            }
                        }
                    }
                }
                Ok(response) => {
                    session.timeouts.reset();

                    let records = if response.status == 200 {
                        let context = ExtractContext {
                            item_name: &item.name,
                            title: item.title.as_deref(),
                            page,
                        };
                        match self.extractor.extract(&response.body, &context) {
                            Ok(records) => records,
                            Err(e) => {
                                tracing::error!(
                                    "Extraction failed for item {} page {}: {}",
                                    item.id,
                                    page,
                                    e
                                );
                                return PageFetch {
                                    result: PageResult::Failed(e.to_string()),
                                    attempts: attempt,
                                };
                            }
                        }
                    } else {
                        Vec::new()
                    };

                    let outcome = classify(
                        response.status,
                        &response.body,
                        records.len(),
                        attempt,
                        page,
                        &self.policy,
                    );

                    match outcome {
                        FetchOutcome::Success { record_count } => {
                            tracing::info!(
                                "Item {} page {}: {} records",
                                item.id,
                                page,
                                record_count
                            );
                            item.cursor.consecutive_timeouts = 0;
                            if item.title.is_none() {
                                item.title = records.first().map(|r| r.title.clone());
                            }
                            return PageFetch {
                                result: PageResult::Records(records),
                                attempts: attempt,
                            };
                        }
                        FetchOutcome::EmptyNotBlocked => {
                            tracing::info!("Item {} page {}: no records", item.id, page);
                            return PageFetch {
                                result: PageResult::Empty,
                                attempts: attempt,
                            };
                        }
                        FetchOutcome::EmptyBlocked { indicator } => {
                            tracing::warn!(
                                "Item {} page {} still blocked ('{}') after {} attempts",
                                item.id,
                                page,
                                indicator,
                                attempt
                            );
                            if let Some(p) = &proxy {
                                session.proxies.mark_failed(p);
                            }
                            return PageFetch {
                                result: PageResult::Blocked,
                                attempts: attempt,
                            };
                        }
                        FetchOutcome::FatalError(message) => {
                            return PageFetch {
                                result: PageResult::Failed(message),
                                attempts: attempt,
                            };
                        }
                        FetchOutcome::TransientError(reason) => {
                            self.log_transient(item, page, attempt, &reason);
                            if reason.is_proxy_attributable() {
                                if let Some(p) = &proxy {
                                    session.proxies.mark_failed(p);
                                }
                            }
                            reason
                        }
                    }
                }
            };

            if attempt < budget {
                let delay = self.retry_delay(&reason);
                if !session.pacer.pause(&delay).await {
                    return PageFetch {
                        result: PageResult::Interrupted,
                        attempts: attempt,
                    };
                }
            }
        }

        tracing::warn!(
            "Giving up on item {} page {} after {} attempts",
            item.id,
            page,
            budget
        );
        PageFetch {
            result: PageResult::GaveUp,
            attempts: budget,
        }
    }

    /// Updates counters for a request that got no response
    ///
    /// Returns `None` when a cooldown was interrupted by shutdown.
    async fn handle_network_error(
        &self,
        session: &mut CrawlSession,
        item: &mut TargetItem,
        proxy: Option<&SelectedProxy>,
        error: &TransportError,
    ) -> Option<TransientReason> {
        let timeout = error.is_timeout_like();
        tracing::warn!(
            "Request for item {} failed ({}): {}",
            item.id,
            if timeout { "timeout" } else { "error" },
            error
        );

        if let Some(p) = proxy {
            if error.is_proxy_attributable() {
                session.proxies.mark_failed(p);
            }
        }

        if timeout {
            item.cursor.consecutive_timeouts += 1;
            if session.timeouts.record_timeout() {
                let cooldown = &self.config.cooldown;
                let report_every = Duration::from_secs(cooldown.report_interval.max(1));
                if !session.pacer.cooldown(&cooldown.window, report_every).await {
                    return None;
                }
                session.timeouts.finish_cooldown();
            }
        } else {
            session.timeouts.reset();
        }

        Some(TransientReason::Network {
            message: error.message.clone(),
            timeout,
        })
    }

    fn retry_delay(&self, reason: &TransientReason) -> DelayRange {
        if reason.wants_long_delay() {
            self.config.crawler.blocked_retry_delay
        } else {
            self.config.crawler.retry_delay
        }
    }

    fn log_transient(&self, item: &TargetItem, page: u32, attempt: u32, reason: &TransientReason) {
        match reason {
            TransientReason::AccessDenied => tracing::warn!(
                "Item {} page {} attempt {}: access denied (403)",
                item.id,
                page,
                attempt
            ),
            TransientReason::Status(status) => tracing::warn!(
                "Item {} page {} attempt {}: HTTP {}",
                item.id,
                page,
                attempt,
                status
            ),
            TransientReason::BlockedContent { indicator } => tracing::warn!(
                "Item {} page {} attempt {}: block page detected ('{}')",
                item.id,
                page,
                attempt,
                indicator
            ),
            TransientReason::Network { .. } => {}
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::ProxyConfig;
    use crate::crawler::Pacer;
    use crate::extract::ExtractError;
    use crate::identity::Identity;
    use crate::proxy::{ProxyEndpoint, ProxyPool};
    use crate::session::{HttpResponse, TransportErrorKind};
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::VecDeque;
    use std::net::Ipv4Addr;
    use std::sync::Mutex;
    use tokio_util::sync::CancellationToken;

    /// One scripted transport reply
    #[derive(Debug, Clone)]
    pub(crate) enum Reply {
        Page(u16, String),
        Timeout,
        Refused,
    }

    impl Reply {
        pub(crate) fn reviews(count: usize) -> Self {
            Reply::Page(200, "<article>review</article>".repeat(count))
        }

        pub(crate) fn empty() -> Self {
            Reply::Page(200, "<html><body></body></html>".to_string())
        }
    }

    /// What the transport saw for one request
    #[derive(Debug, Clone)]
    pub(crate) struct Seen {
        pub page: String,
        pub proxy: Option<String>,
        pub user_agent: String,
    }

    /// Replays replies in order, falling back to a default once drained
    pub(crate) struct ScriptedTransport {
        replies: Mutex<VecDeque<Reply>>,
        fallback: Reply,
        pub seen: Mutex<Vec<Seen>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(replies: Vec<Reply>, fallback: Reply) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                fallback,
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn seen(&self) -> Vec<Seen> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(
            &self,
            request: &PageRequest,
            identity: &Identity,
            proxy: Option<&SelectedProxy>,
        ) -> Result<HttpResponse, TransportError> {
            let page = request
                .query
                .iter()
                .find(|(k, _)| k == "page")
                .map(|(_, v)| v.clone())
                .unwrap_or_default();
            self.seen.lock().unwrap().push(Seen {
                page,
                proxy: proxy.map(|p| p.label()),
                user_agent: identity.user_agent().to_string(),
            });

            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone());
            match reply {
                Reply::Page(status, body) => Ok(HttpResponse {
                    status,
                    final_url: request.url.clone(),
                    body,
                }),
                Reply::Timeout => Err(TransportError::new(
                    TransportErrorKind::Timeout,
                    &request.url,
                    "operation timed out",
                )),
                Reply::Refused => Err(TransportError::new(
                    TransportErrorKind::Connect,
                    &request.url,
                    "connection refused",
                )),
            }
        }
    }

    /// One record per `<article>` in the document
    pub(crate) struct ArticleCounter;

    impl DocumentExtractor for ArticleCounter {
        fn extract(
            &self,
            document: &str,
            context: &ExtractContext<'_>,
        ) -> Result<Vec<Record>, ExtractError> {
            if document.contains("<malformed") {
                return Err(ExtractError::Malformed("unterminated article".to_string()));
            }
            Ok(document
                .matches("<article>")
                .enumerate()
                .map(|(i, _)| Record {
                    title: context
                        .title
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("{} (page {})", context.item_name, context.page)),
                    product_name: context.item_name.to_string(),
                    review_date: "2024.05.01".to_string(),
                    author: format!("author-{}-{}", context.page, i),
                    rating: 5,
                    headline: String::new(),
                    body: format!("review {} on page {}", i, context.page),
                    helpful_count: 0,
                    attachment_count: 0,
                })
                .collect())
        }
    }

    /// Configuration with every wait disabled
    pub(crate) fn fast_config() -> Config {
        let mut config = Config::default();
        config.crawler.retry_delay = DelayRange::zero();
        config.crawler.blocked_retry_delay = DelayRange::zero();
        config.crawler.page_delay = DelayRange::zero();
        config.crawler.item_delay = DelayRange::zero();
        config.cooldown.window = DelayRange::zero();
        config.browser.warm_up_delay = DelayRange::zero();
        config
    }

    pub(crate) fn pool(count: u8) -> ProxyPool {
        let endpoints = (1..=count)
            .map(|i| ProxyEndpoint::new(Ipv4Addr::new(10, 0, 0, i), 8080, None))
            .collect();
        ProxyPool::new(endpoints, &ProxyConfig::default())
    }

    pub(crate) fn session(config: &Config, proxies: ProxyPool) -> CrawlSession {
        CrawlSession::from_config(config, proxies, Pacer::new(CancellationToken::new()))
    }

    fn item() -> TargetItem {
        TargetItem::new("123", "Test item", "https://www.coupang.com/vp/products/123")
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let config = fast_config();
        let transport = ScriptedTransport::new(vec![Reply::reviews(3)], Reply::empty());
        let fetcher = PageFetcher::new(&transport, &ArticleCounter, &config);
        let mut session = session(&config, ProxyPool::empty());
        let mut item = item();

        let fetch = fetcher.fetch_page(&mut session, &mut item, 1).await;
        assert_eq!(fetch.attempts, 1);
        match fetch.result {
            PageResult::Records(records) => assert_eq!(records.len(), 3),
            other => panic!("unexpected result {:?}", other),
        }
        assert!(transport.seen()[0].proxy.is_none());
    }

    #[tokio::test]
    async fn test_title_fixed_by_first_page_with_records() {
        let config = fast_config();
        let transport = ScriptedTransport::new(
            vec![Reply::empty(), Reply::reviews(2), Reply::reviews(1)],
            Reply::empty(),
        );
        let fetcher = PageFetcher::new(&transport, &ArticleCounter, &config);
        let mut session = session(&config, ProxyPool::empty());
        let mut item = item();

        assert_eq!(
            fetcher.fetch_page(&mut session, &mut item, 1).await.result,
            PageResult::Empty
        );
        assert_eq!(item.title, None);

        let mut titles = Vec::new();
        for page in 2..=3 {
            match fetcher.fetch_page(&mut session, &mut item, page).await.result {
                PageResult::Records(records) => {
                    titles.extend(records.into_iter().map(|r| r.title))
                }
                other => panic!("unexpected result {:?}", other),
            }
        }

        assert_eq!(item.title.as_deref(), Some("Test item (page 2)"));
        assert_eq!(titles.len(), 3);
        assert!(titles.iter().all(|t| t == "Test item (page 2)"));
    }

    #[tokio::test]
    async fn test_request_query() {
        let config = fast_config();
        let transport = ScriptedTransport::new(vec![], Reply::empty());
        let fetcher = PageFetcher::new(&transport, &ArticleCounter, &config);

        let request = fetcher.review_request(&item(), 4);
        assert_eq!(request.url, "https://www.coupang.com/vp/product/reviews");
        assert_eq!(
            request.referer.as_deref(),
            Some("https://www.coupang.com/vp/products/123")
        );
        assert!(request
            .query
            .contains(&("productId".to_string(), "123".to_string())));
        assert!(request.query.contains(&("page".to_string(), "4".to_string())));
        assert!(request.query.contains(&("size".to_string(), "10".to_string())));
        assert!(request
            .query
            .contains(&("sortBy".to_string(), "DATE_DESC".to_string())));
    }

    #[tokio::test]
    async fn test_attempts_never_exceed_budget() {
        let mut config = fast_config();
        config.crawler.retry_attempts = 4;
        let transport = ScriptedTransport::new(vec![], Reply::Page(500, String::new()));
        let fetcher = PageFetcher::new(&transport, &ArticleCounter, &config);
        let mut session = session(&config, ProxyPool::empty());
        let mut item = item();

        let fetch = fetcher.fetch_page(&mut session, &mut item, 2).await;
        assert_eq!(fetch.result, PageResult::GaveUp);
        assert_eq!(fetch.attempts, 4);
        assert_eq!(transport.seen().len(), 4);
    }

    #[tokio::test]
    async fn test_403_blacklists_endpoint_and_switches() {
        let config = fast_config();
        // The first endpoint used is always refused, every other one serves reviews
        struct SplitTransport {
            seen: Mutex<Vec<String>>,
        }

        #[async_trait]
        impl Transport for SplitTransport {
            async fn get(
                &self,
                request: &PageRequest,
                _identity: &Identity,
                proxy: Option<&SelectedProxy>,
            ) -> Result<HttpResponse, TransportError> {
                let label = proxy.map(|p| p.label()).unwrap_or_default();
                let mut seen = self.seen.lock().unwrap();
                seen.push(label.clone());
                let (status, body) = if seen[0] == label {
                    (403, String::new())
                } else {
                    (200, "<article>ok</article>".to_string())
                };
                Ok(HttpResponse {
                    status,
                    final_url: request.url.clone(),
                    body,
                })
            }
        }

        let transport = SplitTransport {
            seen: Mutex::new(Vec::new()),
        };
        let endpoints = (1..=2)
            .map(|i| ProxyEndpoint::new(Ipv4Addr::new(10, 0, 0, i), 8080, None))
            .collect();
        let proxy_config = ProxyConfig {
            failure_threshold: 1,
            ..ProxyConfig::default()
        };
        let proxies = ProxyPool::with_rng(endpoints, &proxy_config, StdRng::seed_from_u64(7));
        let fetcher = PageFetcher::new(&transport, &ArticleCounter, &config);
        let mut session = session(&config, proxies);
        let mut item = item();

        let first = fetcher.fetch_page(&mut session, &mut item, 1).await;
        assert!(first.result.has_records());
        assert_eq!(first.attempts, 2);
        for page in 2..=10 {
            let fetch = fetcher.fetch_page(&mut session, &mut item, page).await;
            assert!(fetch.result.has_records());
            assert_eq!(fetch.attempts, 1);
        }

        let seen = transport.seen.lock().unwrap().clone();
        let bad = seen[0].clone();
        assert_eq!(seen.len(), 11);
        assert_eq!(seen.iter().filter(|l| **l == bad).count(), 1);

        let (blacklisted, healthy): (Vec<_>, Vec<_>) = session
            .proxies
            .endpoints()
            .iter()
            .partition(|e| e.is_blacklisted());
        assert_eq!(blacklisted.len(), 1);
        assert_eq!(blacklisted[0].to_string(), bad);
        assert_eq!(healthy.len(), 1);
        assert_eq!(healthy[0].failure_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_captcha_first_page_retries_with_long_delay() {
        let mut config = fast_config();
        config.crawler.retry_attempts = 3;
        config.crawler.blocked_retry_delay = DelayRange::new(5.0, 10.0);
        let transport = ScriptedTransport::new(
            vec![
                Reply::Page(200, "<html>Please complete the captcha</html>".to_string()),
                Reply::reviews(2),
            ],
            Reply::empty(),
        );
        let fetcher = PageFetcher::new(&transport, &ArticleCounter, &config);
        let mut session = session(&config, pool(2));
        let mut item = item();

        let started = tokio::time::Instant::now();
        let fetch = fetcher.fetch_page(&mut session, &mut item, 1).await;
        let elapsed = started.elapsed();

        assert!(fetch.result.has_records());
        assert_eq!(fetch.attempts, 2);
        assert!(elapsed >= Duration::from_secs(5), "waited {:?}", elapsed);
        assert!(elapsed <= Duration::from_secs(10), "waited {:?}", elapsed);

        let failures: u32 = session
            .proxies
            .endpoints()
            .iter()
            .map(|e| e.failure_count())
            .sum();
        assert_eq!(failures, 1);
    }

    #[tokio::test]
    async fn test_captcha_until_budget_is_blocked() {
        let mut config = fast_config();
        config.crawler.retry_attempts = 3;
        let transport = ScriptedTransport::new(vec![], Reply::Page(200, "captcha".to_string()));
        let fetcher = PageFetcher::new(&transport, &ArticleCounter, &config);
        let mut session = session(&config, ProxyPool::empty());
        let mut item = item();

        let fetch = fetcher.fetch_page(&mut session, &mut item, 1).await;
        assert_eq!(fetch.result, PageResult::Blocked);
        assert_eq!(fetch.attempts, 3);
    }

    #[tokio::test]
    async fn test_captcha_on_later_page_is_plain_empty() {
        let config = fast_config();
        let transport = ScriptedTransport::new(vec![], Reply::Page(200, "captcha".to_string()));
        let fetcher = PageFetcher::new(&transport, &ArticleCounter, &config);
        let mut session = session(&config, ProxyPool::empty());
        let mut item = item();

        let fetch = fetcher.fetch_page(&mut session, &mut item, 2).await;
        assert_eq!(fetch.result, PageResult::Empty);
        assert_eq!(fetch.attempts, 1);
    }

    #[tokio::test]
    async fn test_later_attempts_rotate_identity() {
        let mut config = fast_config();
        config.crawler.retry_attempts = 2;
        let transport = ScriptedTransport::new(
            vec![Reply::Page(503, String::new()), Reply::reviews(1)],
            Reply::empty(),
        );
        let fetcher = PageFetcher::new(&transport, &ArticleCounter, &config);
        let mut session = session(&config, ProxyPool::empty());
        let first = session.current_identity();
        let mut item = item();

        fetcher.fetch_page(&mut session, &mut item, 1).await;
        let seen = transport.seen();
        assert_eq!(seen[0].user_agent, first.user_agent());
        assert_eq!(session.current_identity().user_agent(), seen[1].user_agent);
    }

    #[tokio::test]
    async fn test_timeouts_trigger_cooldown() {
        let mut config = fast_config();
        config.cooldown.trigger = 3;
        config.crawler.retry_attempts = 5;
        let transport = ScriptedTransport::new(
            vec![Reply::Timeout, Reply::Timeout, Reply::Timeout, Reply::Timeout],
            Reply::reviews(1),
        );
        let fetcher = PageFetcher::new(&transport, &ArticleCounter, &config);
        let mut session = session(&config, ProxyPool::empty());
        let mut item = item();

        let fetch = fetcher.fetch_page(&mut session, &mut item, 1).await;
        assert!(fetch.result.has_records());
        assert_eq!(fetch.attempts, 5);
        assert_eq!(session.timeouts.cooldowns(), 1);
        assert_eq!(session.timeouts.consecutive(), 0);
        assert_eq!(item.cursor.consecutive_timeouts, 0);
    }

    #[tokio::test]
    async fn test_response_resets_timeout_streak() {
        let mut config = fast_config();
        config.cooldown.trigger = 3;
        let transport = ScriptedTransport::new(
            vec![
                Reply::Timeout,
                Reply::Timeout,
                Reply::Page(500, String::new()),
                Reply::Timeout,
            ],
            Reply::reviews(1),
        );
        let fetcher = PageFetcher::new(&transport, &ArticleCounter, &config);
        let mut session = session(&config, ProxyPool::empty());
        let mut item = item();

        fetcher.fetch_page(&mut session, &mut item, 1).await;
        assert_eq!(session.timeouts.cooldowns(), 0);
    }

    #[tokio::test]
    async fn test_network_error_marks_proxy() {
        let mut config = fast_config();
        config.crawler.retry_attempts = 2;
        let transport = ScriptedTransport::new(vec![Reply::Refused], Reply::reviews(1));
        let fetcher = PageFetcher::new(&transport, &ArticleCounter, &config);
        let mut session = session(&config, pool(1));
        let mut item = item();

        let fetch = fetcher.fetch_page(&mut session, &mut item, 1).await;
        assert!(fetch.result.has_records());
        assert_eq!(session.proxies.endpoints()[0].failure_count(), 1);
        assert_eq!(item.cursor.consecutive_timeouts, 0);
    }

    #[tokio::test]
    async fn test_extraction_failure_abandons_page() {
        let config = fast_config();
        let transport = ScriptedTransport::new(
            vec![Reply::Page(200, "<malformed".to_string())],
            Reply::reviews(1),
        );
        let fetcher = PageFetcher::new(&transport, &ArticleCounter, &config);
        let mut session = session(&config, ProxyPool::empty());
        let mut item = item();

        let fetch = fetcher.fetch_page(&mut session, &mut item, 1).await;
        assert!(matches!(fetch.result, PageResult::Failed(_)));
        assert_eq!(fetch.attempts, 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_attempt() {
        let config = fast_config();
        let transport = ScriptedTransport::new(vec![], Reply::reviews(1));
        let fetcher = PageFetcher::new(&transport, &ArticleCounter, &config);
        let token = CancellationToken::new();
        let mut session =
            CrawlSession::from_config(&config, ProxyPool::empty(), Pacer::new(token.clone()));
        token.cancel();
        let mut item = item();

        let fetch = fetcher.fetch_page(&mut session, &mut item, 1).await;
        assert_eq!(fetch.result, PageResult::Interrupted);
        assert!(transport.seen().is_empty());
    }
}
