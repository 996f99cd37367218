//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the storefront and exercise the
//! HTTP session and full harvest end-to-end.

use review_harvester::config::{Config, DelayRange};
use review_harvester::crawler::{run_harvest, CrawlOrchestrator, CrawlSession, Pacer};
use review_harvester::extract::ReviewExtractor;
use review_harvester::identity::{Identity, FALLBACK_DESKTOP};
use review_harvester::input::parse_targets;
use review_harvester::proxy::{ProxyEndpoint, ProxyPool};
use review_harvester::session::{
    check_proxies, BrowserBootstrap, HttpBootstrap, HttpSessionClient, PageRequest, Transport,
};
use review_harvester::state::TargetItem;
use review_harvester::storage::{load_statistics, MemorySink, RunStatus};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const REVIEW_PATH: &str = "/vp/product/reviews";

/// A review article in the storefront's markup
fn article(author: &str, body: &str) -> String {
    format!(
        r#"<article class="sdp-review__article__list">
  <span class="sdp-review__article__list__info__user__name">{}</span>
  <div class="sdp-review__article__list__info__product-info__star-orange" data-rating="4"></div>
  <div class="sdp-review__article__list__info__product-info__name">Oak Desk, Natural</div>
  <div class="sdp-review__article__list__review__content js_reviewArticleContent">{}</div>
</article>"#,
        author, body
    )
}

/// A review-list document with `count` articles
fn review_page(count: usize) -> String {
    let articles: String = (0..count)
        .map(|i| article(&format!("kim{}", i), "Sturdy and easy to assemble"))
        .collect();
    format!("<html><body>{}</body></html>", articles)
}

/// Creates a test configuration pointing at the mock storefront
fn create_test_config(uri: &str) -> Config {
    let mut config = Config::default();
    config.target.base_url = uri.to_string();
    config.target.review_endpoint = format!("{}{}", uri, REVIEW_PATH);
    config.crawler.max_pages = 20;
    config.crawler.max_empty_pages = 3;
    config.crawler.retry_attempts = 3;
    config.crawler.retry_delay = DelayRange::zero();
    config.crawler.blocked_retry_delay = DelayRange::zero();
    config.crawler.page_delay = DelayRange::zero();
    config.crawler.item_delay = DelayRange::zero();
    config.cooldown.window = DelayRange::zero();
    config.browser.warm_up_delay = DelayRange::zero();
    config
}

fn targets(config: &Config, ids: &[&str]) -> Vec<TargetItem> {
    let entries: Vec<String> = ids
        .iter()
        .map(|id| {
            format!(
                r#"{{"product_url": "{}", "product_name": "Product {}"}}"#,
                config.target.item_url(id),
                id
            )
        })
        .collect();
    parse_targets(&format!("[{}]", entries.join(",")), &config.target)
        .expect("Failed to parse targets")
}

/// Serves review pages by `productId` and `page`
///
/// `pages[i]` is the article count of page `i + 1`; later pages are empty.
struct ReviewPages {
    product_id: &'static str,
    pages: Vec<usize>,
}

impl Respond for ReviewPages {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let param = |name: &str| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };

        if param("productId").as_deref() != Some(self.product_id) {
            return ResponseTemplate::new(200).set_body_string(review_page(0));
        }

        let page: usize = param("page").and_then(|p| p.parse().ok()).unwrap_or(1);
        let count = self.pages.get(page - 1).copied().unwrap_or(0);
        ResponseTemplate::new(200).set_body_string(review_page(count))
    }
}

/// Refuses the first `denials` requests with 403, then serves one article
struct DeniesThenServes {
    denials: usize,
    calls: AtomicUsize,
}

impl Respond for DeniesThenServes {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.denials {
            ResponseTemplate::new(403).set_body_string("Forbidden")
        } else {
            ResponseTemplate::new(200).set_body_string(review_page(1))
        }
    }
}

async fn mount_warm_up(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "PCID=abc123; Path=/")
                .set_body_string("<html><body>home</body></html>"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/vp/products/111"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>item</html>"))
        .mount(server)
        .await;
}

fn orchestrator(config: Config, sink: MemorySink, cancel: CancellationToken) -> CrawlOrchestrator {
    let client = Arc::new(HttpSessionClient::new(&config.http));
    let pacer = Pacer::new(cancel);
    let bootstrap = HttpBootstrap::new(
        Arc::clone(&client) as Arc<dyn Transport>,
        &config.target,
        config.browser.warm_up_delay,
        pacer.fork(),
    );
    let session = CrawlSession::from_config(&config, ProxyPool::empty(), pacer);
    let extractor = ReviewExtractor::storefront().expect("Failed to build extractor");

    CrawlOrchestrator::new(
        config,
        client,
        Box::new(extractor),
        Box::new(bootstrap),
        Box::new(sink),
        session,
    )
}

#[tokio::test]
async fn test_session_client_sends_consistent_identity_headers() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server.uri());
    let referer = config.target.item_url("111");

    Mock::given(method("GET"))
        .and(path(REVIEW_PATH))
        .and(query_param("productId", "111"))
        .and(query_param("page", "3"))
        .and(header("sec-ch-ua-platform", "\"macOS\""))
        .and(header("sec-ch-ua-mobile", "?0"))
        .and(header("referer", referer.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpSessionClient::new(&config.http);
    let mut request = PageRequest::get(config.target.review_endpoint.clone()).with_referer(referer);
    request.query = vec![
        ("productId".to_string(), "111".to_string()),
        ("page".to_string(), "3".to_string()),
    ];

    let response = client
        .get(&request, &Identity::new(FALLBACK_DESKTOP), None)
        .await
        .expect("Request failed");

    assert_eq!(response.status, 200);
    assert_eq!(response.body, "ok");
}

#[tokio::test]
async fn test_warm_up_cookies_reach_review_requests() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server.uri());
    mount_warm_up(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(REVIEW_PATH))
        .and(header("cookie", "PCID=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("with cookie"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Arc::new(HttpSessionClient::new(&config.http));
    let mut bootstrap = HttpBootstrap::new(
        Arc::clone(&client) as Arc<dyn Transport>,
        &config.target,
        DelayRange::zero(),
        Pacer::new(CancellationToken::new()),
    );
    let identity = Identity::new(FALLBACK_DESKTOP);

    assert!(bootstrap.warm_up("111", &identity, None).await);

    let request = PageRequest::get(config.target.review_endpoint.clone());
    let response = client
        .get(&request, &identity, None)
        .await
        .expect("Request failed");
    assert_eq!(response.status, 200);
    assert_eq!(response.body, "with cookie");
}

#[tokio::test]
async fn test_full_harvest_stops_after_empty_streak() {
    let mock_server = MockServer::start().await;
    let config = create_test_config(&mock_server.uri());
    mount_warm_up(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(REVIEW_PATH))
        .respond_with(ReviewPages {
            product_id: "111",
            pages: vec![2, 2, 1],
        })
        .mount(&mock_server)
        .await;

    let items = targets(&config, &["111", "222"]);
    let sink = MemorySink::new();
    let mut orchestrator = orchestrator(config, sink.clone(), CancellationToken::new());

    let stats = orchestrator.run(items).await.expect("Harvest failed");

    assert_eq!(stats.items_attempted, 2);
    assert_eq!(stats.items_succeeded, 1);
    assert_eq!(stats.items_failed, 1);
    assert_eq!(stats.pages_fetched, 3);
    assert_eq!(stats.records_written, 5);
    assert!(!stats.interrupted);

    let records = sink.records();
    assert_eq!(records.len(), 5);
    assert!(records.iter().all(|r| r.item_id == "111"));
    assert_eq!(records[0].record.author, "kim0");
    assert_eq!(records[0].record.rating, 4);
    assert_eq!(records[0].record.title, "Oak Desk, Natural");
    assert_eq!(records[4].page, 3);
    assert_eq!(sink.finished(), Some(stats));

    // Item 111: 3 pages with records, then 3 empty pages. Item 222: 3 empty pages.
    let review_requests = mock_server
        .received_requests()
        .await
        .expect("Request recording disabled")
        .iter()
        .filter(|r| r.url.path() == REVIEW_PATH)
        .count();
    assert_eq!(review_requests, 9);
}

#[tokio::test]
async fn test_denied_page_is_retried_until_served() {
    let mock_server = MockServer::start().await;
    let mut config = create_test_config(&mock_server.uri());
    config.crawler.max_pages = 1;
    mount_warm_up(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(REVIEW_PATH))
        .respond_with(DeniesThenServes {
            denials: 2,
            calls: AtomicUsize::new(0),
        })
        .expect(3)
        .mount(&mock_server)
        .await;

    let items = targets(&config, &["111"]);
    let sink = MemorySink::new();
    let mut orchestrator = orchestrator(config, sink.clone(), CancellationToken::new());

    let stats = orchestrator.run(items).await.expect("Harvest failed");

    assert_eq!(stats.items_succeeded, 1);
    assert_eq!(stats.pages_fetched, 1);
    assert_eq!(sink.records().len(), 1);
}

#[tokio::test]
async fn test_run_harvest_persists_run_to_sqlite() {
    let mock_server = MockServer::start().await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("data").join("reviews.db");

    let mut config = create_test_config(&mock_server.uri());
    config.output.database_path = db_path.to_string_lossy().to_string();
    mount_warm_up(&mock_server).await;

    Mock::given(method("GET"))
        .and(path(REVIEW_PATH))
        .respond_with(ReviewPages {
            product_id: "111",
            pages: vec![3, 1],
        })
        .mount(&mock_server)
        .await;

    let items = targets(&config, &["111"]);
    let stats = run_harvest(
        config,
        "test-hash",
        items,
        ProxyPool::empty(),
        CancellationToken::new(),
    )
    .await
    .expect("Harvest failed");

    assert_eq!(stats.records_written, 4);
    assert!(db_path.exists());

    let stored = load_statistics(&db_path).expect("Failed to load statistics");
    assert_eq!(stored.run_count, 1);
    assert_eq!(stored.total_records, 4);
    assert_eq!(stored.items.len(), 1);
    assert_eq!(stored.items[0].item_id, "111");

    let run = stored.latest_run.expect("Run was not recorded");
    assert_eq!(run.config_hash, "test-hash");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.items_succeeded, 1);
    assert_eq!(run.records_written, 4);
    assert!(run.finished_at.is_some());
}

#[tokio::test]
async fn test_interrupted_harvest_sends_no_requests() {
    let mock_server = MockServer::start().await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("reviews.db");

    let mut config = create_test_config(&mock_server.uri());
    config.output.database_path = db_path.to_string_lossy().to_string();
    let items = targets(&config, &["111", "222"]);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let stats = run_harvest(config, "test-hash", items, ProxyPool::empty(), cancel)
        .await
        .expect("Harvest failed");

    assert!(stats.interrupted);
    assert_eq!(stats.items_attempted, 0);
    assert!(mock_server
        .received_requests()
        .await
        .expect("Request recording disabled")
        .is_empty());

    let stored = load_statistics(&db_path).expect("Failed to load statistics");
    let run = stored.latest_run.expect("Run was not recorded");
    assert_eq!(run.status, RunStatus::Interrupted);
}

#[tokio::test]
async fn test_proxy_check_rejects_unreachable_proxy() {
    let config = Config::default();
    let client = HttpSessionClient::new(&config.http);
    // Nothing listens on port 1, so the proxy connection is refused
    let unreachable = ProxyEndpoint::new(Ipv4Addr::LOCALHOST, 1, None);

    let check = check_proxies(
        &client,
        vec![unreachable.clone()],
        &config.proxy.preflight_url,
    )
    .await;

    assert!(check.working.is_empty());
    assert_eq!(check.failed.len(), 1);
    assert_eq!(check.failed[0].0, unreachable);
}
