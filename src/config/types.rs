use crate::identity::IdentityKind;
use rand::Rng;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure for Review-Harvester
///
/// Every section is optional; missing sections and keys take the defaults
/// tuned for the production storefront.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub target: TargetConfig,
    pub crawler: CrawlerConfig,
    pub cooldown: CooldownConfig,
    pub proxy: ProxyConfig,
    pub http: HttpConfig,
    pub identity: IdentityConfig,
    pub browser: BrowserConfig,
    pub listing: ListingConfig,
    pub output: OutputConfig,
}

/// A randomized wait, in seconds, sampled uniformly from `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DelayRange {
    pub min: f64,
    pub max: f64,
}

impl DelayRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// A range that never waits
    pub const fn zero() -> Self {
        Self { min: 0.0, max: 0.0 }
    }

    /// Draws a duration from the range
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max <= self.min {
            return Duration::from_secs_f64(self.min.max(0.0));
        }
        Duration::from_secs_f64(rng.gen_range(self.min..=self.max))
    }

    pub fn is_zero(&self) -> bool {
        self.max <= 0.0
    }
}

/// Storefront endpoints and review-query parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Root of the storefront, visited during session warm-up
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path prefix that identifies an item page (`/vp/products/{id}`)
    #[serde(rename = "item-path")]
    pub item_path: String,

    /// Endpoint serving one page of review articles
    #[serde(rename = "review-endpoint")]
    pub review_endpoint: String,

    /// Reviews requested per page
    #[serde(rename = "page-size")]
    pub page_size: u32,

    /// Sort order sent with each review request
    #[serde(rename = "sort-by")]
    pub sort_by: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.coupang.com".to_string(),
            item_path: "/vp/products/".to_string(),
            review_endpoint: "https://www.coupang.com/vp/product/reviews".to_string(),
            page_size: 10,
            sort_by: "DATE_DESC".to_string(),
        }
    }
}

impl TargetConfig {
    /// The item page URL for an item identifier
    ///
    /// `item-path` may be written with or without surrounding slashes.
    pub fn item_url(&self, item_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.item_path.trim_matches('/'),
            item_id
        )
    }
}

/// Crawler pacing and retry behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Hard upper bound on pages visited per item
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Consecutive non-yielding pages that end an item
    #[serde(rename = "max-empty-pages")]
    pub max_empty_pages: u32,

    /// Attempts per page before giving up
    #[serde(rename = "retry-attempts")]
    pub retry_attempts: u32,

    /// Wait between ordinary retries
    #[serde(rename = "retry-delay")]
    pub retry_delay: DelayRange,

    /// Wait after a block page was detected
    #[serde(rename = "blocked-retry-delay")]
    pub blocked_retry_delay: DelayRange,

    /// Wait after each successful page
    #[serde(rename = "page-delay")]
    pub page_delay: DelayRange,

    /// Wait between items
    #[serde(rename = "item-delay")]
    pub item_delay: DelayRange,

    /// Same-page proxy changes allowed per empty streak (0 disables)
    #[serde(rename = "proxy-change-budget")]
    pub proxy_change_budget: u32,

    /// Case-insensitive markers of a block page
    #[serde(rename = "block-indicators")]
    pub block_indicators: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 150,
            max_empty_pages: 5,
            retry_attempts: 10,
            retry_delay: DelayRange::new(1.0, 2.0),
            blocked_retry_delay: DelayRange::new(5.0, 10.0),
            page_delay: DelayRange::new(1.0, 3.0),
            item_delay: DelayRange::new(10.0, 20.0),
            proxy_change_budget: 3,
            block_indicators: [
                "access denied",
                "blocked",
                "forbidden",
                "captcha",
                "robot",
                "bot",
                "security",
                "verification",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Crawl-wide circuit breaker on consecutive network failures
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CooldownConfig {
    /// Consecutive timeouts that trigger a cooldown
    pub trigger: u32,

    /// Length of the cooldown
    pub window: DelayRange,

    /// Seconds between "minutes remaining" log lines
    #[serde(rename = "report-interval")]
    pub report_interval: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            trigger: 5,
            window: DelayRange::new(600.0, 900.0),
            report_interval: 30,
        }
    }
}

/// Proxy health model
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Failures after which an endpoint is blacklisted
    #[serde(rename = "failure-threshold")]
    pub failure_threshold: u32,

    /// Highest failure count still considered preferred
    #[serde(rename = "preferred-max-failures")]
    pub preferred_max_failures: u32,

    /// Refuse to start without at least one proxy
    pub required: bool,

    /// Check every proxy before the run and keep only those that answer
    pub preflight: bool,

    /// URL fetched through each proxy by the connectivity check
    #[serde(rename = "preflight-url")]
    pub preflight_url: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            preferred_max_failures: 1,
            required: false,
            preflight: false,
            preflight_url: "http://httpbin.org/ip".to_string(),
        }
    }
}

/// Outbound HTTP settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Connect timeout in seconds
    #[serde(rename = "connect-timeout")]
    pub connect_timeout: u64,

    /// Read timeout in seconds
    #[serde(rename = "read-timeout")]
    pub read_timeout: u64,

    #[serde(rename = "accept-language")]
    pub accept_language: String,

    /// Static headers added to every request
    #[serde(rename = "extra-headers")]
    pub extra_headers: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let mut extra_headers = BTreeMap::new();
        extra_headers.insert("x-coupang-target-market".to_string(), "KR".to_string());
        extra_headers.insert("x-coupang-accept-language".to_string(), "ko-KR".to_string());
        Self {
            connect_timeout: 15,
            read_timeout: 30,
            accept_language: "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
            extra_headers,
        }
    }
}

impl HttpConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout)
    }
}

/// Client identity generation
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Draws before falling back to the fixed identity
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Case-insensitive substrings that disqualify a candidate
    #[serde(rename = "excluded-keywords")]
    pub excluded_keywords: Vec<String>,

    /// Replacement catalogue; empty uses the built-in one
    #[serde(rename = "user-agents")]
    pub user_agents: Vec<String>,

    /// Platform requested on every draw: `random`, `desktop` or `mobile`
    pub kind: IdentityKind,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            excluded_keywords: [
                "Windows NT",
                "Win32",
                "Win64",
                "WOW64",
                "Windows 10",
                "Windows 11",
                "Windows 7",
                "Windows 8",
                "Microsoft Windows",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            user_agents: Vec::new(),
            kind: IdentityKind::Random,
        }
    }
}

/// Headless browser settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Use Chromium for warm-up and listing pages (needs the `browser` feature)
    pub enabled: bool,

    pub headless: bool,

    /// Unchanged height checks that end scrolling
    #[serde(rename = "stable-checks")]
    pub stable_checks: u32,

    /// Upper bound on scroll steps per page
    #[serde(rename = "max-scrolls")]
    pub max_scrolls: u32,

    #[serde(rename = "scroll-delay")]
    pub scroll_delay: DelayRange,

    /// Pause between the root visit and the item visit
    #[serde(rename = "warm-up-delay")]
    pub warm_up_delay: DelayRange,

    /// Path to a Chromium binary; detected when unset
    #[serde(rename = "chrome-path")]
    pub chrome_path: Option<String>,

    /// Extra command-line flags
    #[serde(rename = "chrome-args")]
    pub chrome_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            headless: true,
            stable_checks: 3,
            max_scrolls: 50,
            scroll_delay: DelayRange::new(2.0, 4.0),
            warm_up_delay: DelayRange::new(2.0, 4.0),
            chrome_path: None,
            chrome_args: Vec::new(),
        }
    }
}

/// Listing-page discovery of target items
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    /// Listing URL with a `{page}` placeholder
    #[serde(rename = "url-template")]
    pub url_template: String,

    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    #[serde(rename = "page-delay")]
    pub page_delay: DelayRange,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            url_template:
                "https://www.coupang.com/np/products/brand-shop?brandName=example&page={page}"
                    .to_string(),
            max_pages: 5,
            page_delay: DelayRange::new(2.0, 5.0),
        }
    }
}

impl ListingConfig {
    pub fn page_url(&self, page: u32) -> String {
        self.url_template.replace("{page}", &page.to_string())
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./reviews.db".to_string(),
        }
    }
}
