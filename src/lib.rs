//! Review-Harvester: a resilient paginated review crawler
//!
//! This crate harvests per-item review pages from a rate-limited, bot-hostile
//! storefront. It rotates egress proxies and client identities under a health
//! model, tells genuine end-of-data apart from soft blocking, and writes the
//! extracted records to SQLite.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod identity;
pub mod input;
pub mod output;
pub mod proxy;
pub mod session;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Review-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] session::TransportError),

    #[error("Browser error: {0}")]
    Browser(#[from] session::BrowserError),

    #[error("Extraction error: {0}")]
    Extract(#[from] extract::ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while loading target and proxy lists
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse target list: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No usable target items in {0}")]
    NoTargets(String),

    #[error("Proxies are required but none were loaded from {0}")]
    NoProxies(String),

    #[error("Proxies are required but none of the {0} checked proxies is working")]
    NoWorkingProxies(usize),

    #[error("Invalid target URL '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("Invalid proxy line '{line}': {reason}")]
    InvalidProxy { line: String, reason: String },
}

/// Result type alias for Review-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for input loading
pub type InputResult<T> = std::result::Result<T, InputError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlOrchestrator, FetchOutcome};
pub use identity::{Identity, IdentityGenerator, IdentityKind, PlatformClass};
pub use output::RunStatistics;
pub use proxy::{ProxyEndpoint, ProxyPool, SelectedProxy};
pub use state::TargetItem;
