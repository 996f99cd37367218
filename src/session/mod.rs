//! Outbound session handling
//!
//! This module covers everything between the crawler and the network:
//! - `Transport`: the seam the page fetcher talks to
//! - `HttpSessionClient`: cookie-bearing reqwest transport with identity, proxy and tiered timeouts
//! - Header derivation keeping client hints consistent with the identity
//! - `BrowserBootstrap`: session warm-up and fully scrolled page loads
//! - Proxy connectivity checks before a run

mod bootstrap;
#[cfg(feature = "browser")]
mod chromium;
mod client;
mod headers;
mod preflight;

pub use bootstrap::{BrowserBootstrap, HttpBootstrap, ScrollTracker};
#[cfg(feature = "browser")]
pub use chromium::ChromiumBootstrap;
pub use client::HttpSessionClient;
pub use headers::derive_headers;
pub use preflight::{check_proxies, ProxyCheck};

use crate::identity::Identity;
use crate::proxy::SelectedProxy;
use async_trait::async_trait;
use thiserror::Error;

/// Substrings of a network error that implicate the proxy in use
const PROXY_FAILURE_MARKERS: [&str; 7] = [
    "timeout",
    "timed out",
    "connection",
    "refused",
    "unreachable",
    "proxy",
    "403",
];

/// One outbound GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub referer: Option<String>,
}

impl PageRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            referer: None,
        }
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }
}

/// A received HTTP response, body fully read
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub final_url: String,
    pub body: String,
}

/// How a request failed before a response arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Other,
}

/// A request that produced no HTTP response
#[derive(Debug, Clone, Error)]
#[error("{kind:?} error for {url}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub url: String,
    /// Full error chain text
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            message: message.into(),
        }
    }

    /// Classifies a reqwest error, keeping every `source()` in the message
    pub fn from_reqwest(url: &str, error: &reqwest::Error) -> Self {
        let kind = if error.is_timeout() {
            TransportErrorKind::Timeout
        } else if error.is_connect() {
            TransportErrorKind::Connect
        } else {
            TransportErrorKind::Other
        };

        let mut message = error.to_string();
        let mut source = std::error::Error::source(error);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        Self::new(kind, url, message)
    }

    /// Timeouts and connection failures feed the crawl-wide circuit breaker
    pub fn is_timeout_like(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::Timeout | TransportErrorKind::Connect
        )
    }

    /// Whether the failure should count against the proxy in use
    pub fn is_proxy_attributable(&self) -> bool {
        if self.is_timeout_like() {
            return true;
        }
        let lowered = self.message.to_lowercase();
        PROXY_FAILURE_MARKERS.iter().any(|m| lowered.contains(m))
    }
}

/// Errors from browser-driven bootstrap and page loads
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Browser support is not compiled in; rebuild with --features browser")]
    Unavailable,

    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Page request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Page request returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Interrupted by shutdown")]
    Interrupted,
}

/// Sends one GET with the given identity and proxy
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        request: &PageRequest,
        identity: &Identity,
        proxy: Option<&SelectedProxy>,
    ) -> Result<HttpResponse, TransportError>;
}
