use super::{BrowserError, PageRequest, Transport};
use crate::config::{DelayRange, TargetConfig};
use crate::crawler::Pacer;
use crate::identity::{Identity, FALLBACK_DESKTOP};
use crate::proxy::SelectedProxy;
use async_trait::async_trait;
use std::sync::Arc;

/// Establishes a session before raw requests begin
///
/// Implementations visit the storefront root and then the item page so the
/// shared cookie jar holds whatever the site sets for a real visitor. A failed
/// warm-up is reported and never aborts the item.
#[async_trait]
pub trait BrowserBootstrap: Send {
    /// Warms up a session for `item_id`; `false` means the visit failed
    async fn warm_up(
        &mut self,
        item_id: &str,
        identity: &Identity,
        proxy: Option<&SelectedProxy>,
    ) -> bool;

    /// Loads `url` and returns its document once lazy content stops growing
    async fn load_fully_scrolled(&mut self, url: &str) -> Result<String, BrowserError>;
}

/// Tracks page height across scroll steps
///
/// Scrolling is complete once the height has been unchanged for
/// `required` consecutive checks.
#[derive(Debug, Clone)]
pub struct ScrollTracker {
    last_height: f64,
    unchanged: u32,
    required: u32,
}

impl ScrollTracker {
    pub fn new(initial_height: f64, required: u32) -> Self {
        Self {
            last_height: initial_height,
            unchanged: 0,
            required,
        }
    }

    /// Records the height after a scroll step; `true` once it has settled
    pub fn observe(&mut self, height: f64) -> bool {
        if (height - self.last_height).abs() < f64::EPSILON {
            self.unchanged += 1;
        } else {
            self.unchanged = 0;
            self.last_height = height;
        }
        self.unchanged >= self.required
    }
}

/// Warm-up over plain HTTP through the shared session transport
///
/// Cookies land in the transport's jar. Without a script engine,
/// `load_fully_scrolled` is a single GET.
pub struct HttpBootstrap {
    transport: Arc<dyn Transport>,
    target: TargetConfig,
    warm_up_delay: DelayRange,
    pacer: Pacer,
    identity: Identity,
    proxy: Option<SelectedProxy>,
}

impl HttpBootstrap {
    pub fn new(
        transport: Arc<dyn Transport>,
        target: &TargetConfig,
        warm_up_delay: DelayRange,
        pacer: Pacer,
    ) -> Self {
        Self {
            transport,
            target: target.clone(),
            warm_up_delay,
            pacer,
            identity: Identity::new(FALLBACK_DESKTOP),
            proxy: None,
        }
    }

    async fn visit(&self, request: &PageRequest) -> Result<u16, BrowserError> {
        let response = self
            .transport
            .get(request, &self.identity, self.proxy.as_ref())
            .await?;
        Ok(response.status)
    }
}

#[async_trait]
impl BrowserBootstrap for HttpBootstrap {
    async fn warm_up(
        &mut self,
        item_id: &str,
        identity: &Identity,
        proxy: Option<&SelectedProxy>,
    ) -> bool {
        self.identity = identity.clone();
        self.proxy = proxy.cloned();

        let root = PageRequest::get(self.target.base_url.clone());
        match self.visit(&root).await {
            Ok(status) => tracing::debug!("Warm-up root visit returned {}", status),
            Err(e) => {
                tracing::warn!("Warm-up root visit failed: {}", e);
                return false;
            }
        }

        if !self.pacer.pause(&self.warm_up_delay).await {
            return false;
        }

        let item = PageRequest::get(self.target.item_url(item_id))
            .with_referer(self.target.base_url.clone());
        match self.visit(&item).await {
            Ok(status) if status < 400 => {
                tracing::info!("Session warmed up for item {}", item_id);
                true
            }
            Ok(status) => {
                tracing::warn!("Warm-up item visit for {} returned {}", item_id, status);
                false
            }
            Err(e) => {
                tracing::warn!("Warm-up item visit for {} failed: {}", item_id, e);
                false
            }
        }
    }

    async fn load_fully_scrolled(&mut self, url: &str) -> Result<String, BrowserError> {
        let request = PageRequest::get(url).with_referer(self.target.base_url.clone());
        let response = self
            .transport
            .get(&request, &self.identity, self.proxy.as_ref())
            .await?;

        if response.status != 200 {
            return Err(BrowserError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(response.body)
    }
}
