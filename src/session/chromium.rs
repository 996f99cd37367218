//! Headless Chromium bootstrap, built with the `browser` feature.

use super::{BrowserBootstrap, BrowserError, HttpSessionClient, ScrollTracker};
use crate::config::{BrowserConfig as BrowserSettings, TargetConfig};
use crate::crawler::Pacer;
use crate::identity::Identity;
use crate::proxy::SelectedProxy;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::sync::Arc;
use url::Url;

/// Flags that keep automation markers out of the page
const STEALTH_ARGS: [&str; 6] = [
    "--disable-blink-features=AutomationControlled",
    "--disable-gpu",
    "--no-sandbox",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--window-size=1920,1080",
];

/// Session warm-up and scrolled page loads through a real browser
///
/// The browser is launched on first use with the identity and proxy of that
/// call; later calls reuse it. Cookies the browser collects during warm-up are
/// copied into the HTTP session's jar.
pub struct ChromiumBootstrap {
    settings: BrowserSettings,
    target: TargetConfig,
    session: Arc<HttpSessionClient>,
    pacer: Pacer,
    browser: Option<Browser>,
    page: Option<Page>,
}

impl ChromiumBootstrap {
    pub fn new(
        settings: &BrowserSettings,
        target: &TargetConfig,
        session: Arc<HttpSessionClient>,
        pacer: Pacer,
    ) -> Self {
        Self {
            settings: settings.clone(),
            target: target.clone(),
            session,
            pacer,
            browser: None,
            page: None,
        }
    }

    async fn launch(
        &mut self,
        identity: &Identity,
        proxy: Option<&SelectedProxy>,
    ) -> Result<&Page, BrowserError> {
        if self.page.is_none() {
            let mut builder = BrowserConfig::builder();
            if !self.settings.headless {
                builder = builder.with_head();
            }
            if let Some(path) = &self.settings.chrome_path {
                builder = builder.chrome_executable(path);
            }
            for arg in STEALTH_ARGS {
                builder = builder.arg(arg);
            }
            builder = builder.arg(format!("--user-agent={}", identity.user_agent()));
            if let Some(proxy) = proxy {
                builder = builder.arg(format!("--proxy-server={}", proxy.server_url()));
            }
            for arg in &self.settings.chrome_args {
                builder = builder.arg(arg.as_str());
            }

            let config = builder.build().map_err(BrowserError::Launch)?;
            let (browser, mut handler) = Browser::launch(config)
                .await
                .map_err(|e| BrowserError::Launch(e.to_string()))?;

            tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let page = browser
                .new_page("about:blank")
                .await
                .map_err(|e| BrowserError::Launch(e.to_string()))?;

            tracing::info!("Launched Chromium for session bootstrap");
            self.browser = Some(browser);
            self.page = Some(page);
        }

        self.page
            .as_ref()
            .ok_or_else(|| BrowserError::Launch("browser page unavailable".to_string()))
    }

    async fn navigate(page: &Page, url: &str) -> Result<(), BrowserError> {
        page.goto(url)
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        page.wait_for_navigation()
            .await
            .map_err(|e| BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    async fn scroll_height(page: &Page) -> Result<f64, BrowserError> {
        page.evaluate("document.body.scrollHeight")
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?
            .into_value::<f64>()
            .map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn copy_cookies(&self) -> Result<usize, BrowserError> {
        let Some(page) = &self.page else {
            return Ok(0);
        };
        let cookies = page
            .get_cookies()
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        let base = Url::parse(&self.target.base_url).map_err(|e| BrowserError::Navigation {
            url: self.target.base_url.clone(),
            message: e.to_string(),
        })?;

        for cookie in &cookies {
            let line = format!(
                "{}={}; Domain={}; Path={}",
                cookie.name, cookie.value, cookie.domain, cookie.path
            );
            self.session.add_cookie(&line, &base);
        }
        Ok(cookies.len())
    }

    async fn try_warm_up(
        &mut self,
        item_id: &str,
        identity: &Identity,
        proxy: Option<&SelectedProxy>,
    ) -> Result<(), BrowserError> {
        let root = self.target.base_url.clone();
        let item_url = self.target.item_url(item_id);
        let delay = self.settings.warm_up_delay;
        if self.pacer.is_cancelled() {
            return Err(BrowserError::Interrupted);
        }

        let page = self.launch(identity, proxy).await?.clone();
        Self::navigate(&page, &root).await?;
        if !self.pacer.pause(&delay).await {
            return Err(BrowserError::Interrupted);
        }
        Self::navigate(&page, &item_url).await?;

        let copied = self.copy_cookies().await?;
        tracing::debug!("Copied {} browser cookies into the HTTP session", copied);
        Ok(())
    }
}

#[async_trait]
impl BrowserBootstrap for ChromiumBootstrap {
    async fn warm_up(
        &mut self,
        item_id: &str,
        identity: &Identity,
        proxy: Option<&SelectedProxy>,
    ) -> bool {
        match self.try_warm_up(item_id, identity, proxy).await {
            Ok(()) => {
                tracing::info!("Browser session warmed up for item {}", item_id);
                true
            }
            Err(e) => {
                tracing::warn!("Browser warm-up for item {} failed: {}", item_id, e);
                false
            }
        }
    }

    async fn load_fully_scrolled(&mut self, url: &str) -> Result<String, BrowserError> {
        let identity = Identity::new(crate::identity::FALLBACK_DESKTOP);
        let page = self.launch(&identity, None).await?.clone();
        Self::navigate(&page, url).await?;

        let delay = self.settings.scroll_delay;
        let mut tracker = ScrollTracker::new(
            Self::scroll_height(&page).await?,
            self.settings.stable_checks,
        );

        for step in 1..=self.settings.max_scrolls {
            page.evaluate("window.scrollTo(0, document.body.scrollHeight)")
                .await
                .map_err(|e| BrowserError::Script(e.to_string()))?;
            if !self.pacer.pause(&delay).await {
                break;
            }
            if tracker.observe(Self::scroll_height(&page).await?) {
                tracing::debug!("Page height settled after {} scrolls", step);
                break;
            }
        }

        page.content()
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))
    }
}
