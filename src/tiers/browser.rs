//! Real-browser tier.
//!
//! The tier logic is independent of the automation backend: it talks to a
//! [`BrowserLauncher`] that yields a [`BrowserSession`]. The Chrome DevTools
//! backend lives in [`crate::tiers::chromium`].
//!
//! Each call launches its own browser and closes it before returning, on
//! success and on failure alike.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use crate::config::SearchConfig;
use crate::extract::{extract_hits, Markers, RESULT_LINK};
use crate::normalize::normalize_wrapped;
use crate::proxy::{ProxyConfig, ProxyEnvGuard};
use crate::{RequestContext, Result, SearchError, SearchResult, Tier, TierKind};

/// Results extracted by this tier, whatever the caller asked for.
pub const INTERNAL_MAX_RETURN: usize = 10;

/// Upper bound of the random pause before teardown, in milliseconds.
const TEARDOWN_JITTER_MS: u64 = 10;

/// How to start a browser for one call.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    /// Run without a window.
    pub headless: bool,
    /// Proxy passed to the browser as a launch argument.
    pub proxy: Option<ProxyConfig>,
    /// Explicit executable. If `None`, detected or provisioned.
    pub chrome_path: Option<PathBuf>,
}

/// A live browser owned by exactly one call.
#[async_trait]
pub trait BrowserSession: Send {
    /// Sends `headers` with every subsequent request.
    async fn set_extra_headers(&mut self, headers: &BTreeMap<String, String>) -> Result<()>;

    /// Loads `url`.
    async fn navigate(&mut self, url: &str) -> Result<()>;

    /// Resolves once an element matching `css` is in the DOM. Unbounded;
    /// the caller applies the timeout.
    async fn wait_for(&mut self, css: &str) -> Result<()>;

    /// Rendered markup of the current page.
    async fn content(&mut self) -> Result<String>;

    /// Terminates the browser process.
    async fn close(&mut self) -> Result<()>;
}

/// Starts browser sessions. Launching includes driver provisioning.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>>;
}

/// Tier 3.
pub struct BrowserTier {
    launcher: Arc<dyn BrowserLauncher>,
    page_url: String,
    headless: bool,
    bypass_proxy_for_driver: bool,
    launch_timeout: Duration,
    timeout: Duration,
    chrome_path: Option<PathBuf>,
}

impl BrowserTier {
    /// Creates the tier on top of `launcher`.
    pub fn new(launcher: Arc<dyn BrowserLauncher>, config: &SearchConfig) -> Self {
        Self {
            launcher,
            page_url: config.endpoints.browser_page.clone(),
            headless: config.headless,
            bypass_proxy_for_driver: config.bypass_proxy_for_driver,
            launch_timeout: config.launch_timeout,
            timeout: config.browser_timeout,
            chrome_path: config.chrome_path.clone(),
        }
    }

    /// Results page URL for `query`.
    pub fn page_url(&self, query: &str) -> String {
        format!("{}?q={}", self.page_url, urlencoding::encode(query))
    }

    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>> {
        // Proxy variables stay cleared until the launch future completes or
        // is dropped on timeout.
        let _guard = self.bypass_proxy_for_driver.then(ProxyEnvGuard::clear);
        tokio::time::timeout(self.launch_timeout, self.launcher.launch(options))
            .await
            .map_err(|_| {
                SearchError::Driver(format!(
                    "Browser launch timed out after {:?}",
                    self.launch_timeout
                ))
            })?
    }

    async fn bounded<T>(
        &self,
        step: &str,
        fut: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| SearchError::Driver(format!("{} timed out after {:?}", step, self.timeout)))?
    }

    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        ctx: &RequestContext,
    ) -> Result<Vec<SearchResult>> {
        if !ctx.headers.is_empty() {
            if let Err(e) = session.set_extra_headers(&ctx.headers).await {
                debug!("Header injection failed: {}", e);
            }
        }

        let url = self.page_url(&ctx.query);
        self.bounded("Navigation", session.navigate(&url)).await?;
        self.bounded("Waiting for results", session.wait_for(RESULT_LINK))
            .await?;

        let html = session.content().await?;
        let hits = extract_hits(&html, Markers::BROWSER, INTERNAL_MAX_RETURN)?;
        debug!("{} tier extracted {} hits", TierKind::Browser, hits.len());
        Ok(normalize_wrapped(hits, INTERNAL_MAX_RETURN))
    }
}

#[async_trait]
impl Tier for BrowserTier {
    fn kind(&self) -> TierKind {
        TierKind::Browser
    }

    async fn search(&self, ctx: &RequestContext) -> Result<Vec<SearchResult>> {
        let options = LaunchOptions {
            headless: self.headless,
            proxy: ProxyConfig::resolve(ctx.proxy.as_deref())?,
            chrome_path: self.chrome_path.clone(),
        };

        let mut session = self.launch(&options).await?;
        let outcome = self.drive(session.as_mut(), ctx).await;

        let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..=TEARDOWN_JITTER_MS));
        tokio::time::sleep(jitter).await;
        if let Err(e) = session.close().await {
            debug!("Ignoring browser teardown error: {}", e);
        }

        outcome
    }
}
