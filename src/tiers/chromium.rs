//! Chrome DevTools backend for the browser tier.
//!
//! Only available with the `headless` Cargo feature.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, Headers, SetExtraHttpHeadersParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::browser_setup::ensure_chrome;
use crate::tiers::browser::{BrowserLauncher, BrowserSession, LaunchOptions};
use crate::{Result, SearchError};

/// Poll interval while waiting for a selector to appear.
const SELECTOR_POLL: Duration = Duration::from_millis(100);

fn driver(context: &str, err: impl std::fmt::Display) -> SearchError {
    SearchError::Driver(format!("{}: {}", context, err))
}

/// Launches Chrome/Chromium through the DevTools protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromiumLauncher;

impl ChromiumLauncher {
    /// Creates the launcher.
    pub fn new() -> Self {
        Self
    }

    fn browser_config(options: &LaunchOptions, executable: std::path::PathBuf) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder().chrome_executable(executable);

        builder = if options.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };

        builder = builder
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run");

        if let Some(proxy) = &options.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy.server()));
        }

        builder
            .build()
            .map_err(|e| driver("Failed to build browser config", e))
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn BrowserSession>> {
        let executable = ensure_chrome(options.chrome_path.as_deref()).await?;
        debug!("Launching {}", executable.display());
        let config = Self::browser_config(options, executable)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| driver("Failed to launch browser", e))?;

        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    warn!("Browser CDP handler error: {}", e);
                }
            }
            debug!("Browser CDP handler exited");
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                browser.close().await.ok();
                events.abort();
                return Err(driver("Failed to open tab", e));
            }
        };

        Ok(Box::new(ChromiumSession {
            browser,
            page,
            events,
        }))
    }
}

/// One browser process with a single tab.
struct ChromiumSession {
    browser: Browser,
    page: Page,
    events: JoinHandle<()>,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn set_extra_headers(&mut self, headers: &BTreeMap<String, String>) -> Result<()> {
        self.page
            .execute(EnableParams::default())
            .await
            .map_err(|e| driver("Network.enable failed", e))?;

        let value = serde_json::to_value(headers)
            .map_err(|e| driver("Failed to encode headers", e))?;
        self.page
            .execute(SetExtraHttpHeadersParams::new(Headers::new(value)))
            .await
            .map_err(|e| driver("Network.setExtraHTTPHeaders failed", e))?;
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| driver("Navigation failed", e))?;
        Ok(())
    }

    async fn wait_for(&mut self, css: &str) -> Result<()> {
        loop {
            if self.page.find_element(css).await.is_ok() {
                return Ok(());
            }
            tokio::time::sleep(SELECTOR_POLL).await;
        }
    }

    async fn content(&mut self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| driver("Failed to read page content", e))
    }

    async fn close(&mut self) -> Result<()> {
        let closed = self.browser.close().await;
        let waited = self.browser.wait().await;
        self.events.abort();
        closed.map_err(|e| driver("Failed to close browser", e))?;
        waited.map_err(|e| driver("Failed to reap browser process", e))?;
        Ok(())
    }
}
