//! Fallback orchestration across the access tiers.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::tiers::{EngineApiTier, ImpersonatedTier, PlainScrapeTier};
use crate::{KindedTier, QueryKind, RequestContext, Result, SearchError, SearchResult, Tier};

/// The tier set a [`Search`] runs, in fallback order.
#[derive(Clone)]
pub struct Tiers {
    /// Tier 2, always attempted first for text queries.
    pub impersonated: Arc<dyn Tier>,
    /// Tier 3, attempted only when present.
    pub browser: Option<Arc<dyn Tier>>,
    /// Tier 4, also the only tier for non-text query kinds.
    pub api: Arc<dyn KindedTier>,
    /// Tier 5, whose outcome is final.
    pub scrape: Arc<dyn Tier>,
}

impl Tiers {
    /// The production tiers for `config`.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            impersonated: Arc::new(ImpersonatedTier::new(config)),
            browser: browser_tier(config)?,
            api: Arc::new(EngineApiTier::new(config)),
            scrape: Arc::new(PlainScrapeTier::new(config)),
        })
    }
}

#[cfg(feature = "headless")]
fn browser_tier(config: &SearchConfig) -> Result<Option<Arc<dyn Tier>>> {
    use crate::tiers::{BrowserTier, ChromiumLauncher};

    if !config.use_browser {
        return Ok(None);
    }
    let launcher = Arc::new(ChromiumLauncher::new());
    Ok(Some(Arc::new(BrowserTier::new(launcher, config))))
}

#[cfg(not(feature = "headless"))]
fn browser_tier(config: &SearchConfig) -> Result<Option<Arc<dyn Tier>>> {
    if config.use_browser {
        return Err(SearchError::Config(
            "use_browser requires the `headless` feature".into(),
        ));
    }
    Ok(None)
}

/// Tiered search client.
///
/// A text query runs through at most one successful tier: impersonated HTTP,
/// then the browser (when enabled), then the engine client, then the plain
/// scrape. Tiers run one after another, never concurrently, and results of
/// different tiers are never merged.
#[derive(Clone)]
pub struct Search {
    tiers: Tiers,
}

impl Search {
    /// Creates a client with the production tiers.
    pub fn new(config: SearchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_tiers(Tiers::from_config(&config)?))
    }

    /// Creates a client over an explicit tier set.
    pub fn with_tiers(tiers: Tiers) -> Self {
        Self { tiers }
    }

    /// Whether the browser tier takes part.
    pub fn browser_enabled(&self) -> bool {
        self.tiers.browser.is_some()
    }

    /// Runs the text fallback chain.
    ///
    /// Only the plain-scrape tier's failure, or an error outside a tier's
    /// expected failure class, reaches the caller.
    pub async fn search_text(&self, ctx: &RequestContext) -> Result<Vec<SearchResult>> {
        ctx.validate()?;
        debug!("Text search '{}' (limit {})", ctx.query, ctx.limit());

        let impersonated = &self.tiers.impersonated;
        match impersonated.search(ctx).await {
            Ok(results) if !results.is_empty() => return Ok(results),
            Ok(_) => debug!("{} tier returned nothing", impersonated.kind()),
            Err(e) if e.is_transport() || matches!(e, SearchError::EmptyResult(_) | SearchError::Parse(_)) => {
                debug!("{} tier failed: {}", impersonated.kind(), e)
            }
            Err(e) => return Err(e),
        }

        if let Some(browser) = &self.tiers.browser {
            match browser.search(ctx).await {
                Ok(results) => return Ok(results),
                Err(e @ SearchError::Driver(_)) => {
                    warn!("{} tier failed ({:?}); falling back", browser.kind(), e)
                }
                Err(e) => return Err(e),
            }
        }

        match self.tiers.api.search_kind(QueryKind::Text, ctx).await {
            Ok(results) => return Ok(results),
            Err(e @ SearchError::EngineApi(_)) => {
                warn!("Engine client tier failed ({}); falling back to plain scrape", e)
            }
            Err(e) => return Err(e),
        }

        self.tiers.scrape.search(ctx).await
    }

    /// Runs a query of any kind. Non-text kinds go to the engine client only.
    pub async fn search_kind(
        &self,
        kind: QueryKind,
        ctx: &RequestContext,
    ) -> Result<Vec<SearchResult>> {
        match kind {
            QueryKind::Text => self.search_text(ctx).await,
            _ => {
                ctx.validate()?;
                self.tiers.api.search_kind(kind, ctx).await
            }
        }
    }
}
