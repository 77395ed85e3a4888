//! Tier traits and identifiers.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{QueryKind, RequestContext, Result, SearchResult};

/// The independent retrieval strategies, in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TierKind {
    /// Single GET with a browser-fingerprint header preset.
    Impersonated,
    /// Real browser rendering the results page.
    Browser,
    /// Structured engine client with bounded retry.
    EngineApi,
    /// Raw POST to the no-script endpoint; last resort.
    PlainScrape,
}

impl TierKind {
    /// All tiers in the order the orchestrator tries them.
    pub const ORDER: [TierKind; 4] = [
        TierKind::Impersonated,
        TierKind::Browser,
        TierKind::EngineApi,
        TierKind::PlainScrape,
    ];

    /// Short identifier used in logs and CLI output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Impersonated => "impersonated-http",
            Self::Browser => "browser",
            Self::EngineApi => "engine-api",
            Self::PlainScrape => "plain-scrape",
        }
    }
}

impl fmt::Display for TierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A text-search tier.
///
/// Implementations own every per-call resource they create (clients, browser
/// processes) and release it before returning.
#[async_trait]
pub trait Tier: Send + Sync {
    /// Which tier this is.
    fn kind(&self) -> TierKind;

    /// Runs one attempt of this tier for the given request.
    async fn search(&self, ctx: &RequestContext) -> Result<Vec<SearchResult>>;
}

/// A tier that can serve every query family.
#[async_trait]
pub trait KindedTier: Send + Sync {
    /// Runs the given query family for the request.
    async fn search_kind(&self, kind: QueryKind, ctx: &RequestContext) -> Result<Vec<SearchResult>>;
}
