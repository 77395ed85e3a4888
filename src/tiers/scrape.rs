//! Plain-scrape tier: a single form POST, anchors only. Last resort, no retry.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::config::SearchConfig;
use crate::extract::{extract_hits, Markers};
use crate::http::{build_client, merge_headers, ClientOptions};
use crate::normalize::normalize_plain;
use crate::proxy::ProxyConfig;
use crate::{RequestContext, Result, SearchError, SearchResult, Tier, TierKind};

/// Tier 5.
pub struct PlainScrapeTier {
    endpoint: String,
    timeout: Duration,
}

impl PlainScrapeTier {
    /// Creates the tier from client configuration.
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            endpoint: config.endpoints.html.clone(),
            timeout: config.scrape_timeout,
        }
    }
}

#[async_trait]
impl Tier for PlainScrapeTier {
    fn kind(&self) -> TierKind {
        TierKind::PlainScrape
    }

    async fn search(&self, ctx: &RequestContext) -> Result<Vec<SearchResult>> {
        let options = ClientOptions::new(self.timeout)
            .with_proxy(ProxyConfig::resolve(ctx.proxy.as_deref())?)
            .with_headers(merge_headers(HeaderMap::new(), &ctx.headers)?);
        let client = build_client(&options)?;

        let response = client
            .post(&self.endpoint)
            .form(&[("q", ctx.query.as_str())])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }

        let html = response.text().await?;
        let hits = extract_hits(&html, Markers::LINKS_ONLY, ctx.limit())?;
        Ok(normalize_plain(hits, ctx.limit()))
    }
}
