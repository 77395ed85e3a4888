//! Impersonated-HTTP tier: one GET against the no-script HTML endpoint with
//! a browser header preset.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{ImpersonationProfile, SearchConfig};
use crate::extract::{extract_hits, Markers};
use crate::http::{build_client, header_map, merge_headers, ClientOptions};
use crate::normalize::normalize_wrapped;
use crate::proxy::ProxyConfig;
use crate::{RequestContext, Result, SafeSearch, SearchError, SearchResult, Tier, TierKind};

/// `kp` value of the HTML endpoint for a safe search level.
pub fn kp_param(level: SafeSearch) -> &'static str {
    match level {
        SafeSearch::Off => "-1",
        SafeSearch::Moderate => "0",
        SafeSearch::Strict => "1",
    }
}

/// Query parameters for the HTML endpoint. Modifiers the caller did not set
/// are left out.
pub fn html_params(ctx: &RequestContext) -> Vec<(&'static str, String)> {
    let mut params = vec![("q", ctx.query.clone())];
    if let Some(level) = ctx.safesearch {
        params.push(("kp", kp_param(level).to_string()));
    }
    if let Some(time) = &ctx.time {
        params.push(("df", time.clone()));
    }
    if let Some(region) = &ctx.region {
        params.push(("kl", region.clone()));
    }
    params
}

/// Tier 2.
pub struct ImpersonatedTier {
    endpoint: String,
    profile: ImpersonationProfile,
    timeout: Duration,
}

impl ImpersonatedTier {
    /// Creates the tier from client configuration.
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            endpoint: config.endpoints.html.clone(),
            profile: config.impersonation.clone(),
            timeout: config.impersonate_timeout,
        }
    }

    fn client_options(&self, ctx: &RequestContext) -> Result<ClientOptions> {
        let preset = self.profile.with_env_overrides().headers();
        let base = header_map(preset.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
        let headers = merge_headers(base, &ctx.headers)?;
        let proxy = ProxyConfig::resolve(ctx.proxy.as_deref())?;
        Ok(ClientOptions::new(self.timeout)
            .with_proxy(proxy)
            .with_headers(headers))
    }
}

#[async_trait]
impl Tier for ImpersonatedTier {
    fn kind(&self) -> TierKind {
        TierKind::Impersonated
    }

    async fn search(&self, ctx: &RequestContext) -> Result<Vec<SearchResult>> {
        let limit = ctx.limit();
        let client = build_client(&self.client_options(ctx)?)?;

        let response = client
            .get(&self.endpoint)
            .query(&html_params(ctx))
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
        if html.trim().is_empty() {
            return Err(SearchError::EmptyResult(self.kind()));
        }

        let hits = extract_hits(&html, Markers::HTML, limit)?;
        if hits.is_empty() {
            return Err(SearchError::EmptyResult(self.kind()));
        }
        debug!("{} tier extracted {} hits", self.kind(), hits.len());

        Ok(normalize_wrapped(hits, limit))
    }
}
