//! Structured engine-client tier.
//!
//! Serves the four query families through DuckDuckGo's own endpoints: the
//! lite HTML page for text, and the `i.js`/`v.js`/`news.js` JSON endpoints
//! (after obtaining a `vqd` token) for images, videos and news. Any failure
//! inside an attempt surfaces as [`SearchError::EngineApi`], which is the
//! class the retry policy acts on.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::header::HeaderMap;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::config::{Endpoints, SearchConfig};
use crate::extract::{extract_hits, Markers};
use crate::http::{build_client, merge_headers, ClientOptions};
use crate::normalize::{normalize_snippets, renumber};
use crate::proxy::{export_if_absent, ProxyConfig};
use crate::retry::RetryPolicy;
use crate::{
    KindedTier, QueryKind, RequestContext, Result, ResultKind, SafeSearch, SearchError,
    SearchResult,
};

/// Region used when the caller sets none.
pub const DEFAULT_REGION: &str = "wt-wt";

fn api_error(context: &str, err: impl std::fmt::Display) -> SearchError {
    SearchError::EngineApi(format!("{}: {}", context, err))
}

fn vqd_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#"vqd=["']?([0-9-]+)"#).expect("valid vqd pattern"))
}

/// Pulls the `vqd` token out of a landing page.
pub fn extract_vqd(page: &str) -> Option<String> {
    vqd_pattern()
        .captures(page)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// `p` value of the JSON endpoints for a safe search level.
fn safesearch_param(kind: QueryKind, level: SafeSearch) -> &'static str {
    match (kind, level) {
        (QueryKind::Images, SafeSearch::Off) => "-1",
        (QueryKind::Images, _) => "1",
        (_, SafeSearch::Off) => "-2",
        (_, SafeSearch::Moderate) => "-1",
        (_, SafeSearch::Strict) => "1",
    }
}

/// Time filter of the images endpoint (`d` -> `Day`, ...).
fn image_time(time: &str) -> &'static str {
    match time {
        "d" => "Day",
        "w" => "Week",
        "m" => "Month",
        "y" => "Year",
        _ => "",
    }
}

/// Query parameters for a JSON endpoint family.
pub fn json_params(kind: QueryKind, ctx: &RequestContext, vqd: &str) -> Vec<(&'static str, String)> {
    let region = ctx.region.clone().unwrap_or_else(|| DEFAULT_REGION.to_string());
    let level = ctx.safesearch.unwrap_or_default();
    let time = ctx.time.as_deref().unwrap_or("");

    let mut params = vec![
        ("l", region),
        ("o", "json".to_string()),
        ("q", ctx.query.clone()),
        ("vqd", vqd.to_string()),
        ("p", safesearch_param(kind, level).to_string()),
    ];
    match kind {
        QueryKind::Images => {
            let time = image_time(time);
            let filter = if time.is_empty() {
                ",,,,,".to_string()
            } else {
                format!("time:{},,,,,", time)
            };
            params.push(("f", filter));
        }
        QueryKind::Videos => {
            let filter = if time.is_empty() {
                ",,".to_string()
            } else {
                format!("publishedAfter:{},,", time)
            };
            params.push(("f", filter));
        }
        QueryKind::News => {
            params.push(("noamp", "1".to_string()));
            if !time.is_empty() {
                params.push(("df", time.to_string()));
            }
        }
        QueryKind::Text => {}
    }
    params
}

/// Form fields of the lite endpoint.
pub fn lite_form(ctx: &RequestContext) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("q", ctx.query.clone()),
        (
            "kl",
            ctx.region.clone().unwrap_or_else(|| DEFAULT_REGION.to_string()),
        ),
    ];
    if let Some(time) = &ctx.time {
        form.push(("df", time.clone()));
    }
    form
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageHit {
    title: String,
    url: String,
    image: String,
    thumbnail: String,
    source: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VideoImages {
    medium: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VideoHit {
    title: String,
    content: String,
    description: String,
    published: String,
    publisher: String,
    images: VideoImages,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NewsHit {
    title: String,
    url: String,
    excerpt: String,
    image: Option<String>,
    source: String,
    date: Option<i64>,
}

fn non_empty(value: String) -> Option<String> {
    Some(value).filter(|v| !v.is_empty())
}

/// Applies `set` only when `value` is present.
fn set_opt(
    result: SearchResult,
    value: Option<String>,
    set: impl FnOnce(SearchResult, String) -> SearchResult,
) -> SearchResult {
    match value {
        Some(value) => set(result, value),
        None => result,
    }
}

impl From<ImageHit> for SearchResult {
    fn from(hit: ImageHit) -> Self {
        let result = SearchResult::new(0, hit.title, hit.url, "").with_kind(ResultKind::Image);
        let result = set_opt(result, non_empty(hit.image), |r, v| r.with_image(v));
        let result = set_opt(result, non_empty(hit.thumbnail), |r, v| r.with_thumbnail(v));
        set_opt(result, non_empty(hit.source), |r, v| r.with_source(v))
    }
}

impl From<VideoHit> for SearchResult {
    fn from(hit: VideoHit) -> Self {
        let result = SearchResult::new(0, hit.title, hit.content, hit.description)
            .with_kind(ResultKind::Video);
        let result = set_opt(result, non_empty(hit.images.medium), |r, v| r.with_thumbnail(v));
        let result = set_opt(result, non_empty(hit.published), |r, v| {
            r.with_published_date(v)
        });
        set_opt(result, non_empty(hit.publisher), |r, v| r.with_source(v))
    }
}

impl From<NewsHit> for SearchResult {
    fn from(hit: NewsHit) -> Self {
        let result =
            SearchResult::new(0, hit.title, hit.url, hit.excerpt).with_kind(ResultKind::News);
        let result = set_opt(result, hit.image.and_then(non_empty), |r, v| r.with_image(v));
        let result = set_opt(result, non_empty(hit.source), |r, v| r.with_source(v));
        set_opt(result, hit.date.map(|ts| ts.to_string()), |r, v| {
            r.with_published_date(v)
        })
    }
}

/// Tier 4.
pub struct EngineApiTier {
    endpoints: Endpoints,
    timeout: Duration,
    retry: RetryPolicy,
}

impl EngineApiTier {
    /// Creates the tier from client configuration.
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            endpoints: config.endpoints.clone(),
            timeout: config.api_timeout,
            retry: config.retry.clone(),
        }
    }

    async fn checked_text(&self, response: reqwest::Response) -> Result<String> {
        let status = response.status();
        if !status.is_success() || status.as_u16() == 202 {
            return Err(SearchError::EngineApi(format!(
                "HTTP status {} from {}",
                status.as_u16(),
                response.url()
            )));
        }
        response
            .text()
            .await
            .map_err(|e| api_error("Failed to read response", e))
    }

    async fn text(&self, client: &Client, ctx: &RequestContext) -> Result<Vec<SearchResult>> {
        let response = client
            .post(&self.endpoints.lite)
            .form(&lite_form(ctx))
            .send()
            .await
            .map_err(|e| api_error("Lite request failed", e))?;
        let html = self.checked_text(response).await?;
        let hits = extract_hits(&html, Markers::LITE, ctx.limit())
            .map_err(|e| api_error("Lite page unreadable", e))?;
        Ok(normalize_snippets(hits, ctx.limit()))
    }

    async fn vqd(&self, client: &Client, query: &str) -> Result<String> {
        let response = client
            .get(format!("{}/", self.endpoints.api_base.trim_end_matches('/')))
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| api_error("Token request failed", e))?;
        let page = self.checked_text(response).await?;
        extract_vqd(&page)
            .ok_or_else(|| SearchError::EngineApi(format!("Failed to extract vqd for '{}'", query)))
    }

    async fn json<T>(
        &self,
        client: &Client,
        kind: QueryKind,
        path: &str,
        ctx: &RequestContext,
    ) -> Result<Vec<SearchResult>>
    where
        T: DeserializeOwned + Into<SearchResult>,
    {
        let vqd = self.vqd(client, &ctx.query).await?;
        let url = format!("{}/{}", self.endpoints.api_base.trim_end_matches('/'), path);
        let response = client
            .get(&url)
            .query(&json_params(kind, ctx, &vqd))
            .send()
            .await
            .map_err(|e| api_error("JSON request failed", e))?;
        let body = self.checked_text(response).await?;
        let page: Page<T> =
            serde_json::from_str(&body).map_err(|e| api_error("Malformed JSON response", e))?;
        let results = page.results.into_iter().map(Into::into).collect();
        Ok(renumber(results, ctx.limit()))
    }

    async fn attempt(
        &self,
        kind: QueryKind,
        ctx: &RequestContext,
        options: &ClientOptions,
    ) -> Result<Vec<SearchResult>> {
        let client = build_client(options).map_err(|e| api_error("Failed to build client", e))?;
        let results = match kind {
            QueryKind::Text => self.text(&client, ctx).await?,
            QueryKind::Images => self.json::<ImageHit>(&client, kind, "i.js", ctx).await?,
            QueryKind::Videos => self.json::<VideoHit>(&client, kind, "v.js", ctx).await?,
            QueryKind::News => self.json::<NewsHit>(&client, kind, "news.js", ctx).await?,
        };
        if results.is_empty() {
            return Err(SearchError::EngineApi("No results found".into()));
        }
        Ok(results)
    }
}

#[async_trait]
impl KindedTier for EngineApiTier {
    async fn search_kind(&self, kind: QueryKind, ctx: &RequestContext) -> Result<Vec<SearchResult>> {
        let proxy = ProxyConfig::resolve(ctx.proxy.as_deref())?;
        if let Some(proxy) = &proxy {
            export_if_absent(proxy);
        }
        let headers = merge_headers(HeaderMap::new(), &ctx.headers)?;
        let options = ClientOptions::new(self.timeout)
            .with_proxy(proxy)
            .with_headers(headers);

        self.retry
            .run(|attempt| {
                debug!("Engine client {:?} query, attempt {}", kind, attempt);
                self.attempt(kind, ctx, &options)
            })
            .await
    }
}
