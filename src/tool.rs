//! Tool-facing facade with a text-in/text-out contract.

use std::collections::BTreeMap;

use crate::{QueryKind, RequestContext, Result, SafeSearch, Search, SearchResult};

/// Text returned by [`SearchTool::run`] when nothing was found.
pub const NO_RESULTS_MESSAGE: &str = "No good DuckDuckGo Search Result was found";

/// Search tool for agent frameworks.
///
/// Holds per-tool defaults and builds a fresh [`RequestContext`] for every
/// call.
#[derive(Clone)]
pub struct SearchTool {
    search: Search,
    k: usize,
    region: Option<String>,
    safesearch: Option<SafeSearch>,
    time: Option<String>,
    proxy: Option<String>,
    headers: BTreeMap<String, String>,
}

impl SearchTool {
    /// Wraps a search client with default settings (`k = 10`).
    pub fn new(search: Search) -> Self {
        Self {
            search,
            k: crate::query::DEFAULT_MAX_RESULTS,
            region: None,
            safesearch: None,
            time: None,
            proxy: None,
            headers: BTreeMap::new(),
        }
    }

    /// Sets the default number of results.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Sets the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets the safe search level.
    pub fn with_safesearch(mut self, level: SafeSearch) -> Self {
        self.safesearch = Some(level);
        self
    }

    /// Sets the time limit.
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Sets the proxy URL.
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Adds a header sent by every tier.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Tool name advertised to the host framework.
    pub fn name(&self) -> &'static str {
        "duckduckgo_search"
    }

    /// Tool description advertised to the host framework.
    pub fn description(&self) -> &'static str {
        "A wrapper around DuckDuckGo Search. Useful for when you need to answer \
         questions about current events. Input should be a search query."
    }

    /// Builds the per-call request.
    pub fn context(&self, query: &str, max_results: Option<usize>) -> RequestContext {
        RequestContext {
            query: query.to_string(),
            max_results: Some(max_results.unwrap_or(self.k)),
            proxy: self.proxy.clone(),
            headers: self.headers.clone(),
            region: self.region.clone(),
            safesearch: self.safesearch,
            time: self.time.clone(),
        }
    }

    /// Text search through the full fallback chain.
    pub async fn text_search(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        self.search.search_text(&self.context(query, max_results)).await
    }

    /// Image search.
    pub async fn image_search(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        self.search
            .search_kind(QueryKind::Images, &self.context(query, max_results))
            .await
    }

    /// Video search.
    pub async fn video_search(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        self.search
            .search_kind(QueryKind::Videos, &self.context(query, max_results))
            .await
    }

    /// News search.
    pub async fn news_search(
        &self,
        query: &str,
        max_results: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        self.search
            .search_kind(QueryKind::News, &self.context(query, max_results))
            .await
    }

    /// Runs a text search and renders result bodies as one string.
    pub async fn run(&self, query: &str) -> Result<String> {
        let results = self.text_search(query, None).await?;
        Ok(render(&results))
    }
}

/// Joins result bodies with a space, or returns [`NO_RESULTS_MESSAGE`].
pub fn render(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_RESULTS_MESSAGE.to_string();
    }
    results
        .iter()
        .map(|r| r.body.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
