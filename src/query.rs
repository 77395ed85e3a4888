//! Per-call request representation.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, SearchError};

/// Cap applied when the caller does not ask for a specific number of results.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Safe search level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeSearch {
    /// No filtering.
    Off,
    /// Moderate filtering.
    #[default]
    Moderate,
    /// Strict filtering ("safe" is accepted as an alias).
    Strict,
}

impl SafeSearch {
    /// Lenient parse; anything unrecognised maps to the engine default.
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for SafeSearch {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "moderate" => Ok(Self::Moderate),
            "safe" | "strict" => Ok(Self::Strict),
            other => Err(SearchError::Config(format!(
                "unknown safesearch level '{}'",
                other
            ))),
        }
    }
}

/// Query family served by the structured engine client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    #[default]
    Text,
    Images,
    Videos,
    News,
}

impl FromStr for QueryKind {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "web" => Ok(Self::Text),
            "images" | "image" => Ok(Self::Images),
            "videos" | "video" => Ok(Self::Videos),
            "news" => Ok(Self::News),
            other => Err(SearchError::Config(format!("unknown query kind '{}'", other))),
        }
    }
}

/// Everything a single search call needs. Built fresh per call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    /// The search terms.
    pub query: String,
    /// Cap on returned entries; `None` means [`DEFAULT_MAX_RESULTS`].
    pub max_results: Option<usize>,
    /// Forward proxy URL. When absent, `HTTP_PROXY`/`HTTPS_PROXY` apply.
    pub proxy: Option<String>,
    /// Extra HTTP headers merged over the default User-Agent.
    pub headers: BTreeMap<String, String>,
    /// Region code (e.g., "us-en").
    pub region: Option<String>,
    /// Safe search level.
    pub safesearch: Option<SafeSearch>,
    /// Time limit shorthand ("d", "w", "m", "y").
    pub time: Option<String>,
}

impl RequestContext {
    /// Creates a request for the given terms.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Sets the result cap.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Sets the proxy URL.
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Adds an extra header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
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

    /// The effective result cap.
    pub fn limit(&self) -> usize {
        self.max_results.unwrap_or(DEFAULT_MAX_RESULTS)
    }

    /// Checks the request before any tier runs.
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(SearchError::InvalidQuery("Query cannot be empty".into()));
        }
        if self.max_results == Some(0) {
            return Err(SearchError::Config(
                "max_results must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
