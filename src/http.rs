//! Per-call HTTP client construction and header handling.
//!
//! Every tier builds its own [`reqwest::Client`] per call and drops it before
//! returning. Clients carry no cookie store and never read proxy settings
//! from the environment: the resolved [`ProxyConfig`] is passed in.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Client;

use crate::proxy::ProxyConfig;
use crate::{Result, SearchError};

/// Desktop-browser User-Agent used when the caller supplies none.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0 Safari/537.36";

/// Builds a header map from name/value pairs.
pub fn header_map<'a, I>(pairs: I) -> Result<HeaderMap>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|e| SearchError::Config(format!("Invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value.trim()).map_err(|e| {
            SearchError::Config(format!("Invalid value for header '{}': {}", name, e))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Merges caller headers over `base`, adding the default User-Agent when
/// neither side sets one.
pub fn merge_headers(mut base: HeaderMap, extra: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let extra = header_map(extra.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    for (name, value) in extra.iter() {
        base.insert(name.clone(), value.clone());
    }
    if !base.contains_key(USER_AGENT) {
        base.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    }
    Ok(base)
}

/// Settings for one per-call client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Whole-request timeout.
    pub timeout: Duration,
    /// Resolved proxy, if any.
    pub proxy: Option<ProxyConfig>,
    /// Headers sent with every request.
    pub headers: HeaderMap,
}

impl ClientOptions {
    /// Options with the default User-Agent and no proxy.
    pub fn new(timeout: Duration) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        Self {
            timeout,
            proxy: None,
            headers,
        }
    }

    /// Sets the proxy.
    pub fn with_proxy(mut self, proxy: Option<ProxyConfig>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Replaces the header set.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }
}

/// Builds a fresh, isolated client.
pub fn build_client(options: &ClientOptions) -> Result<Client> {
    let mut builder = Client::builder()
        .no_proxy()
        .timeout(options.timeout)
        .default_headers(options.headers.clone())
        .redirect(reqwest::redirect::Policy::limited(10));

    if let Some(proxy) = &options.proxy {
        builder = builder.proxy(proxy.to_reqwest()?);
    }

    Ok(builder.build()?)
}
