//! Error types for the search client.

use thiserror::Error;

use crate::tier::TierKind;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors that can occur while retrieving search results.
///
/// Each tier raises only the variants of its own mechanism; the orchestrator
/// decides per tier which of them are recoverable by falling through.
#[derive(Error, Debug)]
pub enum SearchError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The engine answered with a non-2xx status.
    #[error("HTTP status {status} from {url}")]
    Status {
        /// Status code returned.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The tier completed but produced nothing usable.
    #[error("{0} tier produced no results")]
    EmptyResult(TierKind),

    /// Browser automation failed (provisioning, launch, navigation, render wait).
    #[error("Browser driver failure: {0}")]
    Driver(String),

    /// The structured engine client failed.
    #[error("Engine API failure: {0}")]
    EngineApi(String),

    /// Failed to parse a response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Invalid query.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid client or request configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl SearchError {
    /// Returns true for network, timeout and non-2xx failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_status() {
        let err = SearchError::Status {
            status: 503,
            url: "https://html.duckduckgo.com/html".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "HTTP status 503 from https://html.duckduckgo.com/html"
        );
    }

    #[test]
    fn test_error_display_empty_result() {
        let err = SearchError::EmptyResult(TierKind::Impersonated);
        assert_eq!(err.to_string(), "impersonated-http tier produced no results");
    }

    #[test]
    fn test_error_display_driver() {
        let err = SearchError::Driver("render timeout".to_string());
        assert_eq!(err.to_string(), "Browser driver failure: render timeout");
    }

    #[test]
    fn test_error_display_engine_api() {
        let err = SearchError::EngineApi("rate limited".to_string());
        assert_eq!(err.to_string(), "Engine API failure: rate limited");
    }

    #[test]
    fn test_error_display_invalid_query() {
        let err = SearchError::InvalidQuery("empty query".to_string());
        assert_eq!(err.to_string(), "Invalid query: empty query");
    }

    #[test]
    fn test_is_transport() {
        let status = SearchError::Status {
            status: 429,
            url: "u".to_string(),
        };
        assert!(status.is_transport());
        assert!(!SearchError::Driver("x".to_string()).is_transport());
        assert!(!SearchError::EmptyResult(TierKind::PlainScrape).is_transport());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchError>();
    }
}
