//! Common result record produced by every tier.

use serde::{Deserialize, Serialize};

/// Kind of search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    /// Standard web result.
    #[default]
    Web,
    /// Image result.
    Image,
    /// Video result.
    Video,
    /// News article.
    News,
}

/// A single search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// 1-based position within this response.
    pub id: usize,
    /// Display text of the result link; may be empty.
    pub title: String,
    /// URL as returned by the source. May still be redirect-wrapped.
    pub href: String,
    /// Snippet, delimiter-wrapped snippet, or empty.
    pub body: String,
    /// Kind of result.
    #[serde(default)]
    pub kind: ResultKind,
    /// Thumbnail URL (images, videos, news).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Full-size image URL (images, news).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Published date as reported by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    /// Publisher or source site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl SearchResult {
    /// Creates a web result.
    pub fn new(
        id: usize,
        title: impl Into<String>,
        href: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            href: href.into(),
            body: body.into(),
            kind: ResultKind::Web,
            thumbnail: None,
            image: None,
            published_date: None,
            source: None,
        }
    }

    /// Sets the result kind.
    pub fn with_kind(mut self, kind: ResultKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the thumbnail URL.
    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    /// Sets the full-size image URL.
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Sets the published date.
    pub fn with_published_date(mut self, date: impl Into<String>) -> Self {
        self.published_date = Some(date.into());
        self
    }

    /// Sets the source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Returns true when ids run exactly `1..=len` in order.
pub fn ids_are_contiguous(results: &[SearchResult]) -> bool {
    results.iter().enumerate().all(|(i, r)| r.id == i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_kind_default() {
        assert_eq!(ResultKind::default(), ResultKind::Web);
    }

    #[test]
    fn test_search_result_new() {
        let result = SearchResult::new(1, "Title", "https://example.com", "");
        assert_eq!(result.id, 1);
        assert_eq!(result.title, "Title");
        assert_eq!(result.href, "https://example.com");
        assert!(result.body.is_empty());
        assert_eq!(result.kind, ResultKind::Web);
        assert!(result.thumbnail.is_none());
        assert!(result.published_date.is_none());
    }

    #[test]
    fn test_search_result_builders() {
        let result = SearchResult::new(2, "t", "u", "b")
            .with_kind(ResultKind::News)
            .with_image("https://img")
            .with_thumbnail("https://thumb")
            .with_published_date("1700000000")
            .with_source("Reuters");
        assert_eq!(result.kind, ResultKind::News);
        assert_eq!(result.image.as_deref(), Some("https://img"));
        assert_eq!(result.thumbnail.as_deref(), Some("https://thumb"));
        assert_eq!(result.published_date.as_deref(), Some("1700000000"));
        assert_eq!(result.source.as_deref(), Some("Reuters"));
    }

    #[test]
    fn test_ids_are_contiguous() {
        let ok = vec![
            SearchResult::new(1, "a", "u", ""),
            SearchResult::new(2, "b", "u", ""),
        ];
        assert!(ids_are_contiguous(&ok));
        assert!(ids_are_contiguous(&[]));

        let gap = vec![
            SearchResult::new(1, "a", "u", ""),
            SearchResult::new(3, "b", "u", ""),
        ];
        assert!(!ids_are_contiguous(&gap));
    }

    #[test]
    fn test_serialization_skips_absent_extras() {
        let result = SearchResult::new(1, "Title", "https://example.com", "snippet");
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"id\":1"));
        assert!(json.contains("\"href\":\"https://example.com\""));
        assert!(json.contains("\"kind\":\"web\""));
        assert!(!json.contains("thumbnail"));
    }
}
