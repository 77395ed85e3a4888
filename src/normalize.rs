//! Conversion of extracted hits into [`SearchResult`] records.
//!
//! Pure functions, no I/O. The only non-trivial work here is decoding the
//! `uddg` redirect wrapper and building the delimiter-marked `body`.

use url::Url;

use crate::SearchResult;

/// Query parameter DuckDuckGo uses to embed the destination URL.
const REDIRECT_PARAM: &str = "uddg";

/// One anchor pulled from a results page, before normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawHit {
    /// Link text.
    pub title: String,
    /// Raw `href` attribute.
    pub href: String,
    /// Adjacent snippet, if the tier extracts one.
    pub snippet: Option<String>,
}

impl RawHit {
    /// Creates a hit without snippet.
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
            snippet: None,
        }
    }

    /// Attaches a snippet.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

/// Returns the destination embedded in a redirect link, or `href` unchanged.
///
/// Protocol-relative and root-relative links are resolved against
/// `https://duckduckgo.com` before looking for the parameter. The value is
/// decoded once more after query parsing, so double-encoded targets come out
/// readable.
pub fn decode_redirect(href: &str) -> String {
    let candidate = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{}", href)
    } else {
        href.to_string()
    };

    let Ok(parsed) = Url::parse(&candidate) else {
        return href.to_string();
    };

    match parsed
        .query_pairs()
        .find(|(key, _)| key == REDIRECT_PARAM)
        .map(|(_, value)| value.into_owned())
    {
        Some(target) => urlencoding::decode(&target)
            .map(|decoded| decoded.into_owned())
            .unwrap_or(target),
        None => href.to_string(),
    }
}

/// Builds the delimiter-marked body for result `id`.
pub fn wrap_body(id: usize, snippet: &str, real_url: &str) -> String {
    format!(
        "__START_OF_SOURCE {id}__ <CONTENT> {snippet} </CONTENT> <URL> {real_url} </URL> __END_OF_SOURCE {id}__"
    )
}

/// Normalises hits into results whose body wraps the snippet and decoded URL.
///
/// A missing snippet is wrapped as an empty string.
pub fn normalize_wrapped(hits: Vec<RawHit>, limit: usize) -> Vec<SearchResult> {
    hits.into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, hit)| {
            let id = i + 1;
            let real_url = decode_redirect(&hit.href);
            let body = wrap_body(id, hit.snippet.as_deref().unwrap_or_default(), &real_url);
            SearchResult::new(id, hit.title, hit.href, body)
        })
        .collect()
}

/// Normalises hits into results with an empty body and the raw href.
pub fn normalize_plain(hits: Vec<RawHit>, limit: usize) -> Vec<SearchResult> {
    hits.into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, hit)| SearchResult::new(i + 1, hit.title, hit.href, ""))
        .collect()
}

/// Normalises hits keeping the snippet as a plain body and decoding the href.
pub fn normalize_snippets(hits: Vec<RawHit>, limit: usize) -> Vec<SearchResult> {
    hits.into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, hit)| {
            let href = decode_redirect(&hit.href);
            SearchResult::new(i + 1, hit.title, href, hit.snippet.unwrap_or_default())
        })
        .collect()
}

/// Renumbers results so ids run `1..=len` after truncation to `limit`.
pub fn renumber(results: Vec<SearchResult>, limit: usize) -> Vec<SearchResult> {
    results
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, mut result)| {
            result.id = i + 1;
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ids_are_contiguous;

    #[test]
    fn test_decode_redirect_protocol_relative() {
        let href = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fpage&rut=abc";
        assert_eq!(decode_redirect(href), "https://example.com/page");
    }

    #[test]
    fn test_decode_redirect_root_relative() {
        let href = "/l/?uddg=https%3A%2F%2Fdoc.rust-lang.org%2Fbook%2F";
        assert_eq!(decode_redirect(href), "https://doc.rust-lang.org/book/");
    }

    #[test]
    fn test_decode_redirect_double_encoded() {
        let href = "//duckduckgo.com/l/?uddg=https%253A%252F%252Fexample.com";
        assert_eq!(decode_redirect(href), "https://example.com");
    }

    #[test]
    fn test_decode_redirect_passthrough() {
        assert_eq!(decode_redirect("https://example.com/a?b=c"), "https://example.com/a?b=c");
        assert_eq!(decode_redirect(""), "");
        assert_eq!(decode_redirect("not a url"), "not a url");
    }

    #[test]
    fn test_wrap_body_format() {
        let body = wrap_body(2, "The Rust book", "https://doc.rust-lang.org");
        assert_eq!(
            body,
            "__START_OF_SOURCE 2__ <CONTENT> The Rust book </CONTENT> <URL> https://doc.rust-lang.org </URL> __END_OF_SOURCE 2__"
        );
    }

    #[test]
    fn test_normalize_wrapped() {
        let hits = vec![
            RawHit::new("One", "//duckduckgo.com/l/?uddg=https%3A%2F%2Fone.example")
                .with_snippet("first"),
            RawHit::new("Two", "https://two.example"),
        ];
        let results = normalize_wrapped(hits, 10);
        assert_eq!(results.len(), 2);
        assert!(ids_are_contiguous(&results));
        assert_eq!(results[0].href, "//duckduckgo.com/l/?uddg=https%3A%2F%2Fone.example");
        assert!(results[0].body.contains("<CONTENT> first </CONTENT>"));
        assert!(results[0].body.contains("<URL> https://one.example </URL>"));
        assert!(results[1].body.contains("<CONTENT>  </CONTENT>"));
    }

    #[test]
    fn test_normalize_plain_respects_limit() {
        let hits = (0..5)
            .map(|i| RawHit::new(format!("t{}", i), format!("https://{}.example", i)))
            .collect();
        let results = normalize_plain(hits, 3);
        assert_eq!(results.len(), 3);
        assert!(ids_are_contiguous(&results));
        assert!(results.iter().all(|r| r.body.is_empty()));
    }

    #[test]
    fn test_normalize_snippets_decodes_href() {
        let hits = vec![RawHit::new("A", "//duckduckgo.com/l/?uddg=https%3A%2F%2Fa.example")
            .with_snippet("about a")];
        let results = normalize_snippets(hits, 10);
        assert_eq!(results[0].href, "https://a.example");
        assert_eq!(results[0].body, "about a");
    }

    #[test]
    fn test_renumber() {
        let results = vec![
            SearchResult::new(7, "a", "u", ""),
            SearchResult::new(9, "b", "u", ""),
            SearchResult::new(11, "c", "u", ""),
        ];
        let results = renumber(results, 2);
        assert_eq!(results.len(), 2);
        assert!(ids_are_contiguous(&results));
    }
}
