//! Extraction of result anchors and snippets from results markup.

use scraper::{ElementRef, Html, Selector};

use crate::normalize::RawHit;
use crate::{Result, SearchError};

/// Result anchor on the HTML endpoints.
pub const RESULT_LINK: &str = "a.result__a";
/// Snippet on the HTML endpoint (div or anchor, depending on page version).
pub const RESULT_SNIPPET: &str = "div.result__snippet, a.result__snippet";
/// Snippet as rendered by a real browser.
pub const BROWSER_SNIPPET: &str = "a.result__snippet";
/// Result anchor on the lite endpoint.
pub const LITE_LINK: &str = "a.result-link";
/// Snippet cell on the lite endpoint.
pub const LITE_SNIPPET: &str = "td.result-snippet";

/// Which elements to pull out of a page.
#[derive(Debug, Clone, Copy)]
pub struct Markers<'a> {
    /// Selector for result anchors.
    pub link: &'a str,
    /// Selector for snippets, aligned to anchors by position.
    pub snippet: Option<&'a str>,
}

impl Markers<'static> {
    /// Anchors and snippets of the HTML endpoint.
    pub const HTML: Markers<'static> = Markers {
        link: RESULT_LINK,
        snippet: Some(RESULT_SNIPPET),
    };

    /// Anchors and snippets of a browser-rendered page.
    pub const BROWSER: Markers<'static> = Markers {
        link: RESULT_LINK,
        snippet: Some(BROWSER_SNIPPET),
    };

    /// Anchors only.
    pub const LINKS_ONLY: Markers<'static> = Markers {
        link: RESULT_LINK,
        snippet: None,
    };

    /// Anchors and snippets of the lite endpoint.
    pub const LITE: Markers<'static> = Markers {
        link: LITE_LINK,
        snippet: Some(LITE_SNIPPET),
    };
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| SearchError::Parse(format!("Failed to parse selector '{}': {:?}", css, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extracts up to `limit` hits from `html`.
///
/// Snippets are matched to anchors by index; when there are fewer snippets
/// than anchors, the trailing hits carry no snippet.
pub fn extract_hits(html: &str, markers: Markers<'_>, limit: usize) -> Result<Vec<RawHit>> {
    let document = Html::parse_document(html);
    let link_selector = selector(markers.link)?;

    let snippets: Vec<String> = match markers.snippet {
        Some(css) => {
            let snippet_selector = selector(css)?;
            document
                .select(&snippet_selector)
                .take(limit)
                .map(element_text)
                .collect()
        }
        None => Vec::new(),
    };

    let hits = document
        .select(&link_selector)
        .take(limit)
        .enumerate()
        .map(|(i, link)| {
            let href = link.value().attr("href").unwrap_or_default();
            let mut hit = RawHit::new(element_text(link), href);
            if markers.snippet.is_some() {
                hit.snippet = Some(snippets.get(i).cloned().unwrap_or_default());
            }
            hit
        })
        .collect();

    Ok(hits)
}
