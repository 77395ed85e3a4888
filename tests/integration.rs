//! Integration tests against the live engine.
//!
//! These tests are marked with `#[ignore]` by default because they require
//! network access and may be slow or flaky.
//!
//! Run with: `cargo test --test integration -- --ignored`

use ddg_tiers::tiers::{EngineApiTier, ImpersonatedTier, PlainScrapeTier};
use ddg_tiers::{
    ids_are_contiguous, KindedTier, QueryKind, RequestContext, Search, SearchConfig, SearchResult,
    SearchTool, Tier,
};

/// Helper to run one tier and print what came back
async fn run_tier<T: Tier>(tier: T, query: &str) -> Vec<SearchResult> {
    let ctx = RequestContext::new(query).with_max_results(5);
    match tier.search(&ctx).await {
        Ok(results) => {
            println!(
                "Tier '{}' returned {} results for '{}'",
                tier.kind(),
                results.len(),
                ctx.query
            );
            for result in results.iter().take(3) {
                println!("  {}. {} - {}", result.id, result.title, result.href);
            }
            results
        }
        Err(e) => {
            println!("Tier '{}' failed: {}", tier.kind(), e);
            vec![]
        }
    }
}

mod tier_tests {
    use super::*;

    #[tokio::test]
    #[ignore]
    async fn test_impersonated_tier_live() {
        let results = run_tier(ImpersonatedTier::new(&SearchConfig::default()), "rust ownership").await;
        assert!(results.len() <= 5);
        assert!(ids_are_contiguous(&results));
        assert!(results.iter().all(|r| r.body.contains("__START_OF_SOURCE")));
    }

    #[tokio::test]
    #[ignore]
    async fn test_plain_scrape_tier_live() {
        let results = run_tier(PlainScrapeTier::new(&SearchConfig::default()), "rust programming").await;
        assert!(results.len() <= 5);
        assert!(results.iter().all(|r| r.body.is_empty()));
    }

    #[tokio::test]
    #[ignore]
    async fn test_engine_api_text_live() {
        let tier = EngineApiTier::new(&SearchConfig::default());
        let ctx = RequestContext::new("rust programming").with_max_results(5);
        match tier.search_kind(QueryKind::Text, &ctx).await {
            Ok(results) => {
                assert!(results.len() <= 5);
                assert!(ids_are_contiguous(&results));
            }
            Err(e) => println!("Engine client failed: {}", e),
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_engine_api_news_live() {
        let tier = EngineApiTier::new(&SearchConfig::default());
        let ctx = RequestContext::new("rust language").with_max_results(3);
        match tier.search_kind(QueryKind::News, &ctx).await {
            Ok(results) => println!("News returned {} results", results.len()),
            Err(e) => println!("News failed: {}", e),
        }
    }
}

mod search_tests {
    use super::*;

    #[tokio::test]
    #[ignore]
    async fn test_fallback_chain_live() {
        let search = Search::new(SearchConfig::default()).unwrap();
        let ctx = RequestContext::new("rust ownership").with_max_results(3);
        let results = search.search_text(&ctx).await.unwrap();
        println!("Fallback chain returned {} results", results.len());
        assert!(results.len() <= 3);
        assert!(ids_are_contiguous(&results));
    }

    #[tokio::test]
    #[ignore]
    async fn test_tool_run_live() {
        let tool = SearchTool::new(Search::new(SearchConfig::default()).unwrap()).with_k(3);
        let text = tool.run("rust borrow checker").await.unwrap();
        println!("{}", text);
        assert!(!text.is_empty());
    }

    #[cfg(feature = "headless")]
    #[tokio::test]
    #[ignore]
    async fn test_browser_tier_live() {
        let config = SearchConfig {
            use_browser: true,
            ..Default::default()
        };
        let search = Search::new(config).unwrap();
        assert!(search.browser_enabled());
        let results = search
            .search_text(&RequestContext::new("rust ownership"))
            .await
            .unwrap();
        println!("Browser-enabled chain returned {} results", results.len());
    }
}
