//! # ddg-tiers
//!
//! A resilient DuckDuckGo search client that falls back across independent
//! access tiers until one of them produces results:
//!
//! 1. impersonated HTTP (a browser header preset on a fresh client)
//! 2. a real browser, when enabled
//! 3. the structured engine client, with bounded retry
//! 4. a plain form POST scrape, whose outcome is final
//!
//! Every tier returns the same [`SearchResult`] shape, and a call never mixes
//! results from two tiers.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ddg_tiers::{RequestContext, Search, SearchConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let search = Search::new(SearchConfig::default())?;
//!
//!     let ctx = RequestContext::new("rust ownership").with_max_results(5);
//!     for result in search.search_text(&ctx).await? {
//!         println!("{}. {} ({})", result.id, result.title, result.href);
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod query;
mod result;
mod search;
mod tier;

pub mod config;
pub mod extract;
pub mod http;
pub mod normalize;
pub mod proxy;
pub mod retry;
pub mod tiers;
pub mod tool;

#[cfg(feature = "headless")]
pub mod browser_setup;

pub use config::{Endpoints, ImpersonationProfile, SearchConfig};
pub use error::{Result, SearchError};
pub use query::{QueryKind, RequestContext, SafeSearch, DEFAULT_MAX_RESULTS};
pub use result::{ids_are_contiguous, ResultKind, SearchResult};
pub use search::{Search, Tiers};
pub use tier::{KindedTier, Tier, TierKind};
pub use tool::SearchTool;
