//! The individual access tiers, in fallback order.

pub mod api;
pub mod browser;
#[cfg(feature = "headless")]
pub mod chromium;
pub mod impersonate;
pub mod scrape;

pub use api::EngineApiTier;
pub use browser::{BrowserLauncher, BrowserSession, BrowserTier, LaunchOptions, INTERNAL_MAX_RETURN};
#[cfg(feature = "headless")]
pub use chromium::ChromiumLauncher;
pub use impersonate::ImpersonatedTier;
pub use scrape::PlainScrapeTier;
