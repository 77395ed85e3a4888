//! Client configuration with sensible defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::retry::RetryPolicy;
use crate::{Result, SearchError};

/// Environment variable overriding the impersonated browser (e.g. `firefox_133`).
pub const IMPERSONATE_ENV: &str = "DDG_TIERS_IMPERSONATE";
/// Environment variable overriding the impersonated OS (e.g. `macos`).
pub const IMPERSONATE_OS_ENV: &str = "DDG_TIERS_IMPERSONATE_OS";

/// Browser families with a header preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserFamily {
    Chrome,
    Edge,
    Firefox,
    Safari,
}

impl BrowserFamily {
    fn default_version(&self) -> u32 {
        match self {
            Self::Chrome | Self::Edge => 131,
            Self::Firefox => 133,
            Self::Safari => 18,
        }
    }
}

/// Operating systems with a platform token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpersonatedOs {
    Windows,
    MacOs,
    Linux,
    Android,
    Ios,
}

impl ImpersonatedOs {
    fn ua_token(&self) -> &'static str {
        match self {
            Self::Windows => "Windows NT 10.0; Win64; x64",
            Self::MacOs => "Macintosh; Intel Mac OS X 10_15_7",
            Self::Linux => "X11; Linux x86_64",
            Self::Android => "Linux; Android 10; K",
            Self::Ios => "iPhone; CPU iPhone OS 17_0 like Mac OS X",
        }
    }

    fn platform(&self) -> &'static str {
        match self {
            Self::Windows => "\"Windows\"",
            Self::MacOs => "\"macOS\"",
            Self::Linux => "\"Linux\"",
            Self::Android => "\"Android\"",
            Self::Ios => "\"iOS\"",
        }
    }

    fn is_mobile(&self) -> bool {
        matches!(self, Self::Android | Self::Ios)
    }
}

/// Browser fingerprint preset used by the impersonated-HTTP tier.
///
/// Profiles are named like `chrome_131` and `windows`. Unknown names fall
/// back to the default preset with a warning.
///
/// Only request headers are impersonated; the TLS and HTTP/2 handshake stays
/// reqwest's own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpersonationProfile {
    /// Browser name with optional version, e.g. `chrome_131`.
    pub browser: String,
    /// Operating system name, e.g. `windows`.
    pub os: String,
}

impl Default for ImpersonationProfile {
    fn default() -> Self {
        Self {
            browser: "chrome_131".to_string(),
            os: "windows".to_string(),
        }
    }
}

impl ImpersonationProfile {
    /// Creates a profile.
    pub fn new(browser: impl Into<String>, os: impl Into<String>) -> Self {
        Self {
            browser: browser.into(),
            os: os.into(),
        }
    }

    /// Applies the environment overrides, if set.
    pub fn with_env_overrides(&self) -> Self {
        let pick = |var: &str, current: &str| {
            env::var(var)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| current.to_string())
        };
        Self {
            browser: pick(IMPERSONATE_ENV, &self.browser),
            os: pick(IMPERSONATE_OS_ENV, &self.os),
        }
    }

    fn family_and_version(&self) -> (BrowserFamily, u32) {
        let name = self.browser.trim().to_ascii_lowercase();
        let (family, version) = match name.split_once('_') {
            Some((family, version)) => (family.to_string(), version.parse::<u32>().ok()),
            None => (name.clone(), None),
        };
        let family = match family.as_str() {
            "chrome" => BrowserFamily::Chrome,
            "edge" => BrowserFamily::Edge,
            "firefox" => BrowserFamily::Firefox,
            "safari" => BrowserFamily::Safari,
            other => {
                warn!("Unknown impersonation browser '{}', using chrome", other);
                BrowserFamily::Chrome
            }
        };
        (family, version.unwrap_or(family.default_version()))
    }

    fn os_kind(&self) -> ImpersonatedOs {
        match self.os.trim().to_ascii_lowercase().as_str() {
            "windows" => ImpersonatedOs::Windows,
            "macos" | "mac" => ImpersonatedOs::MacOs,
            "linux" => ImpersonatedOs::Linux,
            "android" => ImpersonatedOs::Android,
            "ios" => ImpersonatedOs::Ios,
            other => {
                warn!("Unknown impersonation OS '{}', using windows", other);
                ImpersonatedOs::Windows
            }
        }
    }

    /// User-Agent string of this profile.
    pub fn user_agent(&self) -> String {
        let (family, version) = self.family_and_version();
        let os = self.os_kind();
        let mobile = if os.is_mobile() { " Mobile" } else { "" };
        match family {
            BrowserFamily::Chrome => format!(
                "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{}.0.0.0{} Safari/537.36",
                os.ua_token(),
                version,
                mobile
            ),
            BrowserFamily::Edge => format!(
                "Mozilla/5.0 ({}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{v}.0.0.0{} Safari/537.36 Edg/{v}.0.0.0",
                os.ua_token(),
                mobile,
                v = version
            ),
            BrowserFamily::Firefox => format!(
                "Mozilla/5.0 ({}; rv:{v}.0) Gecko/20100101 Firefox/{v}.0",
                os.ua_token(),
                v = version
            ),
            BrowserFamily::Safari => format!(
                "Mozilla/5.0 ({}) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{}.0{} Safari/605.1.15",
                os.ua_token(),
                version,
                mobile
            ),
        }
    }

    /// Full header preset of this profile, lowercase names.
    pub fn headers(&self) -> Vec<(String, String)> {
        let (family, version) = self.family_and_version();
        let os = self.os_kind();

        let mut headers = vec![
            ("user-agent".to_string(), self.user_agent()),
            (
                "accept".to_string(),
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string(),
            ),
            ("accept-language".to_string(), "en-US,en;q=0.9".to_string()),
            ("upgrade-insecure-requests".to_string(), "1".to_string()),
            ("sec-fetch-dest".to_string(), "document".to_string()),
            ("sec-fetch-mode".to_string(), "navigate".to_string()),
            ("sec-fetch-site".to_string(), "none".to_string()),
            ("sec-fetch-user".to_string(), "?1".to_string()),
        ];

        if matches!(family, BrowserFamily::Chrome | BrowserFamily::Edge) {
            let brand = match family {
                BrowserFamily::Edge => "Microsoft Edge",
                _ => "Google Chrome",
            };
            headers.push((
                "sec-ch-ua".to_string(),
                format!(
                    "\"{}\";v=\"{v}\", \"Chromium\";v=\"{v}\", \"Not_A Brand\";v=\"24\"",
                    brand,
                    v = version
                ),
            ));
            headers.push((
                "sec-ch-ua-mobile".to_string(),
                if os.is_mobile() { "?1" } else { "?0" }.to_string(),
            ));
            headers.push(("sec-ch-ua-platform".to_string(), os.platform().to_string()));
        }

        headers
    }
}

/// Engine endpoints. Overridable so tiers can be pointed at a local server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// No-script HTML endpoint (impersonated GET, plain-scrape POST).
    pub html: String,
    /// Results page loaded by the browser tier.
    pub browser_page: String,
    /// Base of the JSON endpoints and the `vqd` landing page.
    pub api_base: String,
    /// Lite endpoint used for text queries of the engine client.
    pub lite: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            html: "https://html.duckduckgo.com/html".to_string(),
            browser_page: "https://duckduckgo.com/html/".to_string(),
            api_base: "https://duckduckgo.com".to_string(),
            lite: "https://lite.duckduckgo.com/lite/".to_string(),
        }
    }
}

impl Endpoints {
    /// Points every endpoint at `base` (paths `/html`, `/html/`, `/`, `/lite/`).
    pub fn local(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            html: format!("{}/html", base),
            browser_page: format!("{}/html/", base),
            api_base: base.to_string(),
            lite: format!("{}/lite/", base),
        }
    }
}

/// Client-level options shared by every call of a [`crate::Search`].
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Attempt the real-browser tier.
    pub use_browser: bool,
    /// Run the browser without a window.
    pub headless: bool,
    /// Clear proxy environment variables while the browser is provisioned.
    pub bypass_proxy_for_driver: bool,
    /// Fingerprint preset of the impersonated-HTTP tier.
    pub impersonation: ImpersonationProfile,
    /// Impersonated-HTTP request timeout.
    pub impersonate_timeout: Duration,
    /// Bound on starting the browser, including provisioning a download.
    pub launch_timeout: Duration,
    /// Bound on waiting for the first result anchor in the browser.
    pub browser_timeout: Duration,
    /// Engine client request timeout.
    pub api_timeout: Duration,
    /// Plain-scrape request timeout.
    pub scrape_timeout: Duration,
    /// Retry budget of the engine client.
    pub retry: RetryPolicy,
    /// Engine endpoints.
    pub endpoints: Endpoints,
    /// Explicit Chrome/Chromium executable. If `None`, auto-detected.
    pub chrome_path: Option<PathBuf>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            use_browser: false,
            headless: true,
            bypass_proxy_for_driver: true,
            impersonation: ImpersonationProfile::default(),
            impersonate_timeout: Duration::from_secs(12),
            launch_timeout: Duration::from_secs(120),
            browser_timeout: Duration::from_secs(15),
            api_timeout: Duration::from_secs(20),
            scrape_timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            endpoints: Endpoints::default(),
            chrome_path: None,
        }
    }
}

impl SearchConfig {
    /// Validates this configuration.
    ///
    /// Checks:
    /// - every timeout is non-zero
    /// - the retry budget allows at least one attempt and does not shrink
    /// - every endpoint parses as an absolute URL
    pub fn validate(&self) -> Result<()> {
        let timeouts = [
            ("impersonate_timeout", self.impersonate_timeout),
            ("launch_timeout", self.launch_timeout),
            ("browser_timeout", self.browser_timeout),
            ("api_timeout", self.api_timeout),
            ("scrape_timeout", self.scrape_timeout),
        ];
        for (name, timeout) in timeouts {
            if timeout.is_zero() {
                return Err(SearchError::Config(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }
        if self.retry.max_attempts == 0 {
            return Err(SearchError::Config(
                "retry.max_attempts must be greater than 0".into(),
            ));
        }
        if self.retry.multiplier < 1.0 {
            return Err(SearchError::Config(
                "retry.multiplier must be at least 1.0".into(),
            ));
        }
        for endpoint in [
            &self.endpoints.html,
            &self.endpoints.browser_page,
            &self.endpoints.api_base,
            &self.endpoints.lite,
        ] {
            Url::parse(endpoint)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_values() {
        let config = SearchConfig::default();
        assert!(!config.use_browser);
        assert!(config.headless);
        assert!(config.bypass_proxy_for_driver);
        assert_eq!(config.impersonate_timeout, Duration::from_secs(12));
        assert_eq!(config.launch_timeout, Duration::from_secs(120));
        assert_eq!(config.browser_timeout, Duration::from_secs(15));
        assert_eq!(config.api_timeout, Duration::from_secs(20));
        assert_eq!(config.scrape_timeout, Duration::from_secs(10));
        assert_eq!(config.retry, RetryPolicy::default());
        assert!(config.chrome_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = SearchConfig {
            api_timeout: Duration::ZERO,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("api_timeout"));

        let config = SearchConfig {
            launch_timeout: Duration::ZERO,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("launch_timeout"));
    }

    #[test]
    fn zero_attempts_rejected() {
        let config = SearchConfig {
            retry: RetryPolicy {
                max_attempts: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn shrinking_backoff_rejected() {
        let config = SearchConfig {
            retry: RetryPolicy {
                multiplier: 0.5,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_endpoint_rejected() {
        let config = SearchConfig {
            endpoints: Endpoints {
                lite: "lite".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SearchError::UrlParse(_))));
    }

    #[test]
    fn local_endpoints() {
        let endpoints = Endpoints::local("http://127.0.0.1:9000/");
        assert_eq!(endpoints.html, "http://127.0.0.1:9000/html");
        assert_eq!(endpoints.browser_page, "http://127.0.0.1:9000/html/");
        assert_eq!(endpoints.api_base, "http://127.0.0.1:9000");
        assert_eq!(endpoints.lite, "http://127.0.0.1:9000/lite/");
    }

    #[test]
    fn default_profile_is_chrome_on_windows() {
        let profile = ImpersonationProfile::default();
        let ua = profile.user_agent();
        assert!(ua.contains("Windows NT 10.0"));
        assert!(ua.contains("Chrome/131.0.0.0"));
        let headers = profile.headers();
        let platform = headers.iter().find(|(k, _)| k == "sec-ch-ua-platform").unwrap();
        assert_eq!(platform.1, "\"Windows\"");
    }

    #[test]
    fn firefox_profile_has_no_client_hints() {
        let profile = ImpersonationProfile::new("firefox_133", "linux");
        assert!(profile.user_agent().contains("Firefox/133.0"));
        assert!(profile.user_agent().contains("X11; Linux x86_64"));
        assert!(!profile.headers().iter().any(|(k, _)| k == "sec-ch-ua"));
    }

    #[test]
    fn edge_profile_on_android_is_mobile() {
        let profile = ImpersonationProfile::new("edge", "android");
        let ua = profile.user_agent();
        assert!(ua.contains("Edg/131.0.0.0"));
        assert!(ua.contains("Mobile"));
        let headers = profile.headers();
        let mobile = headers.iter().find(|(k, _)| k == "sec-ch-ua-mobile").unwrap();
        assert_eq!(mobile.1, "?1");
    }

    #[test]
    fn unknown_profile_falls_back_to_chrome() {
        let profile = ImpersonationProfile::new("netscape_4", "beos");
        let ua = profile.user_agent();
        assert!(ua.contains("Chrome/4.0.0.0"));
        assert!(ua.contains("Windows NT 10.0"));
    }
}
