//! Chrome/Chromium discovery and on-demand provisioning for the browser tier.
//!
//! Lookup order: an explicit path, the `CHROME` variable, well-known commands
//! on `PATH`, well-known install locations, the local cache, and finally a
//! fresh Chrome for Testing download into `~/.ddg-tiers/chromium/<version>/`.
//!
//! The download client honours the proxy environment. When the browser tier
//! runs with proxy bypass enabled, the caller clears those variables first.

use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::{Result, SearchError};

const DOWNLOAD_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Chrome for Testing release metadata.
const CHROME_VERSIONS_URL: &str =
    "https://googlechromelabs.github.io/chrome-for-testing/last-known-good-versions-with-downloads.json";

#[cfg(target_os = "macos")]
const KNOWN_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
];

#[cfg(all(unix, not(target_os = "macos")))]
const KNOWN_PATHS: &[&str] = &[
    "/usr/bin/google-chrome",
    "/usr/bin/google-chrome-stable",
    "/usr/bin/chromium",
    "/usr/bin/chromium-browser",
    "/snap/bin/chromium",
    "/opt/google/chrome/chrome",
];

#[cfg(not(unix))]
const KNOWN_PATHS: &[&str] = &[];

const KNOWN_COMMANDS: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

fn driver_error(context: &str, err: impl std::fmt::Display) -> SearchError {
    SearchError::Driver(format!("{}: {}", context, err))
}

/// Chrome for Testing platform id of this host.
fn platform_id() -> Result<&'static str> {
    match (std::env::consts::OS, std::env::consts::ARCH) {
        ("macos", "aarch64") => Ok("mac-arm64"),
        ("macos", "x86_64") => Ok("mac-x64"),
        ("linux", "x86_64") => Ok("linux64"),
        (os, arch) => Err(SearchError::Driver(format!(
            "No Chrome for Testing build for {}/{}",
            os, arch
        ))),
    }
}

/// Executable path inside an extracted archive for `platform`.
fn executable_in_archive(platform: &str) -> PathBuf {
    let root = PathBuf::from(format!("chrome-{}", platform));
    if platform.starts_with("mac") {
        root.join("Google Chrome for Testing.app")
            .join("Contents")
            .join("MacOS")
            .join("Google Chrome for Testing")
    } else {
        root.join("chrome")
    }
}

/// Cache root below `home`.
fn cache_root(home: &Path) -> PathBuf {
    home.join(".ddg-tiers").join("chromium")
}

fn home_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| SearchError::Driver("HOME is not set".to_string()))
}

/// Finds an installed Chrome/Chromium, without downloading anything.
pub fn detect_chrome() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("CHROME").map(PathBuf::from) {
        if path.exists() {
            debug!("Chrome from CHROME: {}", path.display());
            return Some(path);
        }
    }

    if let Some(path) = KNOWN_COMMANDS.iter().find_map(|cmd| which::which(cmd).ok()) {
        debug!("Chrome on PATH: {}", path.display());
        return Some(path);
    }

    KNOWN_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// Newest cached executable below `root`, if any.
fn cached_chrome_in(root: &Path, platform: &str) -> Option<PathBuf> {
    let mut versions: Vec<PathBuf> = std::fs::read_dir(root)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();
    versions.sort();
    versions
        .into_iter()
        .rev()
        .map(|dir| dir.join(executable_in_archive(platform)))
        .find(|exe| exe.exists())
}

/// Returns a usable Chrome executable, downloading one when needed.
///
/// `explicit` wins when it exists on disk.
pub async fn ensure_chrome(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        warn!("Configured Chrome path {} does not exist", path.display());
    }

    if let Some(path) = detect_chrome() {
        info!("Using system Chrome: {}", path.display());
        return Ok(path);
    }

    let platform = platform_id()?;
    let root = cache_root(&home_dir()?);
    if let Some(path) = cached_chrome_in(&root, platform) {
        info!("Using cached Chrome: {}", path.display());
        return Ok(path);
    }

    info!("No Chrome found, downloading Chrome for Testing");
    download_chrome(&root, platform).await
}

/// Stable version and archive URL for `platform` from the release metadata.
fn stable_download(metadata: &serde_json::Value, platform: &str) -> Result<(String, String)> {
    let stable = &metadata["channels"]["Stable"];
    let version = stable["version"]
        .as_str()
        .ok_or_else(|| SearchError::Driver("Release metadata has no Stable version".into()))?;
    let url = stable["downloads"]["chrome"]
        .as_array()
        .into_iter()
        .flatten()
        .find(|d| d["platform"].as_str() == Some(platform))
        .and_then(|d| d["url"].as_str())
        .ok_or_else(|| SearchError::Driver(format!("No Chrome download for '{}'", platform)))?;
    Ok((version.to_string(), url.to_string()))
}

fn download_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(DOWNLOAD_CONNECT_TIMEOUT)
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|e| driver_error("Failed to build download client", e))
}

async fn download_chrome(root: &Path, platform: &str) -> Result<PathBuf> {
    let client = download_client()?;

    let metadata: serde_json::Value = client
        .get(CHROME_VERSIONS_URL)
        .send()
        .await
        .map_err(|e| driver_error("Failed to fetch Chrome versions", e))?
        .json()
        .await
        .map_err(|e| driver_error("Failed to parse Chrome versions", e))?;
    let (version, url) = stable_download(&metadata, platform)?;

    info!("Downloading Chrome for Testing {} ({})", version, platform);
    let archive = client
        .get(&url)
        .send()
        .await
        .map_err(|e| driver_error("Failed to download Chrome", e))?
        .bytes()
        .await
        .map_err(|e| driver_error("Failed to read Chrome download", e))?;
    debug!("Downloaded {} bytes", archive.len());

    let version_dir = root.join(&version);
    std::fs::create_dir_all(&version_dir)
        .map_err(|e| driver_error(&format!("Failed to create {}", version_dir.display()), e))?;
    extract_zip(&archive, &version_dir)?;

    let exe = version_dir.join(executable_in_archive(platform));
    if !exe.exists() {
        return Err(SearchError::Driver(format!(
            "Chrome executable missing after extraction: {}",
            exe.display()
        )));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755))
            .map_err(|e| driver_error("Failed to mark Chrome executable", e))?;
    }

    info!("Chrome installed at {}", exe.display());
    Ok(exe)
}

/// Unpacks a zip archive into `target`.
fn extract_zip(bytes: &[u8], target: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| driver_error("Failed to open zip archive", e))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| driver_error("Failed to read zip entry", e))?;
        let out = target.join(entry.mangled_name());

        if entry.is_dir() {
            std::fs::create_dir_all(&out)
                .map_err(|e| driver_error(&format!("Failed to create {}", out.display()), e))?;
            continue;
        }

        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| driver_error(&format!("Failed to create {}", parent.display()), e))?;
        }
        let mut contents = Vec::with_capacity(entry.size() as usize);
        entry
            .read_to_end(&mut contents)
            .map_err(|e| driver_error("Failed to inflate zip entry", e))?;
        std::fs::File::create(&out)
            .and_then(|mut file| file.write_all(&contents))
            .map_err(|e| driver_error(&format!("Failed to write {}", out.display()), e))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out, std::fs::Permissions::from_mode(mode)).ok();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_client_is_bounded() {
        assert!(DOWNLOAD_CONNECT_TIMEOUT < DOWNLOAD_TIMEOUT);
        assert!(download_client().is_ok());
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ddg_tiers_{}_{}", name, std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_executable_in_archive() {
        assert_eq!(
            executable_in_archive("linux64"),
            PathBuf::from("chrome-linux64/chrome")
        );
        let mac = executable_in_archive("mac-arm64");
        assert!(mac.starts_with("chrome-mac-arm64"));
        assert!(mac.ends_with("Google Chrome for Testing"));
    }

    #[test]
    fn test_cache_root() {
        assert_eq!(
            cache_root(Path::new("/home/alice")),
            PathBuf::from("/home/alice/.ddg-tiers/chromium")
        );
    }

    #[test]
    fn test_detect_chrome_returns_existing_path() {
        if let Some(path) = detect_chrome() {
            assert!(path.exists());
        }
    }

    #[test]
    fn test_cached_chrome_missing_root() {
        let root = std::env::temp_dir().join("ddg_tiers_no_such_cache");
        assert!(cached_chrome_in(&root, "linux64").is_none());
    }

    #[test]
    fn test_cached_chrome_version_without_executable() {
        let root = scratch_dir("no_exe");
        std::fs::create_dir_all(root.join("130.0.6723.58")).unwrap();
        assert!(cached_chrome_in(&root, "linux64").is_none());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_cached_chrome_picks_newest() {
        let root = scratch_dir("newest");
        for version in ["129.0.1", "131.0.2"] {
            let exe = root.join(version).join(executable_in_archive("linux64"));
            std::fs::create_dir_all(exe.parent().unwrap()).unwrap();
            std::fs::write(&exe, b"").unwrap();
        }
        let found = cached_chrome_in(&root, "linux64").unwrap();
        assert!(found.starts_with(root.join("131.0.2")));
        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn test_ensure_chrome_prefers_explicit_path() {
        let root = scratch_dir("explicit");
        let exe = root.join("my-chrome");
        std::fs::write(&exe, b"").unwrap();
        let found = ensure_chrome(Some(&exe)).await.unwrap();
        assert_eq!(found, exe);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_stable_download() {
        let metadata = serde_json::json!({
            "channels": {
                "Stable": {
                    "version": "131.0.6778.85",
                    "downloads": {
                        "chrome": [
                            {"platform": "mac-arm64", "url": "https://cdn.example/mac.zip"},
                            {"platform": "linux64", "url": "https://cdn.example/linux.zip"}
                        ]
                    }
                }
            }
        });
        let (version, url) = stable_download(&metadata, "linux64").unwrap();
        assert_eq!(version, "131.0.6778.85");
        assert_eq!(url, "https://cdn.example/linux.zip");

        let missing = stable_download(&metadata, "win64");
        assert!(matches!(missing, Err(SearchError::Driver(_))));
    }

    #[test]
    fn test_stable_download_without_channel() {
        let result = stable_download(&serde_json::json!({}), "linux64");
        assert!(matches!(result, Err(SearchError::Driver(_))));
    }

    #[test]
    fn test_extract_zip_invalid_data() {
        let err = extract_zip(b"not a zip file", Path::new("/tmp")).unwrap_err();
        assert!(err.to_string().contains("zip"));
    }

    #[test]
    fn test_extract_zip_nested() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        writer.add_directory("chrome-linux64", options).unwrap();
        writer.start_file("chrome-linux64/chrome", options).unwrap();
        writer.write_all(b"#!/bin/sh").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let target = scratch_dir("extract");
        extract_zip(&bytes, &target).unwrap();
        let exe = target.join(executable_in_archive("linux64"));
        assert_eq!(std::fs::read_to_string(exe).unwrap(), "#!/bin/sh");
        std::fs::remove_dir_all(&target).ok();
    }
}
