// src/config/watcher.rs
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::WatchError;

pub const ENV_CONFIG_PATH: &str = "WATCHER_CONFIG_PATH";
pub const DEFAULT_TOML_PATH: &str = "config/watcher.toml";
pub const DEFAULT_JSON_PATH: &str = "config/watcher.json";

pub const PAGE_URL: &str = "https://www.eventbrite.com/o/italy-expo-2025-osaka-107252340551";
pub const EVENT_PATH_MARKER: &str = "/e/";
pub const SEEN_FILE: &str = "seen.json";
pub const FEED_FILE: &str = "feed.xml";
pub const FEED_TITLE: &str = "Italy Expo 2025 Osaka - Eventbrite";
pub const FEED_DESCRIPTION: &str =
    "Auto-generated RSS for new Eventbrite events (Italy Expo 2025 Osaka)";
pub const USER_AGENT: &str =
    "Mozilla/5.0 (compatible; RSS-Checker/1.0; +https://github.com/yourname)";
pub const TIMEOUT_SECS: u64 = 20;

/// Everything one run needs to know. Every field may be omitted from an
/// override file; missing fields keep the compiled-in default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub page_url: String,
    pub event_path_marker: String,
    pub seen_path: PathBuf,
    pub feed_path: PathBuf,
    pub feed_title: String,
    pub feed_description: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            page_url: PAGE_URL.to_string(),
            event_path_marker: EVENT_PATH_MARKER.to_string(),
            seen_path: PathBuf::from(SEEN_FILE),
            feed_path: PathBuf::from(FEED_FILE),
            feed_title: FEED_TITLE.to_string(),
            feed_description: FEED_DESCRIPTION.to_string(),
            user_agent: USER_AGENT.to_string(),
            timeout_secs: TIMEOUT_SECS,
        }
    }
}

impl WatcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parsed `page_url`; also the base for resolving relative hrefs.
    pub fn base_url(&self) -> Result<url::Url, WatchError> {
        let u = url::Url::parse(&self.page_url)
            .map_err(|e| WatchError::Config(format!("page_url {:?}: {e}", self.page_url)))?;
        match u.scheme() {
            "http" | "https" => Ok(u),
            other => Err(WatchError::Config(format!(
                "page_url must be http(s), got scheme {other:?}"
            ))),
        }
    }

    pub fn validate(&self) -> Result<(), WatchError> {
        self.base_url()?;
        if self.event_path_marker.trim().is_empty() {
            return Err(WatchError::Config("event_path_marker is empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(WatchError::Config("timeout_secs must be > 0".into()));
        }
        Ok(())
    }

    /// Load overrides from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self, WatchError> {
        let content = fs::read_to_string(path)
            .map_err(|e| WatchError::Config(format!("reading {}: {e}", path.display())))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, ext.as_str())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load config using env var + fallbacks:
    /// 1) $WATCHER_CONFIG_PATH
    /// 2) config/watcher.toml
    /// 3) config/watcher.json
    /// 4) built-in defaults
    pub fn load_default() -> Result<Self, WatchError> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(WatchError::Config(format!(
                "{ENV_CONFIG_PATH} points to non-existent path {}",
                pb.display()
            )));
        }
        for candidate in [DEFAULT_TOML_PATH, DEFAULT_JSON_PATH] {
            let p = PathBuf::from(candidate);
            if p.exists() {
                tracing::debug!(path = %p.display(), "loading watcher config");
                return Self::load_from(&p);
            }
        }
        Ok(Self::default())
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<WatcherConfig, WatchError> {
    match hint_ext {
        "toml" => toml::from_str(s).map_err(|e| WatchError::Config(format!("toml: {e}"))),
        "json" => serde_json::from_str(s).map_err(|e| WatchError::Config(format!("json: {e}"))),
        _ => {
            if let Ok(v) = toml::from_str(s) {
                return Ok(v);
            }
            serde_json::from_str(s)
                .map_err(|_| WatchError::Config("unsupported config format".into()))
        }
    }
}
