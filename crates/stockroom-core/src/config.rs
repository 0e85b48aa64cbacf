//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the backend origin, the API root and the last used username.
//!
//! Configuration is stored at `~/.config/stockroom/config.json`. The backend
//! location can be overridden with `STOCKROOM_BASE_URL` and `STOCKROOM_API_ROOT`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "stockroom";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Cookie jar file name in cache directory
const COOKIE_FILE: &str = "cookies.json";

/// Backend origin the development proxy forwards `/api` to
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Path under which every inventory endpoint lives
pub const DEFAULT_API_ROOT: &str = "/api/inventory";

pub const BASE_URL_ENV: &str = "STOCKROOM_BASE_URL";
pub const API_ROOT_ENV: &str = "STOCKROOM_API_ROOT";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub api_root: String,
    pub last_username: Option<String>,
    /// Unset means the transport default (no client-side timeout)
    pub request_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_root: DEFAULT_API_ROOT.to_string(),
            last_username: None,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `STOCKROOM_BASE_URL` / `STOCKROOM_API_ROOT` when set and non-empty
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(BASE_URL_ENV).ok(),
            std::env::var(API_ROOT_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, base_url: Option<String>, api_root: Option<String>) {
        if let Some(base_url) = base_url.filter(|v| !v.trim().is_empty()) {
            self.base_url = base_url.trim().to_string();
        }
        if let Some(api_root) = api_root.filter(|v| !v.trim().is_empty()) {
            self.api_root = api_root.trim().to_string();
        }
    }

    /// API root without a trailing slash, always starting with `/`
    pub fn api_root(&self) -> String {
        let trimmed = self.api_root.trim_matches('/');
        format!("/{}", trimmed)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Where the backend session cookies are kept between runs
    pub fn cookie_path(&self) -> Result<PathBuf> {
        Ok(self.cache_dir()?.join(COOKIE_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api_root(), "/api/inventory");
        assert_eq!(config.request_timeout_secs, None);
    }

    #[test]
    fn test_api_root_normalizes_slashes() {
        let mut config = Config::default();
        config.api_root = "api/inventory/".to_string();
        assert_eq!(config.api_root(), "/api/inventory");
    }

    #[test]
    fn test_overrides_ignore_blank_values() {
        let mut config = Config::default();
        config.apply_overrides(Some("  ".to_string()), None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);

        config.apply_overrides(Some("https://stock.example.com".to_string()), Some("/api/v2".to_string()));
        assert_eq!(config.base_url, "https://stock.example.com");
        assert_eq!(config.api_root(), "/api/v2");
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"last_username": "alice"}"#).expect("write");

        let config = Config::load_from(&path).expect("load");
        assert_eq!(config.last_username.as_deref(), Some("alice"));
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("sub").join(CONFIG_FILE);
        let config = Config {
            last_username: Some("bob".to_string()),
            request_timeout_secs: Some(15),
            ..Config::default()
        };
        config.save_to(&path).expect("save");
        assert_eq!(Config::load_from(&path).expect("load"), config);
    }
}
