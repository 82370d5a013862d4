//! Configuration management for gamewatch
//!
//! Uses XDG-compliant paths:
//! - Config: ~/.config/gamewatch/config.toml
//! - Data: ~/.local/share/gamewatch/
//! - Cache: ~/.cache/gamewatch/

mod paths;

pub use paths::Paths;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote catalog connection
    pub catalog: CatalogConfig,

    /// Library ingestion settings
    pub import: ImportConfig,

    /// Watch-list synchronization settings
    pub watch: WatchConfig,

    /// Paths configuration
    #[serde(skip)]
    pub paths: Option<Paths>,
}

/// Remote catalog connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the catalog JSON API
    pub base_url: String,

    /// Optional API key sent as the `apikey` header
    pub api_key: Option<String>,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Attempts before a rate-limited or 5xx request is given up
    pub max_retries: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://catalog.invalid/api".to_string(),
            api_key: None,
            timeout_secs: 30,
            max_retries: 5,
        }
    }
}

/// Library ingestion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Up to this many duplicates are reported one notice each; above it a
    /// single aggregate notice is emitted
    pub duplicate_notice_limit: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            duplicate_notice_limit: 5,
        }
    }
}

/// Watch-list synchronization settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Newline-separated watch URL list used when `sync` gets no URLs
    pub watch_list_file: Option<PathBuf>,

    /// Abort the whole sync pass on the first remote fetch failure instead
    /// of isolating the failed thread
    pub abort_on_fetch_error: bool,
}

impl Config {
    /// Resolved paths; falls back to XDG defaults when not loaded from disk
    pub fn paths(&self) -> Result<Paths> {
        match &self.paths {
            Some(paths) => Ok(paths.clone()),
            None => Paths::new(),
        }
    }

    /// Load configuration from the default location or create it
    pub async fn load() -> Result<Self> {
        Self::load_with_paths(Paths::new()?).await
    }

    /// Load configuration from `paths.config_file()` or create default
    pub async fn load_with_paths(paths: Paths) -> Result<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .await
                .context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.paths = Some(paths);

        if !config_path.exists() {
            config.save().await?;
        }

        Ok(config)
    }

    /// Save configuration to disk
    pub async fn save(&self) -> Result<()> {
        let config_path = self.paths()?.config_file();
        save_to(&config_path, self).await
    }
}

async fn save_to(config_path: &Path, config: &Config) -> Result<()> {
    // Ensure config directory exists
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)
            .await
            .context("Failed to create config directory")?;
    }

    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(config_path, content)
        .await
        .context("Failed to write config file")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_creates_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted_at(dir.path());

        let config = Config::load_with_paths(paths.clone()).await.unwrap();
        assert!(paths.config_file().exists());
        assert_eq!(config.import.duplicate_notice_limit, 5);
        assert!(!config.watch.abort_on_fetch_error);
        assert_eq!(config.catalog.max_retries, 5);
    }

    #[tokio::test]
    async fn partial_config_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted_at(dir.path());
        std::fs::create_dir_all(paths.config_dir()).unwrap();
        std::fs::write(
            paths.config_file(),
            "[import]\nduplicate_notice_limit = 2\n\n[catalog]\nbase_url = \"http://localhost:9000\"\n",
        )
        .unwrap();

        let config = Config::load_with_paths(paths).await.unwrap();
        assert_eq!(config.import.duplicate_notice_limit, 2);
        assert_eq!(config.catalog.base_url, "http://localhost:9000");
        assert_eq!(config.catalog.timeout_secs, 30);
    }

    #[tokio::test]
    async fn save_round_trips_watch_settings() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted_at(dir.path());

        let mut config = Config::load_with_paths(paths.clone()).await.unwrap();
        config.watch.abort_on_fetch_error = true;
        config.watch.watch_list_file = Some(dir.path().join("watch.txt"));
        config.save().await.unwrap();

        let reloaded = Config::load_with_paths(paths).await.unwrap();
        assert!(reloaded.watch.abort_on_fetch_error);
        assert_eq!(reloaded.watch.watch_list_file, Some(dir.path().join("watch.txt")));
    }
}
