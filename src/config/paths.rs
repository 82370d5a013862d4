//! XDG-compliant path management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Manages all application paths using XDG base directory specification
#[derive(Debug, Clone)]
pub struct Paths {
    config_dir: PathBuf,
    data_dir: PathBuf,
    cache_dir: PathBuf,
}

impl Paths {
    /// Resolve the per-user XDG directories
    pub fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "gamewatch")
            .context("Failed to determine project directories")?;
        Ok(Self {
            config_dir: dirs.config_dir().to_path_buf(),
            data_dir: dirs.data_dir().to_path_buf(),
            cache_dir: dirs.cache_dir().to_path_buf(),
        })
    }

    /// Root every directory under `root` (portable installs and tests)
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
            cache_dir: root.join("cache"),
        }
    }

    // ========== Config Paths ==========

    /// Config directory: ~/.config/gamewatch/
    pub fn config_dir(&self) -> PathBuf {
        self.config_dir.clone()
    }

    /// Main config file: ~/.config/gamewatch/config.toml
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    // ========== Data Paths ==========

    /// Data directory: ~/.local/share/gamewatch/
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    /// Database file: ~/.local/share/gamewatch/gamewatch.db
    pub fn database_file(&self) -> PathBuf {
        self.data_dir.join("gamewatch.db")
    }

    /// Log file: ~/.local/share/gamewatch/gamewatch.log
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("gamewatch.log")
    }

    // ========== Cache Paths ==========

    /// Cache directory: ~/.cache/gamewatch/
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone()
    }

    /// Ensure all required directories exist
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.cache_dir)?;
        Ok(())
    }
}
