//! Configuration management for the reader

pub mod session;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

pub use session::{FileStore, MemoryStore, SessionStore};

/// Reader configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the Pecha API
    pub api_base_url: String,

    /// Maximum number of chapters open side by side
    pub max_chapters: usize,

    /// Sections per page in skip mode
    pub page_size: u32,

    /// Segments per page in segment-cursor mode
    pub segment_page_size: u32,

    /// Scroll ratio at which the next page is requested (0.0 - 1.0)
    pub forward_ratio: f64,

    /// Distance from the top, in pixels, under which the previous page is requested
    pub top_threshold_px: f64,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.pecha.org/api/v1".to_string(),
            max_chapters: 3,
            page_size: 1,
            segment_page_size: 20,
            forward_ratio: 0.99,
            top_threshold_px: 10.0,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Load configuration from disk, or create default if not exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse config.json")
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "pecha-reader")
            .context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("", "", "pecha-reader")
            .context("Failed to determine data directory")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Get the path of the persisted reading session
    pub fn session_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("session.json"))
    }

    /// HTTP request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
