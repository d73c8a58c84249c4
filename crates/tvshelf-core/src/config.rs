use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::TvShelfError;
use crate::models::SearchMatch;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Environment variable that overrides `tmdb.api_key`.
pub const API_KEY_ENV: &str = "TVSHELF_TMDB_API_KEY";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub tmdb: TmdbConfig,
    pub search: SearchConfig,
    pub connectivity: ConnectivityConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbConfig {
    pub api_key: String,
    pub base_url: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub match_fields: SearchMatch,
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    pub probe_addr: String,
    pub timeout_ms: u64,
}

impl ConnectivityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    pub filter: String,
    /// Also write daily rolling log files into the data directory.
    pub file: bool,
}

impl AppConfig {
    /// Load config: user file if it exists, built-in defaults otherwise.
    pub fn load() -> Result<Self, TvShelfError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env();
        Ok(config)
    }

    /// Load config from an explicit path, falling back to defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, TvShelfError> {
        if !path.exists() {
            return Self::defaults();
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| TvShelfError::Config(e.to_string()))
    }

    /// Save current config to the user config file.
    pub fn save(&self) -> Result<(), TvShelfError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), TvShelfError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TvShelfError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn defaults() -> Result<Self, TvShelfError> {
        toml::from_str(DEFAULT_CONFIG).map_err(|e| TvShelfError::Config(e.to_string()))
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.tmdb.api_key = key;
            }
        }
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Path to the database file.
    pub fn db_path() -> PathBuf {
        Self::data_dir().join("tvshelf.db")
    }

    /// Directory for the database and log files.
    pub fn data_dir() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Ensure the data directory exists and return the DB path.
    pub fn ensure_db_path() -> Result<PathBuf, TvShelfError> {
        let path = Self::db_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "tvshelf")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}
