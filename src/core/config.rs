//! Client configuration
//!
//! Settings are read from `config.yaml` in the user's config directory and
//! may be overridden through environment variables:
//!
//! - `DRX_API_URL` - backend base URL (including the `/api` path)
//! - `DRX_HOME` - directory holding `config.yaml` and the saved session

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default backend base URL
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Environment variable overriding the backend URL
pub const API_URL_ENV: &str = "DRX_API_URL";

/// Environment variable overriding the client home directory
pub const HOME_ENV: &str = "DRX_HOME";

const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine a configuration directory; set DRX_HOME")]
    NoHomeDir,

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

/// Client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL, e.g. `http://localhost:8080/api`
    pub api_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Directory of the config file and session storage (not serialized)
    #[serde(skip)]
    home: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: 30,
            home: PathBuf::new(),
        }
    }
}

impl Config {
    /// Load configuration from the default home directory and environment
    pub fn load() -> Result<Self, ConfigError> {
        let home = Self::home_dir()?;
        let mut config = Self::load_from(&home)?;
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_url = url;
            }
        }
        Ok(config)
    }

    /// Load configuration from a specific home directory (no env overrides)
    pub fn load_from(home: &Path) -> Result<Self, ConfigError> {
        let path = home.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            if content.trim().is_empty() {
                Config::default()
            } else {
                serde_yml::from_str(&content).map_err(|e| ConfigError::Parse {
                    path: path.clone(),
                    message: e.to_string(),
                })?
            }
        } else {
            Config::default()
        };
        config.home = home.to_path_buf();
        Ok(config)
    }

    /// Resolve the client home directory
    pub fn home_dir() -> Result<PathBuf, ConfigError> {
        if let Ok(dir) = std::env::var(HOME_ENV) {
            if !dir.trim().is_empty() {
                return Ok(PathBuf::from(dir));
            }
        }
        ProjectDirs::from("", "", "drx")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or(ConfigError::NoHomeDir)
    }

    /// Directory used for session storage
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Override the backend URL (e.g. from a command-line flag)
    pub fn with_api_url(mut self, url: Option<&str>) -> Self {
        if let Some(url) = url {
            self.api_url = url.to_string();
        }
        self
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }
}
