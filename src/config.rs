//! Application configuration
//!
//! Defaults, then `<config dir>/stockroom/config.toml`, then environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::query::QueryOptions;

pub const APP_DIR: &str = "stockroom";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid api_url {0:?}")]
    ApiUrl(String),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub cloud_name: Option<String>,
    pub upload_preset: Option<String>,
    pub max_file_size: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            cloud_name: None,
            upload_preset: None,
            max_file_size: 10_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub session_file: PathBuf,
    pub page_size: u32,
    pub search_debounce_ms: u64,
    pub stale_time_secs: u64,
    /// How long an unused cached read survives after going stale
    pub gc_time_secs: u64,
    pub query_retry: u32,
    /// Typing a new search goes back to the first page
    pub reset_offset_on_search: bool,
    pub upload: UploadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080/api/".to_string(),
            session_file: config_dir().join("session"),
            page_size: 10,
            search_debounce_ms: 600,
            stale_time_secs: 300,
            gc_time_secs: 300,
            query_retry: 0,
            reset_offset_on_search: false,
            upload: UploadConfig::default(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

impl Config {
    /// Load from the default file location and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_dir().join("config.toml");
        let config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        let config = config.with_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Apply environment overrides; `lookup` is `std::env::var` in practice
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("STOCKROOM_API_URL") {
            self.api_url = url;
        }
        if let Some(file) = lookup("STOCKROOM_SESSION_FILE") {
            self.session_file = PathBuf::from(file);
        }
        if let Some(cloud) = lookup("CLOUDINARY_CLOUD_NAME") {
            self.upload.cloud_name = Some(cloud);
        }
        if let Some(preset) = lookup("CLOUDINARY_UPLOAD_PRESET") {
            self.upload.upload_preset = Some(preset);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.api_url).map_err(|_| ConfigError::ApiUrl(self.api_url.clone()))?;
        if self.page_size == 0 {
            return Err(ConfigError::Zero("page_size"));
        }
        Ok(())
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::default()
            .retry(self.query_retry)
            .stale_time(Duration::from_secs(self.stale_time_secs))
    }

    pub fn gc_time(&self) -> Duration {
        Duration::from_secs(self.gc_time_secs)
    }
}
