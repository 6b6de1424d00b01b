//! Configuration management for DataQuest.
//!
//! Handles loading configuration from TOML files. Environment and CLI
//! overrides are layered on top in `cli.rs`; the resolved backend address
//! is injected into the HTTP client at startup.

use crate::error::{DataQuestError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Default base URL of the query backend.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Main configuration structure for DataQuest.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Query backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Terminal UI settings.
    #[serde(default)]
    pub ui: UiConfig,
}

/// Query backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    /// Base URL of the backend (e.g., "http://localhost:8000").
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds. No timeout when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

impl BackendConfig {
    /// Parses and validates the base URL.
    ///
    /// Only `http` and `https` schemes are accepted.
    pub fn parsed_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            DataQuestError::config(format!("Invalid backend URL '{}': {e}", self.base_url))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(DataQuestError::config(format!(
                "Invalid scheme '{}'. Expected 'http' or 'https'",
                url.scheme()
            )));
        }

        Ok(url)
    }

    /// Returns a short string for the header bar.
    pub fn display_string(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }
}

/// Terminal UI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    /// How long to wait for terminal input before redrawing (milliseconds).
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
}

fn default_tick_rate_ms() -> u64 {
    100
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate_ms(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dataquest")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| DataQuestError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            DataQuestError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}
