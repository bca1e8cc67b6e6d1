//! # Client Configuration
//!
//! Configuration for the console core's backend connection.
//! Supports environment variables, config files, and explicit overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Client configuration for the console's backend connection
///
/// # Examples
///
/// ```rust
/// use console_core::config::ClientConfig;
///
/// // Default configuration
/// let config = ClientConfig::default();
/// assert_eq!(config.base_url, "http://localhost:8080");
/// assert_eq!(config.timeout_ms, 30000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL for the backend API (e.g., "<http://localhost:8080>")
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    /// Bounded timeout for the credential refresh call specifically.
    /// An unbounded hang there would deadlock every queued waiter.
    pub refresh_timeout_ms: u64,
    /// Quiet period for filter debouncing in milliseconds
    pub debounce_ms: u64,
    /// Language tag sent as `Accept-Language` on every request
    pub language: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: 30000,
            refresh_timeout_ms: 10000,
            debounce_ms: 300,
            language: "en".to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables and config file
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file (`./console.toml`, `~/.config/console/client.toml`)
    /// 3. Default values
    pub fn load() -> ApiResult<Self> {
        let mut config = Self::default();

        if let Some(config_path) = Self::find_config_file() {
            debug!("Loading config from: {}", config_path.display());
            match Self::load_from_file(&config_path) {
                Ok(file_config) => config = file_config,
                Err(e) => {
                    debug!("Failed to load config file: {}", e);
                    // Continue with defaults if config file fails
                }
            }
        }

        config.apply_env_overrides();

        debug!("Loaded client configuration: {:?}", config);
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> ApiResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ApiError::Config(format!("Failed to read config file: {e}")))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ApiError::Config(format!("Failed to parse config file: {e}")))?;

        Ok(config)
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut possible_paths = vec![
            PathBuf::from("./console.toml"),
            PathBuf::from("./config/console.toml"),
        ];
        if let Some(config_dir) = dirs::config_dir() {
            possible_paths.push(config_dir.join("console").join("client.toml"));
        }

        possible_paths.into_iter().find(|p| p.is_file())
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CONSOLE_API_URL") {
            self.base_url = url;
        }
        if let Ok(timeout) = std::env::var("CONSOLE_TIMEOUT_MS") {
            if let Ok(timeout_ms) = timeout.parse() {
                self.timeout_ms = timeout_ms;
            }
        }
        if let Ok(timeout) = std::env::var("CONSOLE_REFRESH_TIMEOUT_MS") {
            if let Ok(timeout_ms) = timeout.parse() {
                self.refresh_timeout_ms = timeout_ms;
            }
        }
        if let Ok(lang) = std::env::var("CONSOLE_LANGUAGE") {
            self.language = lang;
        }
    }
}
