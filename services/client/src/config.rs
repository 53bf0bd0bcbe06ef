//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub storage_path: PathBuf,
    pub download_dir: PathBuf,
    pub log_level: Level,
    pub request_timeout: Duration,
    pub api_token: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        // --- Backend ---
        let api_base_url = var("API_BASE_URL", "http://localhost:8000")
            .trim_end_matches('/')
            .to_string();
        if api_base_url.is_empty() {
            return Err(ConfigError::MissingVar("API_BASE_URL".to_string()));
        }

        let timeout_str = var("REQUEST_TIMEOUT_SECS", "30");
        let timeout_secs = timeout_str.parse::<u64>().map_err(|_| {
            ConfigError::InvalidValue(
                "REQUEST_TIMEOUT_SECS".to_string(),
                format!("'{}' is not a number of seconds", timeout_str),
            )
        })?;

        let api_token = lookup("API_TOKEN").filter(|token| !token.is_empty());

        // --- Local files ---
        let storage_path = PathBuf::from(var("STORAGE_PATH", "./.dashboard/storage.json"));
        let download_dir = PathBuf::from(var("DOWNLOAD_DIR", "./downloads"));

        let log_level_str = var("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            api_base_url,
            storage_path,
            download_dir,
            log_level,
            request_timeout: Duration::from_secs(timeout_secs),
            api_token,
        })
    }
}
