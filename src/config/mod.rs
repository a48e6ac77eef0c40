//! Configuration file loading and parsing.
//!
//! This module handles loading the configuration file from disk and parsing
//! it into validated, type-safe structures.
//!
//! # Configuration Sources
//!
//! Settings are resolved in the following order, later sources winning:
//!
//! 1. Built-in defaults (`https://dealx.com.ua`, log level `warn`)
//! 2. Configuration file:
//!    - Path specified on the command line, or
//!    - **Linux/macOS:** `~/.dealx-mcp/config.json`
//!    - **Windows:** `%USERPROFILE%\.dealx-mcp\config.json`
//! 3. The `DEALX_API_URL` environment variable for the API base URL
//!
//! Unlike an explicitly given path, a missing default file is not an error.

mod settings;

pub use settings::{ApiConfig, Config, LoggingConfig, DEFAULT_BASE_URL};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Environment variable overriding the DealX API base URL.
pub const BASE_URL_ENV: &str = "DEALX_API_URL";

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.dealx-mcp/`
/// - **Windows:** `%USERPROFILE%\.dealx-mcp\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".dealx-mcp"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads the configuration and applies environment overrides.
///
/// If `path` is `None`, the platform-specific default location is tried and
/// built-in defaults are used when no file exists there.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given configuration file cannot be found
/// - The file cannot be read
/// - The JSON is malformed
///
/// The base URL is not checked here. A malformed value is reported by each
/// search call; see [`Config::validate`] for an upfront check.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => read_config_file(p)?,
        None => match default_config_path() {
            Some(p) if p.exists() => read_config_file(&p)?,
            _ => Config::default(),
        },
    };

    apply_base_url_override(&mut config, std::env::var(BASE_URL_ENV).ok());

    Ok(config)
}

/// Replaces the configured base URL when a non-empty override is present.
pub fn apply_base_url_override(config: &mut Config, value: Option<String>) {
    if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
        config.api.base_url = url.trim().to_string();
    }
}

fn read_config_file(config_path: &Path) -> Result<Config, ConfigError> {
    if !config_path.exists() {
        return Err(ConfigError::NotFound {
            path: config_path.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: config_path.to_path_buf(),
        source: e,
    })
}
