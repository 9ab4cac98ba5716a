//! Configuration IO helpers for the prompt server.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::{config_dir, home_dir};

use crate::config::{ConfigError, ServerConfig, validate_config};

/// Environment variable that overrides the configuration file location.
pub const CONFIG_PATH_ENV: &str = "CUECARD_CONFIG_PATH";

/// Returns the default path for the server configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir().unwrap_or_else(|| PathBuf::from(".")).join("cuecard").join("server.json")
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let home = || home_dir().unwrap_or_else(|| PathBuf::from("~"));
    if trimmed == "~" {
        return home();
    }
    if let Some(rest) = trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
        return home().join(rest);
    }
    PathBuf::from(trimmed)
}

/// Loads the server configuration from the default path.
pub fn load_config() -> Result<ServerConfig, ConfigError> {
    let path = default_config_path();
    load_config_from_path(&path)
}

/// Loads and validates the server configuration from a specific path.
///
/// A missing file yields the default configuration. Files ending in `.yaml`
/// or `.yml` are parsed as YAML, everything else as JSON.
pub fn load_config_from_path(path: &Path) -> Result<ServerConfig, ConfigError> {
    if !path.exists() {
        return Ok(ServerConfig::default());
    }
    if path.is_dir() {
        return Err(ConfigError::Invalid {
            message: format!("{} is a directory", path.display()),
        });
    }

    let content = fs::read_to_string(path)?;
    let config: ServerConfig = match path.extension().and_then(|extension| extension.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&content)?,
        _ => serde_json::from_str(&content)?,
    };
    validate_config(&config)?;
    Ok(config)
}
