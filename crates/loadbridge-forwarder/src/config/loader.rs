use std::path::{Path, PathBuf};

use loadbridge_common::ConfigError;
use tracing::info;

use super::LoadBridgeConfig;

/// Load config from a specific TOML file path.
pub fn load_from_path(path: &Path) -> Result<LoadBridgeConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::ParseError(format!("failed to read {}: {e}", path.display()))
    })?;

    let config: LoadBridgeConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    info!("loaded config from {}", path.display());
    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// On macOS: `~/Library/Application Support/loadbridge/config.toml`
/// On Linux: `~/.config/loadbridge/config.toml`
///
/// A missing file yields the defaults; nothing is written.
pub fn load_default() -> Result<LoadBridgeConfig, ConfigError> {
    let path = default_config_path()?;

    if !path.exists() {
        info!("no config found at {}, using defaults", path.display());
        return Ok(LoadBridgeConfig::default());
    }

    load_from_path(&path)
}

/// Get the platform-specific default config file path.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?;
    Ok(config_dir.join("loadbridge").join("config.toml"))
}

/// Write the default config, as TOML, to `path`.
pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::ParseError(format!(
                "failed to create config directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let content = toml::to_string_pretty(&LoadBridgeConfig::default())
        .map_err(|e| ConfigError::ParseError(format!("failed to serialize defaults: {e}")))?;

    std::fs::write(path, content).map_err(|e| {
        ConfigError::ParseError(format!(
            "failed to write default config to {}: {e}",
            path.display()
        ))
    })?;

    info!("created default config at {}", path.display());
    Ok(())
}
