//! Configuration for the bridge and its host process.
//!
//! TOML-based, every section `serde(default)` so a partial file (or none at
//! all) works out of the box.

mod loader;
mod validation;

pub use loader::{create_default_config, default_config_path, load_default, load_from_path};
pub use validation::validate;

use loadbridge_common::ConfigError;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadBridgeConfig {
    pub log: LogConfig,
    pub jni: JniConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive, e.g. `loadbridge=debug`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "loadbridge=info".into(),
        }
    }
}

/// Java class names used when translating into a JVM listener runtime.
/// All names are JVM internal names (`/`-separated).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JniConfig {
    /// Host-provided frame class, a subtype of `org/cef/browser/CefFrame`
    /// with a public constructor matching `frame_constructor`. JCEF's own
    /// `CefFrame_N` wraps a native pointer and cannot be built from a frame
    /// snapshot, so there is no default. Empty means unset.
    pub frame_class: String,
    /// Constructor signature taking (identifier, url, isMain).
    pub frame_constructor: String,
    pub transition_type_class: String,
    pub error_code_class: String,
}

impl Default for JniConfig {
    fn default() -> Self {
        Self {
            frame_class: String::new(),
            frame_constructor: "(Ljava/lang/String;Ljava/lang/String;Z)V".into(),
            transition_type_class: "org/cef/network/CefRequest$TransitionType".into(),
            error_code_class: "org/cef/handler/CefLoadHandler$ErrorCode".into(),
        }
    }
}

impl JniConfig {
    /// The frame class, or an error if none has been configured.
    pub fn require_frame_class(&self) -> Result<&str, ConfigError> {
        if self.frame_class.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "jni.frame_class must name a CefFrame subclass with a {} constructor",
                self.frame_constructor
            )));
        }
        Ok(&self.frame_class)
    }
}

/// Load config from the platform default path, falling back to defaults
/// when no file exists.
pub fn load_config() -> Result<LoadBridgeConfig, ConfigError> {
    let config = load_default()?;
    validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &LoadBridgeConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
