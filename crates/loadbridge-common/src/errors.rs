use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures reported by a runtime bridge implementation.
///
/// None of these ever reach a listener. The forwarder treats them as a
/// dropped notification; they only surface from construction.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("execution environment unavailable")]
    EnvUnavailable,

    #[error("jni error: {0}")]
    Jni(String),

    #[error("listener threw from {method}")]
    ListenerThrew { method: &'static str },

    #[error("unknown object handle: {0}")]
    UnknownObject(u64),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LoadBridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("scenario error: {0}")]
    Scenario(String),

    #[error("{0}")]
    Other(String),
}
