use std::path::PathBuf;
use thiserror::Error;

/// Core library errors
#[derive(Error, Debug)]
pub enum EnvscopeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Failed to serialize detection result: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Plugin lifecycle errors.
///
/// These are the only failures the engine surfaces; detection itself never fails.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluginError {
    #[error("plugin '{0}' is already installed")]
    AlreadyInstalled(String),

    #[error("plugin '{0}' is not installed")]
    NotInstalled(String),

    #[error("failed to install plugin '{plugin}': {reason}")]
    InstallFailed { plugin: String, reason: String },

    #[error("failed to uninstall plugin '{plugin}': {reason}")]
    UninstallFailed { plugin: String, reason: String },

    #[error("detector '{detector}' of plugin '{plugin}' is already provided by plugin '{owner}'")]
    DetectorConflict {
        plugin: String,
        detector: String,
        owner: String,
    },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, EnvscopeError>;
