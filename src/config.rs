use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::detector::DetectorOptions;
use crate::detectors::DEFAULT_MODE_VARIABLE;
use crate::error::{ConfigError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub detection: DetectionConfig,
    pub mode: ModeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache detection results
    pub enabled: bool,
    /// Lifetime of a cached result in milliseconds
    pub ttl_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Hand out deferred results from `detect()`
    pub asynchronous: bool,
    /// Upper bound for privilege-check commands in milliseconds
    pub command_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeConfig {
    /// Environment variable holding the deployment mode.
    ///
    /// Defaults to `APP_ENV`. Set it to `NODE_ENV` to follow the Node.js
    /// convention.
    pub variable: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_ms: 60_000,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            asynchronous: false,
            command_timeout_ms: 5_000,
        }
    }
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            variable: DEFAULT_MODE_VARIABLE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the per-user config file
    /// (`<config_dir>/envscope/config.toml`) is used when present and
    /// defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::ReadError {
            path: path.clone(),
            source,
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ParseError {
                path: path.clone(),
                source,
            })?;

        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded config file");

        Ok(config)
    }

    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("envscope").join("config.toml"))
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.cache.ttl_ms == 0 {
            return Err(ConfigError::Invalid(
                "cache.ttl_ms must be greater than 0".into(),
            ));
        }
        if self.detection.command_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "detection.command_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.mode.variable.trim().is_empty() {
            return Err(ConfigError::Invalid("mode.variable must not be empty".into()));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.detection.command_timeout_ms)
    }

    /// Options applied to every built-in detector
    pub fn detector_options(&self) -> DetectorOptions {
        DetectorOptions {
            cache: self.cache.enabled,
            ttl: Duration::from_millis(self.cache.ttl_ms),
            asynchronous: self.detection.asynchronous,
        }
    }
}
