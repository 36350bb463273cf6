//! Deployment mode detector.

use serde::{Deserialize, Serialize};

use crate::detector::Detector;
use crate::probe::Probes;

/// Variable consulted when none is configured.
pub const DEFAULT_MODE_VARIABLE: &str = "APP_ENV";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentMode {
    #[default]
    Development,
    Production,
    Test,
    Staging,
}

impl EnvironmentMode {
    /// Parse a mode name. Unknown values fall back to development.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => EnvironmentMode::Production,
            "test" | "testing" => EnvironmentMode::Test,
            "staging" | "stage" => EnvironmentMode::Staging,
            _ => EnvironmentMode::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentMode::Development => "development",
            EnvironmentMode::Production => "production",
            EnvironmentMode::Test => "test",
            EnvironmentMode::Staging => "staging",
        }
    }
}

impl std::fmt::Display for EnvironmentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeInfo {
    pub mode: EnvironmentMode,
    /// Raw value of the mode variable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

pub struct ModeDetector {
    probes: Probes,
    variable: String,
}

impl ModeDetector {
    pub fn new(probes: Probes, variable: impl Into<String>) -> Self {
        Self {
            probes,
            variable: variable.into(),
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }
}

impl Detector for ModeDetector {
    type Output = ModeInfo;

    fn name(&self) -> &'static str {
        "mode"
    }

    fn detect(&self) -> ModeInfo {
        let source = self.probes.var(&self.variable);
        let mode = source
            .as_deref()
            .map(EnvironmentMode::parse)
            .unwrap_or_default();

        ModeInfo { mode, source }
    }
}
