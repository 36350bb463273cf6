//! Operating system detector.

use serde::{Deserialize, Serialize};

use crate::detector::Detector;
use crate::probe::Probes;

/// Normalized OS family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsType {
    Windows,
    Macos,
    Linux,
    Unknown,
}

impl OsType {
    /// Map a platform identifier to its family.
    pub fn from_platform(platform: &str) -> Self {
        match platform.to_ascii_lowercase().as_str() {
            "windows" | "win32" => OsType::Windows,
            "macos" | "darwin" => OsType::Macos,
            "linux" => OsType::Linux,
            _ => OsType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OsType::Windows => "windows",
            OsType::Macos => "macos",
            OsType::Linux => "linux",
            OsType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for OsType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsInfo {
    /// Platform identifier as reported by the host
    pub platform: String,
    pub os_type: OsType,
    /// Kernel build version
    pub version: String,
    /// Kernel release
    pub release: String,
    pub arch: String,
    pub is_windows: bool,
    pub is_macos: bool,
    pub is_linux: bool,
}

impl OsInfo {
    fn new(
        platform: String,
        os_type: OsType,
        version: String,
        release: String,
        arch: String,
    ) -> Self {
        Self {
            platform,
            os_type,
            version,
            release,
            arch,
            is_windows: os_type == OsType::Windows,
            is_macos: os_type == OsType::Macos,
            is_linux: os_type == OsType::Linux,
        }
    }
}

/// Detects the OS family and kernel identification.
pub struct OsDetector {
    probes: Probes,
}

impl OsDetector {
    pub fn new(probes: Probes) -> Self {
        Self { probes }
    }
}

impl Detector for OsDetector {
    type Output = OsInfo;

    fn name(&self) -> &'static str {
        "os"
    }

    fn detect(&self) -> OsInfo {
        let host = &self.probes.host;
        let platform = host.platform();

        match host.kernel() {
            Ok(kernel) => {
                let os_type = OsType::from_platform(&platform);
                OsInfo::new(platform, os_type, kernel.version, kernel.release, host.arch())
            }
            Err(e) => {
                tracing::debug!(error = %e, "OS information unavailable, using fallback");
                OsInfo::new(
                    platform,
                    OsType::Unknown,
                    "unknown".to_string(),
                    "unknown".to_string(),
                    host.arch(),
                )
            }
        }
    }
}
