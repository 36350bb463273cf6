//! Toolchain runtime detector.

use serde::{Deserialize, Serialize};

use super::parse_version_triad;
use crate::detector::Detector;
use crate::probe::Probes;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeInfo {
    /// Raw version string, e.g. `rustc 1.80.1 (3f5fd8dd4 2024-08-06)`
    pub version: String,
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub arch: String,
    pub platform: String,
}

/// Reports the compiler version the binary was built with.
pub struct RuntimeDetector {
    probes: Probes,
}

impl RuntimeDetector {
    pub fn new(probes: Probes) -> Self {
        Self { probes }
    }
}

impl Detector for RuntimeDetector {
    type Output = RuntimeInfo;

    fn name(&self) -> &'static str {
        "runtime"
    }

    fn detect(&self) -> RuntimeInfo {
        let host = &self.probes.host;
        let version = host.runtime_version();
        let (major, minor, patch) = parse_version_triad(&version).unwrap_or_else(|| {
            tracing::debug!(%version, "unparseable runtime version");
            (0, 0, 0)
        });

        RuntimeInfo {
            version,
            major,
            minor,
            patch,
            arch: host.arch(),
            platform: host.platform(),
        }
    }
}
