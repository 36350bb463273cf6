//! Container detector: Docker, WSL and Kubernetes.
//!
//! The three signals are probed independently. `is_container` is their
//! disjunction, and `container_type` surfaces only the highest-precedence
//! one (docker, then wsl, then kubernetes) even when several fire.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::os::OsType;
use super::parse_version_triad;
use crate::detector::Detector;
use crate::probe::Probes;

const DOCKER_MARKERS: &[&str] = &["/.dockerenv", "/.dockerinit"];
const SELF_CGROUP: &str = "/proc/self/cgroup";
const INIT_CGROUP: &str = "/proc/1/cgroup";
const SELF_MOUNTINFO: &str = "/proc/self/mountinfo";

const PROC_VERSION: &str = "/proc/version";
const OS_RELEASE: &str = "/etc/os-release";
const WSL_INTEROP_PATHS: &[&str] = &["/proc/sys/fs/binfmt_misc/WSLInterop", "/run/WSL"];

const K8S_SECRETS_DIR: &str = "/var/run/secrets/kubernetes.io";
const K8S_TOKEN: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerType {
    Docker,
    Wsl,
    Kubernetes,
}

impl ContainerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerType::Docker => "docker",
            ContainerType::Wsl => "wsl",
            ContainerType::Kubernetes => "kubernetes",
        }
    }
}

impl std::fmt::Display for ContainerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub is_container: bool,
    pub is_docker: bool,
    pub is_wsl: bool,
    pub is_kubernetes: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_type: Option<ContainerType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wsl_version: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wsl_distro: Option<String>,
}

impl ContainerInfo {
    /// Combine the individual signals.
    pub fn from_signals(is_docker: bool, wsl: Option<WslInfo>, is_kubernetes: bool) -> Self {
        let is_wsl = wsl.is_some();
        let container_type = if is_docker {
            Some(ContainerType::Docker)
        } else if is_wsl {
            Some(ContainerType::Wsl)
        } else if is_kubernetes {
            Some(ContainerType::Kubernetes)
        } else {
            None
        };
        let (wsl_version, wsl_distro) = wsl.map_or((None, None), |w| (w.version, w.distro));

        Self {
            is_container: is_docker || is_wsl || is_kubernetes,
            is_docker,
            is_wsl,
            is_kubernetes,
            container_type,
            wsl_version,
            wsl_distro,
        }
    }
}

/// WSL details, present only when WSL was detected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WslInfo {
    pub version: Option<u8>,
    pub distro: Option<String>,
}

/// Infer the WSL generation from `/proc/version` text.
///
/// An explicit `WSL2` token wins. Otherwise a Microsoft/WSL kernel is
/// classified by its major version: 5 and up is WSL2, older is WSL1.
pub fn parse_wsl_version(proc_version: &str) -> Option<u8> {
    let lower = proc_version.to_ascii_lowercase();
    if lower.contains("wsl2") {
        return Some(2);
    }
    if !(lower.contains("microsoft") || lower.contains("wsl")) {
        return None;
    }

    let (major, _, _) = parse_version_triad(proc_version)?;
    Some(if major >= 5 { 2 } else { 1 })
}

/// Value of `NAME="..."` in an os-release file.
pub fn parse_os_release_name(os_release: &str) -> Option<String> {
    os_release.lines().find_map(|line| {
        let value = line.trim().strip_prefix("NAME=")?;
        let value = value.trim().trim_matches('"').trim_matches('\'');
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn pod_hostname_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)+$").expect("valid regex"))
}

/// Whether a hostname looks like a generated pod name (`web-7d9f8c-x2kq`).
pub fn looks_like_pod_hostname(hostname: &str) -> bool {
    pod_hostname_pattern().is_match(hostname)
}

/// Detects Docker, WSL and Kubernetes.
pub struct ContainerDetector {
    probes: Probes,
}

impl ContainerDetector {
    pub fn new(probes: Probes) -> Self {
        Self { probes }
    }

    fn file_contains(&self, path: &str, needles: &[&str]) -> bool {
        self.probes
            .fs
            .read_to_string(Path::new(path))
            .is_some_and(|content| needles.iter().any(|n| content.contains(n)))
    }

    pub fn detect_docker(&self) -> bool {
        let fs = &self.probes.fs;
        if let Some(marker) = DOCKER_MARKERS.iter().find(|m| fs.exists(Path::new(m))) {
            tracing::debug!(marker, "docker marker file found");
            return true;
        }

        let cgroup_needles = &["docker", "containerd"];
        if self.file_contains(SELF_CGROUP, cgroup_needles)
            || self.file_contains(INIT_CGROUP, cgroup_needles)
        {
            tracing::debug!("docker cgroup found");
            return true;
        }

        self.file_contains(SELF_MOUNTINFO, &["docker"])
    }

    /// WSL details when running under WSL, `None` otherwise.
    pub fn detect_wsl(&self) -> Option<WslInfo> {
        if OsType::from_platform(&self.probes.host.platform()) == OsType::Windows {
            return None;
        }

        let fs = &self.probes.fs;
        let distro_var = self.probes.var("WSL_DISTRO_NAME");
        let proc_version = fs.read_to_string(Path::new(PROC_VERSION));

        let detected = distro_var.is_some()
            || proc_version
                .as_deref()
                .is_some_and(|v| v.to_ascii_lowercase().contains("microsoft"))
            || WSL_INTEROP_PATHS.iter().any(|p| fs.exists(Path::new(p)))
            || self.probes.has_var("WSLENV")
            || self.probes.has_var("WSL_INTEROP");

        if !detected {
            return None;
        }

        let distro = distro_var.or_else(|| {
            fs.read_to_string(Path::new(OS_RELEASE))
                .as_deref()
                .and_then(parse_os_release_name)
        });
        let version = proc_version.as_deref().and_then(parse_wsl_version);
        tracing::debug!(?version, ?distro, "WSL detected");

        Some(WslInfo { version, distro })
    }

    pub fn detect_kubernetes(&self) -> bool {
        let fs = &self.probes.fs;
        if fs.exists(Path::new(K8S_SECRETS_DIR)) {
            return true;
        }
        if self.probes.has_var("KUBERNETES_SERVICE_HOST")
            || self.probes.has_var("KUBERNETES_PORT")
        {
            return true;
        }

        // A pod-like hostname alone is too weak a signal
        let hostname = self
            .probes
            .host
            .hostname()
            .or_else(|| self.probes.var("HOSTNAME"));
        hostname.is_some_and(|h| looks_like_pod_hostname(&h)) && fs.exists(Path::new(K8S_TOKEN))
    }
}

impl Detector for ContainerDetector {
    type Output = ContainerInfo;

    fn name(&self) -> &'static str {
        "container"
    }

    fn detect(&self) -> ContainerInfo {
        ContainerInfo::from_signals(
            self.detect_docker(),
            self.detect_wsl(),
            self.detect_kubernetes(),
        )
    }
}
