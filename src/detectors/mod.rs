//! Built-in detectors, one per detection domain.

mod ci;
mod cloud;
mod container;
mod mode;
mod os;
mod privilege;
mod runtime;

pub use ci::{CiDetector, CiInfo, CiProvider};
pub use cloud::{CloudDetector, CloudInfo, CloudProvider};
pub use container::{
    looks_like_pod_hostname, parse_os_release_name, parse_wsl_version, ContainerDetector,
    ContainerInfo, ContainerType, WslInfo,
};
pub use mode::{EnvironmentMode, ModeDetector, ModeInfo, DEFAULT_MODE_VARIABLE};
pub use os::{OsDetector, OsInfo, OsType};
pub use privilege::{PrivilegeDetector, PrivilegeInfo};
pub use runtime::{RuntimeDetector, RuntimeInfo};

use std::sync::OnceLock;

use regex::Regex;

/// First `major.minor.patch` triad found in `text`.
pub fn parse_version_triad(text: &str) -> Option<(u32, u32, u32)> {
    static TRIAD: OnceLock<Regex> = OnceLock::new();
    let re = TRIAD.get_or_init(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("valid regex"));

    let caps = re.captures(text)?;
    let part = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
    Some((part(1)?, part(2)?, part(3)?))
}
