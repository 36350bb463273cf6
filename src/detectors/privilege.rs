//! Privilege detector.
//!
//! Root is read from the process uid. Administrator rights are probed with a
//! platform-specific ladder of checks; the first positive one wins.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::detector::Detector;
use crate::detectors::os::OsType;
use crate::probe::Probes;

const ADMIN_GROUPS: &[&str] = &["admin", "sudo", "wheel", "root"];
const ADMINISTRATORS_SID: &str = "s-1-5-32-544";
const PROTECTED_CONFIG_DIR: &str = r"C:\Windows\System32\config";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivilegeInfo {
    pub is_elevated: bool,
    pub is_root: bool,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

pub struct PrivilegeDetector {
    probes: Probes,
}

impl PrivilegeDetector {
    pub fn new(probes: Probes) -> Self {
        Self { probes }
    }

    fn windows_admin(&self) -> bool {
        let commands = &self.probes.commands;

        if commands.run("net", &["session"]).is_some() {
            tracing::debug!("net session succeeded");
            return true;
        }

        if let Some(groups) = commands.run("whoami", &["/groups"]) {
            let groups = groups.to_lowercase();
            if groups.contains(ADMINISTRATORS_SID) || groups.contains("administrators") {
                tracing::debug!("administrators group membership found");
                return true;
            }
        }

        self.probes.fs.can_list_dir(Path::new(PROTECTED_CONFIG_DIR))
    }

    fn unix_admin(&self, is_root: bool) -> bool {
        if is_root {
            return true;
        }

        match self.probes.commands.run("groups", &[]) {
            Some(groups) => {
                let groups = groups.to_lowercase();
                ADMIN_GROUPS.iter().any(|group| groups.contains(group))
            }
            None => {
                tracing::debug!("groups unavailable, trying passwordless sudo");
                self.probes.commands.run("sudo", &["-n", "true"]).is_some()
            }
        }
    }
}

impl Detector for PrivilegeDetector {
    type Output = PrivilegeInfo;

    fn name(&self) -> &'static str {
        "privileges"
    }

    fn detect(&self) -> PrivilegeInfo {
        let host = &self.probes.host;
        let uid = host.uid();
        let is_root = uid == Some(0);

        let is_admin = match OsType::from_platform(&host.platform()) {
            OsType::Windows => self.windows_admin(),
            OsType::Macos | OsType::Linux => self.unix_admin(is_root),
            OsType::Unknown => false,
        };

        PrivilegeInfo {
            is_elevated: is_root || is_admin,
            is_root,
            is_admin,
            uid,
            gid: host.gid(),
            username: host.username(),
        }
    }
}
