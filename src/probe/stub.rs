//! In-memory signal sources for deterministic detection.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use super::{CommandRunner, EnvSource, FsProbe, HostInfo, KernelInfo, Probes, SystemFs};

/// Probes where nothing fires: empty environment, empty filesystem under
/// `root`, no commands, unprivileged Linux host.
///
/// Start from here and override single sources with the `Probes::with_*`
/// builders.
pub fn isolated(root: impl Into<PathBuf>) -> Probes {
    Probes {
        env: Arc::new(MapEnv::new()),
        fs: Arc::new(RootedFs::new(root)),
        commands: Arc::new(StubCommands::new()),
        host: Arc::new(StubHost::linux()),
    }
}

/// Environment backed by a map. Nothing from the real process leaks in.
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_string(), value.to_string());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Filesystem re-rooted under a directory: `/proc/version` resolves to
/// `<root>/proc/version`. Pair it with a `tempfile::TempDir` in tests.
#[derive(Debug, Clone)]
pub struct RootedFs {
    root: PathBuf,
}

impl RootedFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of `path` inside the root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        let relative: PathBuf = path
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        self.root.join(relative)
    }

    /// Create `path` (and its parents) inside the root with `content`.
    pub fn write(&self, path: impl AsRef<Path>, content: &str) -> io::Result<()> {
        let target = self.resolve(path.as_ref());
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(target, content)
    }

    /// Create directory `path` inside the root.
    pub fn mkdir(&self, path: impl AsRef<Path>) -> io::Result<()> {
        std::fs::create_dir_all(self.resolve(path.as_ref()))
    }
}

impl FsProbe for RootedFs {
    fn exists(&self, path: &Path) -> bool {
        SystemFs.exists(&self.resolve(path))
    }

    fn read_to_string(&self, path: &Path) -> Option<String> {
        SystemFs.read_to_string(&self.resolve(path))
    }

    fn can_list_dir(&self, path: &Path) -> bool {
        SystemFs.can_list_dir(&self.resolve(path))
    }
}

/// Canned command output keyed by the full command line.
///
/// Commands without a registered response behave like a missing binary.
#[derive(Debug, Default, Clone)]
pub struct StubCommands {
    responses: HashMap<String, String>,
}

impl StubCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register stdout for `command_line`, e.g. `"whoami /groups"`.
    pub fn with(mut self, command_line: &str, stdout: &str) -> Self {
        self.responses
            .insert(command_line.to_string(), stdout.to_string());
        self
    }
}

impl CommandRunner for StubCommands {
    fn run(&self, program: &str, args: &[&str]) -> Option<String> {
        let mut line = program.to_string();
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        self.responses.get(&line).cloned()
    }
}

/// Fixed host facts.
#[derive(Debug, Clone)]
pub struct StubHost {
    pub platform: String,
    pub arch: String,
    /// `None` makes [`HostInfo::kernel`] fail.
    pub kernel: Option<KernelInfo>,
    pub hostname: Option<String>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub username: Option<String>,
    pub runtime_version: String,
}

impl StubHost {
    /// Unprivileged user on a Linux host.
    pub fn linux() -> Self {
        Self {
            platform: "linux".to_string(),
            arch: "x86_64".to_string(),
            kernel: Some(KernelInfo {
                release: "6.5.0-14-generic".to_string(),
                version: "#14-Ubuntu SMP PREEMPT_DYNAMIC".to_string(),
            }),
            hostname: Some("workstation".to_string()),
            uid: Some(1000),
            gid: Some(1000),
            username: Some("dev".to_string()),
            runtime_version: "rustc 1.80.1 (3f5fd8dd4 2024-08-06)".to_string(),
        }
    }

    pub fn macos() -> Self {
        Self {
            platform: "macos".to_string(),
            arch: "aarch64".to_string(),
            kernel: Some(KernelInfo {
                release: "23.4.0".to_string(),
                version: "Darwin Kernel Version 23.4.0".to_string(),
            }),
            uid: Some(501),
            gid: Some(20),
            ..Self::linux()
        }
    }

    pub fn windows() -> Self {
        Self {
            platform: "windows".to_string(),
            kernel: Some(KernelInfo {
                release: "unknown".to_string(),
                version: "Windows_NT".to_string(),
            }),
            uid: None,
            gid: None,
            ..Self::linux()
        }
    }

    pub fn with_platform(mut self, platform: &str) -> Self {
        self.platform = platform.to_string();
        self
    }

    pub fn with_uid(mut self, uid: u32) -> Self {
        self.uid = Some(uid);
        self
    }

    pub fn with_hostname(mut self, hostname: &str) -> Self {
        self.hostname = Some(hostname.to_string());
        self
    }

    pub fn without_kernel(mut self) -> Self {
        self.kernel = None;
        self
    }
}

impl HostInfo for StubHost {
    fn platform(&self) -> String {
        self.platform.clone()
    }

    fn arch(&self) -> String {
        self.arch.clone()
    }

    fn kernel(&self) -> io::Result<KernelInfo> {
        self.kernel
            .clone()
            .ok_or_else(|| io::Error::other("uname unavailable"))
    }

    fn hostname(&self) -> Option<String> {
        self.hostname.clone()
    }

    fn uid(&self) -> Option<u32> {
        self.uid
    }

    fn gid(&self) -> Option<u32> {
        self.gid
    }

    fn username(&self) -> Option<String> {
        self.username.clone()
    }

    fn runtime_version(&self) -> String {
        self.runtime_version.clone()
    }
}
