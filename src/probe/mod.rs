//! Signal sources consulted by the detectors.
//!
//! Detectors never touch the process environment, the filesystem, child
//! processes or OS APIs directly. They go through the traits here, which
//! lets tests swap in the stubs from [`stub`].

mod command;
mod env;
mod fs;
mod host;
pub mod stub;

pub use command::{CommandRunner, SystemCommandRunner};
pub use env::{is_truthy, EnvSource, SystemEnv};
pub use fs::{FsProbe, SystemFs};
pub use host::{HostInfo, KernelInfo, SystemHost};

use std::sync::Arc;
use std::time::Duration;

/// Bundle of signal sources handed to every detector.
#[derive(Clone)]
pub struct Probes {
    pub env: Arc<dyn EnvSource>,
    pub fs: Arc<dyn FsProbe>,
    pub commands: Arc<dyn CommandRunner>,
    pub host: Arc<dyn HostInfo>,
}

impl Probes {
    /// Probes backed by the real process environment and OS.
    pub fn system(command_timeout: Duration) -> Self {
        Self {
            env: Arc::new(SystemEnv),
            fs: Arc::new(SystemFs),
            commands: Arc::new(SystemCommandRunner::new(command_timeout)),
            host: Arc::new(SystemHost),
        }
    }

    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    pub fn with_fs(mut self, fs: impl FsProbe + 'static) -> Self {
        self.fs = Arc::new(fs);
        self
    }

    pub fn with_commands(mut self, commands: impl CommandRunner + 'static) -> Self {
        self.commands = Arc::new(commands);
        self
    }

    pub fn with_host(mut self, host: impl HostInfo + 'static) -> Self {
        self.host = Arc::new(host);
        self
    }

    /// Shorthand for reading an environment variable.
    pub fn var(&self, key: &str) -> Option<String> {
        self.env.var(key)
    }

    pub fn has_var(&self, key: &str) -> bool {
        self.env.var(key).is_some()
    }

    /// First set variable out of `keys`, in order.
    pub fn first_var(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.env.var(key))
    }
}

impl std::fmt::Debug for Probes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Probes")
            .field("platform", &self.host.platform())
            .finish_non_exhaustive()
    }
}
