use std::io;

/// Kernel identification as reported by `uname`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelInfo {
    /// Kernel release, e.g. `6.5.0-14-generic`
    pub release: String,
    /// Kernel build version string
    pub version: String,
}

/// OS-level facts about the host and the current process.
pub trait HostInfo: Send + Sync {
    /// Platform identifier (`linux`, `macos`, `windows`, ...).
    fn platform(&self) -> String;

    /// CPU architecture (`x86_64`, `aarch64`, ...).
    fn arch(&self) -> String;

    fn kernel(&self) -> io::Result<KernelInfo>;

    fn hostname(&self) -> Option<String>;

    fn uid(&self) -> Option<u32>;

    fn gid(&self) -> Option<u32>;

    fn username(&self) -> Option<String>;

    /// Version string of the toolchain this binary was built with.
    fn runtime_version(&self) -> String;
}

/// The machine this process runs on.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

impl HostInfo for SystemHost {
    fn platform(&self) -> String {
        std::env::consts::OS.to_string()
    }

    fn arch(&self) -> String {
        std::env::consts::ARCH.to_string()
    }

    #[cfg(unix)]
    fn kernel(&self) -> io::Result<KernelInfo> {
        let uts = nix::sys::utsname::uname()?;
        Ok(KernelInfo {
            release: uts.release().to_string_lossy().into_owned(),
            version: uts.version().to_string_lossy().into_owned(),
        })
    }

    #[cfg(not(unix))]
    fn kernel(&self) -> io::Result<KernelInfo> {
        Ok(KernelInfo {
            release: "unknown".to_string(),
            version: std::env::var("OS").unwrap_or_else(|_| "unknown".to_string()),
        })
    }

    #[cfg(unix)]
    fn hostname(&self) -> Option<String> {
        nix::unistd::gethostname()
            .ok()
            .map(|h| h.to_string_lossy().into_owned())
    }

    #[cfg(not(unix))]
    fn hostname(&self) -> Option<String> {
        std::env::var("COMPUTERNAME").ok()
    }

    #[cfg(unix)]
    fn uid(&self) -> Option<u32> {
        Some(nix::unistd::getuid().as_raw())
    }

    #[cfg(not(unix))]
    fn uid(&self) -> Option<u32> {
        None
    }

    #[cfg(unix)]
    fn gid(&self) -> Option<u32> {
        Some(nix::unistd::getgid().as_raw())
    }

    #[cfg(not(unix))]
    fn gid(&self) -> Option<u32> {
        None
    }

    #[cfg(unix)]
    fn username(&self) -> Option<String> {
        nix::unistd::User::from_uid(nix::unistd::getuid())
            .ok()
            .flatten()
            .map(|user| user.name)
            .or_else(|| std::env::var("USER").ok())
    }

    #[cfg(not(unix))]
    fn username(&self) -> Option<String> {
        std::env::var("USERNAME")
            .or_else(|_| std::env::var("USER"))
            .ok()
    }

    fn runtime_version(&self) -> String {
        env!("ENVSCOPE_RUSTC_VERSION").to_string()
    }
}
