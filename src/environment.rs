//! Aggregate view over all built-in detectors.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::TimedCache;
use crate::config::Config;
use crate::detector::{CachedDetector, DetectorOptions};
use crate::detectors::{
    CiDetector, CiInfo, CloudDetector, CloudInfo, ContainerDetector, ContainerInfo,
    EnvironmentMode, ModeDetector, ModeInfo, OsDetector, OsInfo, PrivilegeDetector,
    PrivilegeInfo, RuntimeDetector, RuntimeInfo,
};
use crate::probe::Probes;

/// Everything known about the current environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub os: OsInfo,
    pub container: ContainerInfo,
    pub ci: CiInfo,
    pub cloud: CloudInfo,
    pub privileges: PrivilegeInfo,
    pub runtime: RuntimeInfo,
    pub mode: ModeInfo,
}

/// Facade over the seven built-in detectors.
///
/// The detectors share one [`TimedCache`]. Each boolean accessor runs (or
/// reuses the cached result of) its own detector only.
pub struct Environment {
    cache: Arc<TimedCache>,
    os: CachedDetector<OsDetector>,
    container: CachedDetector<ContainerDetector>,
    ci: CachedDetector<CiDetector>,
    cloud: CachedDetector<CloudDetector>,
    privileges: CachedDetector<PrivilegeDetector>,
    runtime: CachedDetector<RuntimeDetector>,
    mode: CachedDetector<ModeDetector>,
}

impl Environment {
    /// Facade over the real host, configured from `config`.
    pub fn new(config: &Config) -> Self {
        Self::with_probes(
            Probes::system(config.command_timeout()),
            Arc::new(TimedCache::new()),
            config.detector_options(),
            &config.mode.variable,
        )
    }

    pub fn with_probes(
        probes: Probes,
        cache: Arc<TimedCache>,
        options: DetectorOptions,
        mode_variable: &str,
    ) -> Self {
        Self {
            os: CachedDetector::new(
                OsDetector::new(probes.clone()),
                Arc::clone(&cache),
                options,
            ),
            container: CachedDetector::new(
                ContainerDetector::new(probes.clone()),
                Arc::clone(&cache),
                options,
            ),
            ci: CachedDetector::new(
                CiDetector::new(probes.clone()),
                Arc::clone(&cache),
                options,
            ),
            cloud: CachedDetector::new(
                CloudDetector::new(probes.clone()),
                Arc::clone(&cache),
                options,
            ),
            privileges: CachedDetector::new(
                PrivilegeDetector::new(probes.clone()),
                Arc::clone(&cache),
                options,
            ),
            runtime: CachedDetector::new(
                RuntimeDetector::new(probes.clone()),
                Arc::clone(&cache),
                options,
            ),
            mode: CachedDetector::new(
                ModeDetector::new(probes, mode_variable),
                Arc::clone(&cache),
                options,
            ),
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<TimedCache> {
        &self.cache
    }

    /// Run every detector in turn.
    pub fn snapshot(&self) -> EnvironmentInfo {
        EnvironmentInfo {
            os: self.os.detect_sync(),
            container: self.container.detect_sync(),
            ci: self.ci.detect_sync(),
            cloud: self.cloud.detect_sync(),
            privileges: self.privileges.detect_sync(),
            runtime: self.runtime.detect_sync(),
            mode: self.mode.detect_sync(),
        }
    }

    /// Await every detector concurrently.
    pub async fn snapshot_async(&self) -> EnvironmentInfo {
        let (os, container, ci, cloud, privileges, runtime, mode) = tokio::join!(
            self.os.detect_async(),
            self.container.detect_async(),
            self.ci.detect_async(),
            self.cloud.detect_async(),
            self.privileges.detect_async(),
            self.runtime.detect_async(),
            self.mode.detect_async(),
        );

        EnvironmentInfo {
            os,
            container,
            ci,
            cloud,
            privileges,
            runtime,
            mode,
        }
    }

    pub fn os(&self) -> &CachedDetector<OsDetector> {
        &self.os
    }

    pub fn container(&self) -> &CachedDetector<ContainerDetector> {
        &self.container
    }

    pub fn ci(&self) -> &CachedDetector<CiDetector> {
        &self.ci
    }

    pub fn cloud(&self) -> &CachedDetector<CloudDetector> {
        &self.cloud
    }

    pub fn privileges(&self) -> &CachedDetector<PrivilegeDetector> {
        &self.privileges
    }

    pub fn runtime(&self) -> &CachedDetector<RuntimeDetector> {
        &self.runtime
    }

    pub fn mode(&self) -> &CachedDetector<ModeDetector> {
        &self.mode
    }

    pub fn is_windows(&self) -> bool {
        self.os.detect_sync().is_windows
    }

    pub fn is_macos(&self) -> bool {
        self.os.detect_sync().is_macos
    }

    pub fn is_linux(&self) -> bool {
        self.os.detect_sync().is_linux
    }

    pub fn is_container(&self) -> bool {
        self.container.detect_sync().is_container
    }

    pub fn is_docker(&self) -> bool {
        self.container.detect_sync().is_docker
    }

    pub fn is_wsl(&self) -> bool {
        self.container.detect_sync().is_wsl
    }

    pub fn is_kubernetes(&self) -> bool {
        self.container.detect_sync().is_kubernetes
    }

    pub fn is_ci(&self) -> bool {
        self.ci.detect_sync().is_ci
    }

    pub fn is_cloud(&self) -> bool {
        self.cloud.detect_sync().is_cloud
    }

    pub fn is_serverless(&self) -> bool {
        self.cloud.detect_sync().is_serverless
    }

    pub fn is_elevated(&self) -> bool {
        self.privileges.detect_sync().is_elevated
    }

    pub fn is_development(&self) -> bool {
        self.mode.detect_sync().mode == EnvironmentMode::Development
    }

    pub fn is_production(&self) -> bool {
        self.mode.detect_sync().mode == EnvironmentMode::Production
    }

    /// One-line description such as `linux+docker+ci`.
    pub fn summary(&self) -> String {
        let mut parts = vec![self.os.detect_sync().os_type.to_string()];

        if let Some(container_type) = self.container.detect_sync().container_type {
            parts.push(container_type.to_string());
        }
        if self.is_ci() {
            parts.push("ci".to_string());
        }
        if self.is_cloud() {
            parts.push("cloud".to_string());
        }
        if self.is_elevated() {
            parts.push("elevated".to_string());
        }

        parts.join("+")
    }

    /// Drop every cached entry, including ones not owned by these detectors.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn enable_cache(&self) {
        self.cache.enable();
    }

    pub fn disable_cache(&self) {
        self.cache.disable();
    }

    /// Forget the cached result of each built-in detector.
    pub fn reset_all(&self) {
        self.os.reset();
        self.container.reset();
        self.ci.reset();
        self.cloud.reset();
        self.privileges.reset();
        self.runtime.reset();
        self.mode.reset();
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
