//! Plugin lifecycle: installing bundles of detectors into a registry.
//!
//! A [`Plugin`] contributes detectors plus optional install/uninstall hooks.
//! [`PluginHost`] runs the hooks, keeps the registry in sync and broadcasts
//! [`PluginEvent`]s to subscribers.
//!
//! Hooks run before the registry is touched, so a failing install leaves
//! nothing behind and a failing uninstall leaves the plugin fully in place.
//! Each detector name belongs to at most one installed plugin.

use std::collections::BTreeMap;
use std::sync::{mpsc, Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::detector::DynamicDetector;
use crate::error::PluginError;
use crate::registry::DetectorRegistry;

/// Outcome of a plugin lifecycle hook.
pub type HookResult = std::result::Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// A bundle of detectors with optional lifecycle hooks.
pub trait Plugin: Send + Sync {
    /// Unique plugin name.
    fn name(&self) -> &str;

    /// Detectors registered while the plugin is installed.
    fn detectors(&self) -> Vec<Arc<dyn DynamicDetector>>;

    /// Called before the detectors are registered.
    fn install(&self) -> HookResult {
        Ok(())
    }

    /// Called before the detectors are unregistered.
    fn uninstall(&self) -> HookResult {
        Ok(())
    }
}

/// Lifecycle stage a plugin error happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginPhase {
    Install,
    Uninstall,
}

/// Lifecycle notifications emitted by [`PluginHost`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PluginEvent {
    Installed {
        plugin: String,
        detectors: Vec<String>,
    },
    Removed {
        plugin: String,
    },
    Error {
        plugin: String,
        phase: PluginPhase,
        message: String,
    },
}

/// An installed plugin and the detector names it registered.
struct Installed {
    plugin: Arc<dyn Plugin>,
    detectors: Vec<String>,
}

/// Installs and removes plugins against a shared [`DetectorRegistry`].
///
/// The plugin table is never locked while a hook runs, so hooks may call
/// back into the host.
pub struct PluginHost {
    registry: Arc<DetectorRegistry>,
    plugins: Mutex<BTreeMap<String, Installed>>,
    subscribers: Mutex<Vec<mpsc::Sender<PluginEvent>>>,
}

impl PluginHost {
    pub fn new(registry: Arc<DetectorRegistry>) -> Self {
        Self {
            registry,
            plugins: Mutex::new(BTreeMap::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn registry(&self) -> &Arc<DetectorRegistry> {
        &self.registry
    }

    /// Receive every lifecycle event emitted from now on.
    pub fn subscribe(&self) -> mpsc::Receiver<PluginEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        rx
    }

    pub fn install(&self, plugin: Arc<dyn Plugin>) -> Result<(), PluginError> {
        let name = plugin.name().to_string();
        let detectors = plugin.detectors();
        let names: Vec<String> = detectors.iter().map(|d| d.name().to_string()).collect();

        Self::check_installable(&self.plugins(), &name, &names)?;

        if let Err(e) = plugin.install() {
            warn!(plugin = %name, error = %e, "plugin install hook failed");
            self.emit(PluginEvent::Error {
                plugin: name.clone(),
                phase: PluginPhase::Install,
                message: e.to_string(),
            });
            return Err(PluginError::InstallFailed {
                plugin: name,
                reason: e.to_string(),
            });
        }

        let mut plugins = self.plugins();
        // The hook ran unlocked; another install may have landed meanwhile.
        Self::check_installable(&plugins, &name, &names)?;
        for detector in detectors {
            debug!(plugin = %name, detector = detector.name(), "registering detector");
            self.registry.register(detector);
        }
        plugins.insert(
            name.clone(),
            Installed {
                plugin,
                detectors: names.clone(),
            },
        );
        drop(plugins);

        info!(plugin = %name, "plugin installed");
        self.emit(PluginEvent::Installed {
            plugin: name,
            detectors: names,
        });
        Ok(())
    }

    pub fn uninstall(&self, name: &str) -> Result<(), PluginError> {
        let plugin = self
            .plugins()
            .get(name)
            .map(|installed| Arc::clone(&installed.plugin))
            .ok_or_else(|| PluginError::NotInstalled(name.to_string()))?;

        if let Err(e) = plugin.uninstall() {
            warn!(plugin = %name, error = %e, "plugin uninstall hook failed");
            self.emit(PluginEvent::Error {
                plugin: name.to_string(),
                phase: PluginPhase::Uninstall,
                message: e.to_string(),
            });
            return Err(PluginError::UninstallFailed {
                plugin: name.to_string(),
                reason: e.to_string(),
            });
        }

        let removed = self
            .plugins()
            .remove(name)
            .ok_or_else(|| PluginError::NotInstalled(name.to_string()))?;
        for detector in &removed.detectors {
            self.registry.unregister(detector);
        }

        info!(plugin = %name, "plugin removed");
        self.emit(PluginEvent::Removed {
            plugin: name.to_string(),
        });
        Ok(())
    }

    /// Names of installed plugins, sorted.
    pub fn installed(&self) -> Vec<String> {
        self.plugins().keys().cloned().collect()
    }

    fn plugins(&self) -> MutexGuard<'_, BTreeMap<String, Installed>> {
        self.plugins.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reject a plugin whose name or detector names are already taken by
    /// an installed plugin.
    fn check_installable(
        plugins: &BTreeMap<String, Installed>,
        name: &str,
        detectors: &[String],
    ) -> Result<(), PluginError> {
        if plugins.contains_key(name) {
            return Err(PluginError::AlreadyInstalled(name.to_string()));
        }
        for (owner, installed) in plugins {
            if let Some(detector) = detectors.iter().find(|d| installed.detectors.contains(d)) {
                return Err(PluginError::DetectorConflict {
                    plugin: name.to_string(),
                    detector: detector.clone(),
                    owner: owner.clone(),
                });
            }
        }
        Ok(())
    }

    fn emit(&self, event: PluginEvent) {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl std::fmt::Debug for PluginHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHost")
            .field("installed", &self.installed())
            .field("registry", &self.registry)
            .finish()
    }
}
