//! Named lookup table for dynamically registered detectors.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::detector::DynamicDetector;

/// Registry of detectors keyed by name.
///
/// Registration goes through `&self`, so one registry can be shared between
/// a [`PluginHost`](crate::plugin::PluginHost) and its callers.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use envscope::cache::TimedCache;
/// use envscope::detector::{CachedDetector, DetectorOptions};
/// use envscope::detectors::OsDetector;
/// use envscope::probe::Probes;
/// use envscope::registry::DetectorRegistry;
///
/// let registry = DetectorRegistry::new();
/// let os = CachedDetector::new(
///     OsDetector::new(Probes::system(Duration::from_secs(5))),
///     Arc::new(TimedCache::new()),
///     DetectorOptions::default(),
/// );
/// registry.register(Arc::new(os));
/// assert_eq!(registry.names(), vec!["os".to_string()]);
/// ```
#[derive(Default)]
pub struct DetectorRegistry {
    detectors: RwLock<BTreeMap<String, Arc<dyn DynamicDetector>>>,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a detector, replacing any existing one with the same name.
    pub fn register(&self, detector: Arc<dyn DynamicDetector>) {
        let name = detector.name().to_string();
        let previous = self.write().insert(name.clone(), detector);
        if previous.is_some() {
            tracing::debug!(detector = %name, "replaced registered detector");
        }
    }

    /// Remove a detector by name. Returns whether it was registered.
    pub fn unregister(&self, name: &str) -> bool {
        self.write().remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DynamicDetector>> {
        self.read().get(name).cloned()
    }

    /// All registered detectors, ordered by name.
    pub fn all(&self) -> Vec<Arc<dyn DynamicDetector>> {
        self.read().values().cloned().collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Arc<dyn DynamicDetector>>> {
        self.detectors.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Arc<dyn DynamicDetector>>> {
        self.detectors.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorRegistry")
            .field("names", &self.names())
            .finish()
    }
}
