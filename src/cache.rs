//! Time-bounded cache shared by all detectors.
//!
//! Entries expire lazily: staleness is checked when a key is read, and a
//! stale entry is dropped at that point. There is no background eviction.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Source of the current time for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Used to test expiry.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|e| e.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(|e| e.into_inner());
        self.origin + offset
    }
}

struct CacheEntry {
    value: Arc<dyn Any + Send + Sync>,
    created: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) > self.ttl
    }
}

/// Key/value store with per-entry expiry and a global on/off switch.
///
/// Disabling the cache is destructive: every entry is purged, and until
/// [`TimedCache::enable`] is called reads miss and writes are dropped.
pub struct TimedCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    enabled: AtomicBool,
    clock: Arc<dyn Clock>,
}

impl TimedCache {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            enabled: AtomicBool::new(true),
            clock,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Look up a live entry, dropping it if it has expired.
    fn live_entry(&self, key: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        if !self.is_enabled() {
            return None;
        }

        let now = self.clock.now();
        let mut entries = self.entries();
        let expired = entries.get(key)?.is_expired(now);
        if expired {
            tracing::trace!(key, "cache entry expired");
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| Arc::clone(&entry.value))
    }

    /// Get a cached value.
    ///
    /// Returns `None` when the cache is disabled, the key is missing or
    /// stale, or the stored value is not a `T`.
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        self.live_entry(key)?.downcast_ref::<T>().cloned()
    }

    /// Store a value. No-op while the cache is disabled.
    pub fn set<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T, ttl: Duration) {
        if !self.is_enabled() {
            return;
        }

        let entry = CacheEntry {
            value: Arc::new(value),
            created: self.clock.now(),
            ttl,
        };
        self.entries().insert(key.into(), entry);
    }

    pub fn has(&self, key: &str) -> bool {
        self.live_entry(key).is_some()
    }

    /// Remove an entry regardless of whether the cache is enabled.
    pub fn delete(&self, key: &str) -> bool {
        self.entries().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    /// Turn caching off and purge everything.
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
        self.clear();
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Number of stored entries, including stale ones not yet read.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for TimedCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TimedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimedCache")
            .field("enabled", &self.is_enabled())
            .field("keys", &self.keys())
            .finish()
    }
}
