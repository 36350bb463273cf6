//! Core trait and cache decorator shared by every detector.

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::cache::TimedCache;

/// Boxed future handed out for deferred detection.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for environment detectors.
///
/// Implement this trait to add a new detection domain. The detector only
/// supplies the decision logic; caching, reset and sync/async dispatch come
/// from wrapping it in a [`CachedDetector`].
///
/// `detect` must be total: probe failures are folded into a conservative
/// default instead of being reported.
pub trait Detector: Send + Sync {
    type Output: Clone + Send + Sync + 'static;

    /// Stable identifier, used for the cache key and registry lookups.
    fn name(&self) -> &'static str;

    /// Run detection from scratch.
    fn detect(&self) -> Self::Output;

    /// Asynchronous detection. Defaults to the synchronous routine.
    fn detect_async(&self) -> impl Future<Output = Self::Output> + Send {
        async move { self.detect() }
    }
}

/// Per-detector settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorOptions {
    /// Cache results between calls
    pub cache: bool,
    /// Lifetime of a cached result
    pub ttl: Duration,
    /// Make [`CachedDetector::detect`] hand out a deferred result
    pub asynchronous: bool,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            cache: true,
            ttl: Duration::from_secs(60),
            asynchronous: false,
        }
    }
}

impl DetectorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_asynchronous(mut self, asynchronous: bool) -> Self {
        self.asynchronous = asynchronous;
        self
    }
}

/// Result of [`CachedDetector::detect`]: available now or after awaiting.
///
/// Both variants can be `.await`ed.
pub enum Detection<'a, T> {
    Ready(T),
    Deferred(BoxFuture<'a, T>),
}

impl<'a, T> Detection<'a, T> {
    /// The value, if it did not need awaiting.
    pub fn ready(self) -> Option<T> {
        match self {
            Detection::Ready(value) => Some(value),
            Detection::Deferred(_) => None,
        }
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Detection::Deferred(_))
    }
}

impl<'a, T: Send + 'a> IntoFuture for Detection<'a, T> {
    type Output = T;
    type IntoFuture = BoxFuture<'a, T>;

    fn into_future(self) -> Self::IntoFuture {
        match self {
            Detection::Ready(value) => Box::pin(std::future::ready(value)),
            Detection::Deferred(future) => future,
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Detection<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Detection::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Detection::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// Wraps a [`Detector`] with the cache-or-compute protocol.
pub struct CachedDetector<D: Detector> {
    detector: D,
    cache: Arc<TimedCache>,
    options: DetectorOptions,
}

impl<D: Detector> CachedDetector<D> {
    pub fn new(detector: D, cache: Arc<TimedCache>, options: DetectorOptions) -> Self {
        Self {
            detector,
            cache,
            options,
        }
    }

    pub fn name(&self) -> &'static str {
        self.detector.name()
    }

    pub fn cache_key(&self) -> String {
        format!("detector:{}", self.detector.name())
    }

    pub fn options(&self) -> DetectorOptions {
        self.options
    }

    pub fn inner(&self) -> &D {
        &self.detector
    }

    /// Detect using the mode selected by [`DetectorOptions::asynchronous`].
    pub fn detect(&self) -> Detection<'_, D::Output> {
        if self.options.asynchronous {
            Detection::Deferred(Box::pin(self.detect_async()))
        } else {
            Detection::Ready(self.detect_sync())
        }
    }

    pub fn detect_sync(&self) -> D::Output {
        let key = self.cache_key();
        if let Some(hit) = self.cached(&key) {
            return hit;
        }

        let value = self.detector.detect();
        self.store(key, &value);
        value
    }

    pub async fn detect_async(&self) -> D::Output {
        let key = self.cache_key();
        if let Some(hit) = self.cached(&key) {
            return hit;
        }

        let value = self.detector.detect_async().await;
        self.store(key, &value);
        value
    }

    /// Forget the cached result so the next call recomputes.
    pub fn reset(&self) {
        self.cache.delete(&self.cache_key());
    }

    fn cached(&self, key: &str) -> Option<D::Output> {
        if !self.options.cache {
            return None;
        }
        let hit = self.cache.get::<D::Output>(key);
        tracing::trace!(key, hit = hit.is_some(), "detector cache lookup");
        hit
    }

    fn store(&self, key: String, value: &D::Output) {
        if self.options.cache {
            self.cache.set(key, value.clone(), self.options.ttl);
        }
    }
}

/// Object-safe view of a detector, for heterogeneous collections such as the
/// [`DetectorRegistry`](crate::registry::DetectorRegistry).
pub trait DynamicDetector: Send + Sync {
    fn name(&self) -> &str;

    /// Detection result rendered as JSON.
    fn detect_value(&self) -> serde_json::Value;

    fn reset(&self);
}

impl<D> DynamicDetector for CachedDetector<D>
where
    D: Detector,
    D::Output: Serialize,
{
    fn name(&self) -> &str {
        self.detector.name()
    }

    fn detect_value(&self) -> serde_json::Value {
        serde_json::to_value(self.detect_sync()).unwrap_or_default()
    }

    fn reset(&self) {
        CachedDetector::reset(self);
    }
}
