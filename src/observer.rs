//! Diagnostic observers for container traceability.
//!
//! Observers receive synchronous callbacks for every resolution and invocation
//! a container performs. They are attached through
//! [`ContainerBuilder::observer`](crate::ContainerBuilder::observer) and are
//! inherited by child containers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::key::Key;

/// Observer trait for container resolution events.
///
/// Calls are made on the resolving thread while the resolution is in
/// progress. Keep implementations lightweight.
///
/// # Examples
///
/// ```
/// use ferrous_ioc::{Constant, Container, DiError, DiObserver, Key};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder {
///     seen: Mutex<Vec<&'static str>>,
/// }
///
/// impl DiObserver for Recorder {
///     fn resolving(&self, key: &Key) {
///         self.seen.lock().unwrap().push(key.display_name());
///     }
///
///     fn resolved(&self, _key: &Key, _duration: Duration) {}
///
///     fn resolution_failed(&self, _key: &Key, _error: &DiError) {}
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let container = Container::builder().observer(recorder.clone()).build();
/// container.register(Constant::new(7u8)).unwrap();
/// container.invoke(|_n: Arc<u8>| {}).unwrap();
///
/// assert_eq!(*recorder.seen.lock().unwrap(), vec!["u8"]);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a key is looked up.
    fn resolving(&self, key: &Key);

    /// Called after a key resolved, with the time spent including dependencies.
    fn resolved(&self, key: &Key, duration: Duration);

    /// Called when a key could not be resolved.
    fn resolution_failed(&self, key: &Key, error: &DiError);

    /// Called after an invocation target returned.
    ///
    /// `parameters` is the number of resolved arguments. The default does nothing.
    fn invoked(&self, parameters: usize, duration: Duration, succeeded: bool) {
        let _ = (parameters, duration, succeeded);
    }
}

/// Collection of observers attached to a container.
#[derive(Clone, Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self { observers: Vec::new() }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    #[inline]
    pub(crate) fn resolving(&self, key: &Key) {
        for observer in &self.observers {
            observer.resolving(key);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, key: &Key, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(key, duration);
        }
    }

    #[inline]
    pub(crate) fn resolution_failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.resolution_failed(key, error);
        }
    }

    #[inline]
    pub(crate) fn invoked(&self, parameters: usize, duration: Duration, succeeded: bool) {
        for observer in &self.observers {
            observer.invoked(parameters, duration, succeeded);
        }
    }
}

/// Built-in observer that forwards events to `tracing`.
///
/// Resolutions are emitted at `TRACE`, failures at `WARN`, invocations at
/// `DEBUG`, all under the `ferrous_ioc::observer` target.
///
/// ```
/// use ferrous_ioc::{Container, LoggingObserver};
/// use std::sync::Arc;
///
/// let container = Container::builder()
///     .name("app")
///     .observer(Arc::new(LoggingObserver::with_prefix("app")))
///     .build();
/// assert_eq!(container.name(), "app");
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self {
            prefix: "ferrous-ioc".to_string(),
        }
    }

    /// Tags every event with `prefix`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, key: &Key) {
        tracing::trace!(target: "ferrous_ioc::observer", prefix = %self.prefix, key = %key, "resolving");
    }

    fn resolved(&self, key: &Key, duration: Duration) {
        tracing::trace!(
            target: "ferrous_ioc::observer",
            prefix = %self.prefix,
            key = %key,
            elapsed_us = duration.as_micros() as u64,
            "resolved"
        );
    }

    fn resolution_failed(&self, key: &Key, error: &DiError) {
        tracing::warn!(
            target: "ferrous_ioc::observer",
            prefix = %self.prefix,
            key = %key,
            error = %error,
            "resolution failed"
        );
    }

    fn invoked(&self, parameters: usize, duration: Duration, succeeded: bool) {
        tracing::debug!(
            target: "ferrous_ioc::observer",
            prefix = %self.prefix,
            parameters,
            succeeded,
            elapsed_us = duration.as_micros() as u64,
            "invoked"
        );
    }
}

/// Observer that counts resolutions, failures and invocations.
pub struct MetricsObserver {
    pub resolution_count: AtomicU64,
    pub total_resolution_time: AtomicU64,
    pub failure_count: AtomicU64,
    pub invocation_count: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self {
            resolution_count: AtomicU64::new(0),
            total_resolution_time: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            invocation_count: AtomicU64::new(0),
        }
    }

    /// Gets the total number of successful resolutions observed.
    pub fn resolution_count(&self) -> u64 {
        self.resolution_count.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    pub fn invocation_count(&self) -> u64 {
        self.invocation_count.load(Ordering::Relaxed)
    }

    /// Gets the average resolution time.
    pub fn average_resolution_time(&self) -> Option<Duration> {
        let count = self.resolution_count();
        if count == 0 {
            return None;
        }
        let total_ns = self.total_resolution_time.load(Ordering::Relaxed);
        Some(Duration::from_nanos(total_ns / count))
    }

    pub fn total_resolution_time(&self) -> Duration {
        Duration::from_nanos(self.total_resolution_time.load(Ordering::Relaxed))
    }

    /// Resets all metrics.
    pub fn reset(&self) {
        self.resolution_count.store(0, Ordering::Relaxed);
        self.total_resolution_time.store(0, Ordering::Relaxed);
        self.failure_count.store(0, Ordering::Relaxed);
        self.invocation_count.store(0, Ordering::Relaxed);
    }
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for MetricsObserver {
    fn resolving(&self, _key: &Key) {}

    fn resolved(&self, _key: &Key, duration: Duration) {
        self.resolution_count.fetch_add(1, Ordering::Relaxed);
        self.total_resolution_time
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    fn resolution_failed(&self, _key: &Key, _error: &DiError) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    fn invoked(&self, _parameters: usize, _duration: Duration, _succeeded: bool) {
        self.invocation_count.fetch_add(1, Ordering::Relaxed);
    }
}
