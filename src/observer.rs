//! Lifecycle observers for logging and diagnostics.
//!
//! The registry reports every construction, failure, revival, teardown and
//! dependency cycle to its observers. The stock [`LoggingObserver`] forwards
//! these events to the `log` facade; tests and tools can register their own.

use std::sync::Arc;
use std::time::Duration;

use crate::error::SingletonError;
use crate::key::Key;
use crate::state::InitState;

/// Observer trait for singleton lifecycle events.
///
/// All methods default to no-ops. Observer calls are made synchronously
/// from the registry, often on the main thread while construction is in
/// flight; keep implementations cheap and never panic from them.
///
/// # Examples
///
/// ```
/// use ferrous_lifecycle::{Key, RegistryObserver, SingletonRegistry};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct StartupTimer {
///     timings: Mutex<Vec<(&'static str, Duration)>>,
/// }
///
/// impl RegistryObserver for StartupTimer {
///     fn constructed(&self, key: &Key, duration: Duration) {
///         self.timings.lock().unwrap().push((key.display_name(), duration));
///     }
/// }
///
/// let timer = Arc::new(StartupTimer::default());
/// let registry = SingletonRegistry::builder().observer(timer.clone()).build();
/// assert_eq!(registry.live_count(), 0);
/// ```
pub trait RegistryObserver: Send + Sync {
    /// The slot of `key` moved from `from` to `to`.
    ///
    /// Called while the slot is locked: must not call back into the registry.
    fn state_changed(&self, _key: &Key, _from: InitState, _to: InitState) {}

    /// Construction of `key` is starting on the main thread.
    fn constructing(&self, _key: &Key) {}

    /// `key` reached `Initialized`; `duration` covers constructor and hook.
    fn constructed(&self, _key: &Key, _duration: Duration) {}

    /// A deleted implicit singleton is being constructed again.
    fn revived(&self, _key: &Key) {}

    /// A request for `key` failed.
    fn failed(&self, _key: &Key, _error: &SingletonError) {}

    /// The teardown hook of `key` completed.
    fn torn_down(&self, _key: &Key) {}

    /// The teardown hook of `key` failed; the sweep carries on.
    fn teardown_failed(&self, _key: &Key, _message: &str) {}

    /// `key` was destroyed and removed from the registry.
    fn deleted(&self, _key: &Key) {}

    /// A dependency cycle had to be broken to order teardown.
    ///
    /// `cycle` lists type names in dependency direction and repeats the
    /// first name at the end.
    fn dependency_cycle(&self, _cycle: &[&'static str]) {}

    /// Any other warning.
    fn warning(&self, _message: &str) {}
}

/// Container for registered observers.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn RegistryObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self { observers: Vec::new() }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn RegistryObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub(crate) fn state_changed(&self, key: &Key, from: InitState, to: InitState) {
        for observer in &self.observers {
            observer.state_changed(key, from, to);
        }
    }

    pub(crate) fn constructing(&self, key: &Key) {
        for observer in &self.observers {
            observer.constructing(key);
        }
    }

    pub(crate) fn constructed(&self, key: &Key, duration: Duration) {
        for observer in &self.observers {
            observer.constructed(key, duration);
        }
    }

    pub(crate) fn revived(&self, key: &Key) {
        for observer in &self.observers {
            observer.revived(key);
        }
    }

    pub(crate) fn failed(&self, key: &Key, error: &SingletonError) {
        for observer in &self.observers {
            observer.failed(key, error);
        }
    }

    pub(crate) fn torn_down(&self, key: &Key) {
        for observer in &self.observers {
            observer.torn_down(key);
        }
    }

    pub(crate) fn teardown_failed(&self, key: &Key, message: &str) {
        for observer in &self.observers {
            observer.teardown_failed(key, message);
        }
    }

    pub(crate) fn deleted(&self, key: &Key) {
        for observer in &self.observers {
            observer.deleted(key);
        }
    }

    pub(crate) fn dependency_cycle(&self, cycle: &[&'static str]) {
        for observer in &self.observers {
            observer.dependency_cycle(cycle);
        }
    }

    pub(crate) fn warning(&self, message: &str) {
        for observer in &self.observers {
            observer.warning(message);
        }
    }
}

/// Observer that forwards lifecycle events to the `log` facade.
///
/// Routine events go to `debug`, revivals, cycles and warnings to `warn`,
/// failures to `error`, all under one log target.
///
/// # Examples
///
/// ```
/// use ferrous_lifecycle::{LoggingObserver, RegistryConfig, SingletonRegistry};
/// use std::sync::Arc;
///
/// // The default registry already installs one; this adds a second target.
/// let registry = SingletonRegistry::builder()
///     .config(RegistryConfig { log_events: false, ..RegistryConfig::default() })
///     .observer(Arc::new(LoggingObserver::with_target("startup")))
///     .build();
/// # drop(registry);
/// ```
pub struct LoggingObserver {
    target: String,
}

impl LoggingObserver {
    /// Creates a logging observer with the default target.
    pub fn new() -> Self {
        Self::with_target(crate::config::DEFAULT_LOG_TARGET)
    }

    /// Creates a logging observer with a custom log target.
    pub fn with_target(target: impl Into<String>) -> Self {
        Self { target: target.into() }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryObserver for LoggingObserver {
    fn state_changed(&self, key: &Key, from: InitState, to: InitState) {
        log::trace!(target: &self.target, "{}: {} -> {}", key, from, to);
    }

    fn constructing(&self, key: &Key) {
        log::debug!(target: &self.target, "constructing {}", key);
    }

    fn constructed(&self, key: &Key, duration: Duration) {
        log::debug!(target: &self.target, "constructed {} in {:?}", key, duration);
    }

    fn revived(&self, key: &Key) {
        log::warn!(target: &self.target, "reviving deleted singleton {}", key);
    }

    fn failed(&self, key: &Key, error: &SingletonError) {
        log::error!(target: &self.target, "{}: {}", key, error);
    }

    fn torn_down(&self, key: &Key) {
        log::debug!(target: &self.target, "tore down {}", key);
    }

    fn teardown_failed(&self, key: &Key, message: &str) {
        log::error!(target: &self.target, "teardown of {} failed: {}", key, message);
    }

    fn deleted(&self, key: &Key) {
        log::debug!(target: &self.target, "deleted {}", key);
    }

    fn dependency_cycle(&self, cycle: &[&'static str]) {
        log::warn!(
            target: &self.target,
            "dependency cycle broken by construction order: {}",
            cycle.join(" -> ")
        );
    }

    fn warning(&self, message: &str) {
        log::warn!(target: &self.target, "{}", message);
    }
}
