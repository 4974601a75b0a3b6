//! Resolution observers.
//!
//! Observers receive a callback around every factory invocation made
//! through a provider. Keys with no registration produce no events.

use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::key::Key;

/// Hook for observing resolution events.
///
/// # Examples
///
/// ```
/// use strata_di::{DiError, DiObserver, Key, Resolver, ServiceCollection};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder {
///     seen: Mutex<Vec<String>>,
/// }
///
/// impl DiObserver for Recorder {
///     fn resolving(&self, key: &Key) {
///         self.seen.lock().unwrap().push(format!("start {}", key));
///     }
///
///     fn resolved(&self, key: &Key, _duration: Duration) {
///         self.seen.lock().unwrap().push(format!("done {}", key));
///     }
///
///     fn resolve_failed(&self, key: &Key, error: &DiError) {
///         self.seen.lock().unwrap().push(format!("failed {}: {}", key, error));
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let mut services = ServiceCollection::new();
/// services.add_singleton(5u8);
/// services.add_observer(recorder.clone());
///
/// let provider = services.build();
/// provider.get_required::<u8>();
///
/// assert_eq!(*recorder.seen.lock().unwrap(), vec!["start u8", "done u8"]);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a factory for `key` runs.
    fn resolving(&self, key: &Key);

    /// Called after the factory returned an instance.
    fn resolved(&self, key: &Key, duration: Duration);

    /// Called when the factory, or one of its dependencies, failed.
    fn resolve_failed(&self, key: &Key, error: &DiError) {
        let _ = (key, error);
    }
}

/// Observers registered on a provider tree.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
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
    pub(crate) fn resolve_failed(&self, key: &Key, error: &DiError) {
        for observer in &self.observers {
            observer.resolve_failed(key, error);
        }
    }
}

/// Observer that forwards resolution events to `tracing`.
///
/// Starts and completions are emitted at `DEBUG`, failures at `WARN`.
///
/// ```
/// use strata_di::{LoggingObserver, ServiceCollection};
/// use std::sync::Arc;
///
/// let mut services = ServiceCollection::new();
/// services.add_observer(Arc::new(LoggingObserver::with_prefix("app")));
/// let _provider = services.build();
/// ```
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self {
            prefix: "strata-di".to_string(),
        }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, key: &Key) {
        tracing::debug!(prefix = %self.prefix, key = %key, "resolving");
    }

    fn resolved(&self, key: &Key, duration: Duration) {
        tracing::debug!(prefix = %self.prefix, key = %key, ?duration, "resolved");
    }

    fn resolve_failed(&self, key: &Key, error: &DiError) {
        tracing::warn!(prefix = %self.prefix, key = %key, %error, "resolution failed");
    }
}
