//! Capability probe cache.
//!
//! Some tests depend on what the service advertises, such as derived types
//! in `$metadata` or the schema namespace. Those facts are probed once per
//! process and shared by every suite. Each probe name maps to its own
//! [`OnceCell`]: the first caller runs the probe, callers that arrive while
//! it is in flight wait for the same result, and later callers read the
//! cached value.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::debug;

static GLOBAL: OnceLock<Arc<ProbeCache>> = OnceLock::new();

/// At-most-once cache of capability probe results.
#[derive(Debug, Default)]
pub struct ProbeCache {
    flags: Mutex<HashMap<String, Arc<OnceCell<bool>>>>,
    texts: Mutex<HashMap<String, Arc<OnceCell<Option<String>>>>>,
    executions: Mutex<HashMap<String, usize>>,
}

impl ProbeCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide cache.
    pub fn global() -> Arc<Self> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    /// Returns the cached flag `name`, running `probe` if no result exists.
    ///
    /// A probe that cannot reach a verdict should return `false`; that answer
    /// is cached like any other.
    pub async fn flag<F, Fut>(&self, name: &str, probe: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        let cell = {
            let mut flags = self.flags.lock();
            Arc::clone(flags.entry(name.to_string()).or_default())
        };

        *cell
            .get_or_init(|| async {
                self.record_execution(name);
                let result = probe().await;
                debug!(probe = %name, result = result, "Capability probe completed");
                result
            })
            .await
    }

    /// Returns the cached text value `name`, running `probe` if no result
    /// exists. `None` is cached as well.
    pub async fn text<F, Fut>(&self, name: &str, probe: F) -> Option<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Option<String>>,
    {
        let cell = {
            let mut texts = self.texts.lock();
            Arc::clone(texts.entry(name.to_string()).or_default())
        };

        cell.get_or_init(|| async {
            self.record_execution(name);
            let result = probe().await;
            debug!(probe = %name, result = ?result, "Capability probe completed");
            result
        })
        .await
        .clone()
    }

    /// Returns the flag `name` if it has already been probed.
    pub fn cached_flag(&self, name: &str) -> Option<bool> {
        self.flags
            .lock()
            .get(name)
            .and_then(|cell| cell.get().copied())
    }

    /// Returns how many times the probe `name` has run.
    pub fn executions(&self, name: &str) -> usize {
        self.executions.lock().get(name).copied().unwrap_or(0)
    }

    fn record_execution(&self, name: &str) {
        *self.executions.lock().entry(name.to_string()).or_insert(0) += 1;
    }
}
