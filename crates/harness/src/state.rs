//! Suite-scoped fixture state.
//!
//! Tests in a suite run in declaration order. A test that creates a server
//! entity can publish its key here for later tests of the same suite run;
//! a later test that finds nothing published skips rather than fails.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::FixtureError;

/// Key/value store shared by every test context of one suite run.
///
/// Cloning shares the underlying map. A new store is created for each suite
/// run, so nothing leaks between suites or runs.
#[derive(Debug, Clone)]
pub struct SuiteState {
    suite: Arc<str>,
    values: Arc<Mutex<HashMap<String, Value>>>,
}

impl SuiteState {
    /// Creates an empty store for the named suite.
    pub fn new(suite: &str) -> Self {
        Self {
            suite: Arc::from(suite),
            values: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the suite this store belongs to.
    pub fn suite(&self) -> &str {
        &self.suite
    }

    /// Publishes a value under `key`, replacing any previous value.
    pub fn put(&self, key: impl Into<String>, value: Value) {
        self.values.lock().insert(key.into(), value);
    }

    /// Returns the value under `key`, if an earlier test published one.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().get(key).cloned()
    }

    /// Returns the value under `key`, or [`FixtureError::Unavailable`].
    pub fn require(&self, key: &str) -> Result<Value, FixtureError> {
        self.get(key).ok_or_else(|| {
            FixtureError::unavailable(format!(
                "suite fixture '{key}' was not produced by an earlier test in '{}'",
                self.suite
            ))
        })
    }

    /// Like [`require`](Self::require), for string values.
    pub fn require_str(&self, key: &str) -> Result<String, FixtureError> {
        match self.require(key)? {
            Value::String(s) => Ok(s),
            other => Err(FixtureError::malformed(format!(
                "suite fixture '{key}' is not a string: {other}"
            ))),
        }
    }

    /// Removes and returns the value under `key`.
    pub fn take(&self, key: &str) -> Option<Value> {
        self.values.lock().remove(key)
    }

    /// Returns true if a value is published under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().contains_key(key)
    }
}
