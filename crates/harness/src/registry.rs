//! Test suite registry.

use std::sync::Arc;

use tracing::debug;

use crate::error::RegistryError;
use crate::suite::Suite;

/// The ordered set of suites a run executes.
///
/// Registration order is report order. Suite names are unique, and test
/// names are unique within a suite; both are checked at registration.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    suites: Vec<Arc<Suite>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a suite, after which it can no longer be modified.
    pub fn register(&mut self, suite: Suite) -> Result<(), RegistryError> {
        if suite.name().is_empty() || suite.tests().iter().any(|t| t.name().is_empty()) {
            return Err(RegistryError::EmptyName {
                suite: suite.name().to_string(),
            });
        }

        if self.suite(suite.name()).is_some() {
            return Err(RegistryError::DuplicateSuite {
                name: suite.name().to_string(),
            });
        }

        if let Some(test) = suite.duplicate_test_name() {
            return Err(RegistryError::DuplicateTest {
                suite: suite.name().to_string(),
                test: test.to_string(),
            });
        }

        debug!(suite = %suite.name(), tests = suite.len(), "Registered suite");
        self.suites.push(Arc::new(suite));
        Ok(())
    }

    /// Returns the suites in registration order.
    pub fn suites(&self) -> &[Arc<Suite>] {
        &self.suites
    }

    /// Returns the named suite.
    pub fn suite(&self, name: &str) -> Option<&Arc<Suite>> {
        self.suites.iter().find(|s| s.name() == name)
    }

    /// Returns a registry holding only the named suites.
    ///
    /// Names match case-insensitively; registration order is kept. An empty
    /// filter selects every suite.
    pub fn filtered(&self, names: &[String]) -> Result<Registry, RegistryError> {
        if names.is_empty() {
            return Ok(self.clone());
        }

        if let Some(unknown) = names.iter().find(|name| {
            !self
                .suites
                .iter()
                .any(|s| s.name().eq_ignore_ascii_case(name))
        }) {
            return Err(RegistryError::UnknownSuite {
                name: unknown.clone(),
            });
        }

        let suites = self
            .suites
            .iter()
            .filter(|s| names.iter().any(|n| s.name().eq_ignore_ascii_case(n)))
            .cloned()
            .collect();
        Ok(Registry { suites })
    }

    /// Returns the number of suites.
    pub fn len(&self) -> usize {
        self.suites.len()
    }

    /// Returns true if no suite is registered.
    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    /// Returns the number of tests across all suites.
    pub fn test_count(&self) -> usize {
        self.suites.iter().map(|s| s.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TestContext, TestResult};

    async fn passes(_ctx: TestContext) -> TestResult {
        Ok(())
    }

    fn suite(name: &str, tests: &[&str]) -> Suite {
        let mut suite = Suite::new(name, "", "");
        for test in tests {
            suite.add_test(*test, "", passes);
        }
        suite
    }

    #[test]
    fn test_register_keeps_order() {
        let mut registry = Registry::new();
        registry.register(suite("B", &["one"])).unwrap();
        registry.register(suite("A", &["one", "two"])).unwrap();

        let names: Vec<&str> = registry.suites().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["B", "A"]);
        assert_eq!(registry.test_count(), 3);
    }

    #[test]
    fn test_duplicate_suite_rejected() {
        let mut registry = Registry::new();
        registry.register(suite("Metadata", &["a"])).unwrap();
        let err = registry.register(suite("Metadata", &["b"])).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateSuite {
                name: "Metadata".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_test_rejected() {
        let mut registry = Registry::new();
        let err = registry.register(suite("S", &["x", "x"])).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTest { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_empty_names_rejected() {
        let mut registry = Registry::new();
        assert!(registry.register(suite("", &["x"])).is_err());
        assert!(registry.register(suite("S", &[""])).is_err());
    }

    #[test]
    fn test_filtered() {
        let mut registry = Registry::new();
        registry.register(suite("A", &["1"])).unwrap();
        registry.register(suite("B", &["1"])).unwrap();
        registry.register(suite("C", &["1"])).unwrap();

        let filtered = registry
            .filtered(&["c".to_string(), "A".to_string()])
            .unwrap();
        let names: Vec<&str> = filtered.suites().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["A", "C"]);

        assert_eq!(registry.filtered(&[]).unwrap().len(), 3);
        assert!(matches!(
            registry.filtered(&["Z".to_string()]),
            Err(RegistryError::UnknownSuite { .. })
        ));
    }
}
