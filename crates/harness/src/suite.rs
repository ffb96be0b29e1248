//! Test suites and test cases.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::TestContext;
use crate::error::TestResult;

/// A boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// A registered test body.
///
/// Bodies take the context by value, so an ordinary
/// `async fn name(ctx: TestContext) -> TestResult` can be registered
/// directly.
pub type TestBody = Arc<dyn Fn(TestContext) -> BoxFuture<TestResult> + Send + Sync>;

/// A single named conformance test.
#[derive(Clone)]
pub struct TestCase {
    name: String,
    description: String,
    citation: Option<String>,
    body: TestBody,
}

impl TestCase {
    /// Returns the test name, unique within its suite.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the OData protocol section the test checks, if recorded.
    pub fn citation(&self) -> Option<&str> {
        self.citation.as_deref()
    }

    pub(crate) fn invoke(&self, ctx: TestContext) -> BoxFuture<TestResult> {
        (self.body)(ctx)
    }
}

impl fmt::Debug for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("citation", &self.citation)
            .finish_non_exhaustive()
    }
}

/// An ordered collection of tests for one area of the protocol.
///
/// Tests run in the order they were added. A suite is built up with
/// [`add_test`](Self::add_test) and becomes read-only once registered.
///
/// # Example
///
/// ```rust
/// use odata_harness::{Suite, TestContext, TestResult};
///
/// async fn service_document(ctx: TestContext) -> TestResult {
///     let response = ctx.get("", &[]).await?;
///     ctx.assert_status(&response, 200)?;
///     ctx.assert_json_field(&response, "value")?;
///     Ok(())
/// }
///
/// let mut suite = Suite::new(
///     "ServiceDocument",
///     "Service document structure",
///     "https://docs.oasis-open.org/odata/odata/v4.01/odata-v4.01-part1-protocol.html#sec_ServiceDocumentRequest",
/// );
/// suite.add_test("returns_entity_sets", "Service document lists entity sets", service_document);
/// assert_eq!(suite.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Suite {
    name: String,
    description: String,
    spec_reference: String,
    tests: Vec<TestCase>,
}

impl Suite {
    /// Creates an empty suite.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        spec_reference: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            spec_reference: spec_reference.into(),
            tests: Vec::new(),
        }
    }

    /// Appends a test.
    pub fn add_test<F, Fut>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        body: F,
    ) -> &mut Self
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.push(name.into(), description.into(), None, body)
    }

    /// Appends a test that cites the OData protocol section it checks.
    pub fn add_cited_test<F, Fut>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        citation: impl Into<String>,
        body: F,
    ) -> &mut Self
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.push(name.into(), description.into(), Some(citation.into()), body)
    }

    fn push<F, Fut>(
        &mut self,
        name: String,
        description: String,
        citation: Option<String>,
        body: F,
    ) -> &mut Self
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        let body: TestBody = Arc::new(move |ctx| Box::pin(body(ctx)));
        self.tests.push(TestCase {
            name,
            description,
            citation,
            body,
        });
        self
    }

    /// Returns the suite name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the URL of the OData protocol section the suite covers.
    pub fn spec_reference(&self) -> &str {
        &self.spec_reference
    }

    /// Returns the tests in execution order.
    pub fn tests(&self) -> &[TestCase] {
        &self.tests
    }

    /// Returns the named test.
    pub fn test(&self, name: &str) -> Option<&TestCase> {
        self.tests.iter().find(|t| t.name == name)
    }

    /// Returns the number of tests.
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    /// Returns true if the suite has no tests.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Returns the first test name that appears more than once.
    pub(crate) fn duplicate_test_name(&self) -> Option<&str> {
        self.tests.iter().enumerate().find_map(|(i, test)| {
            self.tests[..i]
                .iter()
                .any(|earlier| earlier.name == test.name)
                .then_some(test.name.as_str())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn passes(_ctx: TestContext) -> TestResult {
        Ok(())
    }

    #[test]
    fn test_tests_keep_declaration_order() {
        let mut suite = Suite::new("QueryOptions", "System query options", "https://example.org");
        suite
            .add_test("filter", "$filter", passes)
            .add_cited_test("top", "$top", "11.2.6.3", passes)
            .add_test("skip", "$skip", |_ctx| async { Ok(()) });

        let names: Vec<&str> = suite.tests().iter().map(TestCase::name).collect();
        assert_eq!(names, vec!["filter", "top", "skip"]);
        assert_eq!(suite.test("top").and_then(TestCase::citation), Some("11.2.6.3"));
        assert_eq!(suite.duplicate_test_name(), None);
    }

    #[test]
    fn test_duplicate_test_name_detected() {
        let mut suite = Suite::new("S", "", "");
        suite
            .add_test("a", "", passes)
            .add_test("b", "", passes)
            .add_test("a", "", passes);
        assert_eq!(suite.duplicate_test_name(), Some("a"));
    }

    #[test]
    fn test_debug_omits_body() {
        let mut suite = Suite::new("S", "", "");
        suite.add_test("a", "desc", passes);
        let rendered = format!("{:?}", suite.tests()[0]);
        assert!(rendered.contains("\"a\""));
        assert!(rendered.contains(".."));
    }
}
