//! The per-test execution context.
//!
//! A fresh [`TestContext`] is handed to every test body. It bundles the
//! shared HTTP client with the test's own log sink, the suite's fixture
//! state and the process-wide probe cache, and exposes the request and
//! assertion vocabulary test bodies are written in.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::assertions;
use crate::classify::StatusPolicy;
use crate::error::{AssertionFailure, TestError, TestResult, TransportError};
use crate::http::{Header, HttpClient, Method, Response};
use crate::probe::ProbeCache;
use crate::state::SuiteState;

/// Append-only log lines captured for one test.
#[derive(Debug, Clone, Default)]
pub struct LogSink(Arc<Mutex<Vec<String>>>);

impl LogSink {
    /// Appends a line.
    pub fn push(&self, line: impl Into<String>) {
        self.0.lock().push(line.into());
    }

    /// Returns a copy of every line logged so far.
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

/// Everything a test body needs to talk to the service and report back.
///
/// Request methods return the raw [`Response`] whatever its status; only a
/// transport failure is an `Err`. Assertion wrappers return `Result`s meant
/// to be propagated with `?`, and [`skip`](Self::skip) /
/// [`fail`](Self::fail) end the body explicitly.
///
/// # Example
///
/// ```rust,no_run
/// use odata_harness::{TestContext, TestResult};
///
/// async fn top_limits_results(ctx: TestContext) -> TestResult {
///     let response = ctx.get("Products?$top=2", &[]).await?;
///     ctx.assert_status(&response, 200)?;
///     let body = ctx.json_object(&response)?;
///     let count = body.get("value").and_then(|v| v.as_array()).map_or(0, Vec::len);
///     if count > 2 {
///         return ctx.fail(format!("$top=2 returned {count} entities"));
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct TestContext {
    client: Arc<HttpClient>,
    suite_state: SuiteState,
    probes: Arc<ProbeCache>,
    logs: LogSink,
    suite: Arc<str>,
    test: Arc<str>,
}

impl TestContext {
    /// Creates a context for one test of `suite_state`'s suite.
    pub fn new(
        client: Arc<HttpClient>,
        suite_state: SuiteState,
        probes: Arc<ProbeCache>,
        logs: LogSink,
        test: &str,
    ) -> Self {
        let suite = Arc::from(suite_state.suite());
        Self {
            client,
            suite_state,
            probes,
            logs,
            suite,
            test: Arc::from(test),
        }
    }

    /// Returns the name of the running suite.
    pub fn suite_name(&self) -> &str {
        &self.suite
    }

    /// Returns the name of the running test.
    pub fn test_name(&self) -> &str {
        &self.test
    }

    /// Returns the shared HTTP client.
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Returns the fixture state of the running suite.
    pub fn suite_state(&self) -> &SuiteState {
        &self.suite_state
    }

    /// Returns the capability probe cache.
    pub fn probes(&self) -> &ProbeCache {
        &self.probes
    }

    // ---- Requests ----

    /// Sends a bodiless request with any method.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        headers: &[Header],
    ) -> Result<Response, TransportError> {
        self.client.call(method, path, headers).await
    }

    /// `GET path`
    pub async fn get(&self, path: &str, headers: &[Header]) -> Result<Response, TransportError> {
        self.send(Method::GET, path, headers).await
    }

    /// `HEAD path`
    pub async fn head(&self, path: &str, headers: &[Header]) -> Result<Response, TransportError> {
        self.send(Method::HEAD, path, headers).await
    }

    /// `DELETE path`
    pub async fn delete(
        &self,
        path: &str,
        headers: &[Header],
    ) -> Result<Response, TransportError> {
        self.send(Method::DELETE, path, headers).await
    }

    /// `POST path` with a JSON body.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        headers: &[Header],
    ) -> Result<Response, TransportError> {
        self.client.call_json(Method::POST, path, body, headers).await
    }

    /// `PUT path` with a JSON body.
    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        headers: &[Header],
    ) -> Result<Response, TransportError> {
        self.client.call_json(Method::PUT, path, body, headers).await
    }

    /// `PATCH path` with a JSON body.
    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        headers: &[Header],
    ) -> Result<Response, TransportError> {
        self.client
            .call_json(Method::PATCH, path, body, headers)
            .await
    }

    /// `POST path` with a raw body and explicit content type.
    pub async fn post_raw(
        &self,
        path: &str,
        body: impl Into<Bytes>,
        content_type: &str,
        headers: &[Header],
    ) -> Result<Response, TransportError> {
        self.client
            .call_raw(Method::POST, path, body, content_type, headers)
            .await
    }

    /// `PUT path` with a raw body and explicit content type.
    pub async fn put_raw(
        &self,
        path: &str,
        body: impl Into<Bytes>,
        content_type: &str,
        headers: &[Header],
    ) -> Result<Response, TransportError> {
        self.client
            .call_raw(Method::PUT, path, body, content_type, headers)
            .await
    }

    /// `PATCH path` with a raw body and explicit content type.
    pub async fn patch_raw(
        &self,
        path: &str,
        body: impl Into<Bytes>,
        content_type: &str,
        headers: &[Header],
    ) -> Result<Response, TransportError> {
        self.client
            .call_raw(Method::PATCH, path, body, content_type, headers)
            .await
    }

    // ---- Assertions ----

    /// See [`assertions::assert_status`].
    pub fn assert_status(&self, response: &Response, expected: u16) -> Result<(), AssertionFailure> {
        assertions::assert_status(response, expected)
    }

    /// See [`assertions::assert_status_in`].
    pub fn assert_status_in(
        &self,
        response: &Response,
        expected: &[u16],
    ) -> Result<(), AssertionFailure> {
        assertions::assert_status_in(response, expected)
    }

    /// See [`assertions::assert_header_exists`].
    pub fn assert_header_exists(
        &self,
        response: &Response,
        name: &str,
    ) -> Result<(), AssertionFailure> {
        assertions::assert_header_exists(response, name)
    }

    /// See [`assertions::assert_header_equals`].
    pub fn assert_header_equals(
        &self,
        response: &Response,
        name: &str,
        expected: &str,
    ) -> Result<(), AssertionFailure> {
        assertions::assert_header_equals(response, name, expected)
    }

    /// See [`assertions::assert_header_contains`].
    pub fn assert_header_contains(
        &self,
        response: &Response,
        name: &str,
        needle: &str,
    ) -> Result<(), AssertionFailure> {
        assertions::assert_header_contains(response, name, needle)
    }

    /// See [`assertions::assert_json_field`].
    pub fn assert_json_field(
        &self,
        response: &Response,
        field: &str,
    ) -> Result<(), AssertionFailure> {
        assertions::assert_json_field(response, field)
    }

    /// See [`assertions::assert_json_field_equals`].
    pub fn assert_json_field_equals(
        &self,
        response: &Response,
        field: &str,
        expected: &Value,
    ) -> Result<(), AssertionFailure> {
        assertions::assert_json_field_equals(response, field, expected)
    }

    /// See [`assertions::assert_body_contains`].
    pub fn assert_body_contains(
        &self,
        response: &Response,
        needle: &str,
    ) -> Result<(), AssertionFailure> {
        assertions::assert_body_contains(response, needle)
    }

    /// See [`assertions::assert_body_not_contains`].
    pub fn assert_body_not_contains(
        &self,
        response: &Response,
        needle: &str,
    ) -> Result<(), AssertionFailure> {
        assertions::assert_body_not_contains(response, needle)
    }

    /// Parses the body as JSON; a parse error is an assertion failure.
    pub fn json(&self, response: &Response) -> Result<Value, AssertionFailure> {
        assertions::parse_json(response)
    }

    /// Parses the body as a JSON object.
    pub fn json_object(&self, response: &Response) -> Result<Map<String, Value>, AssertionFailure> {
        assertions::parse_json_object(response)
    }

    /// Classifies the response status for an optional feature.
    ///
    /// Returns `Ok(())` for an accepted status, a skip for 404/405/501 and
    /// an assertion failure otherwise.
    pub fn require_status(
        &self,
        response: &Response,
        expected_ok: &[u16],
        feature: &str,
    ) -> Result<(), TestError> {
        self.require_status_with(response, &StatusPolicy::expect(expected_ok), feature)
    }

    /// Like [`require_status`](Self::require_status) with an explicit policy.
    pub fn require_status_with(
        &self,
        response: &Response,
        policy: &StatusPolicy,
        feature: &str,
    ) -> Result<(), TestError> {
        let result = policy.evaluate(response, feature);
        if let Err(TestError::Skipped(reason)) = &result {
            self.log(reason.as_str());
        }
        result
    }

    // ---- Outcome control ----

    /// Ends the body as Skip.
    ///
    /// ```rust,ignore
    /// return ctx.skip("no products available for testing");
    /// ```
    pub fn skip(&self, reason: impl Into<String>) -> TestResult {
        Err(TestError::Skipped(reason.into()))
    }

    /// Ends the body as Fail.
    pub fn fail(&self, message: impl Into<String>) -> TestResult {
        Err(TestError::Failed(message.into()))
    }

    /// Records a line in this test's log. Never affects the outcome.
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        debug!(suite = %self.suite, test = %self.test, "{}", message);
        self.logs.push(message);
    }

    /// Returns the lines logged so far.
    pub fn logs(&self) -> Vec<String> {
        self.logs.lines()
    }
}
