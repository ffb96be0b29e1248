//! Error types for the conformance harness.
//!
//! The hierarchy separates the ways a single conformance test can stop early:
//!
//! | Error | Raised by | Classified as |
//! |-------|-----------|---------------|
//! | [`TransportError`] | HTTP client adapter | Fail |
//! | [`AssertionFailure`] | assertion library | Fail |
//! | [`FixtureError::Unavailable`] | fixture helpers, suite state | Skip |
//! | [`FixtureError::Transport`] / [`FixtureError::Malformed`] / [`FixtureError::UnexpectedStatus`] | fixture helpers | Fail |
//! | [`TestError::Skipped`] | [`TestContext::skip`](crate::TestContext::skip) | Skip |
//!
//! Test bodies return [`TestResult`]; the `From` conversions below let `?`
//! route every error into the right bucket without the body spelling it out.

// Variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// Failures of the HTTP client adapter, distinct from any HTTP status code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connection failed for {method} {url}: {message}")]
    Connect {
        method: String,
        url: String,
        message: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("request timed out for {method} {url}")]
    Timeout { method: String, url: String },

    /// Any other failure while sending the request.
    #[error("request failed for {method} {url}: {message}")]
    Request {
        method: String,
        url: String,
        message: String,
    },

    /// The response body could not be read.
    #[error("failed to read response body for {method} {url}: {message}")]
    Body {
        method: String,
        url: String,
        message: String,
    },

    /// A header name or value could not be encoded.
    #[error("invalid header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    /// The request URL could not be parsed.
    #[error("invalid request URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// A JSON request body could not be serialized.
    #[error("failed to encode JSON request body: {message}")]
    Encode { message: String },

    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {message}")]
    Client { message: String },
}

impl TransportError {
    /// Classifies a `reqwest` failure for the given request.
    pub fn from_reqwest(method: &reqwest::Method, url: &str, err: reqwest::Error) -> Self {
        let method = method.to_string();
        let url = url.to_string();
        if err.is_timeout() {
            TransportError::Timeout { method, url }
        } else if err.is_connect() {
            TransportError::Connect {
                method,
                url,
                message: err.to_string(),
            }
        } else if err.is_body() || err.is_decode() {
            TransportError::Body {
                method,
                url,
                message: err.to_string(),
            }
        } else {
            TransportError::Request {
                method,
                url,
                message: err.to_string(),
            }
        }
    }

    /// Returns true if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }
}

/// A failed assertion, naming what was expected and what was observed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct AssertionFailure {
    /// Human-readable description of the failure.
    pub message: String,
    /// The expected value, when the assertion compares values.
    pub expected: Option<String>,
    /// The observed value, when one was available.
    pub actual: Option<String>,
}

impl AssertionFailure {
    /// Creates a failure with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            expected: None,
            actual: None,
        }
    }

    /// Creates a failure for an expected/actual mismatch.
    pub fn mismatch(
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            expected: Some(expected.into()),
            actual: Some(actual.into()),
        }
    }
}

/// Errors raised while deriving server-side fixtures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FixtureError {
    /// The environment does not provide what the test needs (no entities,
    /// unsupported collection, missing suite fixture).
    #[error("fixture unavailable: {reason}")]
    Unavailable { reason: String },

    /// The fixture query could not reach the server.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered, but not in a shape the helper can use.
    #[error("malformed fixture response: {message}")]
    Malformed { message: String },

    /// The fixture request got a status that neither succeeds nor reads as
    /// "not implemented".
    #[error("unexpected status {status} for {request}")]
    UnexpectedStatus { request: String, status: u16 },
}

impl FixtureError {
    /// Creates an [`FixtureError::Unavailable`] error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        FixtureError::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a [`FixtureError::Malformed`] error.
    pub fn malformed(message: impl Into<String>) -> Self {
        FixtureError::Malformed {
            message: message.into(),
        }
    }

    /// Returns true if this error reflects environment setup rather than
    /// protocol behavior.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FixtureError::Unavailable { .. })
    }
}

/// The early-exit path of a test body.
///
/// `Skipped` is not a failure: it ends the body and is reported in its own
/// bucket. Every other variant is reported as Fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TestError {
    /// The optional behavior under test could not be verified here.
    #[error("skipped: {0}")]
    Skipped(String),

    /// An assertion did not hold.
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),

    /// An HTTP call failed below the protocol level.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A fixture helper failed for a reason other than unavailability.
    #[error("fixture error: {0}")]
    Fixture(String),

    /// The body reported a failure directly.
    #[error("{0}")]
    Failed(String),
}

impl TestError {
    /// Returns true if this is a skip signal.
    pub fn is_skip(&self) -> bool {
        matches!(self, TestError::Skipped(_))
    }
}

impl From<FixtureError> for TestError {
    fn from(err: FixtureError) -> Self {
        match err {
            FixtureError::Unavailable { reason } => TestError::Skipped(reason),
            FixtureError::Transport(e) => TestError::Transport(e),
            FixtureError::Malformed { .. } | FixtureError::UnexpectedStatus { .. } => {
                TestError::Fixture(err.to_string())
            }
        }
    }
}

/// Result type returned by every test body.
pub type TestResult = Result<(), TestError>;

/// Errors raised while registering suites.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A suite with this name is already registered.
    #[error("suite '{name}' is already registered")]
    DuplicateSuite { name: String },

    /// A suite contains two tests with the same name.
    #[error("suite '{suite}' registers test '{test}' more than once")]
    DuplicateTest { suite: String, test: String },

    /// A suite or test was registered without a name.
    #[error("suite and test names must not be empty (suite: '{suite}')")]
    EmptyName { suite: String },

    /// A filter named a suite that is not registered.
    #[error("unknown suite '{name}'")]
    UnknownSuite { name: String },
}

/// Configuration validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid configuration: {}", .errors.join("; "))]
pub struct ConfigError {
    /// Every problem found during validation.
    pub errors: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_unavailable_becomes_skip() {
        let err: TestError = FixtureError::unavailable("no products").into();
        assert_eq!(err, TestError::Skipped("no products".to_string()));
        assert!(err.is_skip());
    }

    #[test]
    fn test_fixture_transport_becomes_failure() {
        let transport = TransportError::Timeout {
            method: "GET".to_string(),
            url: "http://localhost/Products".to_string(),
        };
        let err: TestError = FixtureError::Transport(transport.clone()).into();
        assert_eq!(err, TestError::Transport(transport));
        assert!(!err.is_skip());
    }

    #[test]
    fn test_fixture_malformed_becomes_failure() {
        let err: TestError = FixtureError::malformed("value is not an array").into();
        assert!(matches!(err, TestError::Fixture(_)));
        assert!(err.to_string().contains("value is not an array"));
    }

    #[test]
    fn test_fixture_unexpected_status_becomes_failure() {
        let err: TestError = FixtureError::UnexpectedStatus {
            request: "GET Products?$top=1".to_string(),
            status: 500,
        }
        .into();
        assert!(!err.is_skip());
        assert_eq!(
            err,
            TestError::Fixture("unexpected status 500 for GET Products?$top=1".to_string())
        );
    }

    #[test]
    fn test_assertion_display_is_message() {
        let failure = AssertionFailure::mismatch("expected 200, got 404", "200", "404");
        assert_eq!(failure.to_string(), "expected 200, got 404");
        assert_eq!(failure.expected.as_deref(), Some("200"));
    }

    #[test]
    fn test_config_error_joins_messages() {
        let err = ConfigError {
            errors: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "invalid configuration: a; b");
    }
}
