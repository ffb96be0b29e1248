//! Status classification for optional features.
//!
//! Conformance tests probe behavior a service may legitimately leave out.
//! [`classify`] turns a response status into a [`StatusClass`] from the
//! statuses the test accepts and the statuses that mean "not implemented
//! here", so each test states its policy as data instead of branching on
//! codes inline.

use crate::assertions::assert_status_in;
use crate::error::{AssertionFailure, TestError};
use crate::http::Response;

/// Statuses that, by default, mean an optional feature is absent.
pub const NOT_IMPLEMENTED_STATUSES: [u16; 3] = [404, 405, 501];

/// What a test should do with a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// The status is one the test accepts; carry on asserting.
    Continue,
    /// The service does not implement the feature; skip the test.
    Skip,
    /// Anything else; fail the test.
    Fail,
}

/// Classifies `status` against the accepted and tolerable-absent sets.
///
/// Accepted statuses take precedence, so a test that expects `404` is not
/// skipped because `404` is also in the tolerable set.
///
/// # Arguments
///
/// * `status` - The observed status code
/// * `expected_ok` - Statuses that mean the feature behaved as required
/// * `tolerable_absent` - Statuses that mean the feature is not supported
pub fn classify(status: u16, expected_ok: &[u16], tolerable_absent: &[u16]) -> StatusClass {
    if expected_ok.contains(&status) {
        StatusClass::Continue
    } else if tolerable_absent.contains(&status) {
        StatusClass::Skip
    } else {
        StatusClass::Fail
    }
}

/// A reusable status expectation for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPolicy {
    /// Statuses that mean the feature behaved as required.
    pub expected: Vec<u16>,
    /// Statuses that mean the feature is not supported.
    pub tolerable_absent: Vec<u16>,
}

impl StatusPolicy {
    /// Accepts `expected`; tolerates 404, 405 and 501 as "not implemented".
    pub fn expect(expected: &[u16]) -> Self {
        Self {
            expected: expected.to_vec(),
            tolerable_absent: NOT_IMPLEMENTED_STATUSES.to_vec(),
        }
    }

    /// Accepts `expected` and fails on anything else.
    pub fn strict(expected: &[u16]) -> Self {
        Self {
            expected: expected.to_vec(),
            tolerable_absent: Vec::new(),
        }
    }

    /// Replaces the tolerable-absent set.
    pub fn tolerating(mut self, statuses: &[u16]) -> Self {
        self.tolerable_absent = statuses.to_vec();
        self
    }

    /// Classifies a status against this policy.
    pub fn classify(&self, status: u16) -> StatusClass {
        classify(status, &self.expected, &self.tolerable_absent)
    }

    /// Turns a response into `Ok(())`, a skip, or an assertion failure.
    ///
    /// `feature` names the optional behavior in the skip reason.
    pub fn evaluate(&self, response: &Response, feature: &str) -> Result<(), TestError> {
        match self.classify(response.status()) {
            StatusClass::Continue => Ok(()),
            StatusClass::Skip => Err(TestError::Skipped(format!(
                "{feature} not supported by the service (status {})",
                response.status()
            ))),
            StatusClass::Fail => Err(assert_status_in(response, &self.expected)
                .err()
                .unwrap_or_else(|| AssertionFailure::new("unexpected status code"))
                .into()),
        }
    }
}

impl Default for StatusPolicy {
    fn default() -> Self {
        Self::expect(&[200])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(200, &[200], &[404, 501]), StatusClass::Continue);
        assert_eq!(classify(501, &[200], &[404, 501]), StatusClass::Skip);
        assert_eq!(classify(500, &[200], &[404, 501]), StatusClass::Fail);
    }

    #[test]
    fn test_expected_wins_over_tolerable() {
        assert_eq!(classify(404, &[404], &[404, 501]), StatusClass::Continue);
    }

    #[test]
    fn test_default_policy_tolerates_not_implemented() {
        let policy = StatusPolicy::default();
        assert_eq!(policy.classify(405), StatusClass::Skip);
        assert_eq!(policy.classify(400), StatusClass::Fail);
        assert_eq!(StatusPolicy::strict(&[200]).classify(404), StatusClass::Fail);
    }

    #[test]
    fn test_evaluate_outcomes() {
        let policy = StatusPolicy::expect(&[200]).tolerating(&[501]);

        let ok = Response::new(200, Vec::new(), "");
        assert!(policy.evaluate(&ok, "$apply").is_ok());

        let absent = Response::new(501, Vec::new(), "");
        let err = policy.evaluate(&absent, "$apply").unwrap_err();
        assert!(err.is_skip());
        assert!(err.to_string().contains("$apply"));

        let broken = Response::new(500, Vec::new(), "");
        let err = policy.evaluate(&broken, "$apply").unwrap_err();
        assert!(matches!(err, TestError::Assertion(_)));
        assert!(err.to_string().contains("got 500"));
    }
}
