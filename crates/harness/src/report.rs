//! Run results.
//!
//! A [`Report`] holds one [`TestRecord`] per registered test, in registry
//! order, plus summary counts. Skips are counted in their own bucket and
//! never as failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TestError, TestResult};

/// The terminal state of one test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    /// The body returned without signaling skip or failure.
    Passed,
    /// An assertion failed, a request failed, or the body panicked.
    Failed {
        /// What went wrong.
        message: String,
    },
    /// The behavior under test could not be verified against this service.
    Skipped {
        /// Why the test was skipped.
        reason: String,
    },
}

impl Outcome {
    /// Classifies a test body's result.
    pub fn from_result(result: TestResult) -> Self {
        match result {
            Ok(()) => Outcome::Passed,
            Err(TestError::Skipped(reason)) => Outcome::Skipped { reason },
            Err(err) => Outcome::Failed {
                message: err.to_string(),
            },
        }
    }

    /// Creates a failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Outcome::Failed {
            message: message.into(),
        }
    }

    /// Returns the outcome without its detail.
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Outcome::Passed => OutcomeKind::Passed,
            Outcome::Failed { .. } => OutcomeKind::Failed,
            Outcome::Skipped { .. } => OutcomeKind::Skipped,
        }
    }

    /// Returns the failure message or skip reason.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Outcome::Passed => None,
            Outcome::Failed { message } => Some(message),
            Outcome::Skipped { reason } => Some(reason),
        }
    }

    /// Returns true for [`Outcome::Failed`].
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

/// [`Outcome`] without its detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    /// Passed.
    Passed,
    /// Failed.
    Failed,
    /// Skipped.
    Skipped,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeKind::Passed => write!(f, "PASS"),
            OutcomeKind::Failed => write!(f, "FAIL"),
            OutcomeKind::Skipped => write!(f, "SKIP"),
        }
    }
}

/// The result of one test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    /// Owning suite.
    pub suite: String,
    /// Test name.
    pub test: String,
    /// Test description.
    pub description: String,
    /// OData protocol section, if the test cites one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,
    /// Terminal state.
    pub outcome: Outcome,
    /// Wall-clock duration of the body.
    pub duration_ms: u64,
    /// Lines logged through the context.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub logs: Vec<String>,
}

/// Outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of tests.
    pub total: usize,
    /// Number of passed tests.
    pub passed: usize,
    /// Number of failed tests.
    pub failed: usize,
    /// Number of skipped tests.
    pub skipped: usize,
}

impl Summary {
    /// Counts the outcomes of `records`.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a TestRecord>) -> Self {
        let mut summary = Summary::default();
        for record in records {
            summary.add(&record.outcome);
        }
        summary
    }

    fn add(&mut self, outcome: &Outcome) {
        self.total += 1;
        match outcome.kind() {
            OutcomeKind::Passed => self.passed += 1,
            OutcomeKind::Failed => self.failed += 1,
            OutcomeKind::Skipped => self.skipped += 1,
        }
    }
}

/// Per-suite counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteSummary {
    /// Suite name.
    pub name: String,
    /// URL of the OData protocol section the suite covers.
    pub spec_reference: String,
    /// Outcome counts for the suite.
    #[serde(flatten)]
    pub summary: Summary,
    /// Wall-clock duration of the suite.
    pub duration_ms: u64,
}

/// The complete result of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Unique id of this run.
    pub run_id: Uuid,
    /// Service root the run targeted.
    pub server_url: String,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Totals across every suite.
    pub summary: Summary,
    /// Per-suite totals, in registry order.
    pub suites: Vec<SuiteSummary>,
    /// Every test result, in registry order.
    pub records: Vec<TestRecord>,
}

impl Report {
    /// Assembles a report from per-suite results already in registry order.
    pub fn new(
        run_id: Uuid,
        server_url: impl Into<String>,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
        suites: Vec<(SuiteSummary, Vec<TestRecord>)>,
    ) -> Self {
        let mut summaries = Vec::with_capacity(suites.len());
        let mut records = Vec::new();
        for (summary, suite_records) in suites {
            summaries.push(summary);
            records.extend(suite_records);
        }

        Self {
            run_id,
            server_url: server_url.into(),
            started_at,
            finished_at,
            summary: Summary::from_records(&records),
            suites: summaries,
            records,
        }
    }

    /// Returns the totals.
    pub fn summary(&self) -> Summary {
        self.summary
    }

    /// Returns every test record in registry order.
    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    /// Returns the per-suite totals in registry order.
    pub fn suite_summaries(&self) -> &[SuiteSummary] {
        &self.suites
    }

    /// Returns the failed tests.
    pub fn failures(&self) -> impl Iterator<Item = &TestRecord> {
        self.records.iter().filter(|r| r.outcome.is_failed())
    }

    /// Returns true if no test failed. Skips do not count against success.
    pub fn is_success(&self) -> bool {
        self.summary.failed == 0
    }

    /// Returns the run duration in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
