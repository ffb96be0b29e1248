//! Runner and aggregator.
//!
//! Suites run concurrently, bounded by a semaphore; tests within a suite run
//! one after another in declaration order, so later tests can rely on
//! fixtures earlier tests published. Each test body runs on its own task:
//! a panic is caught at the task boundary and recorded as a failure, and
//! the run deadline aborts whatever is still in flight.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::HarnessConfig;
use crate::context::{LogSink, TestContext};
use crate::error::TransportError;
use crate::http::HttpClient;
use crate::probe::ProbeCache;
use crate::registry::Registry;
use crate::report::{Outcome, Report, Summary, SuiteSummary, TestRecord};
use crate::state::SuiteState;
use crate::suite::{Suite, TestCase};

/// Default number of suites executing at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

const NOT_STARTED: &str = "not started: run timeout elapsed";

/// Executes every suite of a [`Registry`] and aggregates a [`Report`].
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use odata_harness::{HarnessConfig, Registry, Runner};
///
/// # async fn example(registry: Registry) -> Result<(), odata_harness::TransportError> {
/// let config = HarnessConfig::default();
/// let runner = Runner::from_config(&config)?
///     .with_concurrency(2)
///     .with_run_timeout(Some(Duration::from_secs(300)));
/// let report = runner.run(&registry).await;
/// println!("{} failed", report.summary().failed);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Runner {
    client: Arc<HttpClient>,
    concurrency: usize,
    run_timeout: Option<Duration>,
    probes: Arc<ProbeCache>,
}

impl Runner {
    /// Creates a runner that uses the process-wide probe cache.
    pub fn new(client: HttpClient) -> Self {
        Self {
            client: Arc::new(client),
            concurrency: DEFAULT_CONCURRENCY,
            run_timeout: None,
            probes: ProbeCache::global(),
        }
    }

    /// Creates a runner from configuration.
    pub fn from_config(config: &HarnessConfig) -> Result<Self, TransportError> {
        Ok(Self::new(HttpClient::new(config)?)
            .with_concurrency(config.concurrency)
            .with_run_timeout(config.run_timeout_duration()))
    }

    /// Sets how many suites may execute at once (at least one).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets the run deadline, measured from the start of [`run`](Self::run).
    pub fn with_run_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Replaces the probe cache, for example to isolate tests.
    pub fn with_probe_cache(mut self, probes: Arc<ProbeCache>) -> Self {
        self.probes = probes;
        self
    }

    /// Runs every suite and returns the report.
    ///
    /// Every registered test appears in the report exactly once, in registry
    /// order, whatever happened to it.
    pub async fn run(&self, registry: &Registry) -> Report {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let deadline = self.run_timeout.map(|t| Instant::now() + t);

        info!(
            run_id = %run_id,
            server = %self.client.base_url(),
            suites = registry.len(),
            tests = registry.test_count(),
            concurrency = self.concurrency,
            "Starting conformance run"
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<(usize, SuiteSummary, Vec<TestRecord>)> = JoinSet::new();

        for (index, suite) in registry.suites().iter().enumerate() {
            let suite = Arc::clone(suite);
            let client = Arc::clone(&self.client);
            let probes = Arc::clone(&self.probes);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                // The semaphore is never closed; a failed acquire just runs unbounded.
                let _permit = semaphore.acquire_owned().await.ok();
                let (summary, records) = run_suite(&suite, client, probes, deadline).await;
                (index, summary, records)
            });
        }

        let mut completed: HashMap<usize, (SuiteSummary, Vec<TestRecord>)> = HashMap::new();
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok((index, summary, records)) => {
                    completed.insert(index, (summary, records));
                }
                Err(e) => {
                    warn!(error = %e, "Suite task join error");
                }
            }
        }

        let suites = registry
            .suites()
            .iter()
            .enumerate()
            .map(|(index, suite)| {
                completed
                    .remove(&index)
                    .unwrap_or_else(|| aborted_suite(suite))
            })
            .collect();

        let report = Report::new(
            run_id,
            self.client.base_url(),
            started_at,
            Utc::now(),
            suites,
        );

        let summary = report.summary();
        info!(
            run_id = %run_id,
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            duration_ms = report.duration_ms(),
            "Conformance run finished"
        );

        report
    }
}

async fn run_suite(
    suite: &Suite,
    client: Arc<HttpClient>,
    probes: Arc<ProbeCache>,
    deadline: Option<Instant>,
) -> (SuiteSummary, Vec<TestRecord>) {
    let started = Instant::now();
    let state = SuiteState::new(suite.name());
    debug!(suite = %suite.name(), tests = suite.len(), "Running suite");

    let mut records = Vec::with_capacity(suite.len());
    for test in suite.tests() {
        let record = run_test(suite, test, &client, &probes, &state, deadline).await;
        records.push(record);
    }

    let summary = SuiteSummary {
        name: suite.name().to_string(),
        spec_reference: suite.spec_reference().to_string(),
        summary: Summary::from_records(&records),
        duration_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        suite = %summary.name,
        passed = summary.summary.passed,
        failed = summary.summary.failed,
        skipped = summary.summary.skipped,
        "Suite finished"
    );

    (summary, records)
}

async fn run_test(
    suite: &Suite,
    test: &TestCase,
    client: &Arc<HttpClient>,
    probes: &Arc<ProbeCache>,
    state: &SuiteState,
    deadline: Option<Instant>,
) -> TestRecord {
    let logs = LogSink::default();
    let started = Instant::now();

    let outcome = if deadline.is_some_and(|d| started >= d) {
        Outcome::failed(NOT_STARTED)
    } else {
        let ctx = TestContext::new(
            Arc::clone(client),
            state.clone(),
            Arc::clone(probes),
            logs.clone(),
            test.name(),
        );
        let mut handle = tokio::spawn(test.invoke(ctx));

        let joined = match deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(joined) => Some(joined),
                Err(_) => {
                    handle.abort();
                    None
                }
            },
            None => Some(handle.await),
        };

        match joined {
            Some(Ok(result)) => Outcome::from_result(result),
            Some(Err(e)) if e.is_panic() => Outcome::failed(format!(
                "test panicked: {}",
                panic_message(e.into_panic())
            )),
            Some(Err(e)) => Outcome::failed(format!("test task was cancelled: {e}")),
            None => Outcome::failed("run timeout elapsed while the test was running"),
        }
    };

    let duration_ms = started.elapsed().as_millis() as u64;
    match &outcome {
        Outcome::Failed { message } => {
            warn!(suite = %suite.name(), test = %test.name(), error = %message, "Test failed")
        }
        other => {
            debug!(suite = %suite.name(), test = %test.name(), outcome = %other.kind(), duration_ms, "Test finished")
        }
    }

    TestRecord {
        suite: suite.name().to_string(),
        test: test.name().to_string(),
        description: test.description().to_string(),
        citation: test.citation().map(str::to_string),
        outcome,
        duration_ms,
        logs: logs.lines(),
    }
}

/// Records for a suite whose task never reported back.
fn aborted_suite(suite: &Suite) -> (SuiteSummary, Vec<TestRecord>) {
    let records: Vec<TestRecord> = suite
        .tests()
        .iter()
        .map(|test| TestRecord {
            suite: suite.name().to_string(),
            test: test.name().to_string(),
            description: test.description().to_string(),
            citation: test.citation().map(str::to_string),
            outcome: Outcome::failed("suite task aborted before reporting"),
            duration_ms: 0,
            logs: Vec::new(),
        })
        .collect();

    let summary = SuiteSummary {
        name: suite.name().to_string(),
        spec_reference: suite.spec_reference().to_string(),
        summary: Summary::from_records(&records),
        duration_ms: 0,
    };
    (summary, records)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(42_u8)), "unknown panic payload");
    }

    #[test]
    fn test_concurrency_is_at_least_one() {
        let client = HttpClient::with_defaults("http://127.0.0.1:9", Vec::new(), Duration::from_secs(1))
            .unwrap();
        let runner = Runner::new(client).with_concurrency(0);
        assert_eq!(runner.concurrency, 1);
    }

    #[test]
    fn test_aborted_suite_marks_every_test_failed() {
        async fn noop(_ctx: TestContext) -> crate::TestResult {
            Ok(())
        }
        let mut suite = Suite::new("S", "", "");
        suite.add_test("a", "", noop).add_test("b", "", noop);

        let (summary, records) = aborted_suite(&suite);
        assert_eq!(summary.summary.failed, 2);
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_registry_produces_empty_report() {
        let client = HttpClient::with_defaults("http://127.0.0.1:9", Vec::new(), Duration::from_secs(1))
            .unwrap();
        let report = Runner::new(client)
            .with_probe_cache(Arc::new(ProbeCache::new()))
            .run(&Registry::new())
            .await;
        assert_eq!(report.summary().total, 0);
        assert!(report.is_success());
    }
}
