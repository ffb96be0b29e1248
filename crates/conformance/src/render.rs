//! Plain-text report rendering.

use std::fmt;

use odata_harness::{OutcomeKind, Report, TestRecord};

/// Renders a [`Report`] as a terminal-friendly summary.
///
/// Failures and skips carry their message on the same line; `verbose` adds
/// every line the test logged underneath it.
pub struct TextReport<'a> {
    report: &'a Report,
    verbose: bool,
}

impl<'a> TextReport<'a> {
    pub fn new(report: &'a Report, verbose: bool) -> Self {
        Self { report, verbose }
    }

    fn write_record(&self, f: &mut fmt::Formatter<'_>, record: &TestRecord) -> fmt::Result {
        write!(f, "  {}  {}", record.outcome.kind(), record.test)?;
        if let Some(citation) = &record.citation {
            write!(f, " [{citation}]")?;
        }
        if let Some(detail) = record.outcome.detail() {
            write!(f, ": {detail}")?;
        }
        writeln!(f)?;

        let show_logs = self.verbose || record.outcome.kind() == OutcomeKind::Failed;
        if show_logs {
            for line in &record.logs {
                writeln!(f, "        {line}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        writeln!(f, "OData conformance report")?;
        writeln!(f, "Server:   {}", report.server_url)?;
        writeln!(f, "Run:      {}", report.run_id)?;
        writeln!(
            f,
            "Started:  {} ({} ms)",
            report.started_at.to_rfc3339(),
            report.duration_ms()
        )?;

        for suite in report.suite_summaries() {
            let counts = suite.summary;
            writeln!(f)?;
            writeln!(
                f,
                "{} ({} passed, {} failed, {} skipped)",
                suite.name, counts.passed, counts.failed, counts.skipped
            )?;
            if !suite.spec_reference.is_empty() {
                writeln!(f, "  {}", suite.spec_reference)?;
            }
            for record in report.records().iter().filter(|r| r.suite == suite.name) {
                self.write_record(f, record)?;
            }
        }

        let summary = report.summary();
        writeln!(f)?;
        writeln!(
            f,
            "Total: {} tests, {} passed, {} failed, {} skipped",
            summary.total, summary.passed, summary.failed, summary.skipped
        )?;
        write!(f, "Result: {}", if report.is_success() { "PASS" } else { "FAIL" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use odata_harness::{Outcome, SuiteSummary, Summary};
    use uuid::Uuid;

    fn record(test: &str, outcome: Outcome, logs: &[&str]) -> TestRecord {
        TestRecord {
            suite: "Batch".to_string(),
            test: test.to_string(),
            description: String::new(),
            citation: Some("11.7".to_string()),
            outcome,
            duration_ms: 3,
            logs: logs.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn report() -> Report {
        let records = vec![
            record("two_gets", Outcome::Passed, &["sent 2 parts"]),
            record("changeset", Outcome::failed("expected 201, got 500"), &["POST Products"]),
            record(
                "json",
                Outcome::Skipped {
                    reason: "JSON $batch not supported".to_string(),
                },
                &[],
            ),
        ];
        let suite = SuiteSummary {
            name: "Batch".to_string(),
            spec_reference: "https://example.org/batch".to_string(),
            summary: Summary::from_records(&records),
            duration_ms: 9,
        };
        let now = Utc::now();
        Report::new(Uuid::nil(), "http://localhost:9090", now, now, vec![(suite, records)])
    }

    #[test]
    fn test_lines_per_outcome() {
        let text = TextReport::new(&report(), false).to_string();

        assert!(text.contains("Batch (1 passed, 1 failed, 1 skipped)"));
        assert!(text.contains("  PASS  two_gets [11.7]\n"));
        assert!(text.contains("  FAIL  changeset [11.7]: expected 201, got 500\n"));
        assert!(text.contains("  SKIP  json [11.7]: JSON $batch not supported\n"));
        assert!(text.contains("Total: 3 tests, 1 passed, 1 failed, 1 skipped"));
        assert!(text.ends_with("Result: FAIL"));
    }

    #[test]
    fn test_logs_shown_for_failures_or_when_verbose() {
        let quiet = TextReport::new(&report(), false).to_string();
        assert!(quiet.contains("POST Products"));
        assert!(!quiet.contains("sent 2 parts"));

        let verbose = TextReport::new(&report(), true).to_string();
        assert!(verbose.contains("sent 2 parts"));
    }
}
