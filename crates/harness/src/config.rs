//! Harness configuration.
//!
//! Configuration comes from command line flags with environment variable
//! fallbacks, or is built programmatically.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `ODATA_SERVER_URL` | http://localhost:9090 | Service root under test |
//! | `ODATA_REQUEST_TIMEOUT` | 30 | Per-request timeout (seconds) |
//! | `ODATA_RUN_TIMEOUT` | 0 | Whole-run timeout (seconds, 0 for none) |
//! | `ODATA_CONCURRENCY` | 4 | Suites executing at once |
//! | `ODATA_MAX_VERSION` | 4.01 | Default `OData-MaxVersion` header |
//! | `ODATA_LOG_LEVEL` | info | Log level |
//! | `ODATA_SUITES` | (all) | Comma-separated suite filter |
//! | `ODATA_REPORT_FORMAT` | text | Report format (`text` or `json`) |
//! | `ODATA_REPORT_OUTPUT` | (stdout) | Report file |
//!
//! # Example
//!
//! ```rust
//! use odata_harness::HarnessConfig;
//!
//! let config = HarnessConfig {
//!     server_url: "http://localhost:8080/odata".to_string(),
//!     concurrency: 2,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use crate::http::Header;

/// Protocol versions a client may advertise in `OData-MaxVersion`.
pub const SUPPORTED_VERSIONS: [&str; 2] = ["4.0", "4.01"];

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// How the run report is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable summary.
    #[default]
    Text,
    /// The full report as JSON.
    Json,
}

/// Configuration for a conformance run.
#[derive(Debug, Clone, Parser)]
#[command(name = "odata-conformance")]
#[command(about = "OData v4/v4.01 protocol conformance test runner")]
pub struct HarnessConfig {
    /// Service root URL of the OData service under test.
    #[arg(long, env = "ODATA_SERVER_URL", default_value = "http://localhost:9090")]
    pub server_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "ODATA_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Whole-run timeout in seconds (0 disables it).
    #[arg(long, env = "ODATA_RUN_TIMEOUT", default_value = "0")]
    pub run_timeout: u64,

    /// Maximum number of suites executing at once.
    #[arg(short = 'j', long, env = "ODATA_CONCURRENCY", default_value = "4")]
    pub concurrency: usize,

    /// Value of the default `OData-MaxVersion` request header.
    #[arg(long, env = "ODATA_MAX_VERSION", default_value = "4.01")]
    pub odata_max_version: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "ODATA_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Suites to run (repeatable or comma-separated; all when omitted).
    #[arg(short, long = "suite", env = "ODATA_SUITES", value_delimiter = ',')]
    pub suites: Vec<String>,

    /// Report format.
    #[arg(long, env = "ODATA_REPORT_FORMAT", value_enum, default_value = "text")]
    pub format: ReportFormat,

    /// Write the report to this file instead of stdout.
    #[arg(short, long, env = "ODATA_REPORT_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Include per-test log lines in the text report.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:9090".to_string(),
            request_timeout: 30,
            run_timeout: 0,
            concurrency: 4,
            odata_max_version: "4.01".to_string(),
            log_level: "info".to_string(),
            suites: Vec::new(),
            format: ReportFormat::Text,
            output: None,
            verbose: false,
        }
    }
}

impl HarnessConfig {
    /// Returns the per-request timeout.
    pub fn request_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Returns the run timeout, or `None` when disabled.
    pub fn run_timeout_duration(&self) -> Option<Duration> {
        (self.run_timeout > 0).then(|| Duration::from_secs(self.run_timeout))
    }

    /// Returns the headers sent with every request.
    pub fn default_headers(&self) -> Vec<Header> {
        vec![
            Header::accept("application/json"),
            Header::odata_max_version(self.odata_max_version.as_str()),
        ]
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        match url::Url::parse(&self.server_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(format!(
                "Server URL must use http or https, got '{}'",
                url.scheme()
            )),
            Err(e) => errors.push(format!("Server URL '{}' is invalid: {e}", self.server_url)),
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.concurrency == 0 {
            errors.push("Concurrency cannot be 0".to_string());
        }

        if !SUPPORTED_VERSIONS.contains(&self.odata_max_version.as_str()) {
            errors.push(format!(
                "OData max version must be one of {}, got '{}'",
                SUPPORTED_VERSIONS.join(", "),
                self.odata_max_version
            ));
        }

        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            errors.push(format!("Unknown log level '{}'", self.log_level));
        }

        if self.suites.iter().any(|s| s.trim().is_empty()) {
            errors.push("Suite names cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing against a local stub.
    pub fn for_testing() -> Self {
        Self {
            server_url: "http://127.0.0.1:0".to_string(),
            request_timeout: 5, // Shorter timeout for tests
            log_level: "debug".to_string(),
            concurrency: 2,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.server_url, "http://localhost:9090");
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.run_timeout_duration(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_headers() {
        let config = HarnessConfig {
            odata_max_version: "4.0".to_string(),
            ..Default::default()
        };
        let headers = config.default_headers();
        assert_eq!(headers[0], Header::accept("application/json"));
        assert_eq!(headers[1], Header::odata_max_version("4.0"));
    }

    #[test]
    fn test_validate_collects_every_error() {
        let config = HarnessConfig {
            server_url: "ftp://example.org".to_string(),
            request_timeout: 0,
            concurrency: 0,
            odata_max_version: "3.0".to_string(),
            log_level: "loud".to_string(),
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().any(|e| e.contains("http or https")));
    }

    #[test]
    fn test_parse_flags() {
        let config = HarnessConfig::try_parse_from([
            "odata-conformance",
            "--server-url",
            "http://svc/odata",
            "--suite",
            "Metadata,Batch",
            "-s",
            "ErrorResponses",
            "--format",
            "json",
            "--run-timeout",
            "60",
        ])
        .unwrap();
        assert_eq!(config.server_url, "http://svc/odata");
        assert_eq!(config.suites, vec!["Metadata", "Batch", "ErrorResponses"]);
        assert_eq!(config.format, ReportFormat::Json);
        assert_eq!(config.run_timeout_duration(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_unparsable_value_is_an_error() {
        let err = HarnessConfig::try_parse_from(["odata-conformance", "--concurrency", "abc"])
            .unwrap_err();
        assert!(err.to_string().contains("'abc'"));
    }

    #[test]
    fn test_for_testing() {
        let config = HarnessConfig::for_testing();
        assert_eq!(config.request_timeout, 5);
        assert_eq!(config.log_level, "debug");
    }
}
