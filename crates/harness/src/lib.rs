//! # odata-harness
//!
//! Test harness engine for OData v4/v4.01 protocol conformance suites.
//!
//! The harness drives a live OData service over HTTP, evaluates responses
//! against protocol requirements, and aggregates pass/fail/skip outcomes
//! into a [`Report`]. It is the engine only; the conformance suites
//! themselves live in the `odata-suites` crate.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌─────────────────────────────┐
//! │   Registry   │──▶│    Runner    │──▶│ TestContext (one per test)  │
//! │ Suite/Test   │   │ JoinSet +    │   │ requests · assertions ·     │
//! └──────────────┘   │ Semaphore    │   │ skip/fail · log             │
//!                    └──────┬───────┘   └──────┬───────────┬──────────┘
//!                           │                  │           │
//!                           ▼                  ▼           ▼
//!                    ┌──────────────┐   ┌────────────┐ ┌────────────┐
//!                    │    Report    │   │ HttpClient │ │ SuiteState │
//!                    └──────────────┘   └────────────┘ │ ProbeCache │
//!                                                      └────────────┘
//! ```
//!
//! ## Writing a test
//!
//! ```rust
//! use odata_harness::{Header, Suite, TestContext, TestResult, fixtures};
//!
//! async fn entity_by_key(ctx: TestContext) -> TestResult {
//!     // no entities is an environment gap, so `?` turns it into a skip
//!     let path = fixtures::first_entity_path(&ctx, "Products").await?;
//!     let response = ctx.get(&path, &[Header::odata_max_version("4.0")]).await?;
//!     ctx.assert_status(&response, 200)?;
//!     ctx.assert_header_exists(&response, "OData-Version")?;
//!     Ok(())
//! }
//!
//! let mut suite = Suite::new("EntityAccess", "Addressing entities", "https://example.org");
//! suite.add_test("entity_by_key", "GET Collection(key) returns the entity", entity_by_key);
//! ```

pub mod assertions;
pub mod classify;
pub mod config;
pub mod context;
pub mod csdl;
pub mod error;
pub mod fixtures;
pub mod http;
pub mod probe;
pub mod registry;
pub mod report;
pub mod runner;
pub mod state;
pub mod suite;

pub use classify::{StatusClass, StatusPolicy, classify};
pub use config::{HarnessConfig, ReportFormat};
pub use context::{LogSink, TestContext};
pub use error::{
    AssertionFailure, ConfigError, FixtureError, RegistryError, TestError, TestResult,
    TransportError,
};
pub use http::{Header, HttpClient, Method, Response};
pub use probe::ProbeCache;
pub use registry::Registry;
pub use report::{Outcome, OutcomeKind, Report, SuiteSummary, Summary, TestRecord};
pub use runner::Runner;
pub use state::SuiteState;
pub use suite::{Suite, TestCase};

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the harness, suites and CLI crates
/// log at `level`.
///
/// # Arguments
///
/// * `level` - Default log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "odata_harness={level},odata_suites={level},odata_conformance={level}"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
