//! OData conformance runner
//!
//! Runs the OData v4/v4.01 conformance suites against a live service and
//! prints the report. Exits 0 when no test failed, 1 when any test failed
//! and 2 when the configuration is invalid.

mod render;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use odata_harness::{ConfigError, HarnessConfig, Report, ReportFormat, Runner, init_logging};
use tracing::info;

use render::TextReport;

fn render(report: &Report, config: &HarnessConfig) -> anyhow::Result<String> {
    Ok(match config.format {
        ReportFormat::Text => TextReport::new(report, config.verbose).to_string(),
        ReportFormat::Json => report.to_json().context("Failed to serialize report")?,
    })
}

fn emit(rendered: &str, config: &HarnessConfig) -> anyhow::Result<()> {
    match &config.output {
        Some(path) => {
            std::fs::write(path, format!("{rendered}\n"))
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = HarnessConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        eprintln!("{}", ConfigError { errors });
        return Ok(ExitCode::from(2));
    }

    let registry = match odata_suites::registry()?.filtered(&config.suites) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return Ok(ExitCode::from(2));
        }
    };
    info!(
        server_url = %config.server_url,
        suites = registry.len(),
        tests = registry.test_count(),
        concurrency = config.concurrency,
        "Starting OData conformance run"
    );

    let runner = Runner::from_config(&config)?;
    let report = runner.run(&registry).await;

    let rendered = render(&report, &config)?;
    emit(&rendered, &config)?;

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
