//! Protocol version header suite.
//!
//! One definition per header: `OData-MaxVersion` negotiation is checked
//! strictly, expecting the service to answer within the requested maximum.

use odata_harness::{Header, Suite, TestContext, TestResult};

use crate::support::{PROTOCOL_SPEC, assert_odata_version, section};

/// Builds the suite.
pub fn suite() -> Suite {
    let mut suite = Suite::new(
        "VersionHeaders",
        "OData-Version and OData-MaxVersion negotiation",
        section(PROTOCOL_SPEC, "sec_HeaderODataVersion"),
    );
    suite
        .add_cited_test(
            "response_declares_version",
            "Responses carry OData-Version 4.0 or 4.01",
            "8.1.5",
            response_declares_version,
        )
        .add_cited_test(
            "max_version_40",
            "OData-MaxVersion: 4.0 yields OData-Version: 4.0",
            "8.2.7",
            max_version_40,
        )
        .add_cited_test(
            "max_version_401",
            "OData-MaxVersion: 4.01 yields OData-Version 4.0 or 4.01",
            "8.2.7",
            max_version_401,
        )
        .add_cited_test(
            "unsupported_version_rejected",
            "A request with an unsupported OData-Version fails with 400",
            "8.2.6",
            unsupported_version_rejected,
        )
        .add_cited_test(
            "version_on_error_responses",
            "Error responses also carry OData-Version",
            "8.1.5",
            version_on_error_responses,
        );
    suite
}

async fn response_declares_version(ctx: TestContext) -> TestResult {
    let response = ctx.get("", &[]).await?;
    ctx.assert_status(&response, 200)?;
    assert_odata_version(&response)?;
    Ok(())
}

async fn max_version_40(ctx: TestContext) -> TestResult {
    let response = ctx.get("", &[Header::odata_max_version("4.0")]).await?;
    ctx.assert_status(&response, 200)?;
    ctx.assert_header_equals(&response, "OData-Version", "4.0")?;
    Ok(())
}

async fn max_version_401(ctx: TestContext) -> TestResult {
    let response = ctx.get("", &[Header::odata_max_version("4.01")]).await?;
    ctx.assert_status(&response, 200)?;
    assert_odata_version(&response)?;

    let version = response.header("OData-Version").unwrap_or_default();
    ctx.log(format!("negotiated OData-Version {version}"));
    Ok(())
}

async fn unsupported_version_rejected(ctx: TestContext) -> TestResult {
    let response = ctx.get("", &[Header::odata_version("99.0")]).await?;
    ctx.assert_status(&response, 400)?;
    Ok(())
}

async fn version_on_error_responses(ctx: TestContext) -> TestResult {
    let response = ctx.get("ConformanceNoSuchEntitySet", &[]).await?;
    ctx.assert_status(&response, 404)?;
    assert_odata_version(&response)?;
    Ok(())
}
