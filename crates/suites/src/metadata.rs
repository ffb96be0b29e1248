//! Metadata document suite.

use odata_harness::{Header, StatusPolicy, Suite, TestContext, TestResult, fixtures};

use crate::support::{PROTOCOL_SPEC, section};

/// Builds the suite.
pub fn suite() -> Suite {
    let mut suite = Suite::new(
        "Metadata",
        "The $metadata resource returns a CSDL document describing the service",
        section(PROTOCOL_SPEC, "sec_MetadataDocumentRequest"),
    );
    suite
        .add_cited_test(
            "returns_xml",
            "GET $metadata returns 200 with an XML content type",
            "11.1.2",
            returns_xml,
        )
        .add_test(
            "edmx_root",
            "The document root is edmx:Edmx with a 4.0 or 4.01 Version",
            edmx_root,
        )
        .add_test(
            "declares_schema_namespace",
            "At least one Schema declares a Namespace",
            declares_schema_namespace,
        )
        .add_test(
            "declares_entity_container",
            "The document declares an EntityContainer",
            declares_entity_container,
        )
        .add_cited_test(
            "json_csdl",
            "JSON CSDL is served when requested (optional, 4.01)",
            "11.1.2",
            json_csdl,
        );
    suite
}

fn accept_xml() -> [Header; 1] {
    [Header::accept("application/xml")]
}

async fn returns_xml(ctx: TestContext) -> TestResult {
    let response = ctx.get("$metadata", &accept_xml()).await?;
    ctx.assert_status(&response, 200)?;
    ctx.assert_header_contains(&response, "Content-Type", "application/xml")?;
    Ok(())
}

async fn edmx_root(ctx: TestContext) -> TestResult {
    let response = ctx.get("$metadata", &accept_xml()).await?;
    ctx.assert_status(&response, 200)?;
    ctx.assert_body_contains(&response, "<edmx:Edmx")?;

    let text = response.text();
    if !(text.contains("Version=\"4.0\"") || text.contains("Version=\"4.01\"")) {
        return ctx.fail("edmx:Edmx must declare Version=\"4.0\" or Version=\"4.01\"");
    }
    Ok(())
}

async fn declares_schema_namespace(ctx: TestContext) -> TestResult {
    match fixtures::service_namespace(&ctx).await {
        Some(namespace) => {
            ctx.log(format!("schema namespace: {namespace}"));
            Ok(())
        }
        None => ctx.fail("no Schema element with a Namespace attribute found in $metadata"),
    }
}

async fn declares_entity_container(ctx: TestContext) -> TestResult {
    let response = ctx.get("$metadata", &accept_xml()).await?;
    ctx.assert_status(&response, 200)?;
    ctx.assert_body_contains(&response, "<EntityContainer")?;
    Ok(())
}

async fn json_csdl(ctx: TestContext) -> TestResult {
    let response = ctx
        .get("$metadata", &[Header::accept("application/json")])
        .await?;
    let policy = StatusPolicy::expect(&[200]).tolerating(&[404, 406, 415, 501]);
    ctx.require_status_with(&response, &policy, "JSON CSDL")?;

    ctx.assert_header_contains(&response, "Content-Type", "application/json")?;
    ctx.assert_json_field(&response, "$Version")?;
    Ok(())
}
