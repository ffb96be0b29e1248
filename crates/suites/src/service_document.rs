//! Service document suite.

use odata_harness::{Suite, TestContext, TestResult};
use serde_json::Value;

use crate::support::{PROTOCOL_SPEC, assert_odata_version, section, value_array};

/// Builds the suite.
pub fn suite() -> Suite {
    let mut suite = Suite::new(
        "ServiceDocument",
        "The service root returns a JSON service document listing its resources",
        section(PROTOCOL_SPEC, "sec_ServiceDocumentRequest"),
    );
    suite
        .add_cited_test(
            "returns_json",
            "GET on the service root returns 200 with a JSON content type",
            "11.1.1",
            returns_json,
        )
        .add_cited_test(
            "has_context_url",
            "The service document carries an @odata.context pointing at $metadata",
            "JSON 5",
            has_context_url,
        )
        .add_cited_test(
            "lists_resources",
            "Every entry of 'value' has a name and a url",
            "JSON 5",
            lists_resources,
        )
        .add_test(
            "declares_version",
            "The response carries a supported OData-Version header",
            declares_version,
        )
        .add_test(
            "entity_sets_are_addressable",
            "The first advertised entity set can be read",
            entity_sets_are_addressable,
        );
    suite
}

async fn returns_json(ctx: TestContext) -> TestResult {
    let response = ctx.get("", &[]).await?;
    ctx.assert_status(&response, 200)?;
    ctx.assert_header_contains(&response, "Content-Type", "application/json")?;
    Ok(())
}

async fn has_context_url(ctx: TestContext) -> TestResult {
    let response = ctx.get("", &[]).await?;
    ctx.assert_status(&response, 200)?;
    ctx.assert_body_contains(&response, "@odata.context")?;

    let body = ctx.json_object(&response)?;
    match body.get("@odata.context").and_then(Value::as_str) {
        Some(context) if context.ends_with("$metadata") => Ok(()),
        Some(context) => ctx.fail(format!(
            "@odata.context should reference $metadata, got '{context}'"
        )),
        None => ctx.fail("@odata.context is not a string"),
    }
}

async fn lists_resources(ctx: TestContext) -> TestResult {
    let response = ctx.get("", &[]).await?;
    ctx.assert_status(&response, 200)?;

    for entry in value_array(&ctx, &response)? {
        let name = entry.get("name").and_then(Value::as_str);
        let url = entry.get("url").and_then(Value::as_str);
        if name.is_none() || url.is_none() {
            return ctx.fail(format!("service document entry lacks name or url: {entry}"));
        }
    }
    Ok(())
}

async fn declares_version(ctx: TestContext) -> TestResult {
    let response = ctx.get("", &[]).await?;
    ctx.assert_status(&response, 200)?;
    assert_odata_version(&response)?;
    Ok(())
}

async fn entity_sets_are_addressable(ctx: TestContext) -> TestResult {
    let response = ctx.get("", &[]).await?;
    ctx.assert_status(&response, 200)?;

    let entity_set = value_array(&ctx, &response)?.into_iter().find_map(|entry| {
        let is_set = entry
            .get("kind")
            .and_then(Value::as_str)
            .is_none_or(|kind| kind == "EntitySet");
        let url = entry.get("url").and_then(Value::as_str)?.to_string();
        is_set.then_some(url)
    });
    let Some(url) = entity_set else {
        return ctx.skip("service document advertises no entity sets");
    };

    ctx.log(format!("reading entity set {url}"));
    let response = ctx.get(&format!("{url}?$top=1"), &[]).await?;
    ctx.assert_status(&response, 200)?;
    value_array(&ctx, &response)?;
    Ok(())
}
