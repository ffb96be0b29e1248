//! Conditional request suite (ETags, If-Match, If-None-Match).

use odata_harness::{Header, Suite, TestContext, TestError, TestResult, fixtures};
use serde_json::json;

use crate::support::{PRODUCTS, PROTOCOL_SPEC, section};

/// Builds the suite.
pub fn suite() -> Suite {
    let mut suite = Suite::new(
        "ConditionalRequests",
        "ETags and If-Match / If-None-Match preconditions",
        section(PROTOCOL_SPEC, "sec_UseofETagsforAvoidingUpdateConflicts"),
    );
    suite
        .add_cited_test(
            "etag_on_entity",
            "A single entity response carries an ETag that matches @odata.etag",
            "8.3.1",
            etag_on_entity,
        )
        .add_cited_test(
            "if_none_match_not_modified",
            "GET with a matching If-None-Match returns 304",
            "8.2.5",
            if_none_match_not_modified,
        )
        .add_cited_test(
            "if_match_mismatch_rejected",
            "PATCH with a stale If-Match fails with 412",
            "8.2.4",
            if_match_mismatch_rejected,
        )
        .add_cited_test(
            "if_none_match_star_on_existing",
            "PATCH with If-None-Match: * on an existing entity fails with 412",
            "8.2.5",
            if_none_match_star_on_existing,
        );
    suite
}

/// Returns the first product's path and ETag, skipping when the service
/// does not use ETags.
async fn etagged_entity(ctx: &TestContext) -> Result<(String, String), TestError> {
    let path = fixtures::first_entity_path(ctx, PRODUCTS).await?;
    let response = ctx.get(&path, &[]).await?;
    ctx.assert_status(&response, 200)?;

    match response.header("ETag") {
        Some(etag) => Ok((path, etag.to_string())),
        None => Err(TestError::Skipped(format!(
            "{path} has no ETag; the service does not use optimistic concurrency"
        ))),
    }
}

async fn etag_on_entity(ctx: TestContext) -> TestResult {
    let (path, etag) = etagged_entity(&ctx).await?;
    let response = ctx.get(&path, &[]).await?;
    ctx.assert_status(&response, 200)?;

    let body = ctx.json_object(&response)?;
    if let Some(annotation) = body.get("@odata.etag").and_then(|v| v.as_str())
        && annotation != etag
    {
        return ctx.fail(format!(
            "@odata.etag '{annotation}' differs from the ETag header '{etag}'"
        ));
    }
    Ok(())
}

async fn if_none_match_not_modified(ctx: TestContext) -> TestResult {
    let (path, etag) = etagged_entity(&ctx).await?;
    let response = ctx.get(&path, &[Header::if_none_match(etag)]).await?;
    ctx.assert_status(&response, 304)?;
    Ok(())
}

async fn if_match_mismatch_rejected(ctx: TestContext) -> TestResult {
    let (path, _) = etagged_entity(&ctx).await?;
    let response = ctx
        .patch_json(
            &path,
            &json!({}),
            &[Header::if_match("W/\"conformance-stale-etag\"")],
        )
        .await?;
    ctx.assert_status(&response, 412)?;
    Ok(())
}

async fn if_none_match_star_on_existing(ctx: TestContext) -> TestResult {
    let (path, _) = etagged_entity(&ctx).await?;
    let response = ctx
        .patch_json(&path, &json!({}), &[Header::if_none_match("*")])
        .await?;
    ctx.assert_status(&response, 412)?;
    Ok(())
}
