//! Error response suite.
//!
//! Registered once, at the strict level: every 4xx the service returns for a
//! bad request must carry a JSON `error` object with `code` and `message`.

use odata_harness::{Method, Suite, TestContext, TestResult};
use serde_json::Value;

use crate::support::{JSON_FORMAT_SPEC, PRODUCTS, error_object, section};

/// Builds the suite.
pub fn suite() -> Suite {
    let mut suite = Suite::new(
        "ErrorResponses",
        "Error responses use the OData JSON error format",
        section(JSON_FORMAT_SPEC, "sec_ErrorResponse"),
    );
    suite
        .add_cited_test(
            "not_found_error_body",
            "A missing entity set returns 404 with an error object",
            "21",
            not_found_error_body,
        )
        .add_cited_test(
            "bad_filter_error",
            "An unparsable $filter returns 400 with an error object",
            "21",
            bad_filter_error,
        )
        .add_cited_test(
            "malformed_json_payload",
            "A truncated JSON payload returns 400 with an error object",
            "21",
            malformed_json_payload,
        )
        .add_test(
            "error_content_type",
            "Error bodies are served as application/json",
            error_content_type,
        )
        .add_test(
            "method_not_allowed",
            "PUT on an entity collection is rejected with 400 or 405",
            method_not_allowed,
        )
        .add_test(
            "error_details_shape",
            "Optional 'details' is an array of objects with code and message",
            error_details_shape,
        );
    suite
}

async fn not_found_error_body(ctx: TestContext) -> TestResult {
    let response = ctx.get("ConformanceNoSuchEntitySet", &[]).await?;
    ctx.assert_status(&response, 404)?;
    let error = error_object(&ctx, &response)?;
    ctx.log(format!("error code: {}", error["code"]));
    Ok(())
}

async fn bad_filter_error(ctx: TestContext) -> TestResult {
    let response = ctx
        .get(&format!("{PRODUCTS}?$filter=Name eq eq 'x'"), &[])
        .await?;
    ctx.assert_status(&response, 400)?;
    error_object(&ctx, &response)?;
    Ok(())
}

async fn malformed_json_payload(ctx: TestContext) -> TestResult {
    let response = ctx
        .post_raw(PRODUCTS, "{\"Name\": ", "application/json", &[])
        .await?;
    ctx.assert_status(&response, 400)?;
    error_object(&ctx, &response)?;
    Ok(())
}

async fn error_content_type(ctx: TestContext) -> TestResult {
    let response = ctx.get("ConformanceNoSuchEntitySet", &[]).await?;
    ctx.assert_status(&response, 404)?;
    ctx.assert_header_contains(&response, "Content-Type", "application/json")?;
    Ok(())
}

async fn method_not_allowed(ctx: TestContext) -> TestResult {
    let response = ctx.send(Method::PUT, PRODUCTS, &[]).await?;
    ctx.assert_status_in(&response, &[400, 405])?;
    Ok(())
}

async fn error_details_shape(ctx: TestContext) -> TestResult {
    let response = ctx
        .get(&format!("{PRODUCTS}?$filter=Name eq eq 'x'"), &[])
        .await?;
    ctx.assert_status(&response, 400)?;
    let error = error_object(&ctx, &response)?;

    let details = match error.get("details") {
        None => return ctx.skip("error object has no 'details' member"),
        Some(Value::Array(details)) => details,
        Some(other) => return ctx.fail(format!("'details' must be an array, got {other}")),
    };
    for detail in details {
        let well_formed = ["code", "message"]
            .iter()
            .all(|member| detail.get(*member).is_some_and(Value::is_string));
        if !well_formed {
            return ctx.fail(format!(
                "error detail must have string 'code' and 'message': {detail}"
            ));
        }
    }
    Ok(())
}
