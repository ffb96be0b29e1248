//! `$batch` suite.

use odata_harness::{Header, StatusPolicy, Suite, TestContext, TestResult, fixtures};
use serde_json::{Value, json};

use crate::multipart::{BatchBuilder, BatchRequest, boundary_of, count_status_lines};
use crate::support::{PRODUCTS, PROTOCOL_SPEC, section};

/// Builds the suite.
pub fn suite() -> Suite {
    let mut suite = Suite::new(
        "Batch",
        "Multipart and JSON $batch requests",
        section(PROTOCOL_SPEC, "sec_BatchRequests"),
    );
    suite
        .add_cited_test(
            "multipart_two_gets",
            "A multipart batch with two GET parts yields two 200 responses",
            "11.7.7",
            multipart_two_gets,
        )
        .add_cited_test(
            "multipart_changeset_create",
            "A change set with a POST yields a 201 response part",
            "11.7.3",
            multipart_changeset_create,
        )
        .add_cited_test(
            "malformed_batch_rejected",
            "A body that is not valid multipart fails with 400",
            "11.7.2",
            malformed_batch_rejected,
        )
        .add_cited_test(
            "json_batch",
            "A JSON batch returns a 'responses' array (optional, 4.01)",
            "11.7.1",
            json_batch,
        );
    suite
}

fn batch_policy() -> StatusPolicy {
    StatusPolicy::expect(&[200]).tolerating(&[404, 405, 415, 501])
}

async fn multipart_two_gets(ctx: TestContext) -> TestResult {
    let batch = BatchBuilder::new()
        .request(BatchRequest::get(format!("{PRODUCTS}?$top=1")))
        .request(BatchRequest::get(format!("{PRODUCTS}?$top=2")));

    let response = ctx
        .post_raw("$batch", batch.build(), &batch.content_type(), &[])
        .await?;
    ctx.require_status_with(&response, &batch_policy(), "$batch")?;
    ctx.assert_header_contains(&response, "Content-Type", "multipart/mixed")?;

    let content_type = response.content_type().unwrap_or_default();
    if boundary_of(content_type).is_none() {
        return ctx.fail(format!("batch response content type '{content_type}' has no boundary"));
    }

    let ok = count_status_lines(&response.text(), 200);
    if ok < 2 {
        return ctx.fail(format!("expected at least two 200 responses in the batch, found {ok}"));
    }
    Ok(())
}

async fn multipart_changeset_create(ctx: TestContext) -> TestResult {
    let payload = fixtures::minimal_entity_payload(PRODUCTS);
    let batch = BatchBuilder::new().changeset(vec![
        BatchRequest::post_json(PRODUCTS, &payload).with_content_id("1"),
    ]);

    let response = ctx
        .post_raw("$batch", batch.build(), &batch.content_type(), &[])
        .await?;
    ctx.require_status_with(&response, &batch_policy(), "$batch change sets")?;

    let created = count_status_lines(&response.text(), 201);
    if created != 1 {
        return ctx.fail(format!("expected one 201 response in the change set, found {created}"));
    }
    Ok(())
}

async fn malformed_batch_rejected(ctx: TestContext) -> TestResult {
    let response = ctx
        .post_raw(
            "$batch",
            "this is not a multipart body",
            "multipart/mixed;boundary=conformance_batch",
            &[],
        )
        .await?;
    ctx.assert_status(&response, 400)?;
    Ok(())
}

async fn json_batch(ctx: TestContext) -> TestResult {
    let body = json!({
        "requests": [
            { "id": "1", "method": "get", "url": format!("{PRODUCTS}?$top=1") },
            { "id": "2", "method": "get", "url": format!("{PRODUCTS}?$top=1") }
        ]
    });
    let response = ctx
        .post_json("$batch", &body, &[Header::odata_max_version("4.01")])
        .await?;
    // 4.0 services reject a JSON batch body as malformed multipart
    let policy = batch_policy().tolerating(&[400, 404, 405, 415, 501]);
    ctx.require_status_with(&response, &policy, "JSON $batch")?;

    let body = ctx.json_object(&response)?;
    let Some(Value::Array(responses)) = body.get("responses") else {
        return ctx.fail("JSON batch response has no 'responses' array");
    };
    if responses.len() != 2 {
        return ctx.fail(format!("expected 2 batch responses, got {}", responses.len()));
    }
    if let Some(bad) = responses
        .iter()
        .find(|r| r.get("status").and_then(Value::as_u64) != Some(200))
    {
        return ctx.fail(format!("batch response part did not succeed: {bad}"));
    }
    Ok(())
}
