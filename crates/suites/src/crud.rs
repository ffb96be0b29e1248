//! Entity create/read/update/delete suite.
//!
//! The suite creates one entity and threads its path through the suite
//! state, so the read, update and delete tests work on data the suite owns
//! rather than on seeded entities other suites may be reading.

use odata_harness::{Header, Suite, TestContext, TestResult, fixtures};
use serde_json::{Value, json};

use crate::support::{PRODUCTS, PROTOCOL_SPEC, missing_key_like, section};

const CREATED_PATH: &str = "created_path";
const CREATED_NAME: &str = "created_name";
const UPDATED_NAME: &str = "Conformance Updated Product";

/// Builds the suite.
pub fn suite() -> Suite {
    let mut suite = Suite::new(
        "EntityCrud",
        "Creating, reading, updating and deleting entities",
        section(PROTOCOL_SPEC, "sec_DataModification"),
    );
    suite
        .add_cited_test(
            "create",
            "POST to a collection returns 201 with a Location header and the new entity",
            "11.4.2",
            create,
        )
        .add_cited_test(
            "read_created",
            "The created entity can be read back by key",
            "11.2.2",
            read_created,
        )
        .add_cited_test(
            "update_created",
            "PATCH updates the entity and the change is visible on read",
            "11.4.3",
            update_created,
        )
        .add_cited_test(
            "update_return_representation",
            "PATCH with Prefer: return=representation returns 200 with the entity",
            "8.2.8.7",
            update_return_representation,
        )
        .add_cited_test(
            "delete_created",
            "DELETE returns 204 and the entity is gone afterwards",
            "11.4.5",
            delete_created,
        )
        .add_cited_test(
            "read_missing",
            "Reading a key that does not exist returns 404",
            "11.2.2",
            read_missing,
        );
    suite
}

async fn create(ctx: TestContext) -> TestResult {
    let payload = fixtures::minimal_entity_payload(PRODUCTS);
    let response = ctx.post_json(PRODUCTS, &payload, &[]).await?;
    ctx.require_status(&response, &[201], "entity creation")?;
    ctx.assert_header_exists(&response, "Location")?;

    let entity = ctx.json_object(&response)?;
    let Some(key) = fixtures::entity_key(&entity) else {
        return ctx.fail("created entity has no key property");
    };
    let path = fixtures::entity_path(PRODUCTS, key)?;
    ctx.log(format!("created {path}"));

    let state = ctx.suite_state();
    state.put(CREATED_PATH, json!(path));
    state.put(CREATED_NAME, payload["Name"].clone());
    Ok(())
}

async fn read_created(ctx: TestContext) -> TestResult {
    let path = ctx.suite_state().require_str(CREATED_PATH)?;
    let name = ctx.suite_state().require(CREATED_NAME)?;

    let response = ctx.get(&path, &[]).await?;
    ctx.assert_status(&response, 200)?;
    ctx.assert_json_field_equals(&response, "Name", &name)?;
    Ok(())
}

async fn update_created(ctx: TestContext) -> TestResult {
    let path = ctx.suite_state().require_str(CREATED_PATH)?;

    let response = ctx
        .patch_json(&path, &json!({ "Name": UPDATED_NAME }), &[])
        .await?;
    ctx.assert_status_in(&response, &[200, 204])?;

    let response = ctx.get(&path, &[]).await?;
    ctx.assert_status(&response, 200)?;
    ctx.assert_json_field_equals(&response, "Name", &json!(UPDATED_NAME))?;
    ctx.suite_state().put(CREATED_NAME, json!(UPDATED_NAME));
    Ok(())
}

async fn update_return_representation(ctx: TestContext) -> TestResult {
    let path = ctx.suite_state().require_str(CREATED_PATH)?;
    let name = ctx.suite_state().require(CREATED_NAME)?;

    let response = ctx
        .patch_json(
            &path,
            &json!({ "Name": name }),
            &[Header::prefer("return=representation")],
        )
        .await?;
    ctx.assert_status(&response, 200)?;
    ctx.assert_json_field_equals(&response, "Name", &name)?;
    if let Some(applied) = response.header("Preference-Applied")
        && !applied.contains("return=representation")
    {
        return ctx.fail(format!(
            "Preference-Applied '{applied}' does not acknowledge return=representation"
        ));
    }
    Ok(())
}

async fn delete_created(ctx: TestContext) -> TestResult {
    let path = ctx.suite_state().require_str(CREATED_PATH)?;

    let response = ctx.delete(&path, &[]).await?;
    ctx.assert_status(&response, 204)?;
    ctx.suite_state().take(CREATED_PATH);

    let response = ctx.get(&path, &[]).await?;
    ctx.assert_status(&response, 404)?;
    Ok(())
}

async fn read_missing(ctx: TestContext) -> TestResult {
    let key = fixtures::first_entity_id(&ctx, PRODUCTS).await?;
    let missing: Value = missing_key_like(&key);
    let path = fixtures::entity_path(PRODUCTS, &missing)?;

    let response = ctx.get(&path, &[]).await?;
    ctx.assert_status(&response, 404)?;
    Ok(())
}
