//! System query option suite.

use odata_harness::{Suite, TestContext, TestResult, fixtures};
use serde_json::Value;

use crate::support::{PRODUCTS, URL_CONVENTIONS_SPEC, property_names, section, value_array};

/// Builds the suite.
pub fn suite() -> Suite {
    let mut suite = Suite::new(
        "QueryOptions",
        "$top, $skip, $count, $select, $filter and $orderby on entity collections",
        section(URL_CONVENTIONS_SPEC, "sec_SystemQueryOptions"),
    );
    suite
        .add_cited_test("top", "$top limits the number of entities", "5.1.7", top)
        .add_cited_test(
            "skip",
            "$skip omits the first entities",
            "5.1.8",
            skip,
        )
        .add_cited_test(
            "count",
            "$count=true adds a numeric @odata.count",
            "5.1.9",
            count,
        )
        .add_cited_test(
            "select",
            "$select restricts the properties returned",
            "5.1.3",
            select,
        )
        .add_cited_test(
            "filter_by_key",
            "$filter on the key returns only the matching entity",
            "5.1.2",
            filter_by_key,
        )
        .add_cited_test(
            "orderby_key_desc",
            "$orderby on the key in descending order sorts the collection",
            "5.1.6",
            orderby_key_desc,
        )
        .add_cited_test(
            "negative_top_rejected",
            "$top with a negative value fails with 400",
            "5.1.7",
            negative_top_rejected,
        )
        .add_cited_test(
            "unknown_system_option_rejected",
            "An unknown $-prefixed system query option fails with 400",
            "5.1",
            unknown_system_option_rejected,
        );
    suite
}

async fn top(ctx: TestContext) -> TestResult {
    let response = ctx.get(&format!("{PRODUCTS}?$top=1"), &[]).await?;
    ctx.assert_status(&response, 200)?;
    let entities = value_array(&ctx, &response)?;
    if entities.len() > 1 {
        return ctx.fail(format!("$top=1 returned {} entities", entities.len()));
    }
    Ok(())
}

async fn skip(ctx: TestContext) -> TestResult {
    let all = ctx.get(PRODUCTS, &[]).await?;
    ctx.assert_status(&all, 200)?;
    let all = value_array(&ctx, &all)?;
    if all.len() < 2 {
        return ctx.skip("need at least two products to verify $skip");
    }

    let response = ctx.get(&format!("{PRODUCTS}?$skip=1"), &[]).await?;
    ctx.assert_status(&response, 200)?;
    let skipped = value_array(&ctx, &response)?;
    if skipped.first() != all.get(1) {
        return ctx.fail("$skip=1 did not start at the second entity of the unskipped collection");
    }
    Ok(())
}

async fn count(ctx: TestContext) -> TestResult {
    let response = ctx.get(&format!("{PRODUCTS}?$count=true"), &[]).await?;
    ctx.require_status(&response, &[200], "$count")?;

    let body = ctx.json_object(&response)?;
    match body.get("@odata.count") {
        Some(Value::Number(n)) if n.as_u64().is_some() => Ok(()),
        Some(other) => ctx.fail(format!("@odata.count must be a non-negative integer, got {other}")),
        None => ctx.fail("$count=true response has no @odata.count"),
    }
}

async fn select(ctx: TestContext) -> TestResult {
    let entity = fixtures::first_entity(&ctx, PRODUCTS).await?;
    let Some(selected) = property_names(&entity)
        .find(|name| !matches!(*name, "ID" | "Id" | "id"))
        .map(str::to_string)
    else {
        return ctx.skip("products have no non-key property to select");
    };

    let response = ctx
        .get(&format!("{PRODUCTS}?$select={selected}"), &[])
        .await?;
    ctx.assert_status(&response, 200)?;

    for entity in value_array(&ctx, &response)? {
        let Value::Object(entity) = entity else {
            return ctx.fail("collection entry is not an object");
        };
        if let Some(extra) = property_names(&entity)
            .find(|name| *name != selected && !matches!(*name, "ID" | "Id" | "id"))
        {
            return ctx.fail(format!(
                "$select={selected} returned unselected property '{extra}'"
            ));
        }
    }
    Ok(())
}

async fn filter_by_key(ctx: TestContext) -> TestResult {
    let entity = fixtures::first_entity(&ctx, PRODUCTS).await?;
    let (key_name, key) = match ["ID", "Id", "id"]
        .into_iter()
        .find_map(|name| entity.get(name).map(|value| (name, value.clone())))
    {
        Some(found) => found,
        None => return ctx.skip("products expose no ID property"),
    };
    let Some(literal) = fixtures::key_literal(&key) else {
        return ctx.skip(format!("key {key} has no literal form"));
    };

    let response = ctx
        .get(&format!("{PRODUCTS}?$filter={key_name} eq {literal}"), &[])
        .await?;
    ctx.assert_status(&response, 200)?;

    let matches = value_array(&ctx, &response)?;
    if matches.is_empty() {
        return ctx.fail(format!("$filter={key_name} eq {literal} returned no entities"));
    }
    if let Some(other) = matches.iter().find(|e| e.get(key_name) != Some(&key)) {
        return ctx.fail(format!("$filter returned a non-matching entity: {other}"));
    }
    Ok(())
}

async fn orderby_key_desc(ctx: TestContext) -> TestResult {
    let entity = fixtures::first_entity(&ctx, PRODUCTS).await?;
    let Some(key_name) = ["ID", "Id", "id"]
        .into_iter()
        .find(|name| entity.get(*name).is_some_and(Value::is_number))
    else {
        return ctx.skip("products have no numeric key to order by");
    };

    let response = ctx
        .get(&format!("{PRODUCTS}?$orderby={key_name} desc"), &[])
        .await?;
    ctx.require_status(&response, &[200], "$orderby")?;

    let keys: Vec<f64> = value_array(&ctx, &response)?
        .iter()
        .filter_map(|e| e.get(key_name).and_then(Value::as_f64))
        .collect();
    if keys.windows(2).any(|pair| pair[0] < pair[1]) {
        return ctx.fail(format!("$orderby={key_name} desc returned keys out of order: {keys:?}"));
    }
    Ok(())
}

async fn negative_top_rejected(ctx: TestContext) -> TestResult {
    let response = ctx.get(&format!("{PRODUCTS}?$top=-1"), &[]).await?;
    ctx.assert_status(&response, 400)?;
    Ok(())
}

async fn unknown_system_option_rejected(ctx: TestContext) -> TestResult {
    let response = ctx
        .get(&format!("{PRODUCTS}?$conformanceunknown=1"), &[])
        .await?;
    ctx.assert_status(&response, 400)?;
    Ok(())
}
