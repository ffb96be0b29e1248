//! Derived type suite: type-cast segments and `isof`.
//!
//! Every test is gated on the derived-types probe, so a service whose model
//! has no inheritance skips the whole suite after a single `$metadata` read.

use odata_harness::csdl::{self, unqualified};
use odata_harness::{Header, Suite, TestContext, TestError, TestResult, fixtures};
use serde_json::Value;

use crate::support::{URL_CONVENTIONS_SPEC, section, value_array};

/// Builds the suite.
pub fn suite() -> Suite {
    let mut suite = Suite::new(
        "DerivedTypes",
        "Addressing derived entity types through type-cast segments and isof",
        section(URL_CONVENTIONS_SPEC, "sec_AddressingDerivedTypes"),
    );
    suite
        .add_cited_test(
            "metadata_declares_base_type",
            "$metadata declares at least one type with a BaseType",
            "4.11",
            metadata_declares_base_type,
        )
        .add_cited_test(
            "type_cast_segment",
            "A type-cast segment on an entity set returns only instances of that type",
            "4.11",
            type_cast_segment,
        )
        .add_cited_test(
            "isof_filter",
            "$filter=isof('Namespace.Type') returns only instances of that type",
            "5.1.1.11.4",
            isof_filter,
        );
    suite
}

async fn require_derived_types(ctx: &TestContext) -> Result<(), TestError> {
    if fixtures::supports_derived_types(ctx).await {
        Ok(())
    } else {
        Err(TestError::Skipped(
            "the service model declares no derived types".to_string(),
        ))
    }
}

/// Resolves the entity set and qualified derived type name to test against.
async fn cast_target(ctx: &TestContext) -> Result<(String, String), TestError> {
    require_derived_types(ctx).await?;

    let response = ctx
        .get("$metadata", &[Header::accept("application/xml")])
        .await?;
    ctx.assert_status(&response, 200)?;
    let document = csdl::parse(&response.text())?;
    match document.cast_target() {
        Some(target) => Ok((target.entity_set, target.derived_type)),
        None => Err(TestError::Skipped(
            "no entity set is typed with a base type that has derived types".to_string(),
        )),
    }
}

/// Fails if any entity declares an `@odata.type` other than `qualified`.
fn check_instances(ctx: &TestContext, entities: &[Value], qualified: &str) -> TestResult {
    let short = unqualified(qualified);
    for entity in entities {
        if let Some(odata_type) = entity.get("@odata.type").and_then(Value::as_str)
            && unqualified(odata_type.trim_start_matches('#')) != short
        {
            return ctx.fail(format!(
                "expected instances of {qualified}, found @odata.type '{odata_type}'"
            ));
        }
    }
    Ok(())
}

async fn metadata_declares_base_type(ctx: TestContext) -> TestResult {
    require_derived_types(&ctx).await?;
    ctx.log("$metadata declares at least one BaseType");
    Ok(())
}

async fn type_cast_segment(ctx: TestContext) -> TestResult {
    let (entity_set, qualified) = cast_target(&ctx).await?;
    let response = ctx.get(&format!("{entity_set}/{qualified}"), &[]).await?;
    ctx.require_status(&response, &[200], "type-cast segments")?;

    let entities = value_array(&ctx, &response)?;
    ctx.log(format!("{entity_set}/{qualified} returned {} entities", entities.len()));
    check_instances(&ctx, &entities, &qualified)
}

async fn isof_filter(ctx: TestContext) -> TestResult {
    let (entity_set, qualified) = cast_target(&ctx).await?;
    let response = ctx
        .get(&format!("{entity_set}?$filter=isof('{qualified}')"), &[])
        .await?;
    ctx.require_status(&response, &[200], "isof")?;

    let entities = value_array(&ctx, &response)?;
    check_instances(&ctx, &entities, &qualified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use odata_harness::{HttpClient, LogSink, ProbeCache, SuiteState};
    use serde_json::json;

    fn context() -> TestContext {
        let client = HttpClient::with_defaults("http://127.0.0.1:9", Vec::new(), Duration::from_secs(1))
            .unwrap();
        TestContext::new(
            Arc::new(client),
            SuiteState::new("DerivedTypes"),
            Arc::new(ProbeCache::new()),
            LogSink::default(),
            "type_cast_segment",
        )
    }

    #[test]
    fn test_instances_of_other_types_fail() {
        let ctx = context();
        let entities = vec![
            json!({"@odata.type": "#ODataDemo.FeaturedProduct", "ID": 1}),
            json!({"ID": 2}),
        ];
        assert!(check_instances(&ctx, &entities, "ODataDemo.FeaturedProduct").is_ok());

        let mixed = vec![json!({"@odata.type": "#ODataDemo.Product", "ID": 3})];
        assert!(check_instances(&ctx, &mixed, "ODataDemo.FeaturedProduct").is_err());
    }
}
