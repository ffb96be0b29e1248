//! Helpers shared by the suites.

use odata_harness::{AssertionFailure, Response, TestContext};
use serde_json::{Map, Value};

/// Collection most suites read from and write to.
pub(crate) const PRODUCTS: &str = "Products";

/// Base URL of the OData v4.01 protocol document.
pub(crate) const PROTOCOL_SPEC: &str =
    "https://docs.oasis-open.org/odata/odata/v4.01/odata-v4.01-part1-protocol.html";

/// Base URL of the OData v4.01 JSON format document.
pub(crate) const JSON_FORMAT_SPEC: &str =
    "https://docs.oasis-open.org/odata/odata-json-format/v4.01/odata-json-format-v4.01.html";

/// Base URL of the OData v4.01 URL conventions document.
pub(crate) const URL_CONVENTIONS_SPEC: &str =
    "https://docs.oasis-open.org/odata/odata/v4.01/odata-v4.01-part2-url-conventions.html";

/// Versions a service may answer with.
pub(crate) const ODATA_VERSIONS: [&str; 2] = ["4.0", "4.01"];

/// Returns `base#anchor`.
pub(crate) fn section(base: &str, anchor: &str) -> String {
    format!("{base}#{anchor}")
}

/// Returns the `value` array of a collection response.
pub(crate) fn value_array(ctx: &TestContext, response: &Response) -> Result<Vec<Value>, AssertionFailure> {
    let body = ctx.json_object(response)?;
    match body.get("value") {
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(other) => Err(AssertionFailure::new(format!(
            "expected 'value' to be an array, got {other}"
        ))),
        None => Err(AssertionFailure::new(
            "expected JSON field 'value' in collection response",
        )),
    }
}

/// Returns the `error` object of an OData error response, checking that it
/// carries string `code` and `message` members.
pub(crate) fn error_object(
    ctx: &TestContext,
    response: &Response,
) -> Result<Map<String, Value>, AssertionFailure> {
    let body = ctx.json_object(response)?;
    let error = match body.get("error") {
        Some(Value::Object(error)) => error.clone(),
        Some(other) => {
            return Err(AssertionFailure::new(format!(
                "expected 'error' to be an object, got {other}"
            )));
        }
        None => {
            return Err(AssertionFailure::new(
                "expected JSON field 'error' in error response",
            ));
        }
    };

    for member in ["code", "message"] {
        if !error.get(member).is_some_and(Value::is_string) {
            return Err(AssertionFailure::new(format!(
                "error object must have a string '{member}' member"
            )));
        }
    }
    Ok(error)
}

/// Asserts the `OData-Version` response header is a supported version.
pub(crate) fn assert_odata_version(response: &Response) -> Result<(), AssertionFailure> {
    match response.header("OData-Version") {
        Some(version) if ODATA_VERSIONS.contains(&version.trim()) => Ok(()),
        Some(version) => Err(AssertionFailure::mismatch(
            format!("OData-Version: expected 4.0 or 4.01, got '{version}'"),
            "4.0 | 4.01",
            version,
        )),
        None => Err(AssertionFailure::new(
            "expected header 'OData-Version' to be present",
        )),
    }
}

/// Returns a key literal that no seeded entity is expected to use.
pub(crate) fn missing_key_like(key: &Value) -> Value {
    match key {
        Value::String(_) => Value::String("conformance-missing-key".to_string()),
        _ => Value::from(2_147_483_000_i64),
    }
}

/// Returns the non-annotation property names of an entity.
pub(crate) fn property_names(entity: &Map<String, Value>) -> impl Iterator<Item = &str> {
    entity
        .keys()
        .map(String::as_str)
        .filter(|name| !name.starts_with('@') && !name.contains("@odata."))
}
