//! Assertion library.
//!
//! Every assertion is a pure function over a [`Response`] that returns
//! `Ok(())` or an [`AssertionFailure`] naming what was expected and what was
//! observed. Test bodies normally reach these through the wrappers on
//! [`TestContext`](crate::TestContext) and propagate the failure with `?`.

use serde_json::{Map, Value};

use crate::error::AssertionFailure;
use crate::http::Response;

const PREVIEW_CHARS: usize = 200;

/// Returns the first characters of a body for use in failure messages.
pub fn body_preview(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

/// Asserts the response status equals `expected`.
pub fn assert_status(response: &Response, expected: u16) -> Result<(), AssertionFailure> {
    let actual = response.status();
    if actual == expected {
        return Ok(());
    }

    let mut message = format!("unexpected status code: expected {expected}, got {actual}");
    if !response.body().is_empty() {
        message.push_str(&format!(" (body: {})", body_preview(response.body())));
    }
    Err(AssertionFailure::mismatch(
        message,
        expected.to_string(),
        actual.to_string(),
    ))
}

/// Asserts the response status is one of `expected`.
pub fn assert_status_in(response: &Response, expected: &[u16]) -> Result<(), AssertionFailure> {
    let actual = response.status();
    if expected.contains(&actual) {
        return Ok(());
    }

    let expected = expected
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Err(AssertionFailure::mismatch(
        format!("unexpected status code: expected one of [{expected}], got {actual}"),
        expected,
        actual.to_string(),
    ))
}

/// Asserts the named header is present.
pub fn assert_header_exists(response: &Response, name: &str) -> Result<(), AssertionFailure> {
    if response.has_header(name) {
        Ok(())
    } else {
        Err(AssertionFailure::new(format!(
            "expected header '{name}' to be present"
        )))
    }
}

/// Asserts the named header is present with exactly `expected` as its value.
pub fn assert_header_equals(
    response: &Response,
    name: &str,
    expected: &str,
) -> Result<(), AssertionFailure> {
    match response.header(name) {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => Err(AssertionFailure::mismatch(
            format!("header '{name}': expected '{expected}', got '{actual}'"),
            expected,
            actual,
        )),
        None => Err(AssertionFailure::mismatch(
            format!("header '{name}': expected '{expected}', but the header is missing"),
            expected,
            "<missing>",
        )),
    }
}

/// Asserts the named header is present and its value contains `needle`.
pub fn assert_header_contains(
    response: &Response,
    name: &str,
    needle: &str,
) -> Result<(), AssertionFailure> {
    match response.header(name) {
        Some(actual) if actual.contains(needle) => Ok(()),
        Some(actual) => Err(AssertionFailure::mismatch(
            format!("header '{name}': expected a value containing '{needle}', got '{actual}'"),
            needle,
            actual,
        )),
        None => Err(AssertionFailure::mismatch(
            format!("header '{name}': expected a value containing '{needle}', but the header is missing"),
            needle,
            "<missing>",
        )),
    }
}

/// Parses the body as JSON, turning a parse error into a failure.
pub fn parse_json(response: &Response) -> Result<Value, AssertionFailure> {
    response.json().map_err(|e| {
        AssertionFailure::new(format!(
            "response body is not valid JSON: {e} (body: {})",
            body_preview(response.body())
        ))
    })
}

/// Parses the body as a JSON object.
pub fn parse_json_object(response: &Response) -> Result<Map<String, Value>, AssertionFailure> {
    match parse_json(response)? {
        Value::Object(map) => Ok(map),
        other => Err(AssertionFailure::new(format!(
            "expected a JSON object body, got {}",
            json_kind(&other)
        ))),
    }
}

/// Asserts the body is a JSON object with a top-level `field`.
pub fn assert_json_field(response: &Response, field: &str) -> Result<(), AssertionFailure> {
    let object = parse_json_object(response)?;
    if object.contains_key(field) {
        Ok(())
    } else {
        Err(AssertionFailure::new(format!(
            "expected JSON field '{field}' in response body"
        )))
    }
}

/// Asserts the top-level `field` of a JSON object body equals `expected`.
pub fn assert_json_field_equals(
    response: &Response,
    field: &str,
    expected: &Value,
) -> Result<(), AssertionFailure> {
    let object = parse_json_object(response)?;
    match object.get(field) {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => Err(AssertionFailure::mismatch(
            format!("JSON field '{field}': expected {expected}, got {actual}"),
            expected.to_string(),
            actual.to_string(),
        )),
        None => Err(AssertionFailure::mismatch(
            format!("expected JSON field '{field}' in response body"),
            expected.to_string(),
            "<missing>",
        )),
    }
}

/// Asserts the raw body contains `needle`.
pub fn assert_body_contains(response: &Response, needle: &str) -> Result<(), AssertionFailure> {
    if contains_bytes(response.body(), needle.as_bytes()) {
        Ok(())
    } else {
        Err(AssertionFailure::new(format!(
            "expected response body to contain '{needle}' (body: {})",
            body_preview(response.body())
        )))
    }
}

/// Asserts the raw body does not contain `needle`.
pub fn assert_body_not_contains(
    response: &Response,
    needle: &str,
) -> Result<(), AssertionFailure> {
    if contains_bytes(response.body(), needle.as_bytes()) {
        Err(AssertionFailure::new(format!(
            "expected response body not to contain '{needle}'"
        )))
    } else {
        Ok(())
    }
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty() || haystack.windows(needle.len()).any(|window| window == needle)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
