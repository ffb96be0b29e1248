//! Fixture helpers.
//!
//! Tests derive their inputs from whatever data the service already holds
//! rather than from a seeded dataset. When the service has nothing usable
//! the helpers return [`FixtureError::Unavailable`], which a test body turns
//! into a skip with `?`.

use serde_json::{Map, Value, json};
use tracing::warn;

use crate::classify::{NOT_IMPLEMENTED_STATUSES, StatusClass, classify};
use crate::context::TestContext;
use crate::csdl::{self, CsdlDocument};
use crate::error::FixtureError;
use crate::http::Header;

/// Probe name for derived type support.
pub const DERIVED_TYPES_PROBE: &str = "derived-types";
/// Probe name for the schema namespace.
pub const NAMESPACE_PROBE: &str = "service-namespace";
/// Prefix of the cached per-entity-set key name lookups.
pub const ENTITY_KEY_LOOKUP: &str = "entity-key";

const KEY_PROPERTIES: [&str; 3] = ["ID", "Id", "id"];

/// Returns the first entity of `collection`.
pub async fn first_entity(
    ctx: &TestContext,
    collection: &str,
) -> Result<Map<String, Value>, FixtureError> {
    let path = format!("{}?$top=1", collection.trim_start_matches('/'));
    let response = ctx.get(&path, &[]).await?;

    match classify(response.status(), &[200], &NOT_IMPLEMENTED_STATUSES) {
        StatusClass::Continue => {}
        StatusClass::Skip => {
            return Err(FixtureError::unavailable(format!(
                "GET {path} returned status {}",
                response.status()
            )));
        }
        StatusClass::Fail => {
            return Err(FixtureError::UnexpectedStatus {
                request: format!("GET {path}"),
                status: response.status(),
            });
        }
    }

    let body = response
        .json()
        .map_err(|e| FixtureError::malformed(format!("GET {path} did not return JSON: {e}")))?;
    let entities = body
        .get("value")
        .and_then(Value::as_array)
        .ok_or_else(|| FixtureError::malformed(format!("GET {path} has no 'value' array")))?;

    match entities.first() {
        Some(Value::Object(entity)) => Ok(entity.clone()),
        Some(_) => Err(FixtureError::malformed(format!(
            "first entry of {collection} is not an object"
        ))),
        None => Err(FixtureError::unavailable(format!(
            "no entities available in {collection}"
        ))),
    }
}

/// Returns the key of the first entity of `collection`.
///
/// Entities without an `ID`, `Id` or `id` property are keyed by the single
/// `PropertyRef` that `$metadata` declares for the entity set. When neither
/// is available the fixture is unavailable.
pub async fn first_entity_id(ctx: &TestContext, collection: &str) -> Result<Value, FixtureError> {
    let entity = first_entity(ctx, collection).await?;
    if let Some(key) = entity_key(&entity) {
        return Ok(key.clone());
    }

    let entity_set = collection.trim_start_matches('/');
    let declared = declared_key(ctx, entity_set).await;
    declared
        .as_deref()
        .and_then(|name| entity.get(name))
        .cloned()
        .ok_or_else(|| {
            FixtureError::unavailable(format!(
                "first entity of {entity_set} has no key property the runner can address"
            ))
        })
}

/// Returns the key property `$metadata` declares for `entity_set`, if it has
/// exactly one. Looked up once per entity set.
pub async fn declared_key(ctx: &TestContext, entity_set: &str) -> Option<String> {
    let name = format!("{ENTITY_KEY_LOOKUP}:{entity_set}");
    ctx.probes()
        .text(&name, || async move {
            match parsed_metadata(ctx).await {
                Ok(csdl) => match csdl.key_of(entity_set) {
                    Some([key]) => Some(key.clone()),
                    _ => None,
                },
                Err(reason) => {
                    warn!(entity_set = %entity_set, reason = %reason, "Key lookup failed, treating key as unknown");
                    None
                }
            }
        })
        .await
}

/// Returns the addressable path (`Collection(key)`) of the first entity.
pub async fn first_entity_path(
    ctx: &TestContext,
    collection: &str,
) -> Result<String, FixtureError> {
    let key = first_entity_id(ctx, collection).await?;
    entity_path(collection, &key)
}

/// Returns the key property value of an entity.
pub fn entity_key(entity: &Map<String, Value>) -> Option<&Value> {
    KEY_PROPERTIES.iter().find_map(|name| entity.get(*name))
}

/// Formats a key as an OData literal.
///
/// Numbers are written bare and strings single-quoted with embedded quotes
/// doubled. Other JSON values cannot be keys.
pub fn key_literal(key: &Value) -> Option<String> {
    match key {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(format!("'{}'", s.replace('\'', "''"))),
        _ => None,
    }
}

/// Builds `Collection(literal)` for `key`.
pub fn entity_path(collection: &str, key: &Value) -> Result<String, FixtureError> {
    let literal = key_literal(key)
        .ok_or_else(|| FixtureError::malformed(format!("unsupported key value {key}")))?;
    Ok(format!("{}({literal})", collection.trim_start_matches('/')))
}

/// Returns a small valid payload for creating an entity in `collection`.
pub fn minimal_entity_payload(collection: &str) -> Value {
    match collection.trim_start_matches('/') {
        "Products" => json!({
            "Name": "Conformance Test Product",
            "Description": "Created by the OData conformance runner",
            "Price": 9.99,
            "CategoryID": 1
        }),
        "Categories" => json!({
            "Name": "Conformance Test Category"
        }),
        "Customers" => json!({
            "Name": "Conformance Test Customer",
            "Country": "USA"
        }),
        _ => json!({
            "Name": format!("Conformance Test {collection}")
        }),
    }
}

/// Creates an entity for a test to work on and returns its representation.
///
/// A service that refuses creation makes the fixture unavailable.
pub async fn create_entity(
    ctx: &TestContext,
    collection: &str,
    payload: &Value,
) -> Result<Map<String, Value>, FixtureError> {
    let path = collection.trim_start_matches('/');
    let response = ctx
        .post_json(path, payload, &[Header::prefer("return=representation")])
        .await?;

    if !matches!(response.status(), 200 | 201) {
        return Err(FixtureError::unavailable(format!(
            "could not create a fixture entity in {collection} (status {})",
            response.status()
        )));
    }

    match response.json() {
        Ok(Value::Object(entity)) => Ok(entity),
        Ok(_) => Err(FixtureError::malformed(format!(
            "POST {path} did not return an entity object"
        ))),
        Err(e) => Err(FixtureError::malformed(format!(
            "POST {path} did not return JSON: {e}"
        ))),
    }
}

/// Returns true if `$metadata` declares any entity or complex type with a
/// base type. Probed once per process.
pub async fn supports_derived_types(ctx: &TestContext) -> bool {
    ctx.probes()
        .flag(DERIVED_TYPES_PROBE, || async move {
            match parsed_metadata(ctx).await {
                Ok(csdl) => csdl.has_derived_types(),
                Err(reason) => {
                    warn!(probe = DERIVED_TYPES_PROBE, reason = %reason, "Probe failed, treating feature as absent");
                    false
                }
            }
        })
        .await
}

/// Returns the namespace of the first schema in `$metadata`. Probed once per
/// process.
pub async fn service_namespace(ctx: &TestContext) -> Option<String> {
    ctx.probes()
        .text(NAMESPACE_PROBE, || async move {
            match parsed_metadata(ctx).await {
                Ok(csdl) => csdl.namespace().map(str::to_string),
                Err(reason) => {
                    warn!(probe = NAMESPACE_PROBE, reason = %reason, "Probe failed, treating namespace as unknown");
                    None
                }
            }
        })
        .await
}

async fn fetch_metadata(ctx: &TestContext) -> Result<String, String> {
    let response = ctx
        .get("$metadata", &[Header::accept("application/xml")])
        .await
        .map_err(|e| e.to_string())?;
    if response.status() != 200 {
        return Err(format!("$metadata returned status {}", response.status()));
    }
    Ok(response.text().into_owned())
}

async fn parsed_metadata(ctx: &TestContext) -> Result<CsdlDocument, String> {
    let document = fetch_metadata(ctx).await?;
    csdl::parse(&document).map_err(|e| e.to_string())
}

/// Returns the `Namespace` of the first `<Schema>` element.
pub fn schema_namespace(document: &str) -> Option<String> {
    csdl::parse(document)
        .ok()?
        .namespace()
        .map(str::to_string)
}
