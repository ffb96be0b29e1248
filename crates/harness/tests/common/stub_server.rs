//! In-process OData stub service.
//!
//! Binds an axum router to an ephemeral port so tests exercise the real
//! HTTP client end to end. Every request is recorded for later inspection.
//! The suites crate mounts this same module for its end-to-end runs, so the
//! `$batch` route answers every GET part with 200 and every POST part
//! with 201.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::Response;
use odata_harness::{HarnessConfig, HttpClient};
use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::fixtures;

/// Behavior switches for the stub.
#[derive(Debug, Clone)]
pub struct StubOptions {
    /// Entities served from `/Products`.
    pub products: Vec<Value>,
    /// Document served from `/$metadata`.
    pub metadata: &'static str,
    /// Status of `GET /Products`; anything but 200 returns an error body.
    pub products_status: StatusCode,
}

impl Default for StubOptions {
    fn default() -> Self {
        Self {
            products: fixtures::products(),
            metadata: fixtures::METADATA_WITH_DERIVED,
            products_status: StatusCode::OK,
        }
    }
}

const RESPONSE_BOUNDARY: &str = "batchresponse_stub";

#[derive(Debug, Clone)]
struct StubState {
    options: Arc<StubOptions>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

/// A running stub service. Shuts down when dropped.
pub struct StubServer {
    /// Service root, e.g. `http://127.0.0.1:40123`.
    pub base_url: String,
    state: StubState,
    handle: JoinHandle<()>,
}

impl StubServer {
    /// Starts a stub with default data.
    pub async fn start() -> Self {
        Self::with_options(StubOptions::default()).await
    }

    /// Starts a stub with the given options.
    pub async fn with_options(options: StubOptions) -> Self {
        let state = StubState {
            options: Arc::new(options),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let app = Router::new().fallback(handle).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub listener");
        let addr = listener.local_addr().expect("Failed to read stub address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Stub server failed");
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    /// Returns a harness configuration pointed at this stub.
    pub fn config(&self) -> HarnessConfig {
        HarnessConfig {
            server_url: self.base_url.clone(),
            ..HarnessConfig::for_testing()
        }
    }

    /// Returns a client with the default harness headers.
    pub fn client(&self) -> HttpClient {
        HttpClient::new(&self.config()).expect("Failed to build client")
    }

    /// Returns every request as `(method, path?query)`.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.state.requests.lock().clone()
    }

    /// Returns how many requests hit `path` (query ignored).
    pub fn requests_to(&self, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|(_, target)| target.split('?').next() == Some(path))
            .count()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    state
        .requests
        .lock()
        .push((method.to_string(), target));

    let path = uri.path();
    let query = uri.query().unwrap_or("");

    match (method.as_str(), path) {
        ("GET", "/") => json_response(
            StatusCode::OK,
            json!({
                "@odata.context": "$metadata",
                "value": [{"name": "Products", "kind": "EntitySet", "url": "Products"}]
            }),
        ),
        ("GET", "/$metadata") => Response::builder()
            .status(StatusCode::OK)
            .header("Content-Type", "application/xml")
            .header("OData-Version", "4.0")
            .body(Body::from(state.options.metadata))
            .unwrap(),
        ("GET", "/Products") if state.options.products_status != StatusCode::OK => {
            let status = state.options.products_status;
            error_response(status, "Error", &format!("stub answered {status}"))
        }
        ("GET", "/Products") => {
            let top = query
                .split('&')
                .find_map(|pair| pair.strip_prefix("$top="))
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(usize::MAX);
            let value: Vec<Value> = state.options.products.iter().take(top).cloned().collect();
            json_response(StatusCode::OK, json!({ "value": value }))
        }
        ("POST", "/Products") => {
            let mut entity: Map<String, Value> =
                serde_json::from_slice(&body).unwrap_or_default();
            entity.insert("ID".to_string(), json!(100));
            Response::builder()
                .status(StatusCode::CREATED)
                .header("Content-Type", "application/json")
                .header("OData-Version", "4.0")
                .header("Location", "Products(100)")
                .body(Body::from(Value::Object(entity).to_string()))
                .unwrap()
        }
        ("POST", "/$batch") => batch(&headers, &body),
        ("GET", "/echo") | ("POST", "/echo") | ("PATCH", "/echo") | ("PUT", "/echo") => {
            let mut echoed = Map::new();
            for (name, value) in &headers {
                echoed.insert(
                    name.as_str().to_string(),
                    json!(value.to_str().unwrap_or("")),
                );
            }
            json_response(
                StatusCode::OK,
                json!({
                    "method": method.as_str(),
                    "headers": echoed,
                    "body": String::from_utf8_lossy(&body),
                }),
            )
        }
        ("GET", "/slow") => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            json_response(StatusCode::OK, json!({}))
        }
        (_, p) if p.starts_with("/Products(") => {
            let id = p
                .trim_start_matches("/Products(")
                .trim_end_matches(')')
                .parse::<i64>()
                .ok();
            let found = state
                .options
                .products
                .iter()
                .find(|e| e["ID"].as_i64() == id)
                .cloned();
            match (method.as_str(), found) {
                ("GET", Some(entity)) => Response::builder()
                    .status(StatusCode::OK)
                    .header("Content-Type", "application/json")
                    .header("OData-Version", "4.0")
                    .header("ETag", "W/\"1\"")
                    .body(Body::from(entity.to_string()))
                    .unwrap(),
                ("DELETE", Some(_)) => Response::builder()
                    .status(StatusCode::NO_CONTENT)
                    .body(Body::empty())
                    .unwrap(),
                _ => not_found(p),
            }
        }
        (_, p) => not_found(p),
    }
}

fn json_response(status: StatusCode, body: Value) -> Response {
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json;odata.metadata=minimal")
        .header("OData-Version", "4.0")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn batch(headers: &HeaderMap, body: &Bytes) -> Response {
    let content_type = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !content_type.starts_with("multipart/mixed") {
        return error_response(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "UnsupportedMediaType",
            "only multipart batches are supported",
        );
    }

    let body = String::from_utf8_lossy(body);
    let boundary = content_type
        .split_once("boundary=")
        .map(|(_, b)| b.trim())
        .unwrap_or("");
    if boundary.is_empty() || !body.contains(&format!("--{boundary}")) {
        return error_response(StatusCode::BAD_REQUEST, "BadRequest", "malformed multipart body");
    }

    let mut out = String::new();
    for line in body.lines() {
        let status = if line.starts_with("GET ") {
            "200 OK"
        } else if line.starts_with("POST ") {
            "201 Created"
        } else {
            continue;
        };
        out.push_str(&format!(
            "--{RESPONSE_BOUNDARY}\r\nContent-Type: application/http\r\n\r\nHTTP/1.1 {status}\r\nContent-Type: application/json\r\n\r\n{{}}\r\n"
        ));
    }
    out.push_str(&format!("--{RESPONSE_BOUNDARY}--\r\n"));

    Response::builder()
        .status(StatusCode::OK)
        .header(
            "Content-Type",
            format!("multipart/mixed;boundary={RESPONSE_BOUNDARY}"),
        )
        .header("OData-Version", "4.0")
        .body(Body::from(out))
        .unwrap()
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    json_response(status, json!({"error": {"code": code, "message": message}}))
}

fn not_found(path: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, "NotFound", &format!("{path} not found"))
}
