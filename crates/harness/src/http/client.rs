//! The HTTP client adapter used by every test.

use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::{HeaderName, HeaderValue};
use serde::Serialize;
use tracing::debug;

use super::header::{CONTENT_TYPE, Header, merge_headers};
use super::response::Response;
use crate::config::HarnessConfig;
use crate::error::TransportError;

/// Body attached to an outgoing request.
struct RequestBody {
    bytes: Bytes,
    content_type: String,
}

/// Sends requests relative to the service root with a fixed set of default
/// headers.
///
/// Per-call headers are layered over the defaults for that call only. The
/// client never retries; a failed call is returned as a [`TransportError`]
/// and the test decides what it means.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use odata_harness::http::{Header, HttpClient, Method};
///
/// # async fn example() -> Result<(), odata_harness::TransportError> {
/// let client = HttpClient::with_defaults(
///     "http://localhost:9090/odata",
///     vec![Header::accept("application/json")],
///     Duration::from_secs(30),
/// )?;
/// let response = client.call(Method::GET, "$metadata", &[Header::accept("application/xml")]).await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    base_url: String,
    default_headers: Vec<Header>,
}

impl HttpClient {
    /// Creates a client from the harness configuration.
    pub fn new(config: &HarnessConfig) -> Result<Self, TransportError> {
        Self::with_defaults(
            &config.server_url,
            config.default_headers(),
            config.request_timeout_duration(),
        )
    }

    /// Creates a client with an explicit base URL, default headers and
    /// per-request timeout.
    pub fn with_defaults(
        base_url: &str,
        default_headers: Vec<Header>,
        timeout: Duration,
    ) -> Result<Self, TransportError> {
        url::Url::parse(base_url).map_err(|e| TransportError::InvalidUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;

        let inner = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Client {
                message: e.to_string(),
            })?;

        Ok(Self {
            inner,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_headers,
        })
    }

    /// Returns the service root, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the headers sent with every request.
    pub fn default_headers(&self) -> &[Header] {
        &self.default_headers
    }

    /// Resolves a path against the service root.
    ///
    /// Absolute `http://` and `https://` URLs (for example `@odata.nextLink`
    /// values) are returned unchanged.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends a request without a body.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        headers: &[Header],
    ) -> Result<Response, TransportError> {
        self.execute(method, path, None, headers).await
    }

    /// Sends a JSON-encoded body with `Content-Type: application/json`.
    ///
    /// A `Content-Type` in `headers` takes precedence, which lets a test
    /// send parameters such as `odata.metadata=minimal`.
    pub async fn call_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &T,
        headers: &[Header],
    ) -> Result<Response, TransportError> {
        let bytes = serde_json::to_vec(body).map_err(|e| TransportError::Encode {
            message: e.to_string(),
        })?;
        let body = RequestBody {
            bytes: Bytes::from(bytes),
            content_type: "application/json".to_string(),
        };
        self.execute(method, path, Some(body), headers).await
    }

    /// Sends an opaque body with an explicit content type, such as a
    /// `multipart/mixed` batch or a deliberately malformed payload.
    pub async fn call_raw(
        &self,
        method: Method,
        path: &str,
        body: impl Into<Bytes>,
        content_type: &str,
        headers: &[Header],
    ) -> Result<Response, TransportError> {
        let body = RequestBody {
            bytes: body.into(),
            content_type: content_type.to_string(),
        };
        self.execute(method, path, Some(body), headers).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        headers: &[Header],
    ) -> Result<Response, TransportError> {
        let url = self.url_for(path);
        let parsed = url::Url::parse(&url).map_err(|e| TransportError::InvalidUrl {
            url: url.clone(),
            message: e.to_string(),
        })?;

        let mut effective = self.default_headers.clone();
        if let Some(body) = &body {
            effective = merge_headers(
                &effective,
                &[Header::new(CONTENT_TYPE, body.content_type.as_str())],
            );
        }
        let effective = merge_headers(&effective, headers);

        let mut builder = self.inner.request(method.clone(), parsed);
        for header in &effective {
            let name = HeaderName::from_bytes(header.key.as_bytes()).map_err(|e| {
                TransportError::InvalidHeader {
                    name: header.key.clone(),
                    message: e.to_string(),
                }
            })?;
            let value =
                HeaderValue::from_str(&header.value).map_err(|e| TransportError::InvalidHeader {
                    name: header.key.clone(),
                    message: e.to_string(),
                })?;
            builder = builder.header(name, value);
        }
        if let Some(body) = body {
            builder = builder.body(body.bytes);
        }

        let started = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&method, &url, e))?;

        let status = response.status().as_u16();
        let response_headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(&method, &url, e))?;
        let elapsed = started.elapsed();

        debug!(
            method = %method,
            path = %path,
            status = status,
            elapsed_ms = elapsed.as_millis() as u64,
            "OData request completed"
        );

        Ok(Response::new(status, response_headers, bytes).with_elapsed(elapsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> HttpClient {
        HttpClient::with_defaults(base, Vec::new(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_url_for_joins_paths() {
        let client = client("http://localhost:9090/odata/");
        assert_eq!(client.base_url(), "http://localhost:9090/odata");
        assert_eq!(
            client.url_for("/Products(1)"),
            "http://localhost:9090/odata/Products(1)"
        );
        assert_eq!(
            client.url_for("$metadata"),
            "http://localhost:9090/odata/$metadata"
        );
        assert_eq!(client.url_for(""), "http://localhost:9090/odata/");
    }

    #[test]
    fn test_url_for_keeps_absolute_links() {
        let client = client("http://localhost:9090");
        let next = "http://localhost:9090/Products?$skiptoken=10";
        assert_eq!(client.url_for(next), next);
    }

    #[test]
    fn test_invalid_base_url_is_rejected() {
        let result = HttpClient::with_defaults("not a url", Vec::new(), Duration::from_secs(1));
        assert!(matches!(result, Err(TransportError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_invalid_header_name_is_transport_error() {
        let client = client("http://127.0.0.1:9");
        let result = client
            .call(Method::GET, "/", &[Header::new("bad header", "x")])
            .await;
        assert!(matches!(result, Err(TransportError::InvalidHeader { .. })));
    }
}
