//! `multipart/mixed` assembly for `$batch` requests.
//!
//! The harness sends batch bodies verbatim; this module only builds the
//! text and counts status lines in what comes back.

use odata_harness::Header;
use serde_json::Value;
use uuid::Uuid;

const CRLF: &str = "\r\n";

/// One request inside a batch.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    method: String,
    url: String,
    headers: Vec<Header>,
    body: Option<String>,
    content_id: Option<String>,
}

impl BatchRequest {
    fn new(method: &str, url: impl Into<String>) -> Self {
        Self {
            method: method.to_string(),
            url: url.into(),
            headers: Vec::new(),
            body: None,
            content_id: None,
        }
    }

    /// `GET url`, asking for JSON.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url).with_header(Header::accept("application/json"))
    }

    /// `POST url` with a JSON body.
    pub fn post_json(url: impl Into<String>, body: &Value) -> Self {
        Self::new("POST", url).with_json(body)
    }

    /// `PATCH url` with a JSON body.
    pub fn patch_json(url: impl Into<String>, body: &Value) -> Self {
        Self::new("PATCH", url).with_json(body)
    }

    /// `DELETE url`
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new("DELETE", url)
    }

    /// Adds a header to the embedded request.
    pub fn with_header(mut self, header: Header) -> Self {
        self.headers.push(header);
        self
    }

    /// Sets the part's `Content-ID`, which later requests in the same
    /// change set can reference as `$<id>`.
    pub fn with_content_id(mut self, id: impl Into<String>) -> Self {
        self.content_id = Some(id.into());
        self
    }

    fn with_json(mut self, body: &Value) -> Self {
        self.headers.push(Header::content_type("application/json"));
        self.body = Some(body.to_string());
        self
    }

    fn write(&self, out: &mut String) {
        out.push_str("Content-Type: application/http");
        out.push_str(CRLF);
        out.push_str("Content-Transfer-Encoding: binary");
        out.push_str(CRLF);
        if let Some(id) = &self.content_id {
            out.push_str(&format!("Content-ID: {id}{CRLF}"));
        }
        out.push_str(CRLF);

        out.push_str(&format!("{} {} HTTP/1.1{CRLF}", self.method, self.url));
        for header in &self.headers {
            out.push_str(&format!("{}: {}{CRLF}", header.key, header.value));
        }
        out.push_str(CRLF);
        if let Some(body) = &self.body {
            out.push_str(body);
            out.push_str(CRLF);
        }
    }
}

#[derive(Debug, Clone)]
enum Part {
    Request(BatchRequest),
    ChangeSet {
        boundary: String,
        requests: Vec<BatchRequest>,
    },
}

/// Builds a `multipart/mixed` batch body.
///
/// # Example
///
/// ```rust
/// use odata_suites::multipart::{BatchBuilder, BatchRequest};
///
/// let batch = BatchBuilder::with_boundary("batch_1")
///     .request(BatchRequest::get("Products?$top=1"))
///     .request(BatchRequest::get("Categories?$top=1"));
/// assert_eq!(batch.content_type(), "multipart/mixed;boundary=batch_1");
/// assert!(batch.build().ends_with("--batch_1--\r\n"));
/// ```
#[derive(Debug, Clone)]
pub struct BatchBuilder {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for BatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchBuilder {
    /// Creates an empty batch with a random boundary.
    pub fn new() -> Self {
        Self::with_boundary(format!("batch_{}", Uuid::new_v4().simple()))
    }

    /// Creates an empty batch with a fixed boundary.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    /// Returns the batch boundary.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Returns the `Content-Type` to send the batch with.
    pub fn content_type(&self) -> String {
        format!("multipart/mixed;boundary={}", self.boundary)
    }

    /// Appends a top-level request.
    pub fn request(mut self, request: BatchRequest) -> Self {
        self.parts.push(Part::Request(request));
        self
    }

    /// Appends an atomic change set.
    pub fn changeset(mut self, requests: Vec<BatchRequest>) -> Self {
        let boundary = format!("changeset_{}", Uuid::new_v4().simple());
        self.parts.push(Part::ChangeSet { boundary, requests });
        self
    }

    /// Renders the body.
    pub fn build(&self) -> String {
        let mut out = String::new();
        for part in &self.parts {
            out.push_str(&format!("--{}{CRLF}", self.boundary));
            match part {
                Part::Request(request) => request.write(&mut out),
                Part::ChangeSet { boundary, requests } => {
                    out.push_str(&format!("Content-Type: multipart/mixed;boundary={boundary}{CRLF}"));
                    out.push_str(CRLF);
                    for request in requests {
                        out.push_str(&format!("--{boundary}{CRLF}"));
                        request.write(&mut out);
                    }
                    out.push_str(&format!("--{boundary}--{CRLF}"));
                }
            }
        }
        out.push_str(&format!("--{}--{CRLF}", self.boundary));
        out
    }
}

/// Counts embedded response status lines (`HTTP/1.1 <code> ...`).
pub fn count_status_lines(body: &str, code: u16) -> usize {
    let prefix = format!("HTTP/1.1 {code}");
    body.lines()
        .map(str::trim)
        .filter(|line| {
            line.strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
        })
        .count()
}

/// Extracts the `boundary` parameter from a `multipart/*` content type.
pub fn boundary_of(content_type: &str) -> Option<&str> {
    content_type
        .split(';')
        .map(str::trim)
        .find_map(|param| {
            let (name, value) = param.split_once('=')?;
            name.trim()
                .eq_ignore_ascii_case("boundary")
                .then(|| value.trim().trim_matches('"'))
        })
        .filter(|boundary| !boundary.is_empty())
}
