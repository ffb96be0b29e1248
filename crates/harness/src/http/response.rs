//! Captured HTTP responses.

use std::borrow::Cow;
use std::time::Duration;

use bytes::Bytes;
use serde_json::Value;

/// A fully-read HTTP response.
///
/// Headers are kept as an ordered multimap of the raw values the server
/// sent. Lookups by name are case-insensitive. The body is read to the end
/// before the response is handed to a test.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: Vec<(String, String)>,
    body: Bytes,
    elapsed: Duration,
}

impl Response {
    /// Creates a response from its parts.
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            elapsed: Duration::ZERO,
        }
    }

    pub(crate) fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Returns the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns all headers in the order the server sent them.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Returns the first value of the named header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns every value of the named header.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Returns true if the named header is present.
    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    /// Returns the `Content-Type` header, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Returns the raw body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the body as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// Returns how long the call took, from send to fully-read body.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Response {
        Response::new(
            200,
            vec![
                ("content-type".to_string(), "application/json".to_string()),
                ("vary".to_string(), "Accept".to_string()),
                ("Vary".to_string(), "Origin".to_string()),
            ],
            r#"{"value":[]}"#,
        )
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let response = sample();
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert!(response.has_header("CONTENT-TYPE"));
        assert!(!response.has_header("ETag"));
    }

    #[test]
    fn test_header_values_keeps_order() {
        let response = sample();
        assert_eq!(response.header_values("VARY"), vec!["Accept", "Origin"]);
    }

    #[test]
    fn test_body_views() {
        let response = sample();
        assert_eq!(response.text(), r#"{"value":[]}"#);
        assert!(response.json().is_ok_and(|v| v["value"].is_array()));
    }

    #[test]
    fn test_invalid_json_is_error() {
        let response = Response::new(200, Vec::new(), "<edmx:Edmx/>");
        assert!(response.json().is_err());
    }
}
