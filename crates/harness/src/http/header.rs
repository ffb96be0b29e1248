//! Request header values and OData header names.

use serde::Serialize;

/// `OData-Version` header name.
pub const ODATA_VERSION: &str = "OData-Version";
/// `OData-MaxVersion` header name.
pub const ODATA_MAX_VERSION: &str = "OData-MaxVersion";
/// `OData-EntityId` header name.
pub const ODATA_ENTITY_ID: &str = "OData-EntityId";
/// `Prefer` header name.
pub const PREFER: &str = "Prefer";
/// `Preference-Applied` header name.
pub const PREFERENCE_APPLIED: &str = "Preference-Applied";
/// `If-Match` header name.
pub const IF_MATCH: &str = "If-Match";
/// `If-None-Match` header name.
pub const IF_NONE_MATCH: &str = "If-None-Match";
/// `Content-ID` header name, used inside `$batch` parts.
pub const CONTENT_ID: &str = "Content-ID";
/// `Accept` header name.
pub const ACCEPT: &str = "Accept";
/// `Content-Type` header name.
pub const CONTENT_TYPE: &str = "Content-Type";
/// `ETag` header name.
pub const ETAG: &str = "ETag";
/// `Location` header name.
pub const LOCATION: &str = "Location";

/// A single request header.
///
/// Keys compare case-insensitively wherever headers are merged or looked up;
/// the key is sent with the casing given here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Header name.
    pub key: String,
    /// Header value.
    pub value: String,
}

impl Header {
    /// Creates a header from any name/value pair.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// `OData-Version: <version>`
    pub fn odata_version(version: impl Into<String>) -> Self {
        Self::new(ODATA_VERSION, version)
    }

    /// `OData-MaxVersion: <version>`
    pub fn odata_max_version(version: impl Into<String>) -> Self {
        Self::new(ODATA_MAX_VERSION, version)
    }

    /// `Prefer: <preference>`
    pub fn prefer(preference: impl Into<String>) -> Self {
        Self::new(PREFER, preference)
    }

    /// `If-Match: <etag>`
    pub fn if_match(etag: impl Into<String>) -> Self {
        Self::new(IF_MATCH, etag)
    }

    /// `If-None-Match: <etag>`
    pub fn if_none_match(etag: impl Into<String>) -> Self {
        Self::new(IF_NONE_MATCH, etag)
    }

    /// `Content-ID: <id>`
    pub fn content_id(id: impl Into<String>) -> Self {
        Self::new(CONTENT_ID, id)
    }

    /// `Accept: <media type>`
    pub fn accept(media_type: impl Into<String>) -> Self {
        Self::new(ACCEPT, media_type)
    }

    /// `Content-Type: <media type>`
    pub fn content_type(media_type: impl Into<String>) -> Self {
        Self::new(CONTENT_TYPE, media_type)
    }

    /// Returns true if this header's key matches `name`, ignoring case.
    pub fn is(&self, name: &str) -> bool {
        self.key.eq_ignore_ascii_case(name)
    }
}

/// Layers `overrides` on top of `defaults`.
///
/// A later header replaces an earlier one with the same key (compared
/// case-insensitively) in place; new keys are appended in order. Neither
/// input is modified, so per-call overrides never leak into the client's
/// defaults.
pub fn merge_headers(defaults: &[Header], overrides: &[Header]) -> Vec<Header> {
    let mut merged: Vec<Header> = Vec::with_capacity(defaults.len() + overrides.len());

    for header in defaults.iter().chain(overrides) {
        match merged.iter_mut().find(|h| h.is(&header.key)) {
            Some(existing) => *existing = header.clone(),
            None => merged.push(header.clone()),
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_replaces_default_case_insensitively() {
        let defaults = vec![
            Header::accept("application/json"),
            Header::odata_max_version("4.01"),
        ];
        let overrides = vec![Header::new("odata-maxversion", "4.0")];

        let merged = merge_headers(&defaults, &overrides);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1], Header::new("odata-maxversion", "4.0"));
        // defaults untouched
        assert_eq!(defaults[1].value, "4.01");
    }

    #[test]
    fn test_new_keys_are_appended_in_order() {
        let merged = merge_headers(
            &[Header::accept("application/json")],
            &[Header::prefer("return=minimal"), Header::if_match("*")],
        );
        let keys: Vec<&str> = merged.iter().map(|h| h.key.as_str()).collect();
        assert_eq!(keys, vec!["Accept", "Prefer", "If-Match"]);
    }

    #[test]
    fn test_later_override_wins() {
        let merged = merge_headers(
            &[],
            &[Header::prefer("return=minimal"), Header::prefer("return=representation")],
        );
        assert_eq!(merged, vec![Header::prefer("return=representation")]);
    }

    #[test]
    fn test_header_helpers() {
        assert_eq!(Header::odata_version("4.0").key, "OData-Version");
        assert_eq!(Header::if_none_match("W/\"1\"").key, "If-None-Match");
        assert_eq!(Header::content_id("1").key, "Content-ID");
        assert!(Header::accept("application/xml").is("accept"));
    }
}
