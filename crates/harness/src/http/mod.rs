//! HTTP client adapter.
//!
//! [`HttpClient`] wraps a `reqwest` client bound to the service root.
//! [`Response`] is the fully-read result handed to tests, and [`Header`] is
//! the request header type shared by the client, the test context and the
//! `$batch` builder.

mod client;
mod header;
mod response;

pub use client::HttpClient;
pub use header::{
    ACCEPT, CONTENT_ID, CONTENT_TYPE, ETAG, Header, IF_MATCH, IF_NONE_MATCH, LOCATION,
    ODATA_ENTITY_ID, ODATA_MAX_VERSION, ODATA_VERSION, PREFER, PREFERENCE_APPLIED, merge_headers,
};
pub use reqwest::Method;
pub use response::Response;
