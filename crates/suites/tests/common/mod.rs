//! Common test utilities for suite integration tests.
//!
//! The stub service and its canned data are shared with the harness
//! integration tests.
//!
//! - [`stub_server`] - In-process OData service the suites run against
//! - [`fixtures`] - Canned entities and metadata documents

#![allow(dead_code)]

#[path = "../../../harness/tests/common/fixtures.rs"]
pub mod fixtures;
#[path = "../../../harness/tests/common/stub_server.rs"]
pub mod stub_server;
