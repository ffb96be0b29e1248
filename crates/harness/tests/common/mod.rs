//! Common test utilities for harness integration tests.
//!
//! - [`stub_server`] - In-process OData stub service
//! - [`fixtures`] - Canned entities and metadata documents

#![allow(dead_code)]

pub mod fixtures;
pub mod stub_server;
