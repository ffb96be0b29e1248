//! # odata-suites
//!
//! OData v4/v4.01 conformance suites written against the `odata-harness`
//! DSL. Each module builds one [`Suite`] tied to one section of the OData
//! documents; [`register_all`] adds every suite to a [`Registry`].
//!
//! | Suite                 | Covers                                           |
//! |-----------------------|--------------------------------------------------|
//! | `ServiceDocument`     | Service root document                            |
//! | `Metadata`            | `$metadata` CSDL document                        |
//! | `VersionHeaders`      | `OData-Version` / `OData-MaxVersion`             |
//! | `QueryOptions`        | `$top`, `$skip`, `$count`, `$select`, ...        |
//! | `EntityCrud`          | Create, read, update, delete                     |
//! | `ConditionalRequests` | ETags and preconditions                          |
//! | `Batch`               | Multipart and JSON `$batch`                      |
//! | `ErrorResponses`      | JSON error format                                |
//! | `DerivedTypes`        | Type-cast segments and `isof`                    |
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use odata_harness::{HarnessConfig, Runner};
//!
//! let config = HarnessConfig {
//!     server_url: "http://localhost:8080/odata".to_string(),
//!     ..Default::default()
//! };
//! let registry = odata_suites::registry()?;
//! let report = Runner::from_config(&config)?.run(&registry).await;
//! println!("{:?}", report.summary());
//! # Ok(())
//! # }
//! ```

use odata_harness::{Registry, RegistryError, Suite};
use tracing::debug;

pub mod multipart;

pub mod batch;
pub mod conditional;
pub mod crud;
pub mod derived_types;
pub mod errors;
pub mod metadata;
pub mod query_options;
pub mod service_document;
pub mod version_headers;

mod support;

/// Returns every suite, in registration order.
pub fn all_suites() -> Vec<Suite> {
    vec![
        service_document::suite(),
        metadata::suite(),
        version_headers::suite(),
        query_options::suite(),
        crud::suite(),
        conditional::suite(),
        batch::suite(),
        errors::suite(),
        derived_types::suite(),
    ]
}

/// Registers every suite with `registry`.
///
/// # Errors
///
/// Returns [`RegistryError`] if a suite or test name is already taken.
pub fn register_all(registry: &mut Registry) -> Result<(), RegistryError> {
    for suite in all_suites() {
        registry.register(suite)?;
    }
    debug!(
        suites = registry.len(),
        tests = registry.test_count(),
        "Registered conformance suites"
    );
    Ok(())
}

/// Returns a registry holding every suite.
pub fn registry() -> Result<Registry, RegistryError> {
    let mut registry = Registry::new();
    register_all(&mut registry)?;
    Ok(registry)
}
