//! Retail operations service library.
//!
//! Hexagonal layout:
//! - [`domain`]: staff, procurement, notifications, inventory, promotions,
//!   alerts and sales, with their ports and services.
//! - [`inbound`]: the REST adapter under `/api` and the SSE streams under
//!   `/stream`.
//! - [`outbound`]: demo-seeded repositories, fallback decorators, read-model
//!   caches, the live event bus and the sale generator.
//! - [`middleware`]: request tracing.
//! - [`settings`]: `RETAIL_*` configuration.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
pub use settings::AppSettings;
