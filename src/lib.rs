//! Infrastructure provider for the Turso database platform.
//!
//! Manages databases, groups, and access tokens of a Turso organization
//! through the platform's admin API, exposing them as declaratively
//! managed resources and read-only data sources.
//!
//! # Overview
//!
//! The crate provides:
//!
//! - **[`TursoProvider`]**: the [`ProviderService`] implementation a host
//!   framework drives through schema, plan, and CRUD calls
//! - **Schema types**: flat attribute schemas that drive validation and
//!   the generic plan step
//! - **[`client`]**: a typed client for the Turso admin API, scoped to one
//!   organization
//! - **[`testing`]**: a harness for driving a provider in tests without a
//!   host framework
//!
//! # Resources and data sources
//!
//! Managed resources: `turso_database`, `turso_group`,
//! `turso_database_token`, and `turso_group_token`. Data sources mirror
//! them and add the `turso_databases`, `turso_groups`, and
//! `turso_database_instances` listings.
//!
//! Minted tokens are JWTs the platform cannot return again later; the
//! token resources hold them in state as sensitive values, and deleting a
//! token resource rotates the parent's signing key, which invalidates
//! every token minted for it.
//!
//! # Quick Start
//!
//! ```ignore
//! use turso_provider::{ProviderService, TursoProvider};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     turso_provider::init_logging();
//!
//!     let provider = TursoProvider::new();
//!     let diagnostics = provider
//!         .configure(json!({"organization": "acme"}))
//!         .await?;
//!     assert!(diagnostics.is_empty());
//!
//!     let state = provider
//!         .create(
//!             "turso_group",
//!             json!({"name": "prod", "locations": ["sjc", "lhr"]}),
//!         )
//!         .await?;
//!     println!("created group {}", state["name"]);
//!     Ok(())
//! }
//! ```
//!
//! The API token comes from the `api_token` configuration attribute, the
//! `TURSO_API_TOKEN` environment variable, or a logged-in `turso` CLI, in
//! that order. It is never logged.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
mod data_sources;
pub mod error;
pub mod logging;
pub mod provider;
mod reconcile;
mod resources;
pub mod schema;
pub mod testing;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use client::{Client, ClientConfig};
pub use config::ProviderConfig;
pub use error::ProviderError;
pub use logging::{init_logging, init_logging_with_default, try_init_logging};
pub use provider::{ProviderService, TursoProvider};
pub use schema::ProviderSchema;
pub use types::{AttributeChange, PlanResult, ProviderMetadata};
pub use validation::{is_valid, validate, validate_result};

// Re-export async_trait for convenience
pub use async_trait::async_trait;

// Re-export commonly used external types
pub use serde_json;
pub use tracing;
