//! # Declarative
//!
//! A framework for declarative resource providers.
//!
//! A host orchestrator owns planning, diffing and state persistence. A
//! provider built on this crate owns only the mapping between the generic
//! resource lifecycle and one concrete remote API.
//!
//! ## Core Concepts
//!
//! - **Schema**: static declaration of a kind's attributes (required,
//!   optional or computed; sensitive or plain; scalar or nested list)
//! - **Resource**: a managed kind with Create/Read/Update/Delete over a
//!   typed state model
//! - **DataSource**: a read-only lookup kind
//! - **Provider**: configures shared data once and lists its kinds
//! - **ProviderServer**: dispatches calls by type name, isolating failures
//!   into diagnostics
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ProviderServer, Response};
//! use serde_json::json;
//!
//! let server = ProviderServer::new(MyProvider::new("dev"));
//! let diags = server.configure(json!({ "token": "..." }));
//! assert!(!diags.has_error());
//!
//! let response: Response = server.create("my_thing", json!({ "name": "a" }));
//! for diag in &response.diagnostics {
//!     eprintln!("{diag}");
//! }
//! ```
//!
//! ## Dependency Injection
//!
//! The provider's configured client is handed to controllers as
//! [`ProviderData`], a type-erased shared value checked once per controller
//! in `configure`. A mismatch becomes a diagnostic, never a panic.

pub mod context;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod server;
pub mod types;

// Re-export main types at crate root
pub use context::{OperationContext, ProviderData};
pub use provider::Provider;
pub use resource::{
    DataSource, DataSourceFactory, DynDataSource, DynResource, Resource, ResourceFactory,
    Response, data_source, resource,
};
pub use schema::{Attribute, AttributeKind, AttributeMode, Attributes, REDACTED, Schema, Validation};
pub use server::{Call, ProviderSchemas, ProviderServer};
pub use types::{Diagnostic, Diagnostics, Severity, StringValue, UNKNOWN_KEY, is_unknown_marker};
