//! # Notionkit
//!
//! A small, blocking client for the parts of the Notion API that deal with
//! pages and databases.
//!
//! ## Overview
//!
//! - [`NotionApi`]: the capability trait (`get_page`, `get_database`,
//!   `create_database`, `update_database`), keyed by object id
//! - [`HttpClient`]: implementation over `ureq` with bearer auth, the pinned
//!   `Notion-Version` header and bounded retry of transient failures
//! - [`MockClient`]: in-memory implementation for tests
//! - [`Error`] / [`ErrorCategory`]: categorized errors, including a distinct
//!   not-found kind
//!
//! ## Example
//!
//! ```no_run
//! use notionkit::{HttpClient, NotionApi, RetryConfig};
//!
//! let client = HttpClient::new(std::env::var("NOTION_SECRET").unwrap())
//!     .with_retry(RetryConfig::default());
//!
//! match client.get_database("bc1211ca-e3f1-4939-ae34-5260b16f627c") {
//!     Ok(db) => println!("{} has {} properties", db.url, db.properties.len()),
//!     Err(e) if e.is_not_found() => println!("gone"),
//!     Err(e) => eprintln!("{e} ({})", e.category().advice()),
//! }
//! ```

pub mod client;
pub mod error;
pub mod retry;
pub mod types;

pub use client::http::{DEFAULT_API_BASE, HttpClient, NOTION_VERSION};
pub use client::{CallCounts, MockClient, NotionApi};
pub use error::{Error, ErrorCategory, Result};
pub use retry::{LogCallback, NoCallback, RetryCallback, RetryConfig, with_retry, with_retry_if};
pub use types::{
    Database, DatabaseCreateRequest, DatabaseUpdateRequest, Page, Parent, PropertyConfig,
    PropertySchema, RichText, Text, format_timestamp,
};
