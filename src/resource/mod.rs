//! Managed resources served by the provider

pub mod notion_database;

pub use notion_database::NotionDatabaseResource;
