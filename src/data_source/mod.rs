//! Read-only data sources served by the provider

pub mod notion_database;
pub mod notion_page;

pub use notion_database::NotionDatabaseDataSource;
pub use notion_page::NotionPageDataSource;
