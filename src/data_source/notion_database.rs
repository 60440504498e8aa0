//! `notion_database` data source
//!
//! Reports the database's properties as a list of `{name, type}` objects
//! sorted by name, so the result is stable across reads.

use crate::models::{NotionDatabaseModel, require_known};
use crate::provider::{ProviderClient, remote_error, unconfigured};
use declarative::{Attribute, Attributes, DataSource, Diagnostic, OperationContext, ProviderData, Schema};

#[derive(Debug, Default)]
pub struct NotionDatabaseDataSource {
    client: Option<ProviderClient>,
}

impl NotionDatabaseDataSource {
    pub fn new(client: ProviderClient) -> Self {
        Self { client: Some(client) }
    }
}

impl DataSource for NotionDatabaseDataSource {
    type Model = NotionDatabaseModel;

    fn type_name(&self, provider_type_name: &str) -> String {
        format!("{provider_type_name}_notion_database")
    }

    fn schema(&self) -> Schema {
        let property = Attributes::new()
            .with("name", Attribute::computed_string())
            .with("type", Attribute::computed_string());

        Schema::new("Look up a Notion database by id.")
            .with_attribute("id", Attribute::required_string().with_description("Identifier of the database."))
            .with_attribute("url", Attribute::computed_string())
            .with_attribute("parent_id", Attribute::computed_string())
            .with_attribute("created_time", Attribute::computed_string())
            .with_attribute(
                "properties",
                Attribute::computed_list_nested(property).with_description("Database properties, sorted by name."),
            )
    }

    fn configure(&mut self, data: &ProviderData) -> Result<(), Diagnostic> {
        *self = Self::new(ProviderClient::from_data(data)?);
        Ok(())
    }

    fn read(
        &self,
        _ctx: &mut OperationContext,
        config: NotionDatabaseModel,
    ) -> Result<NotionDatabaseModel, Diagnostic> {
        let client = self.client.as_ref().ok_or_else(unconfigured)?;
        let id = require_known(&config.id, "id")?;

        let database = client
            .api
            .get_database(id)
            .map_err(|e| remote_error("Failed to read database", &e).with_attribute("id"))?;

        log::debug!("Read database {} with {} properties", database.id, database.properties.len());
        Ok(NotionDatabaseModel::from(&database))
    }
}
