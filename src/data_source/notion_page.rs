//! `notion_page` data source

use crate::models::{NotionPageModel, require_known};
use crate::provider::{ProviderClient, remote_error, unconfigured};
use declarative::{Attribute, DataSource, Diagnostic, OperationContext, ProviderData, Schema};

#[derive(Debug, Default)]
pub struct NotionPageDataSource {
    client: Option<ProviderClient>,
}

impl NotionPageDataSource {
    pub fn new(client: ProviderClient) -> Self {
        Self { client: Some(client) }
    }
}

impl DataSource for NotionPageDataSource {
    type Model = NotionPageModel;

    fn type_name(&self, provider_type_name: &str) -> String {
        format!("{provider_type_name}_notion_page")
    }

    fn schema(&self) -> Schema {
        Schema::new("Look up a Notion page by id.")
            .with_attribute("id", Attribute::required_string().with_description("Identifier of the page."))
            .with_attribute("url", Attribute::computed_string())
            .with_attribute(
                "parent_id",
                Attribute::computed_string()
                    .with_description("Identifier of the parent page, database or block. Empty for workspace pages."),
            )
            .with_attribute("created_time", Attribute::computed_string())
    }

    fn configure(&mut self, data: &ProviderData) -> Result<(), Diagnostic> {
        *self = Self::new(ProviderClient::from_data(data)?);
        Ok(())
    }

    fn read(&self, _ctx: &mut OperationContext, config: NotionPageModel) -> Result<NotionPageModel, Diagnostic> {
        let client = self.client.as_ref().ok_or_else(unconfigured)?;
        let id = require_known(&config.id, "id")?;

        let page = client
            .api
            .get_page(id)
            .map_err(|e| remote_error("Failed to read page", &e).with_attribute("id"))?;

        log::debug!("Read page {}", page.id);
        Ok(NotionPageModel::from(&page))
    }
}
