//! State models for the Notion resource and data sources
//!
//! Field names are the attribute names the orchestrator sees.

use declarative::{Diagnostic, StringValue, is_unknown_marker};
use notionkit::{Database, Page, format_timestamp};
use serde::{Deserialize, Deserializer, Serialize};

/// State of a managed `notion_database`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotionDatabaseResourceModel {
    #[serde(default)]
    pub id: StringValue,
    #[serde(default)]
    pub url: StringValue,
    #[serde(default)]
    pub parent_id: StringValue,
    #[serde(default)]
    pub created_time: StringValue,
}

impl NotionDatabaseResourceModel {
    /// Copy the server-assigned attributes
    pub fn set_computed(&mut self, database: &Database) {
        self.id = database.id.clone().into();
        self.url = database.url.clone().into();
        self.created_time = format_timestamp(&database.created_time).into();
    }

    /// Replace every attribute with the remote values
    pub fn refresh(&mut self, database: &Database) {
        self.set_computed(database);
        self.parent_id = database.parent.id().to_string().into();
    }
}

/// Result of a `notion_page` lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotionPageModel {
    #[serde(default)]
    pub id: StringValue,
    #[serde(default)]
    pub url: StringValue,
    #[serde(default)]
    pub parent_id: StringValue,
    #[serde(default)]
    pub created_time: StringValue,
}

impl From<&Page> for NotionPageModel {
    fn from(page: &Page) -> Self {
        Self {
            id: page.id.clone().into(),
            url: page.url.clone().into(),
            parent_id: page.parent.id().to_string().into(),
            created_time: format_timestamp(&page.created_time).into(),
        }
    }
}

/// One property of a looked-up database
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NotionDatabasePropertyModel {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Result of a `notion_database` lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotionDatabaseModel {
    #[serde(default)]
    pub id: StringValue,
    #[serde(default)]
    pub url: StringValue,
    #[serde(default)]
    pub parent_id: StringValue,
    #[serde(default)]
    pub created_time: StringValue,
    /// `None` until read
    #[serde(default, deserialize_with = "list_or_unknown")]
    pub properties: Option<Vec<NotionDatabasePropertyModel>>,
}

impl From<&Database> for NotionDatabaseModel {
    fn from(database: &Database) -> Self {
        let mut properties: Vec<_> = database
            .properties
            .iter()
            .map(|(name, config)| NotionDatabasePropertyModel {
                name: name.clone(),
                kind: config.kind.clone(),
            })
            .collect();
        properties.sort_by(|a, b| a.name.cmp(&b.name));

        Self {
            id: database.id.clone().into(),
            url: database.url.clone().into(),
            parent_id: database.parent.id().to_string().into(),
            created_time: format_timestamp(&database.created_time).into(),
            properties: Some(properties),
        }
    }
}

/// A null or unknown list decodes as `None`
fn list_or_unknown<'de, D>(deserializer: D) -> Result<Option<Vec<NotionDatabasePropertyModel>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() || is_unknown_marker(&value) {
        return Ok(None);
    }
    serde_json::from_value(value).map(Some).map_err(serde::de::Error::custom)
}

/// The known value of `attribute`, or an error naming it
pub fn require_known<'a>(value: &'a StringValue, attribute: &str) -> Result<&'a str, Diagnostic> {
    match value {
        StringValue::Known(v) if !v.is_empty() => Ok(v),
        StringValue::Unknown => Err(Diagnostic::error(
            format!("Unknown {attribute}"),
            format!("The {attribute} value must be known before this operation can run."),
        )
        .with_attribute(attribute)),
        _ => Err(Diagnostic::error(
            format!("Missing {attribute}"),
            format!("The {attribute} attribute must be set to a non-empty value."),
        )
        .with_attribute(attribute)),
    }
}
