//! Notion API objects used by the client.
//!
//! Only the fields the provider reads or writes are modelled; everything else
//! in the API payloads is ignored on deserialization.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;

/// Where a page or database lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Parent {
    PageId { page_id: String },
    DatabaseId { database_id: String },
    BlockId { block_id: String },
    Workspace { workspace: bool },
    #[serde(other)]
    Unsupported,
}

impl Parent {
    /// Parent reference to a page.
    pub fn page(page_id: impl Into<String>) -> Self {
        Self::PageId {
            page_id: page_id.into(),
        }
    }

    /// The parent page id, if the parent is a page.
    pub fn page_id(&self) -> Option<&str> {
        match self {
            Self::PageId { page_id } => Some(page_id),
            _ => None,
        }
    }

    /// Id of the parent object. Empty for workspace-level objects.
    pub fn id(&self) -> &str {
        match self {
            Self::PageId { page_id } => page_id,
            Self::DatabaseId { database_id } => database_id,
            Self::BlockId { block_id } => block_id,
            Self::Workspace { .. } | Self::Unsupported => "",
        }
    }
}

/// Plain text content of a rich text item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub content: String,
}

/// A rich text item. Requests only ever send `text` items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Text>,
    #[serde(default, skip_serializing)]
    pub plain_text: String,
}

impl RichText {
    /// A plain `text` rich text item.
    pub fn text(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            kind: "text".to_string(),
            plain_text: content.clone(),
            text: Some(Text { content }),
        }
    }
}

/// A database property as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// A property definition sent when creating or updating a database.
///
/// Serializes as `{"type": "<kind>", "<kind>": {}}`, which is the shape the
/// API expects for property types without extra configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySchema {
    pub kind: String,
}

impl PropertySchema {
    /// The `title` property type. Every database has exactly one.
    pub fn title() -> Self {
        Self {
            kind: "title".to_string(),
        }
    }

    pub fn is_title(&self) -> bool {
        self.kind == "title"
    }
}

impl Serialize for PropertySchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", &self.kind)?;
        map.serialize_entry(&self.kind, &serde_json::Map::new())?;
        map.end()
    }
}

/// A Notion page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub url: String,
    pub parent: Parent,
    pub created_time: DateTime<Utc>,
}

/// A Notion database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub id: String,
    pub url: String,
    pub parent: Parent,
    pub created_time: DateTime<Utc>,
    #[serde(default)]
    pub title: Vec<RichText>,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyConfig>,
}

impl Database {
    /// Concatenated plain text of the title.
    pub fn title_text(&self) -> String {
        self.title.iter().map(|t| t.plain_text.as_str()).collect()
    }
}

/// Body of `POST /databases`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseCreateRequest {
    pub parent: Parent,
    pub title: Vec<RichText>,
    pub properties: BTreeMap<String, PropertySchema>,
    pub is_inline: bool,
}

impl DatabaseCreateRequest {
    /// Number of `title` properties in the request. The API requires exactly one.
    pub fn title_property_count(&self) -> usize {
        self.properties.values().filter(|p| p.is_title()).count()
    }
}

/// Body of `PATCH /databases/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatabaseUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Vec<RichText>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, PropertySchema>>,
}

/// Format a timestamp the way the API writes it (RFC 3339, milliseconds, `Z`).
pub fn format_timestamp(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}
