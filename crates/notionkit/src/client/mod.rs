//! The [`NotionApi`] capability and its implementations.
//!
//! [`http::HttpClient`] talks to the real API. [`MockClient`] keeps pages and
//! databases in memory, counts calls, and can be told to fail the next call,
//! which is what the provider tests run against.
//!
//! ```
//! use notionkit::{MockClient, NotionApi};
//!
//! let mock = MockClient::new();
//! let page = mock.add_page("page-123");
//!
//! assert_eq!(mock.get_page("page-123").unwrap(), page);
//! assert_eq!(mock.calls().get_page, 1);
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::{
    Database, DatabaseCreateRequest, DatabaseUpdateRequest, Page, Parent, PropertyConfig,
    PropertySchema, RichText,
};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Authenticated access to Notion pages and databases, keyed by object id.
///
/// Implementations must be safe to call from several threads at once.
pub trait NotionApi: Send + Sync {
    /// Fetch a page.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the page does not exist or is not shared
    /// with the integration.
    fn get_page(&self, id: &str) -> Result<Page>;

    /// Fetch a database.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if the database does not exist or is not
    /// shared with the integration.
    fn get_database(&self, id: &str) -> Result<Database>;

    /// Create a database.
    fn create_database(&self, request: &DatabaseCreateRequest) -> Result<Database>;

    /// Update a database's title and/or properties.
    fn update_database(&self, id: &str, request: &DatabaseUpdateRequest) -> Result<Database>;
}

/// Number of calls made to each [`MockClient`] operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get_page: usize,
    pub get_database: usize,
    pub create_database: usize,
    pub update_database: usize,
}

impl CallCounts {
    /// Total number of remote calls.
    pub fn total(&self) -> usize {
        self.get_page + self.get_database + self.create_database + self.update_database
    }
}

#[derive(Debug, Default)]
struct MockState {
    pages: HashMap<String, Page>,
    databases: HashMap<String, Database>,
    next_id: u64,
    get_failures: VecDeque<Error>,
    create_failures: VecDeque<Error>,
    calls: CallCounts,
}

impl MockState {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        format!("00000000-0000-4000-8000-{:012x}", self.next_id)
    }
}

/// In-memory Notion workspace for tests.
///
/// Clones share the same workspace, so a test can hand one clone to the code
/// under test and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MockClient {
    state: Arc<Mutex<MockState>>,
}

impl MockClient {
    /// Create an empty workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a workspace-level page with the given id.
    pub fn add_page(&self, id: &str) -> Page {
        let page = Page {
            id: id.to_string(),
            url: notion_url(id),
            parent: Parent::Workspace { workspace: true },
            created_time: fixed_time(),
        };
        let mut state = self.state.lock().unwrap();
        state.pages.insert(id.to_string(), page.clone());
        page
    }

    /// Add a database under `parent_page_id` with `(name, type)` properties.
    pub fn add_database(&self, id: &str, parent_page_id: &str, properties: &[(&str, &str)]) -> Database {
        let database = Database {
            id: id.to_string(),
            url: notion_url(id),
            parent: Parent::page(parent_page_id),
            created_time: fixed_time(),
            title: vec![RichText::text("Fixture")],
            properties: properties
                .iter()
                .enumerate()
                .map(|(i, (name, kind))| {
                    let config = PropertyConfig {
                        id: format!("p{i}"),
                        name: (*name).to_string(),
                        kind: (*kind).to_string(),
                    };
                    ((*name).to_string(), config)
                })
                .collect(),
        };
        let mut state = self.state.lock().unwrap();
        state.databases.insert(id.to_string(), database.clone());
        database
    }

    /// Remove a database, as if it was deleted in the Notion UI.
    pub fn remove_database(&self, id: &str) -> Option<Database> {
        self.state.lock().unwrap().databases.remove(id)
    }

    /// Fail the next `get_page`/`get_database` call with `error`.
    pub fn fail_next_get(&self, error: Error) {
        self.state.lock().unwrap().get_failures.push_back(error);
    }

    /// Fail the next `create_database` call with `error`.
    pub fn fail_next_create(&self, error: Error) {
        self.state.lock().unwrap().create_failures.push_back(error);
    }

    /// Calls made so far.
    pub fn calls(&self) -> CallCounts {
        self.state.lock().unwrap().calls
    }

    /// Current copy of a database, without counting a call.
    pub fn database(&self, id: &str) -> Option<Database> {
        self.state.lock().unwrap().databases.get(id).cloned()
    }

    /// Number of databases in the workspace.
    pub fn database_count(&self) -> usize {
        self.state.lock().unwrap().databases.len()
    }
}

impl NotionApi for MockClient {
    fn get_page(&self, id: &str) -> Result<Page> {
        let mut state = self.state.lock().unwrap();
        state.calls.get_page += 1;
        if let Some(err) = state.get_failures.pop_front() {
            return Err(err);
        }
        state.pages.get(id).cloned().ok_or_else(|| Error::NotFound {
            message: format!("Could not find page with ID: {id}."),
        })
    }

    fn get_database(&self, id: &str) -> Result<Database> {
        let mut state = self.state.lock().unwrap();
        state.calls.get_database += 1;
        if let Some(err) = state.get_failures.pop_front() {
            return Err(err);
        }
        state.databases.get(id).cloned().ok_or_else(|| Error::NotFound {
            message: format!("Could not find database with ID: {id}."),
        })
    }

    fn create_database(&self, request: &DatabaseCreateRequest) -> Result<Database> {
        let mut state = self.state.lock().unwrap();
        state.calls.create_database += 1;
        if let Some(err) = state.create_failures.pop_front() {
            return Err(err);
        }

        let Some(parent_id) = request.parent.page_id() else {
            return Err(Error::Validation {
                message: "body.parent.page_id should be defined".to_string(),
            });
        };
        if !state.pages.contains_key(parent_id) {
            return Err(Error::NotFound {
                message: format!("Could not find page with ID: {parent_id}."),
            });
        }
        if request.title_property_count() != 1 {
            return Err(Error::Validation {
                message: "Database must have exactly one title property.".to_string(),
            });
        }

        let id = state.next_id();
        let database = Database {
            url: notion_url(&id),
            id: id.clone(),
            parent: request.parent.clone(),
            created_time: Utc::now(),
            title: request.title.clone(),
            properties: property_configs(&request.properties),
        };
        state.databases.insert(id, database.clone());
        Ok(database)
    }

    fn update_database(&self, id: &str, request: &DatabaseUpdateRequest) -> Result<Database> {
        let mut state = self.state.lock().unwrap();
        state.calls.update_database += 1;
        let database = state.databases.get_mut(id).ok_or_else(|| Error::NotFound {
            message: format!("Could not find database with ID: {id}."),
        })?;

        if let Some(title) = &request.title {
            database.title = title.clone();
        }
        if let Some(properties) = &request.properties {
            database.properties.extend(property_configs(properties));
        }
        Ok(database.clone())
    }
}

fn property_configs(schemas: &BTreeMap<String, PropertySchema>) -> BTreeMap<String, PropertyConfig> {
    schemas
        .iter()
        .map(|(name, schema)| {
            let config = PropertyConfig {
                id: if schema.is_title() { "title".to_string() } else { name.clone() },
                name: name.clone(),
                kind: schema.kind.clone(),
            };
            (name.clone(), config)
        })
        .collect()
}

fn notion_url(id: &str) -> String {
    format!("https://www.notion.so/{}", id.replace('-', ""))
}

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0)
        .single()
        .unwrap_or_default()
}
