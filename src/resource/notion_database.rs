//! `notion_database` managed resource
//!
//! Creates a database under a parent page. The database itself is never
//! removed remotely: delete only drops it from state.

use crate::models::{NotionDatabaseResourceModel, require_known};
use crate::provider::{ProviderClient, RecreatePolicy, remote_error, unconfigured};
use declarative::{Attribute, Diagnostic, OperationContext, ProviderData, Resource, Schema};
use notionkit::{Database, DatabaseCreateRequest, ErrorCategory, Parent, PropertySchema, RichText};
use std::collections::BTreeMap;

/// Title given to every created database
pub const DEFAULT_TITLE: &str = "Title";

/// Name of the single title property every created database gets
pub const TITLE_PROPERTY: &str = "create";

#[derive(Debug, Default)]
pub struct NotionDatabaseResource {
    client: Option<ProviderClient>,
}

impl NotionDatabaseResource {
    pub fn new(client: ProviderClient) -> Self {
        Self { client: Some(client) }
    }

    fn client(&self) -> Result<&ProviderClient, Diagnostic> {
        self.client.as_ref().ok_or_else(unconfigured)
    }

    fn create_request(parent_id: &str) -> DatabaseCreateRequest {
        let mut properties = BTreeMap::new();
        properties.insert(TITLE_PROPERTY.to_string(), PropertySchema::title());

        DatabaseCreateRequest {
            parent: Parent::page(parent_id),
            title: vec![RichText::text(DEFAULT_TITLE)],
            properties,
            is_inline: false,
        }
    }

    fn create_remote(&self, parent_id: &str) -> Result<Database, Diagnostic> {
        let client = self.client()?;
        log::debug!("Creating database under page {parent_id}");
        client
            .api
            .create_database(&Self::create_request(parent_id))
            .map_err(|e| {
                let diagnostic = remote_error("Failed to create database", &e);
                match e.category() {
                    ErrorCategory::NotFound | ErrorCategory::Validation => diagnostic.with_attribute("parent_id"),
                    _ => diagnostic,
                }
            })
    }

    /// Look up the database the state points at, creating a replacement when
    /// the policy allows it
    fn existing_or_replacement(
        &self,
        ctx: &mut OperationContext,
        id: Option<&str>,
        parent_id: &str,
    ) -> Result<Database, Diagnostic> {
        let client = self.client()?;

        let Some(id) = id else {
            log::info!("No database id in state; creating a new database");
            let database = self.create_remote(parent_id)?;
            ctx.warn(
                "Database re-created",
                format!("The state had no database id. Created database {}.", database.id),
            );
            return Ok(database);
        };

        match client.api.get_database(id) {
            Ok(database) => Ok(database),
            Err(err) if client.recreate_policy.allows(&err) => {
                log::info!("Database {id} could not be read ({err}); creating a replacement");
                let database = self.create_remote(parent_id)?;
                let reason = match client.recreate_policy {
                    RecreatePolicy::NotFoundOnly => "no longer exists".to_string(),
                    RecreatePolicy::AnyError => format!("could not be read: {err}"),
                };
                ctx.warn(
                    "Database re-created",
                    format!("Database {id} {reason}. Created database {} to replace it.", database.id),
                );
                Ok(database)
            }
            Err(err) => Err(remote_error("Failed to read database", &err).with_attribute("id")),
        }
    }
}

impl Resource for NotionDatabaseResource {
    type Model = NotionDatabaseResourceModel;

    fn type_name(&self, provider_type_name: &str) -> String {
        format!("{provider_type_name}_notion_database")
    }

    fn schema(&self) -> Schema {
        Schema::new("A Notion database created under a parent page.")
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("Identifier of the database."),
            )
            .with_attribute("url", Attribute::computed_string())
            .with_attribute(
                "parent_id",
                Attribute::required_string().with_description("Identifier of the page the database lives in."),
            )
            .with_attribute(
                "created_time",
                Attribute::computed_string().with_description("Creation time in RFC 3339 format."),
            )
    }

    fn configure(&mut self, data: &ProviderData) -> Result<(), Diagnostic> {
        *self = Self::new(ProviderClient::from_data(data)?);
        Ok(())
    }

    fn create(
        &self,
        _ctx: &mut OperationContext,
        mut plan: NotionDatabaseResourceModel,
    ) -> Result<NotionDatabaseResourceModel, Diagnostic> {
        let parent_id = require_known(&plan.parent_id, "parent_id")?.to_string();
        let database = self.create_remote(&parent_id)?;

        log::info!("Created database {}", database.id);
        plan.set_computed(&database);
        Ok(plan)
    }

    fn read(
        &self,
        _ctx: &mut OperationContext,
        mut state: NotionDatabaseResourceModel,
    ) -> Result<NotionDatabaseResourceModel, Diagnostic> {
        let client = self.client()?;
        let id = require_known(&state.id, "id")?;

        let database = client
            .api
            .get_database(id)
            .map_err(|e| remote_error("Failed to read database", &e).with_attribute("id"))?;

        state.refresh(&database);
        Ok(state)
    }

    fn update(
        &self,
        ctx: &mut OperationContext,
        prior: NotionDatabaseResourceModel,
        mut plan: NotionDatabaseResourceModel,
    ) -> Result<NotionDatabaseResourceModel, Diagnostic> {
        let parent_id = require_known(&plan.parent_id, "parent_id")?.to_string();
        // Computed ids are unknown in a plan; fall back to the prior state.
        let id = plan
            .id
            .as_known()
            .or_else(|| prior.id.as_known())
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        let database = self.existing_or_replacement(ctx, id.as_deref(), &parent_id)?;

        if database.parent.id() != parent_id {
            ctx.warn(
                "Parent cannot be changed in place",
                format!(
                    "Database {} stays under page {}. Notion does not move databases between pages.",
                    database.id,
                    database.parent.id()
                ),
            );
        }

        plan.refresh(&database);
        Ok(plan)
    }

    fn delete(&self, ctx: &mut OperationContext, state: NotionDatabaseResourceModel) -> Result<(), Diagnostic> {
        ctx.warn(
            "Database not deleted",
            format!(
                "Database {} was removed from state only. It still exists in Notion and must be \
                 archived there by hand.",
                state.id.value_string()
            ),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::StringValue;
    use notionkit::{MockClient, NotionApi};
    use std::sync::Arc;

    const PAGE_ID: &str = "98ad959b-2b6a-4774-80ee-00246fb0ea9b";

    fn controller(mock: &MockClient, recreate_policy: RecreatePolicy) -> NotionDatabaseResource {
        NotionDatabaseResource::new(ProviderClient {
            api: Arc::new(mock.clone()) as Arc<dyn NotionApi>,
            recreate_policy,
        })
    }

    fn plan(parent_id: &str) -> NotionDatabaseResourceModel {
        NotionDatabaseResourceModel {
            id: StringValue::Unknown,
            url: StringValue::Unknown,
            parent_id: parent_id.into(),
            created_time: StringValue::Unknown,
        }
    }

    fn created(mock: &MockClient, resource: &NotionDatabaseResource) -> NotionDatabaseResourceModel {
        mock.add_page(PAGE_ID);
        let mut ctx = OperationContext::new();
        resource.create(&mut ctx, plan(PAGE_ID)).unwrap()
    }

    #[test]
    fn test_create_sends_default_request() {
        let mock = MockClient::new();
        let resource = controller(&mock, RecreatePolicy::NotFoundOnly);
        let state = created(&mock, &resource);

        let id = state.id.as_known().unwrap();
        let database = mock.database(id).unwrap();
        assert_eq!(database.title_text(), DEFAULT_TITLE);
        assert_eq!(database.properties.len(), 1);
        assert_eq!(database.properties[TITLE_PROPERTY].kind, "title");
        assert_eq!(state.url.as_known(), Some(database.url.as_str()));
        assert_eq!(state.parent_id.as_known(), Some(PAGE_ID));
        assert!(state.created_time.as_known().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_create_request_has_one_title_property() {
        let request = NotionDatabaseResource::create_request(PAGE_ID);
        assert_eq!(request.title_property_count(), 1);
        assert!(!request.is_inline);
        assert_eq!(request.parent.page_id(), Some(PAGE_ID));
    }

    #[test]
    fn test_create_failure_is_attributed() {
        let mock = MockClient::new();
        let resource = controller(&mock, RecreatePolicy::NotFoundOnly);

        let mut ctx = OperationContext::new();
        let err = resource.create(&mut ctx, plan("missing-page")).unwrap_err();
        assert_eq!(err.summary, "Failed to create database");
        assert_eq!(err.attribute.as_deref(), Some("parent_id"));
        assert_eq!(mock.database_count(), 0);
    }

    #[test]
    fn test_create_auth_failure_is_not_attributed() {
        let mock = MockClient::new();
        mock.add_page(PAGE_ID);
        mock.fail_next_create(notionkit::Error::Unauthorized {
            message: "API token is invalid.".into(),
        });
        let resource = controller(&mock, RecreatePolicy::NotFoundOnly);

        let mut ctx = OperationContext::new();
        let err = resource.create(&mut ctx, plan(PAGE_ID)).unwrap_err();
        assert_eq!(err.summary, "Failed to create database");
        assert_eq!(err.attribute, None);
    }

    #[test]
    fn test_create_requires_known_parent() {
        let mock = MockClient::new();
        let resource = controller(&mock, RecreatePolicy::NotFoundOnly);

        let mut ctx = OperationContext::new();
        let mut unknown = plan(PAGE_ID);
        unknown.parent_id = StringValue::Unknown;
        assert!(resource.create(&mut ctx, unknown).is_err());
        assert_eq!(mock.calls().total(), 0);
    }

    #[test]
    fn test_read_after_create_matches() {
        let mock = MockClient::new();
        let resource = controller(&mock, RecreatePolicy::NotFoundOnly);
        let state = created(&mock, &resource);

        let mut ctx = OperationContext::new();
        let read = resource.read(&mut ctx, state.clone()).unwrap();
        assert_eq!(read, state);
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn test_read_missing_database_fails() {
        let mock = MockClient::new();
        let resource = controller(&mock, RecreatePolicy::NotFoundOnly);
        let state = created(&mock, &resource);
        mock.remove_database(state.id.as_known().unwrap());

        let mut ctx = OperationContext::new();
        let err = resource.read(&mut ctx, state).unwrap_err();
        assert_eq!(err.summary, "Failed to read database");
        assert!(err.detail.contains("not found"));
    }

    #[test]
    fn test_update_existing_keeps_id() {
        let mock = MockClient::new();
        let resource = controller(&mock, RecreatePolicy::NotFoundOnly);
        let state = created(&mock, &resource);

        let mut ctx = OperationContext::new();
        let updated = resource.update(&mut ctx, state.clone(), state.clone()).unwrap();
        assert_eq!(updated, state);
        assert_eq!(mock.calls().create_database, 1);
        assert_eq!(mock.database_count(), 1);
        assert!(ctx.diagnostics().is_empty());
    }

    #[test]
    fn test_update_with_unknown_plan_id_uses_prior() {
        let mock = MockClient::new();
        let resource = controller(&mock, RecreatePolicy::NotFoundOnly);
        let state = created(&mock, &resource);

        let mut ctx = OperationContext::new();
        let updated = resource.update(&mut ctx, state.clone(), plan(PAGE_ID)).unwrap();
        assert_eq!(updated.id, state.id);
        assert_eq!(mock.calls().create_database, 1);
    }

    #[test]
    fn test_update_not_found_recreates() {
        let mock = MockClient::new();
        let resource = controller(&mock, RecreatePolicy::NotFoundOnly);
        let state = created(&mock, &resource);
        let old_id = state.id.value_string();
        mock.remove_database(&old_id);

        let mut ctx = OperationContext::new();
        let updated = resource.update(&mut ctx, state.clone(), state).unwrap();

        let new_id = updated.id.value_string();
        assert_ne!(new_id, old_id);
        assert!(mock.database(&new_id).is_some());
        assert_eq!(updated.parent_id.as_known(), Some(PAGE_ID));

        let warning = ctx.diagnostics().warnings().next().unwrap();
        assert_eq!(warning.summary, "Database re-created");
        assert!(warning.detail.contains(&old_id));
        assert!(warning.detail.contains(&new_id));
    }

    #[test]
    fn test_update_transient_error_aborts_by_default() {
        let mock = MockClient::new();
        let resource = controller(&mock, RecreatePolicy::NotFoundOnly);
        let state = created(&mock, &resource);
        mock.fail_next_get(notionkit::Error::Unauthorized {
            message: "API token is invalid.".into(),
        });

        let mut ctx = OperationContext::new();
        let err = resource.update(&mut ctx, state.clone(), state).unwrap_err();
        assert_eq!(err.summary, "Failed to read database");
        assert_eq!(mock.calls().create_database, 1);
        assert_eq!(mock.database_count(), 1);
    }

    #[test]
    fn test_update_any_error_policy_recreates() {
        let mock = MockClient::new();
        let resource = controller(&mock, RecreatePolicy::AnyError);
        let state = created(&mock, &resource);
        mock.fail_next_get(notionkit::Error::Network { message: "reset".into() });

        let mut ctx = OperationContext::new();
        let updated = resource.update(&mut ctx, state.clone(), state.clone()).unwrap();
        assert_ne!(updated.id, state.id);
        assert_eq!(mock.database_count(), 2);
        assert!(ctx.diagnostics().warnings().next().unwrap().detail.contains("reset"));
    }

    #[test]
    fn test_update_recreate_failure_surfaces() {
        let mock = MockClient::new();
        let resource = controller(&mock, RecreatePolicy::NotFoundOnly);
        let state = created(&mock, &resource);
        mock.remove_database(&state.id.value_string());
        mock.fail_next_create(notionkit::Error::RateLimited {
            message: "slow down".into(),
            retry_after: None,
        });

        let mut ctx = OperationContext::new();
        let err = resource.update(&mut ctx, state.clone(), state).unwrap_err();
        assert_eq!(err.summary, "Failed to create database");
        assert_eq!(mock.database_count(), 0);
    }

    #[test]
    fn test_update_warns_on_parent_change() {
        let mock = MockClient::new();
        let resource = controller(&mock, RecreatePolicy::NotFoundOnly);
        let state = created(&mock, &resource);

        let mut moved = state.clone();
        moved.parent_id = "other-page".into();

        let mut ctx = OperationContext::new();
        let updated = resource.update(&mut ctx, state, moved).unwrap();
        assert_eq!(updated.parent_id.as_known(), Some(PAGE_ID));
        assert_eq!(
            ctx.diagnostics().warnings().next().unwrap().summary,
            "Parent cannot be changed in place"
        );
    }

    #[test]
    fn test_delete_makes_no_calls() {
        let mock = MockClient::new();
        let resource = controller(&mock, RecreatePolicy::NotFoundOnly);
        let state = created(&mock, &resource);
        let before = mock.calls();

        let mut ctx = OperationContext::new();
        resource.delete(&mut ctx, state.clone()).unwrap();

        assert_eq!(mock.calls(), before);
        assert!(mock.database(&state.id.value_string()).is_some());
        assert_eq!(ctx.diagnostics().warnings().count(), 1);
    }

    #[test]
    fn test_unconfigured_controller() {
        let resource = NotionDatabaseResource::default();
        let mut ctx = OperationContext::new();
        let err = resource.read(&mut ctx, plan(PAGE_ID)).unwrap_err();
        assert_eq!(err.summary, "Unconfigured client");
    }

    #[test]
    fn test_configure_rejects_wrong_data() {
        let mut resource = NotionDatabaseResource::default();
        let err = resource.configure(&ProviderData::new(42_u32)).unwrap_err();
        assert_eq!(err.summary, "Unexpected Configure Type");
    }
}
