//! The provider service contract and its Turso implementation.
//!
//! [`ProviderService`] is the seam the host framework drives: schema
//! discovery, configuration, plan, and the CRUD operations. The host owns
//! the wire protocol and state storage; everything here works on plain
//! JSON values shaped by the declared schemas.
//!
//! [`TursoProvider`] implements the contract by dispatching each call to
//! the registered resource and data source handlers, sharing one
//! configured API client across all of them.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::client::{Client, ClientConfig};
use crate::config::ProviderConfig;
use crate::data_sources::{self, DataSourceHandler};
use crate::error::ProviderError;
use crate::resources::{self, ResourceHandler};
use crate::schema::{Attribute, AttributeType, Diagnostic, ProviderSchema, Schema};
use crate::types::{decode_state, AttributeChange, PlanResult, ProviderMetadata};
use crate::validation;

/// Contract between the host framework and a provider implementation.
///
/// # Example
///
/// ```ignore
/// use turso_provider::{ProviderService, TursoProvider};
/// use serde_json::json;
///
/// let provider = TursoProvider::new();
/// provider.configure(json!({"organization": "acme"})).await?;
/// let state = provider
///     .create("turso_group", json!({"name": "prod", "locations": ["sjc"]}))
///     .await?;
/// ```
#[async_trait]
pub trait ProviderService: Send + Sync + 'static {
    /// The provider's schema including all resources and data sources.
    fn schema(&self) -> ProviderSchema;

    /// Provider metadata. By default this is derived from the schema,
    /// with type names in sorted order.
    fn metadata(&self) -> ProviderMetadata {
        let schema = self.schema();
        let mut resources: Vec<String> = schema.resources.keys().cloned().collect();
        resources.sort();
        let mut data_sources: Vec<String> = schema.data_sources.keys().cloned().collect();
        data_sources.sort();
        ProviderMetadata {
            resources,
            data_sources,
        }
    }

    /// Validate the provider configuration before configuring.
    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = config;
        Ok(Vec::new())
    }

    /// Configure the provider with credentials and settings.
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError>;

    /// Stop the provider gracefully.
    async fn stop(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    /// Validate a resource's configuration before planning.
    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (resource_type, config);
        Ok(Vec::new())
    }

    /// Plan changes for a resource.
    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        config: Value,
    ) -> Result<PlanResult, ProviderError>;

    /// Create a new resource from its planned state.
    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Read the current state of a resource. Returns `Value::Null` when
    /// the remote object no longer exists.
    async fn read(&self, resource_type: &str, current_state: Value)
        -> Result<Value, ProviderError>;

    /// Update an existing resource.
    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete a resource.
    async fn delete(&self, resource_type: &str, current_state: Value)
        -> Result<(), ProviderError>;

    /// Import existing infrastructure into management, returning its state.
    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Value, ProviderError> {
        let _ = id;
        Err(ProviderError::Validation(format!(
            "import is not supported for resource type {resource_type}"
        )))
    }

    /// Validate a data source's configuration.
    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let _ = (data_source_type, config);
        Ok(Vec::new())
    }

    /// Read data from an external source.
    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        let _ = config;
        Err(ProviderError::UnknownDataSource(data_source_type.to_string()))
    }
}

/// Provider for the Turso database platform.
///
/// Holds the configured API client behind a lock so a `configure` call
/// can arrive after the schema has already been served.
pub struct TursoProvider {
    context: RwLock<Option<Client>>,
    resources: HashMap<&'static str, Box<dyn ResourceHandler>>,
    data_sources: HashMap<&'static str, Box<dyn DataSourceHandler>>,
}

impl TursoProvider {
    /// Create the provider with all resource and data source types
    /// registered.
    pub fn new() -> Self {
        let mut resource_handlers: HashMap<&'static str, Box<dyn ResourceHandler>> = HashMap::new();
        resource_handlers.insert("turso_database", Box::new(resources::DatabaseResource));
        resource_handlers.insert(
            "turso_database_token",
            Box::new(resources::DatabaseTokenResource),
        );
        resource_handlers.insert("turso_group", Box::new(resources::GroupResource));
        resource_handlers.insert("turso_group_token", Box::new(resources::GroupTokenResource));

        let mut data_source_handlers: HashMap<&'static str, Box<dyn DataSourceHandler>> =
            HashMap::new();
        data_source_handlers.insert("turso_database", Box::new(data_sources::DatabaseDataSource));
        data_source_handlers.insert(
            "turso_databases",
            Box::new(data_sources::DatabasesDataSource),
        );
        data_source_handlers.insert(
            "turso_database_instances",
            Box::new(data_sources::DatabaseInstancesDataSource),
        );
        data_source_handlers.insert(
            "turso_database_token",
            Box::new(data_sources::DatabaseTokenDataSource),
        );
        data_source_handlers.insert("turso_group", Box::new(data_sources::GroupDataSource));
        data_source_handlers.insert("turso_groups", Box::new(data_sources::GroupsDataSource));
        data_source_handlers.insert(
            "turso_group_token",
            Box::new(data_sources::GroupTokenDataSource),
        );

        Self {
            context: RwLock::new(None),
            resources: resource_handlers,
            data_sources: data_source_handlers,
        }
    }

    /// The configured API client, cloned out of the lock so no guard is
    /// held across handler awaits.
    async fn client(&self) -> Result<Client, ProviderError> {
        self.context
            .read()
            .await
            .clone()
            .ok_or(ProviderError::NotConfigured)
    }

    fn resource(&self, resource_type: &str) -> Result<&dyn ResourceHandler, ProviderError> {
        self.resources
            .get(resource_type)
            .map(Box::as_ref)
            .ok_or_else(|| ProviderError::UnknownResource(resource_type.to_string()))
    }

    fn data_source(
        &self,
        data_source_type: &str,
    ) -> Result<&dyn DataSourceHandler, ProviderError> {
        self.data_sources
            .get(data_source_type)
            .map(Box::as_ref)
            .ok_or_else(|| ProviderError::UnknownDataSource(data_source_type.to_string()))
    }
}

impl Default for TursoProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn provider_config_schema() -> Schema {
    Schema::v0()
        .with_description("Manage Turso databases, groups, and auth tokens.")
        .with_attribute(
            "organization",
            Attribute::required_string()
                .with_description("Slug of the organization all resources belong to."),
        )
        .with_attribute(
            "api_token",
            Attribute::optional_string()
                .sensitive()
                .with_description(
                    "Platform API token. Falls back to the TURSO_API_TOKEN environment \
                     variable, then to the token of a logged-in turso CLI.",
                ),
        )
        .with_attribute(
            "base_url",
            Attribute::optional_string()
                .with_description("Base URL of the platform API, mainly for testing."),
        )
}

#[async_trait]
impl ProviderService for TursoProvider {
    fn schema(&self) -> ProviderSchema {
        let mut schema = ProviderSchema::new().with_provider_config(provider_config_schema());
        for (name, handler) in &self.resources {
            schema = schema.with_resource(*name, handler.schema());
        }
        for (name, handler) in &self.data_sources {
            schema = schema.with_data_source(*name, handler.schema());
        }
        schema
    }

    async fn validate_provider_config(
        &self,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let mut diagnostics = validation::validate(&provider_config_schema(), &config);
        if let Some(organization) = config.get("organization").and_then(Value::as_str) {
            if organization.trim().is_empty() {
                diagnostics.push(
                    Diagnostic::error("invalid provider configuration")
                        .with_detail("organization must not be empty")
                        .with_attribute("organization"),
                );
            }
        }
        Ok(diagnostics)
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        let config: ProviderConfig = decode_state(config)?;

        let organization = config
            .organization
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();
        if organization.is_empty() {
            return Ok(vec![Diagnostic::error("organization is required")
                .with_attribute("organization")]);
        }

        let Some(api_token) = config.resolve_api_token().await else {
            return Ok(vec![Diagnostic::error("no API token found")
                .with_detail(
                    "set api_token in the provider configuration, export TURSO_API_TOKEN, \
                     or log in with the turso CLI",
                )
                .with_attribute("api_token")]);
        };

        let client = match Client::new(ClientConfig {
            organization: organization.to_string(),
            api_token,
            base_url: config.base_url.clone(),
            http: None,
        }) {
            Ok(client) => client,
            Err(err) => return Ok(vec![err.into_diagnostic()]),
        };

        *self.context.write().await = Some(client);
        info!(organization, "provider configured");
        Ok(Vec::new())
    }

    async fn validate_resource_config(
        &self,
        resource_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let handler = self.resource(resource_type)?;
        let mut diagnostics = validation::validate(&handler.schema(), &config);
        diagnostics.extend(handler.validate(&config));
        debug!(
            resource_type,
            diagnostics = diagnostics.len(),
            "validated resource configuration"
        );
        Ok(diagnostics)
    }

    async fn plan(
        &self,
        resource_type: &str,
        prior_state: Option<Value>,
        proposed_state: Value,
        _config: Value,
    ) -> Result<PlanResult, ProviderError> {
        let handler = self.resource(resource_type)?;
        let result = plan_for_schema(&handler.schema(), prior_state.as_ref(), &proposed_state);
        debug!(
            resource_type,
            changes = result.changes.len(),
            requires_replace = result.requires_replace,
            "planned resource changes"
        );
        Ok(result)
    }

    async fn create(
        &self,
        resource_type: &str,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        debug!(resource_type, "creating resource");
        let handler = self.resource(resource_type)?;
        let client = self.client().await?;
        handler.create(&client, planned_state).await
    }

    async fn read(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<Value, ProviderError> {
        debug!(resource_type, "reading resource");
        let handler = self.resource(resource_type)?;
        let client = self.client().await?;
        handler.read(&client, current_state).await
    }

    async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        debug!(resource_type, "updating resource");
        let handler = self.resource(resource_type)?;
        let client = self.client().await?;
        handler.update(&client, prior_state, planned_state).await
    }

    async fn delete(
        &self,
        resource_type: &str,
        current_state: Value,
    ) -> Result<(), ProviderError> {
        debug!(resource_type, "deleting resource");
        let handler = self.resource(resource_type)?;
        let client = self.client().await?;
        handler.delete(&client, current_state).await
    }

    async fn import_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<Value, ProviderError> {
        debug!(resource_type, id, "importing resource");
        let handler = self.resource(resource_type)?;
        let client = self.client().await?;
        handler.import(&client, id).await
    }

    async fn validate_data_source_config(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Vec<Diagnostic>, ProviderError> {
        let handler = self.data_source(data_source_type)?;
        let mut diagnostics = validation::validate(&handler.schema(), &config);
        diagnostics.extend(handler.validate(&config));
        Ok(diagnostics)
    }

    async fn read_data_source(
        &self,
        data_source_type: &str,
        config: Value,
    ) -> Result<Value, ProviderError> {
        debug!(data_source_type, "reading data source");
        let handler = self.data_source(data_source_type)?;
        let client = self.client().await?;
        handler.read(&client, config).await
    }
}

/// Compute a plan for one resource from its schema.
///
/// Unset attributes pick up their schema default; unset computed
/// attributes carry their prior value forward, staying unknown on create.
/// A change to a `force_new` attribute marks the plan as requiring
/// replacement. A null proposed state is a destroy plan.
fn plan_for_schema(schema: &Schema, prior_state: Option<&Value>, proposed_state: &Value) -> PlanResult {
    if proposed_state.is_null() {
        return PlanResult::no_change(Value::Null);
    }

    let mut planned = match proposed_state.as_object() {
        Some(map) => map.clone(),
        None => serde_json::Map::new(),
    };

    let mut attributes: Vec<(&String, &Attribute)> = schema.attributes.iter().collect();
    attributes.sort_by(|a, b| a.0.cmp(b.0));

    for (name, attribute) in &attributes {
        let is_unset = planned.get(name.as_str()).map_or(true, Value::is_null);
        if !is_unset {
            continue;
        }
        if let Some(default) = &attribute.default {
            planned.insert((*name).clone(), default.clone());
        } else if attribute.flags.computed {
            let carried = prior_state
                .and_then(|prior| prior.get(name.as_str()))
                .filter(|value| !value.is_null());
            if let Some(value) = carried {
                planned.insert((*name).clone(), value.clone());
            }
        }
    }

    let mut changes = Vec::new();
    let mut requires_replace = false;

    match prior_state {
        None => {
            for (name, _) in &attributes {
                if let Some(value) = planned.get(name.as_str()) {
                    if !value.is_null() {
                        changes.push(AttributeChange::added(name.as_str(), value.clone()));
                    }
                }
            }
        }
        Some(prior) => {
            for (name, attribute) in &attributes {
                let before = prior
                    .get(name.as_str())
                    .filter(|value| !value.is_null())
                    .cloned();
                let after = planned
                    .get(name.as_str())
                    .filter(|value| !value.is_null())
                    .cloned();
                let equal = match (&before, &after) {
                    (Some(before), Some(after)) => {
                        values_equal(&attribute.attr_type, before, after)
                    }
                    (None, None) => true,
                    _ => false,
                };
                if equal {
                    continue;
                }
                if attribute.force_new {
                    requires_replace = true;
                }
                changes.push(AttributeChange::new(name.as_str(), before, after));
            }
        }
    }

    PlanResult::with_changes(Value::Object(planned), changes, requires_replace)
}

/// Set-typed attributes compare as sets; everything else compares as-is.
fn values_equal(attr_type: &AttributeType, before: &Value, after: &Value) -> bool {
    if let (AttributeType::Set(_), Some(before), Some(after)) =
        (attr_type, before.as_array(), after.as_array())
    {
        return normalized(before) == normalized(after);
    }
    before == after
}

fn normalized(values: &[Value]) -> Vec<String> {
    let mut keys: Vec<String> = values.iter().map(Value::to_string).collect();
    keys.sort();
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        assert_error_contains, assert_has_errors, assert_no_errors, assert_plan_changes_attribute,
        assert_plan_no_changes, assert_plan_replaces, assert_plan_updates_in_place, ProviderTester,
    };
    use serde_json::json;
    use serial_test::serial;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn configured_tester(server: &MockServer) -> ProviderTester<TursoProvider> {
        let tester = ProviderTester::new(TursoProvider::new());
        tester
            .configure(json!({
                "organization": "test-org",
                "api_token": "test-token",
                "base_url": server.uri(),
            }))
            .await
            .unwrap();
        tester
    }

    #[test]
    fn metadata_lists_registered_types_sorted() {
        let metadata = TursoProvider::new().metadata();
        assert_eq!(
            metadata.resources,
            vec![
                "turso_database",
                "turso_database_token",
                "turso_group",
                "turso_group_token"
            ]
        );
        assert_eq!(metadata.data_sources.len(), 7);
        assert!(metadata
            .data_sources
            .contains(&"turso_database_instances".to_string()));
    }

    #[test]
    fn schema_covers_every_registered_type() {
        let schema = TursoProvider::new().schema();
        assert_eq!(schema.resources.len(), 4);
        assert_eq!(schema.data_sources.len(), 7);
        assert!(schema.provider.attributes.contains_key("organization"));
        assert!(schema.provider.attributes["api_token"].flags.sensitive);
    }

    #[tokio::test]
    async fn validate_provider_config_requires_organization() {
        let provider = TursoProvider::new();

        let diagnostics = provider
            .validate_provider_config(json!({"api_token": "tok"}))
            .await
            .unwrap();
        assert_has_errors(&diagnostics);

        let diagnostics = provider
            .validate_provider_config(json!({"organization": "acme"}))
            .await
            .unwrap();
        assert_no_errors(&diagnostics);
    }

    #[tokio::test]
    async fn configure_rejects_missing_organization() {
        let provider = TursoProvider::new();
        let diagnostics = provider.configure(json!({})).await.unwrap();
        assert_error_contains(&diagnostics, "organization");
    }

    #[tokio::test]
    #[serial]
    async fn configure_reports_missing_token_sources() {
        std::env::remove_var(crate::config::API_TOKEN_ENV);
        let provider = TursoProvider::new();
        let diagnostics = provider
            .configure(json!({"organization": "acme"}))
            .await
            .unwrap();
        assert_error_contains(&diagnostics, "token");
    }

    #[tokio::test]
    async fn operations_require_configuration() {
        let provider = TursoProvider::new();
        let err = provider
            .create("turso_group", json!({"name": "prod", "locations": ["sjc"]}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured));
    }

    #[tokio::test]
    async fn unknown_types_are_rejected() {
        let provider = TursoProvider::new();

        let err = provider
            .create("turso_cluster", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownResource(_)));

        let err = provider
            .read_data_source("turso_clusters", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnknownDataSource(_)));
    }

    #[tokio::test]
    async fn plan_create_applies_defaults_and_leaves_computed_unknown() {
        let tester = ProviderTester::new(TursoProvider::new());
        let plan = tester
            .plan_create("turso_database", json!({"name": "orders", "group": "default"}))
            .await
            .unwrap();

        assert_eq!(plan.planned_state["allow_attach"], false);
        assert_eq!(plan.planned_state["block_reads"], false);
        assert_eq!(plan.planned_state["db_id"], Value::Null);
        assert!(!plan.requires_replace);
        assert_plan_changes_attribute(&plan, "name");
    }

    #[tokio::test]
    async fn plan_update_carries_computed_state_forward() {
        let tester = ProviderTester::new(TursoProvider::new());
        let prior = json!({
            "name": "orders",
            "group": "default",
            "allow_attach": false,
            "block_reads": false,
            "block_writes": false,
            "db_id": "db-123",
            "hostname": "orders-test-org.turso.io",
            "type": "logical",
            "version": "0.24.1",
            "primary_region": "sjc",
        });
        let plan = tester
            .plan_update(
                "turso_database",
                prior,
                json!({"name": "orders", "group": "default"}),
            )
            .await
            .unwrap();

        assert_eq!(plan.planned_state["db_id"], "db-123");
        assert_eq!(plan.planned_state["hostname"], "orders-test-org.turso.io");
        assert_plan_no_changes(&plan);
    }

    #[tokio::test]
    async fn plan_flags_replacement_when_group_changes() {
        let tester = ProviderTester::new(TursoProvider::new());
        let plan = tester
            .plan_update(
                "turso_database",
                json!({"name": "orders", "group": "default"}),
                json!({"name": "orders", "group": "prod"}),
            )
            .await
            .unwrap();

        assert_plan_replaces(&plan);
        assert_plan_changes_attribute(&plan, "group");
    }

    #[tokio::test]
    async fn plan_updates_configuration_changes_in_place() {
        let tester = ProviderTester::new(TursoProvider::new());
        let plan = tester
            .plan_update(
                "turso_database",
                json!({"name": "orders", "group": "default", "size_limit": "1gb"}),
                json!({"name": "orders", "group": "default", "size_limit": "2gb"}),
            )
            .await
            .unwrap();

        assert_plan_updates_in_place(&plan);
        assert_plan_changes_attribute(&plan, "size_limit");
    }

    #[tokio::test]
    async fn plan_treats_location_reorder_as_no_change() {
        let tester = ProviderTester::new(TursoProvider::new());
        let plan = tester
            .plan_update(
                "turso_group",
                json!({"name": "prod", "locations": ["ams", "sjc"], "primary": "sjc"}),
                json!({"name": "prod", "locations": ["sjc", "ams"], "primary": "sjc"}),
            )
            .await
            .unwrap();

        assert_plan_no_changes(&plan);
    }

    #[tokio::test]
    async fn plan_with_null_proposed_state_is_a_destroy() {
        let tester = ProviderTester::new(TursoProvider::new());
        let plan = tester
            .plan_delete("turso_group", json!({"name": "prod", "locations": ["sjc"]}))
            .await
            .unwrap();

        assert!(plan.planned_state.is_null());
        assert_plan_no_changes(&plan);
    }

    #[tokio::test]
    async fn validate_resource_config_runs_schema_and_handler_checks() {
        let provider = TursoProvider::new();

        // Schema check: name is required
        let diagnostics = provider
            .validate_resource_config("turso_group", json!({"locations": ["sjc"]}))
            .await
            .unwrap();
        assert_has_errors(&diagnostics);

        // Handler check: a group needs at least one location
        let diagnostics = provider
            .validate_resource_config("turso_group", json!({"name": "prod", "locations": []}))
            .await
            .unwrap();
        assert_error_contains(&diagnostics, "locations");
    }

    #[tokio::test]
    async fn configure_then_full_group_lifecycle() {
        let server = MockServer::start().await;
        let group = json!({
            "group": {
                "name": "prod",
                "version": "0.24.1",
                "uuid": "g-1",
                "locations": ["sjc"],
                "primary": "sjc",
                "archived": false
            }
        });
        Mock::given(method("POST"))
            .and(path("/organizations/test-org/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(group.clone()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/organizations/test-org/groups/prod"))
            .respond_with(ResponseTemplate::new(200).set_body_json(group.clone()))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/organizations/test-org/groups/prod"))
            .respond_with(ResponseTemplate::new(200).set_body_json(group))
            .expect(1)
            .mount(&server)
            .await;

        let tester = configured_tester(&server).await;
        let state = tester
            .lifecycle_create("turso_group", json!({"name": "prod", "locations": ["sjc"]}))
            .await
            .unwrap();
        assert_eq!(state["id"], "prod");
        assert_eq!(state["primary"], "sjc");

        tester.delete("turso_group", state).await.unwrap();
    }

    #[tokio::test]
    async fn import_resource_dispatches_to_the_handler() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/test-org/groups/prod"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "group": {
                    "name": "prod",
                    "version": "0.24.1",
                    "uuid": "g-1",
                    "locations": ["sjc"],
                    "primary": "sjc",
                    "archived": false
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tester = configured_tester(&server).await;
        let state = tester
            .import_resource("turso_group", "prod")
            .await
            .unwrap();
        assert_eq!(state["name"], "prod");
    }

    #[tokio::test]
    async fn read_data_source_dispatches_to_the_handler() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/test-org/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "groups": [{
                    "name": "prod",
                    "version": "0.24.1",
                    "uuid": "g-1",
                    "locations": [],
                    "primary": "sjc",
                    "archived": false
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tester = configured_tester(&server).await;
        let result = tester
            .read_data_source("turso_groups", json!({}))
            .await
            .unwrap();
        assert_eq!(result["groups"][0]["name"], "prod");
    }
}
