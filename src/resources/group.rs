//! The `turso_group` resource.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{decode_state, encode_state, ResourceHandler};
use crate::client::{Client, CreateGroupRequest, Group};
use crate::error::ProviderError;
use crate::reconcile::{apply_location_diff, diff_locations, merge_locations};
use crate::schema::{Attribute, AttributeFlags, AttributeType, Diagnostic, Schema};

/// Manages a database group and its location placement.
pub(crate) struct GroupResource;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GroupState {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    locations: Vec<String>,
    #[serde(default)]
    primary: Option<String>,
    #[serde(default)]
    extensions: Option<String>,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    archived: Option<bool>,
}

impl GroupState {
    /// The full current location set, with the primary folded in.
    fn merged_locations(&self) -> Vec<String> {
        match &self.primary {
            Some(primary) => merge_locations(&self.locations, primary),
            None => self.locations.clone(),
        }
    }

    fn apply(&mut self, group: Group) {
        self.id = Some(group.name.clone());
        self.name = group.name;
        self.locations = merge_locations(&group.locations, &group.primary);
        self.primary = Some(group.primary).filter(|primary| !primary.is_empty());
        self.uuid = Some(group.uuid);
        self.version = Some(group.version);
        self.archived = Some(group.archived);
        // extensions stays as configured; the API does not report it back
    }
}

impl GroupResource {
    async fn refresh(&self, client: &Client, state: &mut GroupState) -> Result<(), ProviderError> {
        let group = client
            .get_group(&state.name)
            .await
            .map_err(|err| ProviderError::api("failed to read group", err))?;
        state.apply(group);
        Ok(())
    }

    /// Re-run handler validation against a planned value and surface the
    /// first error, so a malformed plan can never reach the API.
    fn check(&self, planned: &Value) -> Result<(), ProviderError> {
        match self.validate(planned).into_iter().find(Diagnostic::is_error) {
            Some(error) => Err(ProviderError::Validation(
                error.detail.unwrap_or(error.summary),
            )),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResourceHandler for GroupResource {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A group of databases sharing location placement.")
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_description("Name of the group.")
                    .with_force_new(),
            )
            .with_attribute(
                "locations",
                Attribute::new(
                    AttributeType::set(AttributeType::String),
                    AttributeFlags::required(),
                )
                .with_description("Locations the group is replicated to, including the primary."),
            )
            .with_attribute(
                "primary",
                Attribute::new(AttributeType::String, AttributeFlags::optional_computed())
                    .with_description(
                        "Primary location of the group. Required with more than one location; \
                         defaults to the sole location otherwise.",
                    )
                    .with_force_new(),
            )
            .with_attribute(
                "extensions",
                Attribute::optional_string()
                    .with_description("Extensions to enable for databases in the group, e.g. \"all\".")
                    .with_force_new(),
            )
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("Identifier of the group (its name)."),
            )
            .with_attribute(
                "uuid",
                Attribute::computed_string().with_description("Unique identifier of the group."),
            )
            .with_attribute(
                "version",
                Attribute::computed_string().with_description("libSQL server version of the group."),
            )
            .with_attribute(
                "archived",
                Attribute::computed_bool()
                    .with_description("Whether the group has been archived due to inactivity."),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        let Some(locations) = config.get("locations").and_then(Value::as_array) else {
            // Absence is reported by schema validation
            return diagnostics;
        };

        if locations.is_empty() {
            diagnostics.push(
                Diagnostic::error("invalid group locations")
                    .with_detail("at least one location must be specified")
                    .with_attribute("locations"),
            );
            return diagnostics;
        }

        let primary = config.get("primary").and_then(Value::as_str);
        match primary {
            None if locations.len() > 1 => diagnostics.push(
                Diagnostic::error("missing primary location")
                    .with_detail(
                        "a primary location must be specified when the group has more than one location",
                    )
                    .with_attribute("primary"),
            ),
            Some(primary) if !locations.iter().any(|l| l.as_str() == Some(primary)) => {
                diagnostics.push(
                    Diagnostic::error("invalid primary location")
                        .with_detail("primary must be one of the configured locations")
                        .with_attribute("primary"),
                )
            },
            _ => {},
        }

        diagnostics
    }

    async fn create(&self, client: &Client, planned: Value) -> Result<Value, ProviderError> {
        self.check(&planned)?;
        let mut state: GroupState = decode_state(planned)?;

        let primary = state
            .primary
            .clone()
            .or_else(|| state.locations.first().cloned())
            .ok_or_else(|| {
                ProviderError::Validation("at least one location must be specified".to_string())
            })?;

        client
            .create_group(CreateGroupRequest {
                name: state.name.clone(),
                location: primary.clone(),
                extensions: state.extensions.clone(),
            })
            .await
            .map_err(|err| ProviderError::api("failed to create group", err))?;

        // The group starts with just its primary; replicate to the rest.
        let diff = diff_locations(std::slice::from_ref(&primary), &state.locations);
        apply_location_diff(client, &state.name, &diff).await?;

        self.refresh(client, &mut state).await?;
        info!(group = %state.name, locations = state.locations.len(), "created group");
        encode_state(&state)
    }

    async fn read(&self, client: &Client, state: Value) -> Result<Value, ProviderError> {
        let mut state: GroupState = decode_state(state)?;
        match self.refresh(client, &mut state).await {
            Ok(()) => encode_state(&state),
            Err(ProviderError::Api { source, .. }) if source.is_not_found() => Ok(Value::Null),
            Err(err) => Err(err),
        }
    }

    async fn update(
        &self,
        client: &Client,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        self.check(&planned)?;
        let prior_state: GroupState = decode_state(prior)?;
        let mut state: GroupState = decode_state(planned)?;

        // The primary cannot be removed in place. Plans carry it forward
        // even when the configuration leaves it unset.
        let primary = state.primary.clone().or_else(|| prior_state.primary.clone());
        if let Some(primary) = &primary {
            if !state.locations.contains(primary) {
                return Err(ProviderError::Validation(format!(
                    "the primary location {primary:?} cannot be removed from the group; \
                     replace the group to move its primary"
                )));
            }
        }

        let current = prior_state.merged_locations();
        let diff = diff_locations(&current, &state.locations);
        apply_location_diff(client, &state.name, &diff).await?;

        self.refresh(client, &mut state).await?;
        info!(
            group = %state.name,
            added = diff.to_add.len(),
            removed = diff.to_remove.len(),
            "updated group locations"
        );
        encode_state(&state)
    }

    async fn delete(&self, client: &Client, state: Value) -> Result<(), ProviderError> {
        let state: GroupState = decode_state(state)?;
        client
            .delete_group(&state.name)
            .await
            .map_err(|err| ProviderError::api("failed to delete group", err))?;
        info!(group = %state.name, "deleted group");
        Ok(())
    }

    async fn import(&self, client: &Client, id: &str) -> Result<Value, ProviderError> {
        if id.is_empty() {
            return Err(ProviderError::Validation(
                "import id must be the group name".to_string(),
            ));
        }

        let mut state = GroupState {
            name: id.to_string(),
            ..Default::default()
        };
        self.refresh(client, &mut state).await?;
        info!(group = %state.name, "imported group");
        encode_state(&state)
    }
}
