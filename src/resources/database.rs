//! The `turso_database` resource.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::{decode_state, encode_state, ResourceHandler};
use crate::client::{
    Client, CreateDatabaseRequest, DatabaseConfig, DatabaseInstance, DatabaseSeed,
};
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Diagnostic, Schema};

/// Manages a libSQL database inside an existing group.
pub(crate) struct DatabaseResource;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DatabaseState {
    name: String,
    group: String,
    #[serde(default)]
    seed: Option<DatabaseSeed>,
    #[serde(default)]
    size_limit: Option<String>,
    #[serde(default)]
    is_schema: Option<bool>,
    #[serde(default)]
    schema: Option<String>,
    #[serde(default)]
    allow_attach: Option<bool>,
    #[serde(default)]
    block_reads: Option<bool>,
    #[serde(default)]
    block_writes: Option<bool>,
    #[serde(default)]
    db_id: Option<String>,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(rename = "type", default)]
    database_type: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    primary_region: Option<String>,
    #[serde(default)]
    instances: Option<BTreeMap<String, DatabaseInstance>>,
}

impl DatabaseResource {
    /// Pull the live database and its instances into `state`.
    async fn refresh(&self, client: &Client, state: &mut DatabaseState) -> Result<(), ProviderError> {
        let details = client
            .get_database(&state.name)
            .await
            .map_err(|err| ProviderError::api("failed to read database", err))?;
        let instances = client
            .list_database_instances(&state.name)
            .await
            .map_err(|err| ProviderError::api("failed to list database instances", err))?;

        if !details.group.is_empty() {
            state.group = details.group;
        }
        state.db_id = Some(details.id);
        state.hostname = Some(details.hostname);
        state.database_type = Some(details.database_type);
        state.version = Some(details.version);
        state.primary_region = Some(details.primary_region);
        state.allow_attach = Some(details.allow_attach);
        state.block_reads = Some(details.block_reads);
        state.block_writes = Some(details.block_writes);
        // is_schema and schema stay as configured unless the practitioner
        // set them, in which case the live value wins.
        if state.is_schema.is_some() {
            state.is_schema = Some(details.is_schema);
        }
        if details.schema.is_some() {
            state.schema = details.schema;
        }
        state.instances = Some(
            instances
                .into_iter()
                .map(|instance| (instance.region.clone(), instance))
                .collect(),
        );
        Ok(())
    }
}

fn seed_object_type() -> AttributeType {
    AttributeType::object(HashMap::from([
        ("type".to_string(), AttributeType::String),
        ("name".to_string(), AttributeType::String),
        ("url".to_string(), AttributeType::String),
        ("timestamp".to_string(), AttributeType::String),
    ]))
}

fn instances_type() -> AttributeType {
    AttributeType::map(AttributeType::object(HashMap::from([
        ("uuid".to_string(), AttributeType::String),
        ("name".to_string(), AttributeType::String),
        ("type".to_string(), AttributeType::String),
        ("region".to_string(), AttributeType::String),
        ("hostname".to_string(), AttributeType::String),
    ])))
}

#[async_trait]
impl ResourceHandler for DatabaseResource {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A libSQL database hosted on the Turso platform.")
            .with_attribute(
                "name",
                Attribute::required_string()
                    .with_description("Name of the database.")
                    .with_force_new(),
            )
            .with_attribute(
                "group",
                Attribute::required_string()
                    .with_description("Group the database is placed in. Must already exist.")
                    .with_force_new(),
            )
            .with_attribute(
                "seed",
                Attribute::new(seed_object_type(), AttributeFlags::optional())
                    .with_description(
                        "Seed the new database from an existing database or a dump URL.",
                    )
                    .with_force_new(),
            )
            .with_attribute(
                "size_limit",
                Attribute::optional_string()
                    .with_description("Maximum total storage, e.g. \"2gb\" or \"256mb\"."),
            )
            .with_attribute(
                "is_schema",
                Attribute::optional_bool().with_description(
                    "Mark this database as a schema database other databases can inherit from.",
                ),
            )
            .with_attribute(
                "schema",
                Attribute::optional_string()
                    .with_description("Name of the schema database to inherit a schema from."),
            )
            .with_attribute(
                "allow_attach",
                Attribute::new(AttributeType::Bool, AttributeFlags::optional_computed())
                    .with_description("Allow other databases to attach to this one.")
                    .with_default(serde_json::json!(false)),
            )
            .with_attribute(
                "block_reads",
                Attribute::new(AttributeType::Bool, AttributeFlags::optional_computed())
                    .with_description("Block all reads against the database.")
                    .with_default(serde_json::json!(false)),
            )
            .with_attribute(
                "block_writes",
                Attribute::new(AttributeType::Bool, AttributeFlags::optional_computed())
                    .with_description("Block all writes against the database.")
                    .with_default(serde_json::json!(false)),
            )
            .with_attribute(
                "db_id",
                Attribute::computed_string().with_description("Unique identifier of the database."),
            )
            .with_attribute(
                "hostname",
                Attribute::computed_string()
                    .with_description("Hostname used to connect to the database."),
            )
            .with_attribute(
                "type",
                Attribute::computed_string().with_description("Deployment type of the database."),
            )
            .with_attribute(
                "version",
                Attribute::computed_string().with_description("libSQL server version."),
            )
            .with_attribute(
                "primary_region",
                Attribute::computed_string()
                    .with_description("Region hosting the primary instance."),
            )
            .with_attribute(
                "instances",
                Attribute::new(instances_type(), AttributeFlags::computed())
                    .with_description("Database instances keyed by region."),
            )
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        let Some(seed) = config.get("seed").filter(|seed| !seed.is_null()) else {
            return diagnostics;
        };

        match seed.get("type").and_then(Value::as_str) {
            Some("database") | Some("dump") => {},
            Some(other) => diagnostics.push(
                Diagnostic::error("invalid seed type")
                    .with_detail(format!(
                        "seed type must be \"database\" or \"dump\", got {other:?}"
                    ))
                    .with_attribute("seed.type"),
            ),
            None => diagnostics.push(
                Diagnostic::error("invalid seed")
                    .with_detail("a seed requires a type of \"database\" or \"dump\"")
                    .with_attribute("seed.type"),
            ),
        }

        let has_name = seed.get("name").is_some_and(|v| !v.is_null());
        let has_url = seed.get("url").is_some_and(|v| !v.is_null());
        if has_name && has_url {
            diagnostics.push(
                Diagnostic::error("invalid seed")
                    .with_detail("seed name and url are mutually exclusive")
                    .with_attribute("seed"),
            );
        }
        if !has_name && !has_url {
            diagnostics.push(
                Diagnostic::error("invalid seed")
                    .with_detail("a seed requires either a database name or a dump url")
                    .with_attribute("seed"),
            );
        }

        diagnostics
    }

    async fn create(&self, client: &Client, planned: Value) -> Result<Value, ProviderError> {
        let mut state: DatabaseState = decode_state(planned)?;

        let request = CreateDatabaseRequest {
            name: state.name.clone(),
            group: state.group.clone(),
            seed: state.seed.clone(),
            size_limit: state.size_limit.clone(),
            is_schema: state.is_schema,
            schema: state.schema.clone(),
        };
        client
            .create_database(request)
            .await
            .map_err(|err| ProviderError::api("failed to create database", err))?;

        self.refresh(client, &mut state).await?;
        info!(database = %state.name, group = %state.group, "created database");
        encode_state(&state)
    }

    async fn read(&self, client: &Client, state: Value) -> Result<Value, ProviderError> {
        let mut state: DatabaseState = decode_state(state)?;
        match self.refresh(client, &mut state).await {
            Ok(()) => encode_state(&state),
            Err(ProviderError::Api { source, .. }) if source.is_not_found() => Ok(Value::Null),
            Err(err) => Err(err),
        }
    }

    async fn update(
        &self,
        client: &Client,
        _prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError> {
        let mut state: DatabaseState = decode_state(planned)?;

        let config = DatabaseConfig {
            size_limit: state.size_limit.clone(),
            allow_attach: state.allow_attach,
            block_reads: state.block_reads,
            block_writes: state.block_writes,
        };
        client
            .update_database_configuration(&state.name, &config)
            .await
            .map_err(|err| ProviderError::api("failed to update database configuration", err))?;

        self.refresh(client, &mut state).await?;
        info!(database = %state.name, "updated database configuration");
        encode_state(&state)
    }

    async fn delete(&self, client: &Client, state: Value) -> Result<(), ProviderError> {
        let state: DatabaseState = decode_state(state)?;
        client
            .delete_database(&state.name)
            .await
            .map_err(|err| ProviderError::api("failed to delete database", err))?;
        info!(database = %state.name, "deleted database");
        Ok(())
    }

    async fn import(&self, client: &Client, id: &str) -> Result<Value, ProviderError> {
        let (group, name) = id
            .split_once('/')
            .filter(|(group, name)| !group.is_empty() && !name.is_empty())
            .ok_or_else(|| {
                ProviderError::Validation(format!(
                    "import id must be \"group-name/database-name\", got {id:?}"
                ))
            })?;

        let mut state = DatabaseState {
            name: name.to_string(),
            group: group.to_string(),
            ..Default::default()
        };
        self.refresh(client, &mut state).await?;
        info!(database = %state.name, group = %state.group, "imported database");
        encode_state(&state)
    }
}
