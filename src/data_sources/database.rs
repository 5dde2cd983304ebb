//! The `turso_database`, `turso_databases`, and `turso_database_instances`
//! data sources.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{decode_state, encode_state, DataSourceHandler};
use crate::client::{Client, DatabaseDetails, DatabaseInstance};
use crate::error::ProviderError;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

/// Looks up a single database by name.
pub(crate) struct DatabaseDataSource;

/// Lists every database in the organization.
pub(crate) struct DatabasesDataSource;

/// Lists the instances of one database across its group's locations.
pub(crate) struct DatabaseInstancesDataSource;

#[derive(Debug, Serialize, Deserialize)]
struct DatabaseQuery {
    name: String,
    #[serde(default)]
    db_id: Option<String>,
    #[serde(default)]
    hostname: Option<String>,
}

fn database_object_type() -> AttributeType {
    AttributeType::object(HashMap::from([
        ("db_id".to_string(), AttributeType::String),
        ("name".to_string(), AttributeType::String),
        ("group".to_string(), AttributeType::String),
        ("hostname".to_string(), AttributeType::String),
        (
            "regions".to_string(),
            AttributeType::list(AttributeType::String),
        ),
        ("primary_region".to_string(), AttributeType::String),
        ("schema".to_string(), AttributeType::String),
        ("is_schema".to_string(), AttributeType::Bool),
        ("type".to_string(), AttributeType::String),
        ("archived".to_string(), AttributeType::Bool),
        ("version".to_string(), AttributeType::String),
        ("allow_attach".to_string(), AttributeType::Bool),
        ("block_reads".to_string(), AttributeType::Bool),
        ("block_writes".to_string(), AttributeType::Bool),
    ]))
}

fn instance_object_type() -> AttributeType {
    AttributeType::object(HashMap::from([
        ("hostname".to_string(), AttributeType::String),
        ("name".to_string(), AttributeType::String),
        ("region".to_string(), AttributeType::String),
        ("type".to_string(), AttributeType::String),
        ("uuid".to_string(), AttributeType::String),
    ]))
}

fn database_value(database: DatabaseDetails) -> Value {
    json!({
        "db_id": database.id,
        "name": database.name,
        "group": database.group,
        "hostname": database.hostname,
        "regions": database.regions,
        "primary_region": database.primary_region,
        "schema": database.schema,
        "is_schema": database.is_schema,
        "type": database.database_type,
        "archived": database.archived,
        "version": database.version,
        "allow_attach": database.allow_attach,
        "block_reads": database.block_reads,
        "block_writes": database.block_writes,
    })
}

fn instance_value(instance: DatabaseInstance) -> Value {
    json!({
        "hostname": instance.hostname,
        "name": instance.name,
        "region": instance.region,
        "type": instance.instance_type,
        "uuid": instance.uuid,
    })
}

#[async_trait]
impl DataSourceHandler for DatabaseDataSource {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Connection details of a single database.")
            .with_attribute(
                "name",
                Attribute::required_string().with_description("Name of the database to look up."),
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
    }

    async fn read(&self, client: &Client, config: Value) -> Result<Value, ProviderError> {
        let mut query: DatabaseQuery = decode_state(config)?;
        let database = client
            .get_database(&query.name)
            .await
            .map_err(|err| ProviderError::api("failed to read database", err))?;
        query.db_id = Some(database.id);
        query.hostname = Some(database.hostname);
        encode_state(&query)
    }
}

#[async_trait]
impl DataSourceHandler for DatabasesDataSource {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("All databases in the organization.")
            .with_attribute(
                "databases",
                Attribute::new(
                    AttributeType::list(database_object_type()),
                    AttributeFlags::computed(),
                )
                .with_description("Databases in the organization."),
            )
    }

    async fn read(&self, client: &Client, _config: Value) -> Result<Value, ProviderError> {
        let databases = client
            .list_databases()
            .await
            .map_err(|err| ProviderError::api("failed to list databases", err))?;
        let databases: Vec<Value> = databases.into_iter().map(database_value).collect();
        Ok(json!({ "databases": databases }))
    }
}

#[async_trait]
impl DataSourceHandler for DatabaseInstancesDataSource {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("Instances of a database, one per group location.")
            .with_attribute(
                "id",
                Attribute::required_string().with_description("Name of the database."),
            )
            .with_attribute(
                "instances",
                Attribute::new(
                    AttributeType::list(instance_object_type()),
                    AttributeFlags::computed(),
                )
                .with_description("Instances of the database."),
            )
    }

    async fn read(&self, client: &Client, config: Value) -> Result<Value, ProviderError> {
        let name = config
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Validation("id is required".to_string()))?;
        let instances = client
            .list_database_instances(name)
            .await
            .map_err(|err| ProviderError::api("failed to list database instances", err))?;
        let instances: Vec<Value> = instances.into_iter().map(instance_value).collect();
        Ok(json!({ "id": name, "instances": instances }))
    }
}
