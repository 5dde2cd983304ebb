//! Database operations of the admin API.
//!
//! The API wraps most responses in an envelope object and mixes casing
//! conventions in its JSON fields (`DbId`, `primaryRegion`, `allow_attach`);
//! the serde renames below pin the wire names down.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Authorization, Client};
use crate::error::ApiError;

/// Request body for creating a database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDatabaseRequest {
    /// Name of the new database.
    pub name: String,
    /// Group the database is placed in. Must already exist.
    pub group: String,
    /// Optional seed to start from instead of an empty database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<DatabaseSeed>,
    /// Maximum total storage, e.g. "2gb" or "256mb".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_limit: Option<String>,
    /// Create a schema database that other databases can attach to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_schema: Option<bool>,
    /// Name of the schema database to inherit a schema from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

/// What a new database is seeded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedType {
    /// Copy an existing database in the organization.
    Database,
    /// Import a SQLite dump from a URL.
    Dump,
}

/// Seed description for [`CreateDatabaseRequest`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSeed {
    /// Kind of seed.
    #[serde(rename = "type")]
    pub seed_type: SeedType,
    /// Name of the database to copy, for [`SeedType::Database`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// URL of the dump to import, for [`SeedType::Dump`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Point in time to restore the seed database to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Core database identity returned by create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    /// Unique identifier of the database.
    #[serde(rename = "DbId")]
    pub id: String,
    /// Hostname used to connect to the database.
    #[serde(rename = "Hostname")]
    pub hostname: String,
    /// Name of the database.
    #[serde(rename = "Name")]
    pub name: String,
}

/// Full database description returned by get and list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseDetails {
    /// Unique identifier of the database.
    #[serde(rename = "DbId")]
    pub id: String,
    /// Hostname used to connect to the database.
    #[serde(rename = "Hostname")]
    pub hostname: String,
    /// Name of the database.
    #[serde(rename = "Name")]
    pub name: String,
    /// Group the database belongs to.
    #[serde(default)]
    pub group: String,
    /// Whether other databases may attach to this one.
    #[serde(default)]
    pub allow_attach: bool,
    /// Whether reads are currently blocked.
    #[serde(default)]
    pub block_reads: bool,
    /// Whether writes are currently blocked.
    #[serde(default)]
    pub block_writes: bool,
    /// Regions the database is replicated to.
    #[serde(default)]
    pub regions: Vec<String>,
    /// Region hosting the primary instance.
    #[serde(rename = "primaryRegion", default)]
    pub primary_region: String,
    /// Deployment type reported by the platform.
    #[serde(rename = "type", default)]
    pub database_type: String,
    /// libSQL server version.
    #[serde(default)]
    pub version: String,
    /// Whether this is a schema database.
    #[serde(default)]
    pub is_schema: bool,
    /// Schema database this database inherits from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    /// Whether the database has been archived due to inactivity.
    #[serde(default)]
    pub archived: bool,
}

/// A single instance (primary or replica) of a database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseInstance {
    /// Unique identifier of the instance.
    pub uuid: String,
    /// Name of the instance.
    pub name: String,
    /// Whether this instance is the primary or a replica.
    #[serde(rename = "type")]
    pub instance_type: InstanceType,
    /// Region the instance runs in.
    pub region: String,
    /// Hostname used to connect to this specific instance.
    pub hostname: String,
}

/// Role of a database instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceType {
    /// The writable primary instance.
    Primary,
    /// A read replica.
    Replica,
}

/// Mutable per-database configuration.
///
/// Doubles as the PATCH request body and its response; unset fields are
/// left untouched by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Maximum total storage, e.g. "2gb".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_limit: Option<String>,
    /// Whether other databases may attach to this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_attach: Option<bool>,
    /// Whether reads are blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_reads: Option<bool>,
    /// Whether writes are blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_writes: Option<bool>,
}

#[derive(Deserialize)]
struct DatabaseResponse {
    database: Database,
}

#[derive(Deserialize)]
struct DatabaseDetailsResponse {
    database: DatabaseDetails,
}

#[derive(Deserialize)]
struct DatabasesResponse {
    databases: Vec<DatabaseDetails>,
}

#[derive(Deserialize)]
struct InstancesResponse {
    instances: Vec<DatabaseInstance>,
}

impl Client {
    /// Create a database in the organization.
    pub async fn create_database(
        &self,
        request: CreateDatabaseRequest,
    ) -> Result<Database, ApiError> {
        debug!(database = %request.name, group = %request.group, "creating database");
        let response = self
            .request(Method::POST, "databases")
            .json(&request)
            .send()
            .await?;
        let body: DatabaseResponse = self.handle(response).await?;
        Ok(body.database)
    }

    /// Fetch a database by name.
    pub async fn get_database(&self, name: &str) -> Result<DatabaseDetails, ApiError> {
        debug!(database = %name, "fetching database");
        let response = self
            .request(Method::GET, &format!("databases/{name}"))
            .send()
            .await?;
        let body: DatabaseDetailsResponse = self.handle(response).await?;
        Ok(body.database)
    }

    /// List all databases in the organization.
    pub async fn list_databases(&self) -> Result<Vec<DatabaseDetails>, ApiError> {
        debug!("listing databases");
        let response = self.request(Method::GET, "databases").send().await?;
        let body: DatabasesResponse = self.handle(response).await?;
        Ok(body.databases)
    }

    /// Delete a database by name.
    pub async fn delete_database(&self, name: &str) -> Result<(), ApiError> {
        debug!(database = %name, "deleting database");
        let response = self
            .request(Method::DELETE, &format!("databases/{name}"))
            .send()
            .await?;
        self.handle_empty(response).await
    }

    /// List the instances of a database across its group's locations.
    pub async fn list_database_instances(
        &self,
        name: &str,
    ) -> Result<Vec<DatabaseInstance>, ApiError> {
        debug!(database = %name, "listing database instances");
        let response = self
            .request(Method::GET, &format!("databases/{name}/instances"))
            .send()
            .await?;
        let body: InstancesResponse = self.handle(response).await?;
        Ok(body.instances)
    }

    /// Fetch the mutable configuration of a database.
    pub async fn get_database_configuration(
        &self,
        name: &str,
    ) -> Result<DatabaseConfig, ApiError> {
        debug!(database = %name, "fetching database configuration");
        let response = self
            .request(Method::GET, &format!("databases/{name}/configuration"))
            .send()
            .await?;
        self.handle(response).await
    }

    /// Patch the mutable configuration of a database. Unset fields are
    /// left as they are.
    pub async fn update_database_configuration(
        &self,
        name: &str,
        config: &DatabaseConfig,
    ) -> Result<DatabaseConfig, ApiError> {
        debug!(database = %name, "updating database configuration");
        let response = self
            .request(Method::PATCH, &format!("databases/{name}/configuration"))
            .json(config)
            .send()
            .await?;
        self.handle(response).await
    }

    /// Mint an access token for a database. A zero expiration creates a
    /// token that never expires.
    pub async fn create_database_token(
        &self,
        name: &str,
        expiration: Duration,
        authorization: Authorization,
    ) -> Result<String, ApiError> {
        debug!(database = %name, %authorization, "creating database token");
        self.mint_token(
            &format!("databases/{name}/auth/tokens"),
            expiration,
            authorization,
        )
        .await
    }

    /// Invalidate every token previously minted for a database.
    pub async fn invalidate_database_tokens(&self, name: &str) -> Result<(), ApiError> {
        debug!(database = %name, "invalidating database tokens");
        let response = self
            .request(Method::POST, &format!("databases/{name}/auth/rotate"))
            .send()
            .await?;
        self.handle_empty(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_client;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn create_database_posts_request_and_decodes_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/organizations/test-org/databases"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_partial_json(json!({"name": "orders", "group": "default"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "database": {"DbId": "db-123", "Hostname": "orders-test-org.turso.io", "Name": "orders"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let database = client
            .create_database(CreateDatabaseRequest {
                name: "orders".to_string(),
                group: "default".to_string(),
                seed: None,
                size_limit: None,
                is_schema: None,
                schema: None,
            })
            .await
            .unwrap();

        assert_eq!(database.id, "db-123");
        assert_eq!(database.hostname, "orders-test-org.turso.io");
        assert_eq!(database.name, "orders");
    }

    #[tokio::test]
    async fn create_database_serializes_seed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/organizations/test-org/databases"))
            .and(body_partial_json(json!({
                "name": "restored",
                "seed": {"type": "database", "name": "orders"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "database": {"DbId": "db-9", "Hostname": "h", "Name": "restored"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client
            .create_database(CreateDatabaseRequest {
                name: "restored".to_string(),
                group: "default".to_string(),
                seed: Some(DatabaseSeed {
                    seed_type: SeedType::Database,
                    name: Some("orders".to_string()),
                    url: None,
                    timestamp: None,
                }),
                size_limit: None,
                is_schema: None,
                schema: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn get_database_decodes_mixed_case_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/test-org/databases/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "database": {
                    "DbId": "db-123",
                    "Hostname": "orders-test-org.turso.io",
                    "Name": "orders",
                    "group": "default",
                    "allow_attach": true,
                    "block_reads": false,
                    "block_writes": false,
                    "regions": ["sjc", "lhr"],
                    "primaryRegion": "sjc",
                    "type": "logical",
                    "version": "0.24.1",
                    "is_schema": false
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let database = client.get_database("orders").await.unwrap();

        assert_eq!(database.id, "db-123");
        assert_eq!(database.group, "default");
        assert!(database.allow_attach);
        assert_eq!(database.regions, vec!["sjc", "lhr"]);
        assert_eq!(database.primary_region, "sjc");
        assert_eq!(database.database_type, "logical");
        assert!(database.schema.is_none());
        assert!(!database.archived);
    }

    #[tokio::test]
    async fn list_database_instances_decodes_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/test-org/databases/orders/instances"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "instances": [
                    {"uuid": "i-1", "name": "sjc", "type": "primary", "region": "sjc", "hostname": "a"},
                    {"uuid": "i-2", "name": "lhr", "type": "replica", "region": "lhr", "hostname": "b"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let instances = client.list_database_instances("orders").await.unwrap();

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].instance_type, InstanceType::Primary);
        assert_eq!(instances[1].instance_type, InstanceType::Replica);
        assert_eq!(instances[1].region, "lhr");
    }

    #[tokio::test]
    async fn update_database_configuration_patches_only_set_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/organizations/test-org/databases/orders/configuration"))
            .and(body_partial_json(json!({"size_limit": "2gb", "allow_attach": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "size_limit": "2gb",
                "allow_attach": true,
                "block_reads": false,
                "block_writes": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let config = client
            .update_database_configuration(
                "orders",
                &DatabaseConfig {
                    size_limit: Some("2gb".to_string()),
                    allow_attach: Some(true),
                    block_reads: None,
                    block_writes: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(config.size_limit.as_deref(), Some("2gb"));
        assert_eq!(config.allow_attach, Some(true));
    }

    #[tokio::test]
    async fn database_config_omits_unset_fields() {
        let config = DatabaseConfig {
            size_limit: None,
            allow_attach: Some(false),
            block_reads: None,
            block_writes: None,
        };
        let body = serde_json::to_value(&config).unwrap();
        assert_eq!(body, json!({"allow_attach": false}));
    }

    #[tokio::test]
    async fn create_database_token_sends_expiration_and_authorization() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/organizations/test-org/databases/orders/auth/tokens"))
            .and(query_param("expiration", "3600s"))
            .and(query_param("authorization", "full-access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jwt": "token-value"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let token = client
            .create_database_token(
                "orders",
                Duration::from_secs(3600),
                Authorization::FullAccess,
            )
            .await
            .unwrap();
        assert_eq!(token, "token-value");
    }

    #[tokio::test]
    async fn zero_expiration_requests_token_that_never_expires() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/organizations/test-org/databases/orders/auth/tokens"))
            .and(query_param("expiration", "never"))
            .and(query_param("authorization", "read-only"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jwt": "token-value"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let token = client
            .create_database_token("orders", Duration::ZERO, Authorization::ReadOnly)
            .await
            .unwrap();
        assert_eq!(token, "token-value");
    }

    #[tokio::test]
    async fn invalidate_database_tokens_rotates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/organizations/test-org/databases/orders/auth/rotate"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client.invalidate_database_tokens("orders").await.unwrap();
    }

    #[tokio::test]
    async fn error_status_carries_api_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/test-org/databases/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"error": "database missing not found"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.get_database("missing").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("database missing not found"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/test-org/databases"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.list_databases().await.unwrap_err();
        assert!(matches!(err, crate::error::ApiError::Decode(_)));
    }
}
