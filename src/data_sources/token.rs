//! The `turso_database_token` and `turso_group_token` data sources.
//!
//! Reading one of these mints a fresh token on every refresh. That suits
//! short-lived credentials handed to other resources; use the token
//! resources instead when the token itself should be tracked in state.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode_state, encode_state, DataSourceHandler};
use crate::client::{parse_expiration, Authorization, Client};
use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};

/// Mints a token scoped to a single database.
pub(crate) struct DatabaseTokenDataSource;

/// Mints a token valid for every database in a group.
pub(crate) struct GroupTokenDataSource;

#[derive(Debug, Serialize, Deserialize)]
struct TokenQuery {
    id: String,
    #[serde(default)]
    expiration: Option<String>,
    #[serde(default)]
    authorization: Option<String>,
    #[serde(default)]
    jwt: Option<String>,
}

impl TokenQuery {
    fn mint_parameters(&self) -> Result<(std::time::Duration, Authorization), ProviderError> {
        let expiration = parse_expiration(self.expiration.as_deref())?;
        let authorization = match self.authorization.as_deref() {
            Some(authorization) => authorization.parse()?,
            None => Authorization::default(),
        };
        Ok((expiration, authorization))
    }
}

fn token_schema(parent: &str, id_description: &str) -> Schema {
    Schema::v0()
        .with_description(format!("Mints a fresh auth token for a {parent} on every read."))
        .with_attribute(
            "id",
            Attribute::required_string().with_description(id_description),
        )
        .with_attribute(
            "expiration",
            Attribute::optional_string().with_description(
                "Time until the token expires, e.g. \"2w\" or \"30d\". \
                 Omit or use \"never\" for a token that never expires.",
            ),
        )
        .with_attribute(
            "authorization",
            Attribute::optional_string()
                .with_description("Access level of the token, either \"full-access\" or \"read-only\"."),
        )
        .with_attribute(
            "jwt",
            Attribute::computed_string()
                .sensitive()
                .with_description("The minted JWT."),
        )
}

fn validate_token_query(config: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if let Some(expiration) = config.get("expiration").and_then(Value::as_str) {
        if let Err(err) = parse_expiration(Some(expiration)) {
            diagnostics.push(
                Diagnostic::error("invalid token expiration")
                    .with_detail(err.to_string())
                    .with_attribute("expiration"),
            );
        }
    }
    if let Some(authorization) = config.get("authorization").and_then(Value::as_str) {
        if authorization.parse::<Authorization>().is_err() {
            diagnostics.push(
                Diagnostic::error("invalid token authorization")
                    .with_detail("authorization must be \"full-access\" or \"read-only\"")
                    .with_attribute("authorization"),
            );
        }
    }

    diagnostics
}

#[async_trait]
impl DataSourceHandler for DatabaseTokenDataSource {
    fn schema(&self) -> Schema {
        token_schema("database", "Name of the database the token grants access to.")
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validate_token_query(config)
    }

    async fn read(&self, client: &Client, config: Value) -> Result<Value, ProviderError> {
        let mut query: TokenQuery = decode_state(config)?;
        let (expiration, authorization) = query.mint_parameters()?;
        let jwt = client
            .create_database_token(&query.id, expiration, authorization)
            .await
            .map_err(|err| ProviderError::api("failed to create database token", err))?;
        query.jwt = Some(jwt);
        encode_state(&query)
    }
}

#[async_trait]
impl DataSourceHandler for GroupTokenDataSource {
    fn schema(&self) -> Schema {
        token_schema("group", "Name of the group the token grants access to.")
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validate_token_query(config)
    }

    async fn read(&self, client: &Client, config: Value) -> Result<Value, ProviderError> {
        let mut query: TokenQuery = decode_state(config)?;
        let (expiration, authorization) = query.mint_parameters()?;
        let jwt = client
            .create_group_token(&query.id, expiration, authorization)
            .await
            .map_err(|err| ProviderError::api("failed to create group token", err))?;
        query.jwt = Some(jwt);
        encode_state(&query)
    }
}
