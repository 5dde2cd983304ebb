//! The `turso_database_token` and `turso_group_token` resources.
//!
//! Tokens are minted once at create time and can never be read back, so
//! every input attribute forces replacement. Deleting a token resource
//! rotates the parent's signing key, which invalidates all outstanding
//! tokens for that database or group, not just the one being destroyed.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{decode_state, encode_state, ResourceHandler};
use crate::client::{parse_expiration, Authorization, Client};
use crate::error::ProviderError;
use crate::schema::{Attribute, Diagnostic, Schema};

/// Manages an auth token scoped to a single database.
pub(crate) struct DatabaseTokenResource;

/// Manages an auth token valid for every database in a group.
pub(crate) struct GroupTokenResource;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DatabaseTokenState {
    #[serde(default)]
    id: Option<String>,
    database: String,
    #[serde(flatten)]
    token: TokenState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GroupTokenState {
    #[serde(default)]
    id: Option<String>,
    group: String,
    #[serde(flatten)]
    token: TokenState,
}

/// The attributes shared by both token resources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TokenState {
    #[serde(default)]
    expiration: Option<String>,
    #[serde(default)]
    authorization: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    expires_at: Option<String>,
}

impl TokenState {
    fn mint_parameters(&self) -> Result<(Duration, Authorization), ProviderError> {
        let expiration = parse_expiration(self.expiration.as_deref())?;
        let authorization = match self.authorization.as_deref() {
            Some(authorization) => authorization.parse()?,
            None => Authorization::default(),
        };
        Ok((expiration, authorization))
    }

    fn record(&mut self, jwt: String, expiration: Duration, authorization: Authorization) {
        self.token = Some(jwt);
        self.expires_at = expires_at(expiration);
        self.authorization = Some(authorization.as_str().to_string());
    }
}

/// The RFC 3339 deadline of a freshly minted token, or `None` for
/// tokens that never expire.
fn expires_at(expiration: Duration) -> Option<String> {
    if expiration.is_zero() {
        return None;
    }
    chrono::Duration::from_std(expiration)
        .ok()
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .map(|deadline| deadline.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn token_schema(parent: &str, parent_description: &str) -> Schema {
    Schema::v0()
        .with_description(format!("An auth token for a {parent}."))
        .with_attribute(
            parent,
            Attribute::required_string()
                .with_description(parent_description)
                .with_force_new(),
        )
        .with_attribute(
            "expiration",
            Attribute::optional_string()
                .with_description(
                    "Time until the token expires, e.g. \"2w\" or \"30d\". \
                     Omit or use \"never\" for a token that never expires.",
                )
                .with_force_new(),
        )
        .with_attribute(
            "authorization",
            Attribute::optional_string()
                .with_description("Access level of the token, either \"full-access\" or \"read-only\".")
                .with_default(json!(Authorization::default().as_str()))
                .with_force_new(),
        )
        .with_attribute(
            "token",
            Attribute::computed_string()
                .sensitive()
                .with_description("The minted JWT."),
        )
        .with_attribute(
            "expires_at",
            Attribute::computed_string()
                .with_description("RFC 3339 time the token expires, absent for non-expiring tokens."),
        )
        .with_attribute(
            "id",
            Attribute::computed_string().with_description("Identifier of the token resource."),
        )
}

fn validate_token_config(config: &Value) -> Vec<Diagnostic> {
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
impl ResourceHandler for DatabaseTokenResource {
    fn schema(&self) -> Schema {
        token_schema("database", "Name of the database the token grants access to.")
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validate_token_config(config)
    }

    async fn create(&self, client: &Client, planned: Value) -> Result<Value, ProviderError> {
        let mut state: DatabaseTokenState = decode_state(planned)?;
        let (expiration, authorization) = state.token.mint_parameters()?;

        let jwt = client
            .create_database_token(&state.database, expiration, authorization)
            .await
            .map_err(|err| ProviderError::api("failed to create database token", err))?;

        state.token.record(jwt, expiration, authorization);
        state.id = Some(state.database.clone());
        info!(database = %state.database, authorization = authorization.as_str(), "minted database token");
        encode_state(&state)
    }

    // Tokens cannot be read back from the API; the stored state stands.
    async fn read(&self, _client: &Client, state: Value) -> Result<Value, ProviderError> {
        Ok(state)
    }

    async fn update(
        &self,
        _client: &Client,
        _prior: Value,
        _planned: Value,
    ) -> Result<Value, ProviderError> {
        // Every input forces replacement, so plans never produce an update.
        Err(ProviderError::Internal(
            "database tokens cannot be updated in place".to_string(),
        ))
    }

    async fn delete(&self, client: &Client, state: Value) -> Result<(), ProviderError> {
        let state: DatabaseTokenState = decode_state(state)?;
        if let Err(err) = client.invalidate_database_tokens(&state.database).await {
            warn!(
                database = %state.database,
                error = %err,
                "failed to invalidate database tokens; removing from state anyway"
            );
        } else {
            info!(database = %state.database, "invalidated all database tokens");
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceHandler for GroupTokenResource {
    fn schema(&self) -> Schema {
        token_schema("group", "Name of the group the token grants access to.")
    }

    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        validate_token_config(config)
    }

    async fn create(&self, client: &Client, planned: Value) -> Result<Value, ProviderError> {
        let mut state: GroupTokenState = decode_state(planned)?;
        let (expiration, authorization) = state.token.mint_parameters()?;

        let jwt = client
            .create_group_token(&state.group, expiration, authorization)
            .await
            .map_err(|err| ProviderError::api("failed to create group token", err))?;

        state.token.record(jwt, expiration, authorization);
        state.id = Some(state.group.clone());
        info!(group = %state.group, authorization = authorization.as_str(), "minted group token");
        encode_state(&state)
    }

    async fn read(&self, _client: &Client, state: Value) -> Result<Value, ProviderError> {
        Ok(state)
    }

    async fn update(
        &self,
        _client: &Client,
        _prior: Value,
        _planned: Value,
    ) -> Result<Value, ProviderError> {
        Err(ProviderError::Internal(
            "group tokens cannot be updated in place".to_string(),
        ))
    }

    async fn delete(&self, client: &Client, state: Value) -> Result<(), ProviderError> {
        let state: GroupTokenState = decode_state(state)?;
        if let Err(err) = client.invalidate_group_tokens(&state.group).await {
            warn!(
                group = %state.group,
                error = %err,
                "failed to invalidate group tokens; removing from state anyway"
            );
        } else {
            info!(group = %state.group, "invalidated all group tokens");
        }
        Ok(())
    }
}
