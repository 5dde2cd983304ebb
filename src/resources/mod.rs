//! Resource handlers, one per managed resource type.

mod database;
mod group;
mod token;

pub(crate) use database::DatabaseResource;
pub(crate) use group::GroupResource;
pub(crate) use token::{DatabaseTokenResource, GroupTokenResource};

use async_trait::async_trait;
use serde_json::Value;

use crate::client::Client;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};

/// CRUD handler for one managed resource type.
///
/// State and configuration travel as JSON values shaped by the handler's
/// [`schema`](ResourceHandler::schema). A `read` returning `Value::Null`
/// means the remote object no longer exists and its state should be
/// dropped.
#[async_trait]
pub(crate) trait ResourceHandler: Send + Sync {
    /// Schema of this resource type.
    fn schema(&self) -> Schema;

    /// Extra validation beyond schema type checks. Runs before any API
    /// call is made.
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let _ = config;
        Vec::new()
    }

    /// Create the remote object from planned state, returning final state.
    async fn create(&self, client: &Client, planned: Value) -> Result<Value, ProviderError>;

    /// Refresh state from the remote object.
    async fn read(&self, client: &Client, state: Value) -> Result<Value, ProviderError>;

    /// Apply in-place changes, returning final state.
    async fn update(
        &self,
        client: &Client,
        prior: Value,
        planned: Value,
    ) -> Result<Value, ProviderError>;

    /// Delete the remote object.
    async fn delete(&self, client: &Client, state: Value) -> Result<(), ProviderError>;

    /// Build state from an import identifier.
    async fn import(&self, client: &Client, id: &str) -> Result<Value, ProviderError> {
        let _ = (client, id);
        Err(ProviderError::Validation(
            "this resource type does not support import".to_string(),
        ))
    }
}

pub(crate) use crate::types::{decode_state, encode_state};
