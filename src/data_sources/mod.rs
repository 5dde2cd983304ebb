//! Data source handlers, one per queryable view.

mod database;
mod group;
mod token;

pub(crate) use database::{DatabaseDataSource, DatabaseInstancesDataSource, DatabasesDataSource};
pub(crate) use group::{GroupDataSource, GroupsDataSource};
pub(crate) use token::{DatabaseTokenDataSource, GroupTokenDataSource};

use async_trait::async_trait;
use serde_json::Value;

use crate::client::Client;
use crate::error::ProviderError;
use crate::schema::{Diagnostic, Schema};

pub(crate) use crate::types::{decode_state, encode_state};

/// Read handler for one data source type.
///
/// Unlike resources, data sources never write anything. `read` takes the
/// configured query attributes and returns the full result value; a
/// missing remote object is an error, not an empty result.
#[async_trait]
pub(crate) trait DataSourceHandler: Send + Sync {
    /// Schema of this data source type.
    fn schema(&self) -> Schema;

    /// Extra validation beyond schema type checks.
    fn validate(&self, config: &Value) -> Vec<Diagnostic> {
        let _ = config;
        Vec::new()
    }

    /// Resolve the query against the API.
    async fn read(&self, client: &Client, config: Value) -> Result<Value, ProviderError>;
}
