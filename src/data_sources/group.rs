//! The `turso_group` and `turso_groups` data sources.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::DataSourceHandler;
use crate::client::{Client, Group};
use crate::error::ProviderError;
use crate::reconcile::merge_locations;
use crate::schema::{Attribute, AttributeFlags, AttributeType, Schema};

/// Looks up a single group by name.
pub(crate) struct GroupDataSource;

/// Lists every group in the organization.
pub(crate) struct GroupsDataSource;

fn group_object_type() -> AttributeType {
    AttributeType::object(HashMap::from([
        ("name".to_string(), AttributeType::String),
        ("primary".to_string(), AttributeType::String),
        (
            "locations".to_string(),
            AttributeType::list(AttributeType::String),
        ),
        ("uuid".to_string(), AttributeType::String),
        ("version".to_string(), AttributeType::String),
        ("archived".to_string(), AttributeType::Bool),
    ]))
}

fn group_value(group: Group) -> Value {
    // The API reports non-primary locations only; fold the primary in so
    // the exposed list is the full placement.
    let locations = merge_locations(&group.locations, &group.primary);
    json!({
        "name": group.name,
        "primary": group.primary,
        "locations": locations,
        "uuid": group.uuid,
        "version": group.version,
        "archived": group.archived,
    })
}

#[async_trait]
impl DataSourceHandler for GroupDataSource {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("A single group, looked up by name.")
            .with_attribute(
                "id",
                Attribute::required_string().with_description("Name of the group to look up."),
            )
            .with_attribute(
                "group",
                Attribute::new(group_object_type(), AttributeFlags::computed())
                    .with_description("The group as reported by the platform."),
            )
    }

    async fn read(&self, client: &Client, config: Value) -> Result<Value, ProviderError> {
        let name = config
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| ProviderError::Validation("id is required".to_string()))?;
        let group = client
            .get_group(name)
            .await
            .map_err(|err| ProviderError::api("failed to read group", err))?;
        Ok(json!({ "id": name, "group": group_value(group) }))
    }
}

#[async_trait]
impl DataSourceHandler for GroupsDataSource {
    fn schema(&self) -> Schema {
        Schema::v0()
            .with_description("All groups in the organization.")
            .with_attribute(
                "groups",
                Attribute::new(
                    AttributeType::list(group_object_type()),
                    AttributeFlags::computed(),
                )
                .with_description("Groups in the organization."),
            )
    }

    async fn read(&self, client: &Client, _config: Value) -> Result<Value, ProviderError> {
        let groups = client
            .list_groups()
            .await
            .map_err(|err| ProviderError::api("failed to list groups", err))?;
        let groups: Vec<Value> = groups.into_iter().map(group_value).collect();
        Ok(json!({ "groups": groups }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_client;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn group_lookup_merges_primary_into_locations() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/test-org/groups/prod"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "group": {
                    "name": "prod",
                    "version": "0.24.1",
                    "uuid": "g-123",
                    "locations": ["lhr", "ams"],
                    "primary": "sjc",
                    "archived": false
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = GroupDataSource
            .read(&client, json!({"id": "prod"}))
            .await
            .unwrap();

        assert_eq!(result["id"], "prod");
        assert_eq!(result["group"]["name"], "prod");
        assert_eq!(result["group"]["primary"], "sjc");
        assert_eq!(result["group"]["locations"], json!(["ams", "lhr", "sjc"]));
    }

    #[tokio::test]
    async fn group_lookup_fails_for_missing_group() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/test-org/groups/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = GroupDataSource
            .read(&client, json!({"id": "missing"}))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to read group"));
    }

    #[tokio::test]
    async fn groups_listing_exposes_every_group() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/test-org/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "groups": [
                    {
                        "name": "default",
                        "version": "0.24.1",
                        "uuid": "g-1",
                        "locations": [],
                        "primary": "sjc",
                        "archived": false
                    },
                    {
                        "name": "prod",
                        "version": "0.24.1",
                        "uuid": "g-2",
                        "locations": ["lhr"],
                        "primary": "sjc",
                        "archived": false
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = GroupsDataSource.read(&client, json!({})).await.unwrap();

        let groups = result["groups"].as_array().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0]["locations"], json!(["sjc"]));
        assert_eq!(groups[1]["locations"], json!(["lhr", "sjc"]));
    }
}
