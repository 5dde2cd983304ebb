//! Group operations of the admin API.
//!
//! A group is a placement unit: the set of locations its databases are
//! replicated to. Location membership changes one location per call.

use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Authorization, Client};
use crate::error::ApiError;

/// A database group and its current placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Name of the group.
    pub name: String,
    /// libSQL server version the group runs.
    #[serde(default)]
    pub version: String,
    /// Unique identifier of the group.
    #[serde(default)]
    pub uuid: String,
    /// Locations the group is replicated to. May or may not include the
    /// primary, depending on the endpoint.
    #[serde(default)]
    pub locations: Vec<String>,
    /// The group's primary location.
    #[serde(default)]
    pub primary: String,
    /// Whether the group has been archived due to inactivity.
    #[serde(default)]
    pub archived: bool,
}

/// Request body for creating a group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGroupRequest {
    /// Name of the new group.
    pub name: String,
    /// Primary location of the group.
    pub location: String,
    /// Extensions to enable, e.g. "all".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<String>,
}

#[derive(Deserialize)]
struct GroupResponse {
    group: Group,
}

#[derive(Deserialize)]
struct GroupsResponse {
    groups: Vec<Group>,
}

impl Client {
    /// Create a group with a single primary location.
    pub async fn create_group(&self, request: CreateGroupRequest) -> Result<Group, ApiError> {
        debug!(group = %request.name, location = %request.location, "creating group");
        let response = self
            .request(Method::POST, "groups")
            .json(&request)
            .send()
            .await?;
        let body: GroupResponse = self.handle(response).await?;
        Ok(body.group)
    }

    /// Fetch a group by name.
    pub async fn get_group(&self, name: &str) -> Result<Group, ApiError> {
        debug!(group = %name, "fetching group");
        let response = self
            .request(Method::GET, &format!("groups/{name}"))
            .send()
            .await?;
        let body: GroupResponse = self.handle(response).await?;
        Ok(body.group)
    }

    /// List all groups in the organization.
    pub async fn list_groups(&self) -> Result<Vec<Group>, ApiError> {
        debug!("listing groups");
        let response = self.request(Method::GET, "groups").send().await?;
        let body: GroupsResponse = self.handle(response).await?;
        Ok(body.groups)
    }

    /// Delete a group and every database in it.
    pub async fn delete_group(&self, name: &str) -> Result<(), ApiError> {
        debug!(group = %name, "deleting group");
        let response = self
            .request(Method::DELETE, &format!("groups/{name}"))
            .send()
            .await?;
        self.handle_empty(response).await
    }

    /// Add a location to a group, returning the updated group.
    pub async fn add_group_location(
        &self,
        group: &str,
        location: &str,
    ) -> Result<Group, ApiError> {
        debug!(group = %group, location = %location, "adding group location");
        let response = self
            .request(Method::POST, &format!("groups/{group}/locations/{location}"))
            .send()
            .await?;
        let body: GroupResponse = self.handle(response).await?;
        Ok(body.group)
    }

    /// Remove a location from a group, returning the updated group.
    pub async fn remove_group_location(
        &self,
        group: &str,
        location: &str,
    ) -> Result<Group, ApiError> {
        debug!(group = %group, location = %location, "removing group location");
        let response = self
            .request(
                Method::DELETE,
                &format!("groups/{group}/locations/{location}"),
            )
            .send()
            .await?;
        let body: GroupResponse = self.handle(response).await?;
        Ok(body.group)
    }

    /// Mint an access token valid for every database in a group. A zero
    /// expiration creates a token that never expires.
    pub async fn create_group_token(
        &self,
        name: &str,
        expiration: Duration,
        authorization: Authorization,
    ) -> Result<String, ApiError> {
        debug!(group = %name, %authorization, "creating group token");
        self.mint_token(
            &format!("groups/{name}/auth/tokens"),
            expiration,
            authorization,
        )
        .await
    }

    /// Invalidate every token previously minted for a group.
    pub async fn invalidate_group_tokens(&self, name: &str) -> Result<(), ApiError> {
        debug!(group = %name, "invalidating group tokens");
        let response = self
            .request(Method::POST, &format!("groups/{name}/auth/rotate"))
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
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn group_body(locations: &[&str], primary: &str) -> serde_json::Value {
        json!({
            "group": {
                "name": "prod",
                "version": "0.24.1",
                "uuid": "g-123",
                "locations": locations,
                "primary": primary,
                "archived": false
            }
        })
    }

    #[tokio::test]
    async fn create_group_posts_primary_location() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/organizations/test-org/groups"))
            .and(body_json(json!({"name": "prod", "location": "sjc"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(group_body(&["sjc"], "sjc")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let group = client
            .create_group(CreateGroupRequest {
                name: "prod".to_string(),
                location: "sjc".to_string(),
                extensions: None,
            })
            .await
            .unwrap();

        assert_eq!(group.name, "prod");
        assert_eq!(group.primary, "sjc");
        assert_eq!(group.locations, vec!["sjc"]);
    }

    #[tokio::test]
    async fn create_group_includes_extensions_when_set() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/organizations/test-org/groups"))
            .and(body_json(json!({
                "name": "prod",
                "location": "sjc",
                "extensions": "all"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(group_body(&["sjc"], "sjc")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client
            .create_group(CreateGroupRequest {
                name: "prod".to_string(),
                location: "sjc".to_string(),
                extensions: Some("all".to_string()),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn add_and_remove_location_hit_location_routes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/organizations/test-org/groups/prod/locations/lhr"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(group_body(&["sjc", "lhr"], "sjc")),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/organizations/test-org/groups/prod/locations/lhr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(group_body(&["sjc"], "sjc")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);

        let group = client.add_group_location("prod", "lhr").await.unwrap();
        assert_eq!(group.locations, vec!["sjc", "lhr"]);

        let group = client.remove_group_location("prod", "lhr").await.unwrap();
        assert_eq!(group.locations, vec!["sjc"]);
    }

    #[tokio::test]
    async fn list_groups_decodes_collection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/test-org/groups"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "groups": [
                    {"name": "prod", "uuid": "g-1", "locations": ["sjc"], "primary": "sjc"},
                    {"name": "staging", "uuid": "g-2", "locations": ["lhr"], "primary": "lhr"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let groups = client.list_groups().await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "prod");
        assert_eq!(groups[1].primary, "lhr");
    }

    #[tokio::test]
    async fn group_token_uses_group_auth_route() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/organizations/test-org/groups/prod/auth/tokens"))
            .and(query_param("expiration", "never"))
            .and(query_param("authorization", "full-access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jwt": "group-token"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let token = client
            .create_group_token("prod", Duration::ZERO, Authorization::FullAccess)
            .await
            .unwrap();
        assert_eq!(token, "group-token");
    }

    #[tokio::test]
    async fn invalidate_group_tokens_rotates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/organizations/test-org/groups/prod/auth/rotate"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        client.invalidate_group_tokens("prod").await.unwrap();
    }

    #[tokio::test]
    async fn delete_group_propagates_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/organizations/test-org/groups/prod"))
            .respond_with(
                ResponseTemplate::new(409).set_body_json(json!({"error": "group is not empty"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let err = client.delete_group("prod").await.unwrap_err();
        assert!(err.to_string().contains("group is not empty"));
        assert!(err.to_string().contains("409"));
    }
}
