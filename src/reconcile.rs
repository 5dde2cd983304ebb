//! Reconciliation of group location membership.
//!
//! The admin API changes placement one location per call, so a desired
//! location set is reconciled as a sequence of adds and removes. Additions
//! run before removals so the group never passes through a state with fewer
//! locations than either the old or the new set requires. Both lists are
//! computed against the locations observed before the first call; the first
//! failed call aborts the sequence and surfaces as the operation error, with
//! no rollback of calls that already succeeded.

use tracing::debug;

use crate::client::Client;
use crate::error::ProviderError;

/// The location changes needed to move a group from one placement to another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationDiff {
    /// Locations to add, in requested order.
    pub to_add: Vec<String>,
    /// Locations to remove, in the order they appear in the current set.
    pub to_remove: Vec<String>,
}

impl LocationDiff {
    /// Whether the diff carries no changes.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// Compute the changes that turn `current` into `requested`.
///
/// Membership is exact: anything requested but not current is added,
/// anything current but not requested is removed.
pub fn diff_locations(current: &[String], requested: &[String]) -> LocationDiff {
    let to_add = requested
        .iter()
        .filter(|location| !current.contains(location))
        .cloned()
        .collect();
    let to_remove = current
        .iter()
        .filter(|location| !requested.contains(location))
        .cloned()
        .collect();
    LocationDiff { to_add, to_remove }
}

/// Merge a group's replica locations with its primary into one sorted,
/// deduplicated set. The API reports the two separately; state treats the
/// primary as a member of the location set.
pub fn merge_locations(locations: &[String], primary: &str) -> Vec<String> {
    let mut merged: std::collections::BTreeSet<String> = locations.iter().cloned().collect();
    if !primary.is_empty() {
        merged.insert(primary.to_string());
    }
    merged.into_iter().collect()
}

/// Apply a [`LocationDiff`] to a group, one API call per change.
pub(crate) async fn apply_location_diff(
    client: &Client,
    group: &str,
    diff: &LocationDiff,
) -> Result<(), ProviderError> {
    debug!(
        group = %group,
        add = diff.to_add.len(),
        remove = diff.to_remove.len(),
        "reconciling group locations"
    );

    for location in &diff.to_add {
        client
            .add_group_location(group, location)
            .await
            .map_err(|err| {
                ProviderError::api(format!("failed to add location {location} to group"), err)
            })?;
    }

    for location in &diff.to_remove {
        client
            .remove_group_location(group, location)
            .await
            .map_err(|err| {
                ProviderError::api(
                    format!("failed to remove location {location} from group"),
                    err,
                )
            })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_client;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn locations(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn identical_sets_need_no_changes() {
        let current = locations(&["sjc", "lhr"]);
        let diff = diff_locations(&current, &current);
        assert!(diff.is_empty());
    }

    #[test]
    fn disjoint_members_are_added_and_removed() {
        let current = locations(&["sjc", "ams"]);
        let requested = locations(&["sjc", "lhr"]);
        let diff = diff_locations(&current, &requested);
        assert_eq!(diff.to_add, locations(&["lhr"]));
        assert_eq!(diff.to_remove, locations(&["ams"]));
        assert!(!diff.is_empty());
    }

    #[test]
    fn scaling_out_only_adds_and_scaling_in_only_removes() {
        let diff = diff_locations(&locations(&["sjc"]), &locations(&["sjc", "dfw", "sea"]));
        assert_eq!(diff.to_add, locations(&["dfw", "sea"]));
        assert!(diff.to_remove.is_empty());

        let diff = diff_locations(&locations(&["sjc", "dfw", "sea"]), &locations(&["sjc", "dfw"]));
        assert!(diff.to_add.is_empty());
        assert_eq!(diff.to_remove, locations(&["sea"]));
    }

    #[test]
    fn add_order_follows_requested_remove_order_follows_current() {
        let current = locations(&["ams", "fra", "sjc"]);
        let requested = locations(&["sjc", "nrt", "syd"]);
        let diff = diff_locations(&current, &requested);
        assert_eq!(diff.to_add, locations(&["nrt", "syd"]));
        assert_eq!(diff.to_remove, locations(&["ams", "fra"]));
    }

    #[test]
    fn empty_requested_removes_everything() {
        let current = locations(&["sjc", "lhr"]);
        let diff = diff_locations(&current, &[]);
        assert!(diff.to_add.is_empty());
        assert_eq!(diff.to_remove, current);
    }

    #[test]
    fn merge_folds_primary_into_sorted_set() {
        assert_eq!(
            merge_locations(&locations(&["lhr", "ams"]), "sjc"),
            locations(&["ams", "lhr", "sjc"])
        );
        // Primary already present stays deduplicated
        assert_eq!(
            merge_locations(&locations(&["sjc", "lhr"]), "sjc"),
            locations(&["lhr", "sjc"])
        );
        // Unknown primary is not invented
        assert_eq!(merge_locations(&locations(&["lhr"]), ""), locations(&["lhr"]));
    }

    fn group_body(locations: &[&str]) -> serde_json::Value {
        json!({
            "group": {
                "name": "prod",
                "uuid": "g-1",
                "locations": locations,
                "primary": "sjc"
            }
        })
    }

    #[tokio::test]
    async fn apply_issues_one_call_per_change() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/organizations/test-org/groups/prod/locations/nrt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(group_body(&["sjc", "ams", "nrt"])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/organizations/test-org/groups/prod/locations/ams"))
            .respond_with(ResponseTemplate::new(200).set_body_json(group_body(&["sjc", "nrt"])))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let diff = LocationDiff {
            to_add: locations(&["nrt"]),
            to_remove: locations(&["ams"]),
        };
        apply_location_diff(&client, "prod", &diff).await.unwrap();
    }

    #[tokio::test]
    async fn additions_run_before_removals() {
        let server = MockServer::start().await;
        // The add succeeds; the removal fails. Seeing the add call proves
        // additions were attempted first, since a failure aborts the rest.
        Mock::given(method("POST"))
            .and(path("/organizations/test-org/groups/prod/locations/nrt"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(group_body(&["sjc", "ams", "nrt"])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/organizations/test-org/groups/prod/locations/ams"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"error": "placement busy"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let diff = LocationDiff {
            to_add: locations(&["nrt"]),
            to_remove: locations(&["ams"]),
        };
        let err = apply_location_diff(&client, "prod", &diff)
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("failed to remove location ams from group"));
    }

    #[tokio::test]
    async fn first_failure_aborts_remaining_calls() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/organizations/test-org/groups/prod/locations/ams"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/organizations/test-org/groups/prod/locations/fra"))
            .respond_with(ResponseTemplate::new(200).set_body_json(group_body(&["sjc"])))
            .expect(0)
            .mount(&server)
            .await;

        let client = test_client(&server);
        let diff = LocationDiff {
            to_add: Vec::new(),
            to_remove: locations(&["ams", "fra"]),
        };
        let err = apply_location_diff(&client, "prod", &diff)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ams"));
    }
}
