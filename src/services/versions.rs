//! Project versions (releases).

use chrono::ParseError;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{segment, PageOptions};
use crate::api::types::{Page, Version};
use crate::api::{Client, Date, Query, Response};
use crate::error::Result;

/// Version operations.
#[derive(Debug, Clone, Copy)]
pub struct VersionsService<'a> {
    pub(super) client: &'a Client,
}

impl Version {
    /// Parse the start date. A missing date is unset.
    pub fn start(&self) -> std::result::Result<Date, ParseError> {
        Date::parse(self.start_date.as_deref().unwrap_or_default())
    }

    /// Parse the release date. A missing date is unset.
    pub fn release(&self) -> std::result::Result<Date, ParseError> {
        Date::parse(self.release_date.as_deref().unwrap_or_default())
    }
}

/// Body for creating or changing a version.
///
/// Dates are `YYYY-MM-DD`. When creating, set `project_id` or `project`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub released: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    /// Version to receive unfixed issues when releasing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_unfixed_issues_to: Option<String>,
}

impl VersionRequest {
    /// A new version in the project with the given numeric ID.
    pub fn new(project_id: i64, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            project_id: Some(project_id),
            ..Self::default()
        }
    }
}

/// Where to send issues when deleting a version with [`VersionsService::delete_and_replace`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAndReplaceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_fix_issues_to: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_affected_issues_to: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_field_replacement_list: Vec<CustomFieldReplacement>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldReplacement {
    pub custom_field_id: i64,
    pub move_to: i64,
}

/// A version move: a relative position or a version URL to follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionPosition {
    Earlier,
    Later,
    First,
    Last,
    /// After the version at this `self` URL.
    After(String),
}

#[derive(Debug, Serialize)]
struct MoveVersionBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<&'a str>,
}

impl VersionPosition {
    fn body(&self) -> MoveVersionBody<'_> {
        let position = match self {
            VersionPosition::Earlier => "Earlier",
            VersionPosition::Later => "Later",
            VersionPosition::First => "First",
            VersionPosition::Last => "Last",
            VersionPosition::After(url) => {
                return MoveVersionBody {
                    position: None,
                    after: Some(url.as_str()),
                }
            }
        };
        MoveVersionBody {
            position: Some(position),
            after: None,
        }
    }
}

/// Issue counts for a version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionIssueCounts {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default)]
    pub issues_fixed_count: i64,
    #[serde(default)]
    pub issues_affected_count: i64,
    #[serde(default)]
    pub issue_count_with_custom_fields_showing_version: i64,
    #[serde(default)]
    pub custom_field_usage: Vec<VersionUsageInCustomField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionUsageInCustomField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(default)]
    pub custom_field_id: i64,
    #[serde(default)]
    pub issue_count_with_version_in_custom_field: i64,
}

/// Unresolved issue counts for a version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionUnresolvedIssueCounts {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default)]
    pub issues_unresolved_count: i64,
    #[serde(default)]
    pub issues_count: i64,
}

/// Options for [`VersionsService::list_for_project`].
#[derive(Debug, Clone, Default)]
pub struct ListVersionsOptions {
    pub page: PageOptions,
    /// e.g. `sequence`, `-releaseDate`, `name`.
    pub order_by: Option<String>,
    pub query: Option<String>,
    /// `released`, `unreleased` or `archived`, comma separated.
    pub status: Option<String>,
    pub expand: Vec<String>,
}

impl<'a> VersionsService<'a> {
    fn path(version_id: &str) -> String {
        format!("/rest/api/3/version/{}", segment(version_id))
    }

    /// Get a version.
    pub async fn get(&self, version_id: &str, expand: &[&str]) -> Result<Response<Version>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply(Self::path(version_id));
        self.client.get(&path).await
    }

    /// Create a version.
    #[instrument(skip(self, version), fields(name = ?version.name))]
    pub async fn create(&self, version: &VersionRequest) -> Result<Response<Version>> {
        let response: Response<Version> = self.client.post("/rest/api/3/version", version).await?;
        debug!(id = ?response.data().id, "Version created");
        Ok(response)
    }

    /// Update a version. Set `released` to release it.
    #[instrument(skip(self, version))]
    pub async fn update(&self, version_id: &str, version: &VersionRequest) -> Result<Response<Version>> {
        self.client.put(&Self::path(version_id), version).await
    }

    /// Delete a version, optionally moving its fix and affected issues.
    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        version_id: &str,
        move_fix_issues_to: Option<&str>,
        move_affected_issues_to: Option<&str>,
    ) -> Result<Response<()>> {
        let path = Query::new()
            .opt_string("moveFixIssuesTo", move_fix_issues_to)
            .opt_string("moveAffectedIssuesTo", move_affected_issues_to)
            .apply(Self::path(version_id));
        self.client.delete(&path).await
    }

    /// Delete a version and swap its references, including in custom fields.
    #[instrument(skip(self, request))]
    pub async fn delete_and_replace(
        &self,
        version_id: &str,
        request: &DeleteAndReplaceRequest,
    ) -> Result<Response<()>> {
        let path = format!("{}/removeAndSwap", Self::path(version_id));
        self.client
            .call_empty(reqwest::Method::POST, &path, Some(request))
            .await
    }

    /// Merge a version into another, moving all of its issues.
    #[instrument(skip(self))]
    pub async fn merge(&self, version_id: &str, move_issues_to: &str) -> Result<Response<()>> {
        let path = format!("{}/mergeto/{}", Self::path(version_id), segment(move_issues_to));
        self.client
            .call_empty(reqwest::Method::PUT, &path, crate::api::NO_BODY)
            .await
    }

    /// Move a version within its project's ordering.
    #[instrument(skip(self))]
    pub async fn move_version(&self, version_id: &str, position: &VersionPosition) -> Result<Response<Version>> {
        let path = format!("{}/move", Self::path(version_id));
        self.client.post(&path, &position.body()).await
    }

    /// Count the issues fixed in or affected by a version.
    pub async fn get_related_issue_counts(&self, version_id: &str) -> Result<Response<VersionIssueCounts>> {
        let path = format!("{}/relatedIssueCounts", Self::path(version_id));
        self.client.get(&path).await
    }

    /// Count the unresolved issues of a version.
    pub async fn get_unresolved_issue_count(
        &self,
        version_id: &str,
    ) -> Result<Response<VersionUnresolvedIssueCounts>> {
        let path = format!("{}/unresolvedIssueCount", Self::path(version_id));
        self.client.get(&path).await
    }

    /// Get a page of a project's versions.
    pub async fn list_for_project(
        &self,
        project_id_or_key: &str,
        options: &ListVersionsOptions,
    ) -> Result<Response<Page<Version>>> {
        let query = options
            .page
            .apply(Query::new())
            .opt_string("orderBy", options.order_by.as_deref())
            .opt_string("query", options.query.as_deref())
            .opt_string("status", options.status.as_deref())
            .joined("expand", &options.expand);
        let path = query.apply(format!(
            "/rest/api/3/project/{}/version",
            segment(project_id_or_key)
        ));
        self.client.get(&path).await
    }

    /// Get all of a project's versions in one unpaged list.
    pub async fn list_all_for_project(
        &self,
        project_id_or_key: &str,
        expand: &[&str],
    ) -> Result<Response<Vec<Version>>> {
        let path = Query::new().joined("expand", expand).apply(format!(
            "/rest/api/3/project/{}/versions",
            segment(project_id_or_key)
        ));
        self.client.get(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use chrono::NaiveDate;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_version_dates() {
        let version = Version {
            start_date: Some("2024-01-15".to_string()),
            ..Version::default()
        };
        assert_eq!(
            version.start().unwrap().get(),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert!(version.release().unwrap().is_unset());

        let bad = Version {
            release_date: Some("15/01/2024".to_string()),
            ..Version::default()
        };
        assert!(bad.release().is_err());
    }

    #[tokio::test]
    async fn test_create_version() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/version")
            .match_body(Matcher::Json(json!({
                "name": "1.0",
                "projectId": 10000,
                "releaseDate": "2024-03-01"
            })))
            .with_status(201)
            .with_body(r#"{"id":"10100","name":"1.0","released":false,"releaseDate":"2024-03-01"}"#)
            .create_async()
            .await;

        let request = VersionRequest {
            release_date: Some("2024-03-01".to_string()),
            ..VersionRequest::new(10000, "1.0")
        };
        let version = client.versions().create(&request).await.unwrap().into_inner();
        assert_eq!(version.released, Some(false));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_move_to_first() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/version/10100/move")
            .match_body(Matcher::Json(json!({"position": "First"})))
            .with_status(200)
            .with_body(r#"{"id":"10100"}"#)
            .create_async()
            .await;

        client
            .versions()
            .move_version("10100", &VersionPosition::First)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_and_replace() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/version/10100/removeAndSwap")
            .match_body(Matcher::Json(json!({
                "moveFixIssuesTo": 10101,
                "customFieldReplacementList": [{"customFieldId": 10050, "moveTo": 10101}]
            })))
            .with_status(204)
            .create_async()
            .await;

        let request = DeleteAndReplaceRequest {
            move_fix_issues_to: Some(10101),
            custom_field_replacement_list: vec![CustomFieldReplacement {
                custom_field_id: 10050,
                move_to: 10101,
            }],
            ..DeleteAndReplaceRequest::default()
        };
        client
            .versions()
            .delete_and_replace("10100", &request)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_merge() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("PUT", "/rest/api/3/version/10100/mergeto/10101")
            .with_status(204)
            .create_async()
            .await;

        client.versions().merge("10100", "10101").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_issue_counts() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/version/10100/relatedIssueCounts")
            .with_status(200)
            .with_body(r#"{"issuesFixedCount":12,"issuesAffectedCount":3,
                "customFieldUsage":[{"fieldName":"Target","customFieldId":10050,
                "issueCountWithVersionInCustomField":2}]}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/rest/api/3/version/10100/unresolvedIssueCount")
            .with_status(200)
            .with_body(r#"{"issuesUnresolvedCount":4,"issuesCount":12}"#)
            .create_async()
            .await;

        let counts = client
            .versions()
            .get_related_issue_counts("10100")
            .await
            .unwrap()
            .into_inner();
        assert_eq!(counts.issues_fixed_count, 12);
        assert_eq!(counts.custom_field_usage[0].issue_count_with_version_in_custom_field, 2);

        let unresolved = client
            .versions()
            .get_unresolved_issue_count("10100")
            .await
            .unwrap()
            .into_inner();
        assert_eq!(unresolved.issues_unresolved_count, 4);
    }

    #[tokio::test]
    async fn test_list_for_project() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/project/PROJ/version")
            .match_query(Matcher::UrlEncoded("status".into(), "unreleased".into()))
            .with_status(200)
            .with_body(r#"{"startAt":0,"maxResults":50,"total":1,"isLast":true,
                "values":[{"id":"10100","name":"1.0"}]}"#)
            .create_async()
            .await;

        let options = ListVersionsOptions {
            status: Some("unreleased".to_string()),
            ..ListVersionsOptions::default()
        };
        let page = client
            .versions()
            .list_for_project("PROJ", &options)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(page.values[0].name.as_deref(), Some("1.0"));
        mock.assert_async().await;
    }
}
