//! Issue types and issue type schemes.

use bytes::Bytes;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use super::avatars::{Avatar, AvatarCrop};
use super::{segment, PageOptions, Position};
use crate::api::types::{IssueType, Page, Project};
use crate::api::{Client, Query, Response};
use crate::error::Result;

/// Issue type operations.
#[derive(Debug, Clone, Copy)]
pub struct IssueTypesService<'a> {
    pub(super) client: &'a Client,
}

/// Body for creating an issue type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueTypeRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `standard` or `subtask`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy_level: Option<i64>,
}

/// Body for changing an issue type. Unset values are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIssueTypeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<i64>,
}

/// An issue type scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTypeScheme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_issue_type_id: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Options for [`IssueTypesService::list_schemes`].
#[derive(Debug, Clone, Default)]
pub struct ListSchemesOptions {
    pub page: PageOptions,
    pub ids: Vec<i64>,
    /// e.g. `projects`, `issueTypes`.
    pub expand: Option<String>,
    /// Case-insensitive name filter.
    pub query_string: Option<String>,
}

/// Body for creating an issue type scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueTypeSchemeRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_issue_type_id: Option<String>,
    pub issue_type_ids: Vec<String>,
}

/// Body for changing an issue type scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateIssueTypeSchemeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_issue_type_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedScheme {
    #[serde(default)]
    issue_type_scheme_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReorderBody<'a> {
    issue_type_ids: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<&'a str>,
}

const SCHEME_PATH: &str = "/rest/api/3/issuetypescheme";

impl<'a> IssueTypesService<'a> {
    fn path(issue_type_id: &str) -> String {
        format!("/rest/api/3/issuetype/{}", segment(issue_type_id))
    }

    fn scheme_path(scheme_id: i64) -> String {
        format!("{}/{}", SCHEME_PATH, scheme_id)
    }

    /// List every issue type visible to the user.
    pub async fn list(&self) -> Result<Response<Vec<IssueType>>> {
        self.client.get("/rest/api/3/issuetype").await
    }

    /// Get an issue type.
    pub async fn get(&self, issue_type_id: &str) -> Result<Response<IssueType>> {
        self.client.get(&Self::path(issue_type_id)).await
    }

    /// Create an issue type.
    #[instrument(skip(self, issue_type), fields(name = %issue_type.name))]
    pub async fn create(&self, issue_type: &CreateIssueTypeRequest) -> Result<Response<IssueType>> {
        let response: Response<IssueType> =
            self.client.post("/rest/api/3/issuetype", issue_type).await?;
        debug!(id = ?response.data().id, "Issue type created");
        Ok(response)
    }

    /// Update an issue type.
    #[instrument(skip(self, issue_type))]
    pub async fn update(
        &self,
        issue_type_id: &str,
        issue_type: &UpdateIssueTypeRequest,
    ) -> Result<Response<IssueType>> {
        self.client.put(&Self::path(issue_type_id), issue_type).await
    }

    /// Delete an issue type, moving its issues to `alternative_id` if given.
    #[instrument(skip(self))]
    pub async fn delete(&self, issue_type_id: &str, alternative_id: Option<&str>) -> Result<Response<()>> {
        let path = Query::new()
            .opt_string("alternativeIssueTypeId", alternative_id)
            .apply(Self::path(issue_type_id));
        self.client.delete(&path).await
    }

    /// List the issue types that can replace this one when it is deleted.
    pub async fn get_alternatives(&self, issue_type_id: &str) -> Result<Response<Vec<IssueType>>> {
        let path = format!("{}/alternatives", Self::path(issue_type_id));
        self.client.get(&path).await
    }

    /// Upload a PNG as the issue type's avatar.
    pub async fn load_avatar(
        &self,
        issue_type_id: &str,
        crop: AvatarCrop,
        image: Bytes,
    ) -> Result<Response<Avatar>> {
        self.client
            .avatars()
            .load_issue_type_avatar(issue_type_id, crop, image)
            .await
    }

    /// List the issue types of a project. `level` filters by hierarchy level.
    #[instrument(skip(self))]
    pub async fn list_for_project(&self, project_id: i64, level: Option<i64>) -> Result<Response<Vec<IssueType>>> {
        let path = Query::new()
            .set("projectId", project_id)
            .opt_int("level", level)
            .apply("/rest/api/3/issuetype/project");
        self.client.get(&path).await
    }

    /// List issue type schemes.
    pub async fn list_schemes(&self, options: &ListSchemesOptions) -> Result<Response<Page<IssueTypeScheme>>> {
        let query = options
            .page
            .apply(Query::new())
            .repeated("id", &options.ids)
            .opt_string("expand", options.expand.as_deref())
            .opt_string("queryString", options.query_string.as_deref());
        self.client.get(&query.apply(SCHEME_PATH)).await
    }

    /// Create an issue type scheme and return its ID.
    #[instrument(skip(self, scheme), fields(name = %scheme.name))]
    pub async fn create_scheme(&self, scheme: &CreateIssueTypeSchemeRequest) -> Result<Response<String>> {
        let response: Response<CreatedScheme> = self.client.post(SCHEME_PATH, scheme).await?;
        Ok(response.map(|r| r.issue_type_scheme_id))
    }

    /// Update an issue type scheme.
    #[instrument(skip(self, scheme))]
    pub async fn update_scheme(
        &self,
        scheme_id: i64,
        scheme: &UpdateIssueTypeSchemeRequest,
    ) -> Result<Response<()>> {
        self.client
            .call_empty(Method::PUT, &Self::scheme_path(scheme_id), Some(scheme))
            .await
    }

    /// Delete an issue type scheme. Its projects fall back to the default scheme.
    #[instrument(skip(self))]
    pub async fn delete_scheme(&self, scheme_id: i64) -> Result<Response<()>> {
        self.client.delete(&Self::scheme_path(scheme_id)).await
    }

    /// Add issue types to a scheme.
    #[instrument(skip(self))]
    pub async fn add_issue_types_to_scheme(
        &self,
        scheme_id: i64,
        issue_type_ids: &[&str],
    ) -> Result<Response<()>> {
        let path = format!("{}/issuetype", Self::scheme_path(scheme_id));
        self.client
            .call_empty(Method::PUT, &path, Some(&json!({ "issueTypeIds": issue_type_ids })))
            .await
    }

    /// Remove an issue type from a scheme.
    #[instrument(skip(self))]
    pub async fn remove_issue_type_from_scheme(
        &self,
        scheme_id: i64,
        issue_type_id: &str,
    ) -> Result<Response<()>> {
        let path = format!(
            "{}/issuetype/{}",
            Self::scheme_path(scheme_id),
            segment(issue_type_id)
        );
        self.client.delete(&path).await
    }

    /// Move issue types within a scheme.
    #[instrument(skip(self))]
    pub async fn reorder_issue_types_in_scheme(
        &self,
        scheme_id: i64,
        issue_type_ids: &[&str],
        position: &Position,
    ) -> Result<Response<()>> {
        let (position, after) = position.parts();
        let body = ReorderBody {
            issue_type_ids,
            position,
            after,
        };
        let path = format!("{}/issuetype/move", Self::scheme_path(scheme_id));
        self.client.call_empty(Method::PUT, &path, Some(&body)).await
    }

    /// List the projects using a scheme.
    pub async fn list_projects_for_scheme(
        &self,
        scheme_id: i64,
        page: PageOptions,
    ) -> Result<Response<Page<Project>>> {
        let path = page
            .apply(Query::new())
            .apply(format!("{}/project", Self::scheme_path(scheme_id)));
        self.client.get(&path).await
    }

    /// Assign a scheme to a project.
    #[instrument(skip(self))]
    pub async fn assign_scheme_to_project(&self, scheme_id: i64, project_id: &str) -> Result<Response<()>> {
        let body = json!({
            "issueTypeSchemeId": scheme_id.to_string(),
            "projectId": project_id,
        });
        self.client
            .call_empty(Method::PUT, "/rest/api/3/issuetypescheme/project", Some(&body))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_list_issue_types() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/issuetype")
            .with_status(200)
            .with_body(r#"[{"id":"10000","name":"Epic","hierarchyLevel":1},
                {"id":"10003","name":"Sub-task","subtask":true,"hierarchyLevel":-1}]"#)
            .create_async()
            .await;

        let types = client.issue_types().list().await.unwrap().into_inner();
        assert_eq!(types[0].to_string(), "Epic");
        assert_eq!(types[1].subtask, Some(true));
    }

    #[tokio::test]
    async fn test_delete_with_alternative() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("DELETE", "/rest/api/3/issuetype/10005")
            .match_query(Matcher::UrlEncoded("alternativeIssueTypeId".into(), "10001".into()))
            .with_status(204)
            .create_async()
            .await;

        client.issue_types().delete("10005", Some("10001")).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_scheme_returns_id() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/issuetypescheme")
            .match_body(Matcher::Json(json!({
                "name": "Software",
                "issueTypeIds": ["10001", "10002"]
            })))
            .with_status(201)
            .with_body(r#"{"issueTypeSchemeId":"10010"}"#)
            .create_async()
            .await;

        let request = CreateIssueTypeSchemeRequest {
            name: "Software".to_string(),
            issue_type_ids: vec!["10001".to_string(), "10002".to_string()],
            ..CreateIssueTypeSchemeRequest::default()
        };
        let id = client
            .issue_types()
            .create_scheme(&request)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(id, "10010");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_reorder_after() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("PUT", "/rest/api/3/issuetypescheme/10010/issuetype/move")
            .match_body(Matcher::Json(json!({
                "issueTypeIds": ["10002"],
                "after": "10001"
            })))
            .with_status(204)
            .create_async()
            .await;

        client
            .issue_types()
            .reorder_issue_types_in_scheme(10010, &["10002"], &Position::After("10001".to_string()))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_assign_scheme_sends_id_as_string() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("PUT", "/rest/api/3/issuetypescheme/project")
            .match_body(Matcher::Json(json!({
                "issueTypeSchemeId": "10010",
                "projectId": "10000"
            })))
            .with_status(204)
            .create_async()
            .await;

        client
            .issue_types()
            .assign_scheme_to_project(10010, "10000")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_for_project() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/issuetype/project")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("projectId".into(), "10000".into()),
                Matcher::UrlEncoded("level".into(), "0".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"id":"10001","name":"Task","hierarchyLevel":0}]"#)
            .create_async()
            .await;

        let types = client
            .issue_types()
            .list_for_project(10000, Some(0))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(types.len(), 1);
        mock.assert_async().await;
    }
}
