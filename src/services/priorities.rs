//! Priorities and priority schemes.

use std::collections::HashMap;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use super::{segment, MoveBody, PageOptions, Position};
use crate::api::types::{Page, Priority, Project};
use crate::api::{Client, Query, Response};
use crate::error::Result;

/// Priority operations.
#[derive(Debug, Clone, Copy)]
pub struct PrioritiesService<'a> {
    pub(super) client: &'a Client,
}

/// Options for [`PrioritiesService::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchPrioritiesOptions {
    pub page: PageOptions,
    pub ids: Vec<String>,
    pub project_ids: Vec<String>,
    pub only_default: bool,
}

/// Body for creating or changing a priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    /// Hex colour such as `#ff0000`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_color: Option<String>,
}

impl PriorityRequest {
    pub fn new(name: impl Into<String>, status_color: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            status_color: Some(status_color.into()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CreatedId {
    #[serde(default)]
    id: String,
}

/// A priority scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityScheme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_priority_id: Option<String>,
    #[serde(default)]
    pub priorities: Vec<Priority>,
    #[serde(default)]
    pub project_ids: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Options for [`PrioritiesService::list_schemes`].
#[derive(Debug, Clone, Default)]
pub struct ListPrioritySchemesOptions {
    pub page: PageOptions,
    pub ids: Vec<i64>,
    pub only_default: bool,
    /// `priorities`, `projects` or both, comma separated.
    pub expand: Option<String>,
}

/// Body for creating or changing a priority scheme.
///
/// `mappings` moves issues from priorities dropped by the change, keyed by
/// old priority ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritySchemeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_priority_id: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub priority_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub project_ids: Vec<i64>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub mappings: HashMap<String, String>,
}

const PRIORITY_PATH: &str = "/rest/api/3/priority";
const SCHEME_PATH: &str = "/rest/api/3/priorityscheme";

impl<'a> PrioritiesService<'a> {
    fn path(priority_id: &str) -> String {
        format!("{}/{}", PRIORITY_PATH, segment(priority_id))
    }

    fn scheme_path(scheme_id: &str) -> String {
        format!("{}/{}", SCHEME_PATH, segment(scheme_id))
    }

    /// List every priority.
    pub async fn list(&self) -> Result<Response<Vec<Priority>>> {
        self.client.get(PRIORITY_PATH).await
    }

    /// Get a priority.
    pub async fn get(&self, priority_id: &str) -> Result<Response<Priority>> {
        self.client.get(&Self::path(priority_id)).await
    }

    /// Search priorities, optionally limited to those used by projects.
    pub async fn search(&self, options: &SearchPrioritiesOptions) -> Result<Response<Page<Priority>>> {
        let query = options
            .page
            .apply(Query::new())
            .repeated("id", &options.ids)
            .repeated("projectId", &options.project_ids)
            .flag("onlyDefault", options.only_default);
        self.client
            .get(&query.apply("/rest/api/3/priority/search"))
            .await
    }

    /// Create a priority and return its ID.
    #[instrument(skip(self, priority), fields(name = ?priority.name))]
    pub async fn create(&self, priority: &PriorityRequest) -> Result<Response<String>> {
        let response: Response<CreatedId> = self.client.post(PRIORITY_PATH, priority).await?;
        debug!(id = %response.data().id, "Priority created");
        Ok(response.map(|r| r.id))
    }

    /// Update a priority.
    #[instrument(skip(self, priority))]
    pub async fn update(&self, priority_id: &str, priority: &PriorityRequest) -> Result<Response<()>> {
        self.client
            .call_empty(Method::PUT, &Self::path(priority_id), Some(priority))
            .await
    }

    /// Delete a priority, moving its issues to `replace_with` if given.
    #[instrument(skip(self))]
    pub async fn delete(&self, priority_id: &str, replace_with: Option<&str>) -> Result<Response<()>> {
        let path = Query::new()
            .opt_string("replaceWith", replace_with)
            .apply(Self::path(priority_id));
        self.client.delete(&path).await
    }

    /// Make a priority the default for new issues.
    #[instrument(skip(self))]
    pub async fn set_default(&self, priority_id: &str) -> Result<Response<()>> {
        self.client
            .call_empty(
                Method::PUT,
                "/rest/api/3/priority/default",
                Some(&json!({ "id": priority_id })),
            )
            .await
    }

    /// Change the order of priorities.
    #[instrument(skip(self))]
    pub async fn move_priorities(&self, ids: &[&str], position: &Position) -> Result<Response<()>> {
        let body = MoveBody::new(ids, position);
        self.client
            .call_empty(Method::PUT, "/rest/api/3/priority/move", Some(&body))
            .await
    }

    /// List priority schemes.
    pub async fn list_schemes(
        &self,
        options: &ListPrioritySchemesOptions,
    ) -> Result<Response<Page<PriorityScheme>>> {
        let query = options
            .page
            .apply(Query::new())
            .repeated("id", &options.ids)
            .flag("onlyDefault", options.only_default)
            .opt_string("expand", options.expand.as_deref());
        self.client.get(&query.apply(SCHEME_PATH)).await
    }

    /// Get a priority scheme.
    pub async fn get_scheme(&self, scheme_id: &str, expand: Option<&str>) -> Result<Response<PriorityScheme>> {
        let path = Query::new()
            .opt_string("expand", expand)
            .apply(Self::scheme_path(scheme_id));
        self.client.get(&path).await
    }

    /// Create a priority scheme.
    #[instrument(skip(self, scheme), fields(name = ?scheme.name))]
    pub async fn create_scheme(&self, scheme: &PrioritySchemeRequest) -> Result<Response<PriorityScheme>> {
        self.client.post(SCHEME_PATH, scheme).await
    }

    /// Update a priority scheme.
    #[instrument(skip(self, scheme))]
    pub async fn update_scheme(
        &self,
        scheme_id: &str,
        scheme: &PrioritySchemeRequest,
    ) -> Result<Response<PriorityScheme>> {
        self.client.put(&Self::scheme_path(scheme_id), scheme).await
    }

    /// Delete a priority scheme.
    #[instrument(skip(self))]
    pub async fn delete_scheme(&self, scheme_id: &str) -> Result<Response<()>> {
        self.client.delete(&Self::scheme_path(scheme_id)).await
    }

    /// List the projects using a priority scheme.
    pub async fn list_scheme_projects(
        &self,
        scheme_id: &str,
        page: PageOptions,
    ) -> Result<Response<Page<Project>>> {
        let path = page
            .apply(Query::new())
            .apply(format!("{}/project", Self::scheme_path(scheme_id)));
        self.client.get(&path).await
    }

    /// Assign a priority scheme to projects.
    #[instrument(skip(self))]
    pub async fn assign_scheme(&self, scheme_id: &str, project_ids: &[i64]) -> Result<Response<()>> {
        let path = format!("{}/project", Self::scheme_path(scheme_id));
        self.client
            .call_empty(Method::PUT, &path, Some(&json!({ "projectIds": project_ids })))
            .await
    }

    /// Remove projects from a priority scheme.
    #[instrument(skip(self))]
    pub async fn unassign_scheme(&self, scheme_id: &str, project_ids: &[i64]) -> Result<Response<()>> {
        let path = format!("{}/project", Self::scheme_path(scheme_id));
        self.client
            .call_empty(Method::POST, &path, Some(&json!({ "projectIds": project_ids })))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_list_priorities() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/priority")
            .with_status(200)
            .with_body(r##"[{"id":"1","name":"Highest","statusColor":"#d04437"},
                {"id":"3","name":"Medium","isDefault":true}]"##)
            .create_async()
            .await;

        let priorities = client.priorities().list().await.unwrap().into_inner();
        assert_eq!(priorities[0].to_string(), "Highest");
        assert_eq!(priorities[1].is_default, Some(true));
    }

    #[tokio::test]
    async fn test_create_returns_id() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/priority")
            .match_body(Matcher::Json(json!({"name": "Urgent", "statusColor": "#ff0000"})))
            .with_status(201)
            .with_body(r#"{"id":"10001"}"#)
            .create_async()
            .await;

        let id = client
            .priorities()
            .create(&PriorityRequest::new("Urgent", "#ff0000"))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(id, "10001");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_move_to_first() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("PUT", "/rest/api/3/priority/move")
            .match_body(Matcher::Json(json!({"ids": ["10001"], "position": "First"})))
            .with_status(204)
            .create_async()
            .await;

        client
            .priorities()
            .move_priorities(&["10001"], &Position::First)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_set_default() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("PUT", "/rest/api/3/priority/default")
            .match_body(Matcher::Json(json!({"id": "3"})))
            .with_status(204)
            .create_async()
            .await;

        client.priorities().set_default("3").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_only_default() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/priority/search")
            .match_query(Matcher::UrlEncoded("onlyDefault".into(), "true".into()))
            .with_status(200)
            .with_body(r#"{"startAt":0,"maxResults":50,"total":1,"isLast":true,
                "values":[{"id":"3","name":"Medium","isDefault":true}]}"#)
            .create_async()
            .await;

        let options = SearchPrioritiesOptions {
            only_default: true,
            ..SearchPrioritiesOptions::default()
        };
        let page = client.priorities().search(&options).await.unwrap().into_inner();
        assert_eq!(page.values.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_scheme_project_assignment() {
        let (mut server, client) = setup().await;
        let assign = server
            .mock("PUT", "/rest/api/3/priorityscheme/10000/project")
            .match_body(Matcher::Json(json!({"projectIds": [10100, 10101]})))
            .with_status(204)
            .create_async()
            .await;
        let unassign = server
            .mock("POST", "/rest/api/3/priorityscheme/10000/project")
            .match_body(Matcher::Json(json!({"projectIds": [10101]})))
            .with_status(204)
            .create_async()
            .await;

        client
            .priorities()
            .assign_scheme("10000", &[10100, 10101])
            .await
            .unwrap();
        client.priorities().unassign_scheme("10000", &[10101]).await.unwrap();
        assign.assert_async().await;
        unassign.assert_async().await;
    }
}
