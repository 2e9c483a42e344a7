//! Workflow statuses and status categories.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{segment, PageOptions};
use crate::api::types::{Page, Status, StatusCategory};
use crate::api::{Client, Query, Response};
use crate::error::Result;

/// Status operations.
#[derive(Debug, Clone, Copy)]
pub struct StatusesService<'a> {
    pub(super) client: &'a Client,
}

/// Options for [`StatusesService::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchStatusesOptions {
    pub page: PageOptions,
    /// `usages` includes the projects and issue types using each status.
    pub expand: Option<String>,
    pub project_id: Option<String>,
    pub search_string: Option<String>,
    /// `TODO`, `IN_PROGRESS` or `DONE`.
    pub status_category: Option<String>,
}

/// A status to create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStatus {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `TODO`, `IN_PROGRESS` or `DONE`.
    pub status_category: String,
}

/// Where new statuses live.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusScope {
    /// `GLOBAL` or `PROJECT`.
    #[serde(rename = "type")]
    pub scope_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectRef>,
}

impl StatusScope {
    /// Company-managed statuses shared by all projects.
    pub fn global() -> Self {
        Self {
            scope_type: "GLOBAL".to_string(),
            project: None,
        }
    }

    /// Statuses owned by a team-managed project.
    pub fn project(project_id: impl Into<String>) -> Self {
        Self {
            scope_type: "PROJECT".to_string(),
            project: Some(ProjectRef {
                id: project_id.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: String,
}

/// Body for creating statuses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateStatusesRequest {
    pub statuses: Vec<NewStatus>,
    pub scope: StatusScope,
}

/// A change to an existing status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_category: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateStatusesBody<'a> {
    statuses: &'a [StatusUpdate],
}

const STATUSES_PATH: &str = "/rest/api/3/statuses";

impl<'a> StatusesService<'a> {
    /// List every status.
    pub async fn list(&self) -> Result<Response<Vec<Status>>> {
        self.client.get("/rest/api/3/status").await
    }

    /// Get a status by ID or name.
    pub async fn get(&self, id_or_name: &str) -> Result<Response<Status>> {
        let path = format!("/rest/api/3/status/{}", segment(id_or_name));
        self.client.get(&path).await
    }

    /// Search statuses.
    #[instrument(skip(self, options))]
    pub async fn search(&self, options: &SearchStatusesOptions) -> Result<Response<Page<Status>>> {
        let query = options
            .page
            .apply(Query::new())
            .opt_string("expand", options.expand.as_deref())
            .opt_string("projectId", options.project_id.as_deref())
            .opt_string("searchString", options.search_string.as_deref())
            .opt_string("statusCategory", options.status_category.as_deref());
        self.client
            .get(&query.apply("/rest/api/3/statuses/search"))
            .await
    }

    /// Get several statuses by ID.
    pub async fn bulk_get(&self, ids: &[&str], expand: Option<&str>) -> Result<Response<Vec<Status>>> {
        let path = Query::new()
            .joined("id", ids)
            .opt_string("expand", expand)
            .apply(STATUSES_PATH);
        self.client.get(&path).await
    }

    /// Create statuses.
    #[instrument(skip(self, request), fields(count = request.statuses.len()))]
    pub async fn create(&self, request: &CreateStatusesRequest) -> Result<Response<Vec<Status>>> {
        let response: Response<Vec<Status>> = self.client.post(STATUSES_PATH, request).await?;
        debug!(created = response.data().len(), "Statuses created");
        Ok(response)
    }

    /// Update statuses.
    #[instrument(skip(self, statuses), fields(count = statuses.len()))]
    pub async fn update(&self, statuses: &[StatusUpdate]) -> Result<Response<Vec<Status>>> {
        self.client
            .put(STATUSES_PATH, &UpdateStatusesBody { statuses })
            .await
    }

    /// Delete statuses. Statuses used by a workflow cannot be deleted.
    #[instrument(skip(self))]
    pub async fn delete(&self, ids: &[&str]) -> Result<Response<()>> {
        let path = Query::new().joined("id", ids).apply(STATUSES_PATH);
        self.client.delete(&path).await
    }

    /// List the status categories.
    pub async fn list_categories(&self) -> Result<Response<Vec<StatusCategory>>> {
        self.client.get("/rest/api/3/statuscategory").await
    }

    /// Get a status category by ID or key.
    pub async fn get_category(&self, id_or_key: &str) -> Result<Response<StatusCategory>> {
        let path = format!("/rest/api/3/statuscategory/{}", segment(id_or_key));
        self.client.get(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_by_name_is_escaped() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/status/In%20Progress")
            .with_status(200)
            .with_body(r#"{"id":"3","name":"In Progress",
                "statusCategory":{"id":4,"key":"indeterminate","colorName":"yellow"}}"#)
            .create_async()
            .await;

        let status = client.statuses().get("In Progress").await.unwrap().into_inner();
        assert_eq!(status.to_string(), "In Progress");
        assert_eq!(
            status.status_category.unwrap().key.as_deref(),
            Some("indeterminate")
        );
    }

    #[tokio::test]
    async fn test_bulk_get_joins_ids() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/statuses")
            .match_query(Matcher::UrlEncoded("id".into(), "1,3".into()))
            .with_status(200)
            .with_body(r#"[{"id":"1","name":"Open"},{"id":"3","name":"In Progress"}]"#)
            .create_async()
            .await;

        let statuses = client
            .statuses()
            .bulk_get(&["1", "3"], None)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(statuses.len(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_in_project_scope() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/statuses")
            .match_body(Matcher::Json(json!({
                "statuses": [{"name": "Review", "statusCategory": "IN_PROGRESS"}],
                "scope": {"type": "PROJECT", "project": {"id": "10000"}}
            })))
            .with_status(200)
            .with_body(r#"[{"id":"10010","name":"Review"}]"#)
            .create_async()
            .await;

        let request = CreateStatusesRequest {
            statuses: vec![NewStatus {
                name: "Review".to_string(),
                description: None,
                status_category: "IN_PROGRESS".to_string(),
            }],
            scope: StatusScope::project("10000"),
        };
        let created = client.statuses().create(&request).await.unwrap().into_inner();
        assert_eq!(created[0].id.as_deref(), Some("10010"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_categories() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/statuscategory")
            .with_status(200)
            .with_body(r#"[{"id":2,"key":"new","name":"To Do"},{"id":3,"key":"done","name":"Done"}]"#)
            .create_async()
            .await;

        let categories = client.statuses().list_categories().await.unwrap().into_inner();
        assert_eq!(categories[1].id, Some(3));
    }
}
