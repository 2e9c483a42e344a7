//! Project components.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use super::{segment, PageOptions};
use crate::api::types::{Component, Page};
use crate::api::{Client, Query, Response};
use crate::error::Result;

/// Component operations.
#[derive(Debug, Clone, Copy)]
pub struct ComponentsService<'a> {
    pub(super) client: &'a Client,
}

/// Body for creating a component.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComponentRequest {
    pub name: String,
    /// Key of the owning project.
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_account_id: Option<String>,
    /// `PROJECT_DEFAULT`, `COMPONENT_LEAD`, `PROJECT_LEAD` or `UNASSIGNED`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl CreateComponentRequest {
    pub fn new(project_key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            project: project_key.into(),
            ..Self::default()
        }
    }
}

/// Body for changing a component. Unset values are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateComponentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_type: Option<String>,
}

/// Number of issues using a component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentIssueCount {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default)]
    pub issue_count: i64,
}

/// Options for [`ComponentsService::list_for_project`].
#[derive(Debug, Clone, Default)]
pub struct ListComponentsOptions {
    pub page: PageOptions,
    /// e.g. `name`, `-issueCount`, `lead`.
    pub order_by: Option<String>,
    /// Matches name or description.
    pub query: Option<String>,
}

impl<'a> ComponentsService<'a> {
    fn path(component_id: &str) -> String {
        format!("/rest/api/3/component/{}", segment(component_id))
    }

    /// Get a component.
    pub async fn get(&self, component_id: &str) -> Result<Response<Component>> {
        self.client.get(&Self::path(component_id)).await
    }

    /// Create a component.
    #[instrument(skip(self, component), fields(project = %component.project, name = %component.name))]
    pub async fn create(&self, component: &CreateComponentRequest) -> Result<Response<Component>> {
        let response: Response<Component> = self.client.post("/rest/api/3/component", component).await?;
        debug!(id = ?response.data().id, "Component created");
        Ok(response)
    }

    /// Update a component.
    #[instrument(skip(self, component))]
    pub async fn update(
        &self,
        component_id: &str,
        component: &UpdateComponentRequest,
    ) -> Result<Response<Component>> {
        self.client.put(&Self::path(component_id), component).await
    }

    /// Delete a component, moving its issues to `move_issues_to` if given.
    #[instrument(skip(self))]
    pub async fn delete(&self, component_id: &str, move_issues_to: Option<&str>) -> Result<Response<()>> {
        let path = Query::new()
            .opt_string("moveIssuesTo", move_issues_to)
            .apply(Self::path(component_id));
        self.client.delete(&path).await
    }

    /// Count the issues using a component.
    pub async fn get_issue_count(&self, component_id: &str) -> Result<Response<ComponentIssueCount>> {
        let path = format!("{}/relatedIssueCounts", Self::path(component_id));
        self.client.get(&path).await
    }

    /// Get a page of a project's components.
    pub async fn list_for_project(
        &self,
        project_id_or_key: &str,
        options: &ListComponentsOptions,
    ) -> Result<Response<Page<Component>>> {
        let query = options
            .page
            .apply(Query::new())
            .opt_string("orderBy", options.order_by.as_deref())
            .opt_string("query", options.query.as_deref());
        let path = query.apply(format!(
            "/rest/api/3/project/{}/component",
            segment(project_id_or_key)
        ));
        self.client.get(&path).await
    }

    /// Get all of a project's components in one unpaged list.
    pub async fn list_all_for_project(&self, project_id_or_key: &str) -> Result<Response<Vec<Component>>> {
        let path = format!("/rest/api/3/project/{}/components", segment(project_id_or_key));
        self.client.get(&path).await
    }

    /// Find components in the given projects that the user can see.
    pub async fn find(
        &self,
        project_ids: &[i64],
        component_ids: &[i64],
        page: PageOptions,
    ) -> Result<Response<Page<Component>>> {
        let query = page
            .apply(Query::new())
            .repeated("projectIds", project_ids)
            .repeated("componentIds", component_ids);
        self.client
            .get(&query.apply("/rest/api/3/component"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_component() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/component")
            .match_body(Matcher::Json(json!({
                "name": "Backend",
                "project": "PROJ",
                "assigneeType": "COMPONENT_LEAD"
            })))
            .with_status(201)
            .with_body(r#"{"id":"10000","name":"Backend","project":"PROJ","projectId":10100}"#)
            .create_async()
            .await;

        let request = CreateComponentRequest {
            assignee_type: Some("COMPONENT_LEAD".to_string()),
            ..CreateComponentRequest::new("PROJ", "Backend")
        };
        let component = client.components().create(&request).await.unwrap().into_inner();
        assert_eq!(component.project_id, Some(10100));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_moves_issues() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("DELETE", "/rest/api/3/component/10000")
            .match_query(Matcher::UrlEncoded("moveIssuesTo".into(), "10001".into()))
            .with_status(204)
            .create_async()
            .await;

        client.components().delete("10000", Some("10001")).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_issue_count() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/component/10000/relatedIssueCounts")
            .with_status(200)
            .with_body(r#"{"issueCount":23}"#)
            .create_async()
            .await;

        let count = client.components().get_issue_count("10000").await.unwrap();
        assert_eq!(count.data().issue_count, 23);
    }

    #[tokio::test]
    async fn test_list_for_project_paged() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/project/PROJ/component")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("orderBy".into(), "name".into()),
                Matcher::UrlEncoded("maxResults".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"startAt":0,"maxResults":2,"total":3,"isLast":false,
                "values":[{"id":"1","name":"A"},{"id":"2","name":"B"}]}"#)
            .create_async()
            .await;

        let options = ListComponentsOptions {
            page: PageOptions::new(0, 2),
            order_by: Some("name".to_string()),
            ..ListComponentsOptions::default()
        };
        let page = client
            .components()
            .list_for_project("PROJ", &options)
            .await
            .unwrap()
            .into_inner();
        assert!(page.has_more());
        assert_eq!(page.next_start(), 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_all_for_project() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/project/PROJ/components")
            .with_status(200)
            .with_body(r#"[{"id":"1","name":"A"}]"#)
            .create_async()
            .await;

        let components = client
            .components()
            .list_all_for_project("PROJ")
            .await
            .unwrap()
            .into_inner();
        assert_eq!(components.len(), 1);
    }
}
