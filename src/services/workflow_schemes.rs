//! Workflow schemes, their issue type mappings and drafts.
//!
//! Changing an active scheme requires a draft. Calls that modify a scheme
//! take `update_draft_if_needed`: when set, Jira creates or updates the draft
//! instead of rejecting the change.

use std::collections::HashMap;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{segment, PageOptions};
use crate::api::types::{IssueType, Page, User};
use crate::api::{Client, Query, Response, NO_BODY};
use crate::error::Result;

/// Workflow scheme operations.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowSchemesService<'a> {
    pub(super) client: &'a Client,
}

/// A workflow scheme or its draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowScheme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_workflow: Option<String>,
    /// Workflow name keyed by issue type ID.
    #[serde(default)]
    pub issue_type_mappings: HashMap<String, String>,
    /// For drafts, the default workflow of the parent scheme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_default_workflow: Option<String>,
    #[serde(default)]
    pub original_issue_type_mappings: HashMap<String, String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    /// Issue types keyed by ID, when expanded.
    #[serde(default)]
    pub issue_types: HashMap<String, IssueType>,
}

/// Body for creating or changing a workflow scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSchemeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_workflow: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub issue_type_mappings: HashMap<String, String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub update_draft_if_needed: bool,
}

/// The default workflow of a scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultWorkflow {
    #[serde(default)]
    pub workflow: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub update_draft_if_needed: bool,
}

/// The workflow mapped to one issue type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueTypeWorkflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub update_draft_if_needed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PublishBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    status_mappings: Option<&'a [StatusMapping]>,
}

/// Moves issues in a status that the new workflow lacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMapping {
    pub issue_type_id: String,
    pub status_id: String,
    pub new_status_id: String,
}

const SCHEME_PATH: &str = "/rest/api/3/workflowscheme";

impl<'a> WorkflowSchemesService<'a> {
    fn path(scheme_id: i64) -> String {
        format!("{}/{}", SCHEME_PATH, scheme_id)
    }

    fn issue_type_path(scheme_id: i64, issue_type: &str) -> String {
        format!("{}/issuetype/{}", Self::path(scheme_id), segment(issue_type))
    }

    /// List workflow schemes.
    pub async fn list(&self, page: PageOptions) -> Result<Response<Page<WorkflowScheme>>> {
        let path = page.apply(Query::new()).apply(SCHEME_PATH);
        self.client.get(&path).await
    }

    /// Get a workflow scheme, or its draft when `return_draft_if_exists` is set.
    pub async fn get(&self, scheme_id: i64, return_draft_if_exists: bool) -> Result<Response<WorkflowScheme>> {
        let path = Query::new()
            .flag("returnDraftIfExists", return_draft_if_exists)
            .apply(Self::path(scheme_id));
        self.client.get(&path).await
    }

    /// Create a workflow scheme.
    #[instrument(skip(self, scheme), fields(name = ?scheme.name))]
    pub async fn create(&self, scheme: &WorkflowSchemeRequest) -> Result<Response<WorkflowScheme>> {
        let response: Response<WorkflowScheme> = self.client.post(SCHEME_PATH, scheme).await?;
        debug!(id = ?response.data().id, "Workflow scheme created");
        Ok(response)
    }

    /// Update a workflow scheme.
    #[instrument(skip(self, scheme))]
    pub async fn update(&self, scheme_id: i64, scheme: &WorkflowSchemeRequest) -> Result<Response<WorkflowScheme>> {
        self.client.put(&Self::path(scheme_id), scheme).await
    }

    /// Delete an inactive workflow scheme.
    #[instrument(skip(self))]
    pub async fn delete(&self, scheme_id: i64) -> Result<Response<()>> {
        self.client.delete(&Self::path(scheme_id)).await
    }

    /// Get the default workflow of a scheme.
    pub async fn get_default(
        &self,
        scheme_id: i64,
        return_draft_if_exists: bool,
    ) -> Result<Response<DefaultWorkflow>> {
        let path = Query::new()
            .flag("returnDraftIfExists", return_draft_if_exists)
            .apply(format!("{}/default", Self::path(scheme_id)));
        self.client.get(&path).await
    }

    /// Set the default workflow of a scheme.
    #[instrument(skip(self))]
    pub async fn set_default(
        &self,
        scheme_id: i64,
        workflow: &str,
        update_draft_if_needed: bool,
    ) -> Result<Response<WorkflowScheme>> {
        let body = DefaultWorkflow {
            workflow: workflow.to_string(),
            update_draft_if_needed,
        };
        let path = format!("{}/default", Self::path(scheme_id));
        self.client.put(&path, &body).await
    }

    /// Reset the default workflow of a scheme to the system workflow.
    #[instrument(skip(self))]
    pub async fn delete_default(
        &self,
        scheme_id: i64,
        update_draft_if_needed: bool,
    ) -> Result<Response<WorkflowScheme>> {
        let path = Query::new()
            .flag("updateDraftIfNeeded", update_draft_if_needed)
            .apply(format!("{}/default", Self::path(scheme_id)));
        self.client.call(Method::DELETE, &path, NO_BODY).await
    }

    /// Get the workflow mapped to an issue type.
    pub async fn get_issue_type_mapping(
        &self,
        scheme_id: i64,
        issue_type: &str,
        return_draft_if_exists: bool,
    ) -> Result<Response<IssueTypeWorkflow>> {
        let path = Query::new()
            .flag("returnDraftIfExists", return_draft_if_exists)
            .apply(Self::issue_type_path(scheme_id, issue_type));
        self.client.get(&path).await
    }

    /// Map an issue type to a workflow.
    #[instrument(skip(self))]
    pub async fn set_issue_type_mapping(
        &self,
        scheme_id: i64,
        issue_type: &str,
        workflow: &str,
        update_draft_if_needed: bool,
    ) -> Result<Response<WorkflowScheme>> {
        let body = IssueTypeWorkflow {
            issue_type: Some(issue_type.to_string()),
            workflow: Some(workflow.to_string()),
            update_draft_if_needed,
        };
        self.client
            .put(&Self::issue_type_path(scheme_id, issue_type), &body)
            .await
    }

    /// Remove the workflow mapping of an issue type.
    #[instrument(skip(self))]
    pub async fn delete_issue_type_mapping(
        &self,
        scheme_id: i64,
        issue_type: &str,
        update_draft_if_needed: bool,
    ) -> Result<Response<WorkflowScheme>> {
        let path = Query::new()
            .flag("updateDraftIfNeeded", update_draft_if_needed)
            .apply(Self::issue_type_path(scheme_id, issue_type));
        self.client.call(Method::DELETE, &path, NO_BODY).await
    }

    /// Get the draft of a scheme.
    pub async fn get_draft(&self, scheme_id: i64) -> Result<Response<WorkflowScheme>> {
        let path = format!("{}/draft", Self::path(scheme_id));
        self.client.get(&path).await
    }

    /// Create a draft copy of an active scheme.
    #[instrument(skip(self))]
    pub async fn create_draft(&self, scheme_id: i64) -> Result<Response<WorkflowScheme>> {
        let path = format!("{}/createdraft", Self::path(scheme_id));
        self.client.call(Method::POST, &path, NO_BODY).await
    }

    /// Update the draft of a scheme.
    #[instrument(skip(self, scheme))]
    pub async fn update_draft(
        &self,
        scheme_id: i64,
        scheme: &WorkflowSchemeRequest,
    ) -> Result<Response<WorkflowScheme>> {
        let path = format!("{}/draft", Self::path(scheme_id));
        self.client.put(&path, scheme).await
    }

    /// Discard the draft of a scheme.
    #[instrument(skip(self))]
    pub async fn delete_draft(&self, scheme_id: i64) -> Result<Response<()>> {
        let path = format!("{}/draft", Self::path(scheme_id));
        self.client.delete(&path).await
    }

    /// Publish a draft, replacing the active scheme.
    #[instrument(skip(self, status_mappings))]
    pub async fn publish_draft(
        &self,
        scheme_id: i64,
        status_mappings: Option<&[StatusMapping]>,
    ) -> Result<Response<()>> {
        let path = format!("{}/draft/publish", Self::path(scheme_id));
        let body = PublishBody { status_mappings };
        self.client.call_empty(Method::POST, &path, Some(&body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_scheme_with_draft() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/workflowscheme/101010")
            .match_query(Matcher::UrlEncoded("returnDraftIfExists".into(), "true".into()))
            .with_status(200)
            .with_body(r#"{"id":101010,"name":"Example","defaultWorkflow":"jira","draft":true,
                "issueTypeMappings":{"10000":"scrum workflow"},
                "originalIssueTypeMappings":{"10000":"jira"}}"#)
            .create_async()
            .await;

        let scheme = client
            .workflow_schemes()
            .get(101010, true)
            .await
            .unwrap()
            .into_inner();
        assert!(scheme.draft);
        assert_eq!(scheme.issue_type_mappings["10000"], "scrum workflow");
        assert_eq!(scheme.original_issue_type_mappings["10000"], "jira");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_set_issue_type_mapping() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("PUT", "/rest/api/3/workflowscheme/101010/issuetype/10000")
            .match_body(Matcher::Json(json!({
                "issueType": "10000",
                "workflow": "jira",
                "updateDraftIfNeeded": true
            })))
            .with_status(200)
            .with_body(r#"{"id":101010,"draft":true}"#)
            .create_async()
            .await;

        let scheme = client
            .workflow_schemes()
            .set_issue_type_mapping(101010, "10000", "jira", true)
            .await
            .unwrap()
            .into_inner();
        assert!(scheme.draft);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_default_returns_scheme() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("DELETE", "/rest/api/3/workflowscheme/101010/default")
            .match_query(Matcher::UrlEncoded("updateDraftIfNeeded".into(), "true".into()))
            .with_status(200)
            .with_body(r#"{"id":101010,"defaultWorkflow":"jira"}"#)
            .create_async()
            .await;

        let scheme = client
            .workflow_schemes()
            .delete_default(101010, true)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(scheme.default_workflow.as_deref(), Some("jira"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_draft_lifecycle() {
        let (mut server, client) = setup().await;
        let create = server
            .mock("POST", "/rest/api/3/workflowscheme/101010/createdraft")
            .with_status(201)
            .with_body(r#"{"id":17218,"draft":true}"#)
            .create_async()
            .await;
        let publish = server
            .mock("POST", "/rest/api/3/workflowscheme/101010/draft/publish")
            .match_body(Matcher::Json(json!({
                "statusMappings": [{"issueTypeId": "10001", "statusId": "3", "newStatusId": "1"}]
            })))
            .with_status(204)
            .create_async()
            .await;

        let draft = client
            .workflow_schemes()
            .create_draft(101010)
            .await
            .unwrap()
            .into_inner();
        assert!(draft.draft);

        let mappings = [StatusMapping {
            issue_type_id: "10001".to_string(),
            status_id: "3".to_string(),
            new_status_id: "1".to_string(),
        }];
        client
            .workflow_schemes()
            .publish_draft(101010, Some(&mappings))
            .await
            .unwrap();
        create.assert_async().await;
        publish.assert_async().await;
    }
}
