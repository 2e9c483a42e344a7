//! Projects.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::fields::Field;
use super::issues::SecurityLevel;
use super::segment;
use crate::api::types::{Group, IssueType, Page, Project, ProjectRole, Status, User};
use crate::api::{Client, Query, Response, NO_BODY};
use crate::error::Result;

/// Project operations.
#[derive(Debug, Clone, Copy)]
pub struct ProjectsService<'a> {
    pub(super) client: &'a Client,
}

/// Filters for [`ProjectsService::list`].
#[derive(Debug, Clone, Default)]
pub struct ListProjectsOptions {
    pub start_at: u32,
    pub max_results: u32,
    /// e.g. `name`, `-key`, `lastIssueUpdatedTime`.
    pub order_by: Option<String>,
    pub ids: Vec<i64>,
    pub keys: Vec<String>,
    /// Matched against project key and name.
    pub query: Option<String>,
    pub type_key: Option<String>,
    pub category_id: Option<i64>,
    /// `view`, `browse` or `edit`.
    pub action: Option<String>,
    pub expand: Vec<String>,
    /// `live`, `archived` or `deleted`.
    pub status: Vec<String>,
    pub properties: Vec<String>,
    pub property_query: Option<String>,
}

/// Fields for creating a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub key: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_security_scheme: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_scheme: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_scheme: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    /// `software`, `service_desk` or `business`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_type_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_template_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_scheme: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_type_screen_scheme: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_type_scheme: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_configuration_scheme: Option<i64>,
}

impl CreateProjectRequest {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Fields to change on a project. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_security_scheme: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_scheme: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_scheme: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

/// Identifiers of a newly created project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedProject {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

/// An issue type with the statuses its workflow uses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueTypeWithStatuses {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub subtask: bool,
    #[serde(default)]
    pub statuses: Vec<Status>,
}

/// The issue type hierarchy of a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectIssueTypeHierarchy {
    #[serde(default)]
    pub project_id: i64,
    #[serde(default)]
    pub hierarchy: Vec<HierarchyLevel>,
}

/// One level of the issue type hierarchy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyLevel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// -1 for subtasks, 0 for base, 1 for epics.
    #[serde(default)]
    pub level: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub issue_types: Vec<IssueType>,
}

/// A notification scheme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationScheme {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub notification_scheme_events: Vec<NotificationSchemeEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<String>,
}

/// The recipients configured for one event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationSchemeEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<NotificationEvent>,
    #[serde(default)]
    pub notifications: Vec<EventNotification>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A recipient of an event notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventNotification {
    #[serde(default)]
    pub id: i64,
    /// e.g. `CurrentAssignee`, `Group`, `ProjectRole`, `User`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_role: Option<ProjectRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

#[derive(Debug, Default, Deserialize)]
struct SecurityLevels {
    #[serde(default)]
    levels: Vec<SecurityLevel>,
}

impl<'a> ProjectsService<'a> {
    fn path(project_id_or_key: &str) -> String {
        format!("/rest/api/3/project/{}", segment(project_id_or_key))
    }

    /// Get a page of projects visible to the user.
    #[instrument(skip(self, options))]
    pub async fn list(&self, options: &ListProjectsOptions) -> Result<Response<Page<Project>>> {
        let path = Query::new()
            .int("startAt", options.start_at)
            .int("maxResults", options.max_results)
            .opt_string("orderBy", options.order_by.as_deref())
            .opt_string("query", options.query.as_deref())
            .opt_string("typeKey", options.type_key.as_deref())
            .opt_int("categoryId", options.category_id)
            .opt_string("action", options.action.as_deref())
            .joined("expand", &options.expand)
            .repeated("status", &options.status)
            .repeated("keys", &options.keys)
            .repeated("id", &options.ids)
            .repeated("properties", &options.properties)
            .opt_string("propertyQuery", options.property_query.as_deref())
            .apply("/rest/api/3/project/search");

        let response: Response<Page<Project>> = self.client.get(&path).await?;
        debug!(
            count = response.data().values.len(),
            total = response.data().total,
            "Projects fetched"
        );
        Ok(response)
    }

    /// Get a project.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        project_id_or_key: &str,
        expand: &[&str],
        properties: &[&str],
    ) -> Result<Response<Project>> {
        let path = Query::new()
            .joined("expand", expand)
            .repeated("properties", properties)
            .apply(Self::path(project_id_or_key));
        self.client.get(&path).await
    }

    /// Create a project.
    #[instrument(skip(self, project), fields(key = %project.key))]
    pub async fn create(&self, project: &CreateProjectRequest) -> Result<Response<CreatedProject>> {
        self.client.post("/rest/api/3/project", project).await
    }

    /// Update a project.
    #[instrument(skip(self, project))]
    pub async fn update(
        &self,
        project_id_or_key: &str,
        project: &UpdateProjectRequest,
    ) -> Result<Response<Project>> {
        self.client.put(&Self::path(project_id_or_key), project).await
    }

    /// Delete a project. With `enable_undo` it goes to the recycle bin.
    #[instrument(skip(self))]
    pub async fn delete(&self, project_id_or_key: &str, enable_undo: bool) -> Result<Response<()>> {
        let path = Query::new()
            .flag("enableUndo", enable_undo)
            .apply(Self::path(project_id_or_key));
        self.client.delete(&path).await
    }

    /// Archive a project.
    #[instrument(skip(self))]
    pub async fn archive(&self, project_id_or_key: &str) -> Result<Response<()>> {
        let path = format!("{}/archive", Self::path(project_id_or_key));
        self.client.call_empty(reqwest::Method::POST, &path, NO_BODY).await
    }

    /// Restore an archived or deleted project.
    #[instrument(skip(self))]
    pub async fn restore(&self, project_id_or_key: &str) -> Result<Response<Project>> {
        let path = format!("{}/restore", Self::path(project_id_or_key));
        self.client.call(reqwest::Method::POST, &path, NO_BODY).await
    }

    /// List the statuses available per issue type in a project.
    pub async fn get_statuses(&self, project_id_or_key: &str) -> Result<Response<Vec<IssueTypeWithStatuses>>> {
        let path = format!("{}/statuses", Self::path(project_id_or_key));
        self.client.get(&path).await
    }

    /// Get the issue type hierarchy of a project.
    pub async fn get_hierarchy(&self, project_id: i64) -> Result<Response<ProjectIssueTypeHierarchy>> {
        let path = format!("/rest/api/3/project/{}/hierarchy", project_id);
        self.client.get(&path).await
    }

    /// Get the notification scheme associated with a project.
    pub async fn get_notification_scheme(
        &self,
        project_id_or_key: &str,
        expand: &[&str],
    ) -> Result<Response<NotificationScheme>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply(format!("{}/notificationscheme", Self::path(project_id_or_key)));
        self.client.get(&path).await
    }

    /// List up to 20 recently viewed projects.
    pub async fn list_recent(&self, expand: &[&str]) -> Result<Response<Vec<Project>>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply("/rest/api/3/project/recent");
        self.client.get(&path).await
    }

    /// List the issue security levels the user can set in a project.
    pub async fn get_security_levels(&self, project_id_or_key: &str) -> Result<Response<Vec<SecurityLevel>>> {
        let path = format!("{}/securitylevel", Self::path(project_id_or_key));
        let response: Response<SecurityLevels> = self.client.get(&path).await?;
        Ok(response.map(|l| l.levels))
    }
}
