//! Project roles, their members in each project and their default members.

use std::collections::HashMap;

use reqwest::Method;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, instrument};

use super::segment;
use crate::api::types::ProjectRole;
use crate::api::{Client, Query, Response, NO_BODY};
use crate::error::Result;

/// Project role operations.
#[derive(Debug, Clone, Copy)]
pub struct ProjectRolesService<'a> {
    pub(super) client: &'a Client,
}

/// Body for creating or replacing a role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectRoleRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProjectRoleRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// Users and groups to add to a role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleActors {
    /// Account IDs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub user: Vec<String>,
    /// Group names.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_id: Vec<String>,
}

impl RoleActors {
    fn categorised(&self) -> HashMap<&'static str, &[String]> {
        let mut actors = HashMap::new();
        if !self.user.is_empty() {
            actors.insert("atlassian-user-role-actor", self.user.as_slice());
        }
        if !self.group.is_empty() {
            actors.insert("atlassian-group-role-actor", self.group.as_slice());
        }
        if !self.group_id.is_empty() {
            actors.insert("atlassian-group-role-actor-id", self.group_id.as_slice());
        }
        actors
    }
}

/// One user or group to remove from a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleMember<'a> {
    /// By account ID.
    User(&'a str),
    Group(&'a str),
    GroupId(&'a str),
}

impl RoleMember<'_> {
    fn apply(&self, path: String) -> String {
        let query = match self {
            RoleMember::User(id) => Query::new().set("user", id),
            RoleMember::Group(name) => Query::new().set("group", name),
            RoleMember::GroupId(id) => Query::new().set("groupId", id),
        };
        query.apply(path)
    }
}

/// Options for [`ProjectRolesService::get_role_details`].
#[derive(Debug, Clone, Default)]
pub struct RoleDetailsOptions {
    /// Only roles the caller belongs to.
    pub current_member: bool,
    pub exclude_connect_addons: bool,
    pub ids: Vec<i64>,
}

impl<'a> ProjectRolesService<'a> {
    fn path(role_id: i64) -> String {
        format!("/rest/api/3/role/{}", role_id)
    }

    fn project_path(project_id_or_key: &str, role_id: i64) -> String {
        format!(
            "/rest/api/3/project/{}/role/{}",
            segment(project_id_or_key),
            role_id
        )
    }

    /// List every project role.
    pub async fn list(&self) -> Result<Response<Vec<ProjectRole>>> {
        self.client.get("/rest/api/3/role").await
    }

    /// Get a role with its default actors.
    pub async fn get(&self, role_id: i64) -> Result<Response<ProjectRole>> {
        self.client.get(&Self::path(role_id)).await
    }

    /// Create a project role.
    #[instrument(skip(self, role), fields(name = %role.name))]
    pub async fn create(&self, role: &ProjectRoleRequest) -> Result<Response<ProjectRole>> {
        let response: Response<ProjectRole> = self.client.post("/rest/api/3/role", role).await?;
        debug!(id = ?response.data().id, "Project role created");
        Ok(response)
    }

    /// Replace the name and description of a role.
    #[instrument(skip(self, role))]
    pub async fn update(&self, role_id: i64, role: &ProjectRoleRequest) -> Result<Response<ProjectRole>> {
        self.client.put(&Self::path(role_id), role).await
    }

    /// Change the name or the description of a role, leaving the other alone.
    #[instrument(skip(self))]
    pub async fn partial_update(
        &self,
        role_id: i64,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Response<ProjectRole>> {
        let mut body = serde_json::Map::new();
        if let Some(name) = name {
            body.insert("name".to_string(), json!(name));
        }
        if let Some(description) = description {
            body.insert("description".to_string(), json!(description));
        }
        self.client.post(&Self::path(role_id), &body).await
    }

    /// Delete a role, moving its uses in schemes to `swap` if given.
    #[instrument(skip(self))]
    pub async fn delete(&self, role_id: i64, swap: Option<i64>) -> Result<Response<()>> {
        let path = Query::new().opt_int("swap", swap).apply(Self::path(role_id));
        self.client.delete(&path).await
    }

    /// List a project's roles as role name to role URL.
    pub async fn list_for_project(&self, project_id_or_key: &str) -> Result<Response<HashMap<String, String>>> {
        let path = format!("/rest/api/3/project/{}/role", segment(project_id_or_key));
        self.client.get(&path).await
    }

    /// Get a role with its actors in a project.
    pub async fn get_for_project(
        &self,
        project_id_or_key: &str,
        role_id: i64,
        exclude_inactive_users: bool,
    ) -> Result<Response<ProjectRole>> {
        let path = Query::new()
            .flag("excludeInactiveUsers", exclude_inactive_users)
            .apply(Self::project_path(project_id_or_key, role_id));
        self.client.get(&path).await
    }

    /// Get the roles of a project without their actors.
    pub async fn get_role_details(
        &self,
        project_id_or_key: &str,
        options: &RoleDetailsOptions,
    ) -> Result<Response<Vec<ProjectRole>>> {
        let path = Query::new()
            .flag("currentMember", options.current_member)
            .flag("excludeConnectAddons", options.exclude_connect_addons)
            .repeated("id", &options.ids)
            .apply(format!(
                "/rest/api/3/project/{}/roledetails",
                segment(project_id_or_key)
            ));
        self.client.get(&path).await
    }

    /// Replace the actors of a role in a project.
    #[instrument(skip(self, actors))]
    pub async fn set_actors(
        &self,
        project_id_or_key: &str,
        role_id: i64,
        actors: &RoleActors,
    ) -> Result<Response<ProjectRole>> {
        let body = json!({ "categorisedActors": actors.categorised() });
        self.client
            .put(&Self::project_path(project_id_or_key, role_id), &body)
            .await
    }

    /// Add actors to a role in a project.
    #[instrument(skip(self, actors))]
    pub async fn add_actors(
        &self,
        project_id_or_key: &str,
        role_id: i64,
        actors: &RoleActors,
    ) -> Result<Response<ProjectRole>> {
        self.client
            .post(&Self::project_path(project_id_or_key, role_id), actors)
            .await
    }

    /// Remove one actor from a role in a project.
    #[instrument(skip(self))]
    pub async fn remove_actor(
        &self,
        project_id_or_key: &str,
        role_id: i64,
        member: RoleMember<'_>,
    ) -> Result<Response<()>> {
        let path = member.apply(Self::project_path(project_id_or_key, role_id));
        self.client.delete(&path).await
    }

    /// Get the default actors of a role.
    pub async fn get_default_actors(&self, role_id: i64) -> Result<Response<ProjectRole>> {
        let path = format!("{}/actors", Self::path(role_id));
        self.client.get(&path).await
    }

    /// Add default actors to a role.
    #[instrument(skip(self, actors))]
    pub async fn add_default_actors(&self, role_id: i64, actors: &RoleActors) -> Result<Response<ProjectRole>> {
        let path = format!("{}/actors", Self::path(role_id));
        self.client.post(&path, actors).await
    }

    /// Remove one default actor from a role.
    #[instrument(skip(self))]
    pub async fn remove_default_actor(&self, role_id: i64, member: RoleMember<'_>) -> Result<Response<ProjectRole>> {
        let path = member.apply(format!("{}/actors", Self::path(role_id)));
        self.client.call(Method::DELETE, &path, NO_BODY).await
    }
}
