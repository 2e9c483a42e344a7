//! Permissions, permission schemes and issue security schemes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use super::issues::SecurityLevel;
use super::{segment, PageOptions};
use crate::api::types::{Page, Project, Scope};
use crate::api::{Client, Query, Response};
use crate::error::Result;

/// Permission operations.
#[derive(Debug, Clone, Copy)]
pub struct PermissionsService<'a> {
    pub(super) client: &'a Client,
}

/// A permission, and whether the caller holds it when returned by
/// [`PermissionsService::get_my_permissions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `GLOBAL` or `PROJECT`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub permission_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub have_permission: bool,
    #[serde(default)]
    pub deprecated_key: bool,
}

#[derive(Debug, Default, Deserialize)]
struct Permissions {
    #[serde(default)]
    permissions: HashMap<String, Permission>,
}

/// Context for [`PermissionsService::get_my_permissions`].
#[derive(Debug, Clone, Default)]
pub struct MyPermissionsOptions {
    pub project_key: Option<String>,
    pub project_id: Option<String>,
    pub issue_key: Option<String>,
    pub issue_id: Option<String>,
    /// Permission keys to check, e.g. `BROWSE_PROJECTS`.
    pub permissions: Vec<String>,
    pub project_uuid: Option<String>,
    pub project_configuration_uuid: Option<String>,
}

/// Body for [`PermissionsService::check_bulk`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkPermissionsRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub project_permissions: Vec<BulkProjectPermission>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub global_permissions: Vec<String>,
    /// Checks for another user instead of the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

/// Project permissions to check against issues and projects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkProjectPermission {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<i64>,
    pub permissions: Vec<String>,
}

/// Result of a bulk permission check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkPermissionsResult {
    #[serde(default)]
    pub project_permissions: Vec<BulkPermissionGrant>,
    #[serde(default)]
    pub global_permissions: Vec<String>,
}

/// The issues and projects where a permission is held.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkPermissionGrant {
    #[serde(default)]
    pub permission: String,
    #[serde(default)]
    pub issues: Vec<i64>,
    #[serde(default)]
    pub projects: Vec<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct PermittedProjects {
    #[serde(default)]
    projects: Vec<Project>,
}

/// A permission scheme.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionScheme {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    /// Grants, present when expanded with `permissions`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<PermissionGrant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<String>,
}

/// A permission granted to a holder within a scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<PermissionHolder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
}

/// Who a grant applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionHolder {
    /// e.g. `group`, `user`, `projectRole`, `anyone`.
    #[serde(rename = "type", default)]
    pub holder_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<String>,
}

impl PermissionHolder {
    pub fn new(holder_type: impl Into<String>, parameter: Option<String>) -> Self {
        Self {
            holder_type: holder_type.into(),
            parameter,
            ..Self::default()
        }
    }
}

/// Body for creating or replacing a permission scheme.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PermissionSchemeRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// On update, replaces every existing grant.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<PermissionGrantInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

impl PermissionSchemeRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A grant to add to a scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionGrantInput {
    pub holder: PermissionHolder,
    pub permission: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PermissionSchemes {
    #[serde(default)]
    permission_schemes: Vec<PermissionScheme>,
}

#[derive(Debug, Default, Deserialize)]
struct Grants {
    #[serde(default)]
    permissions: Vec<PermissionGrant>,
}

/// An issue security scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSecurityScheme {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_security_level_id: Option<i64>,
}

/// Filters for [`PermissionsService::list_security_schemes`].
#[derive(Debug, Clone, Default)]
pub struct ListSecuritySchemesOptions {
    pub page: PageOptions,
    pub ids: Vec<i64>,
    pub project_id: Option<String>,
}

impl<'a> PermissionsService<'a> {
    fn scheme_path(scheme_id: i64) -> String {
        format!("/rest/api/3/permissionscheme/{}", scheme_id)
    }

    fn grants_path(scheme_id: i64) -> String {
        format!("{}/permission", Self::scheme_path(scheme_id))
    }

    /// List every permission known to the instance, keyed by permission key.
    pub async fn list_all(&self) -> Result<Response<HashMap<String, Permission>>> {
        let response: Response<Permissions> = self.client.get("/rest/api/3/permissions").await?;
        Ok(response.map(|r| r.permissions))
    }

    /// Get the caller's permissions in a global, project or issue context.
    pub async fn get_my_permissions(
        &self,
        options: &MyPermissionsOptions,
    ) -> Result<Response<HashMap<String, Permission>>> {
        let path = Query::new()
            .opt_string("projectKey", options.project_key.as_deref())
            .opt_string("projectId", options.project_id.as_deref())
            .opt_string("issueKey", options.issue_key.as_deref())
            .opt_string("issueId", options.issue_id.as_deref())
            .joined("permissions", &options.permissions)
            .opt_string("projectUuid", options.project_uuid.as_deref())
            .opt_string(
                "projectConfigurationUuid",
                options.project_configuration_uuid.as_deref(),
            )
            .apply("/rest/api/3/mypermissions");
        let response: Response<Permissions> = self.client.get(&path).await?;
        Ok(response.map(|r| r.permissions))
    }

    /// Check global and project permissions in one request.
    pub async fn check_bulk(&self, request: &BulkPermissionsRequest) -> Result<Response<BulkPermissionsResult>> {
        self.client.post("/rest/api/3/permissions/check", request).await
    }

    /// Get the projects where the caller holds all of `permissions`.
    pub async fn get_permitted_projects(&self, permissions: &[&str]) -> Result<Response<Vec<Project>>> {
        let body = json!({ "permissions": permissions });
        let response: Response<PermittedProjects> =
            self.client.post("/rest/api/3/permissions/project", &body).await?;
        Ok(response.map(|r| r.projects))
    }

    /// List permission schemes.
    pub async fn list_schemes(&self, expand: &[&str]) -> Result<Response<Vec<PermissionScheme>>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply("/rest/api/3/permissionscheme");
        let response: Response<PermissionSchemes> = self.client.get(&path).await?;
        Ok(response.map(|r| r.permission_schemes))
    }

    /// Get a permission scheme.
    pub async fn get_scheme(&self, scheme_id: i64, expand: &[&str]) -> Result<Response<PermissionScheme>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply(Self::scheme_path(scheme_id));
        self.client.get(&path).await
    }

    /// Create a permission scheme.
    #[instrument(skip(self, scheme), fields(name = %scheme.name))]
    pub async fn create_scheme(
        &self,
        scheme: &PermissionSchemeRequest,
        expand: &[&str],
    ) -> Result<Response<PermissionScheme>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply("/rest/api/3/permissionscheme");
        let response: Response<PermissionScheme> = self.client.post(&path, scheme).await?;
        debug!(id = ?response.data().id, "Permission scheme created");
        Ok(response)
    }

    /// Replace a permission scheme.
    #[instrument(skip(self, scheme))]
    pub async fn update_scheme(
        &self,
        scheme_id: i64,
        scheme: &PermissionSchemeRequest,
        expand: &[&str],
    ) -> Result<Response<PermissionScheme>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply(Self::scheme_path(scheme_id));
        self.client.put(&path, scheme).await
    }

    /// Delete a permission scheme.
    #[instrument(skip(self))]
    pub async fn delete_scheme(&self, scheme_id: i64) -> Result<Response<()>> {
        self.client.delete(&Self::scheme_path(scheme_id)).await
    }

    /// List the grants of a scheme.
    pub async fn list_grants(&self, scheme_id: i64, expand: &[&str]) -> Result<Response<Vec<PermissionGrant>>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply(Self::grants_path(scheme_id));
        let response: Response<Grants> = self.client.get(&path).await?;
        Ok(response.map(|r| r.permissions))
    }

    /// Add a grant to a scheme.
    #[instrument(skip(self, grant), fields(permission = %grant.permission))]
    pub async fn create_grant(
        &self,
        scheme_id: i64,
        grant: &PermissionGrantInput,
        expand: &[&str],
    ) -> Result<Response<PermissionGrant>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply(Self::grants_path(scheme_id));
        self.client.post(&path, grant).await
    }

    /// Get one grant of a scheme.
    pub async fn get_grant(
        &self,
        scheme_id: i64,
        grant_id: i64,
        expand: &[&str],
    ) -> Result<Response<PermissionGrant>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply(format!("{}/{}", Self::grants_path(scheme_id), grant_id));
        self.client.get(&path).await
    }

    /// Remove a grant from a scheme.
    #[instrument(skip(self))]
    pub async fn delete_grant(&self, scheme_id: i64, grant_id: i64) -> Result<Response<()>> {
        let path = format!("{}/{}", Self::grants_path(scheme_id), grant_id);
        self.client.delete(&path).await
    }

    /// Get the permission scheme a project uses.
    pub async fn get_project_scheme(
        &self,
        project_id_or_key: &str,
        expand: &[&str],
    ) -> Result<Response<PermissionScheme>> {
        let path = Query::new().joined("expand", expand).apply(format!(
            "/rest/api/3/project/{}/permissionscheme",
            segment(project_id_or_key)
        ));
        self.client.get(&path).await
    }

    /// Assign a permission scheme to a project.
    #[instrument(skip(self))]
    pub async fn assign_project_scheme(
        &self,
        project_id_or_key: &str,
        scheme_id: i64,
    ) -> Result<Response<PermissionScheme>> {
        let path = format!(
            "/rest/api/3/project/{}/permissionscheme",
            segment(project_id_or_key)
        );
        self.client.put(&path, &json!({ "id": scheme_id })).await
    }

    /// Get the issue security levels the caller can set in a project.
    pub async fn get_project_security_levels(
        &self,
        project_id_or_key: &str,
    ) -> Result<Response<Vec<SecurityLevel>>> {
        self.client
            .projects()
            .get_security_levels(project_id_or_key)
            .await
    }

    /// Get a page of issue security schemes.
    pub async fn list_security_schemes(
        &self,
        options: &ListSecuritySchemesOptions,
    ) -> Result<Response<Page<IssueSecurityScheme>>> {
        let path = options
            .page
            .apply(Query::new())
            .repeated("id", &options.ids)
            .opt_string("projectId", options.project_id.as_deref())
            .apply("/rest/api/3/issuesecurityschemes");
        self.client.get(&path).await
    }

    /// Get an issue security scheme.
    pub async fn get_security_scheme(&self, scheme_id: i64) -> Result<Response<IssueSecurityScheme>> {
        let path = format!("/rest/api/3/issuesecurityschemes/{}", scheme_id);
        self.client.get(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_my_permissions() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/mypermissions")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("projectKey".into(), "PROJ".into()),
                Matcher::UrlEncoded("permissions".into(), "BROWSE_PROJECTS,EDIT_ISSUES".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"permissions":{"EDIT_ISSUES":{"id":"12","key":"EDIT_ISSUES",
                "type":"PROJECT","havePermission":true}}}"#)
            .create_async()
            .await;

        let options = MyPermissionsOptions {
            project_key: Some("PROJ".to_string()),
            permissions: vec!["BROWSE_PROJECTS".to_string(), "EDIT_ISSUES".to_string()],
            ..MyPermissionsOptions::default()
        };
        let permissions = client
            .permissions()
            .get_my_permissions(&options)
            .await
            .unwrap()
            .into_inner();
        let edit = &permissions["EDIT_ISSUES"];
        assert!(edit.have_permission);
        assert_eq!(edit.permission_type.as_deref(), Some("PROJECT"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_check_bulk() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/permissions/check")
            .match_body(Matcher::Json(json!({
                "projectPermissions": [{"projects": [10001], "permissions": ["EDIT_ISSUES"]}],
                "globalPermissions": ["ADMINISTER"]
            })))
            .with_status(200)
            .with_body(r#"{"projectPermissions":[{"permission":"EDIT_ISSUES","projects":[10001]}],
                "globalPermissions":["ADMINISTER"]}"#)
            .create_async()
            .await;

        let request = BulkPermissionsRequest {
            project_permissions: vec![BulkProjectPermission {
                projects: vec![10001],
                permissions: vec!["EDIT_ISSUES".to_string()],
                ..BulkProjectPermission::default()
            }],
            global_permissions: vec!["ADMINISTER".to_string()],
            ..BulkPermissionsRequest::default()
        };
        let result = client.permissions().check_bulk(&request).await.unwrap().into_inner();
        assert_eq!(result.project_permissions[0].projects, vec![10001]);
        assert_eq!(result.global_permissions, vec!["ADMINISTER"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_permitted_projects() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/permissions/project")
            .match_body(Matcher::Json(json!({"permissions": ["BROWSE_PROJECTS"]})))
            .with_status(200)
            .with_body(r#"{"projects":[{"id":"10000","key":"PROJ"}]}"#)
            .create_async()
            .await;

        let projects = client
            .permissions()
            .get_permitted_projects(&["BROWSE_PROJECTS"])
            .await
            .unwrap()
            .into_inner();
        assert_eq!(projects[0].key.as_deref(), Some("PROJ"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_schemes_expanded() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/permissionscheme")
            .match_query(Matcher::UrlEncoded("expand".into(), "permissions,user".into()))
            .with_status(200)
            .with_body(r#"{"permissionSchemes":[{"id":10000,"name":"Default",
                "permissions":[{"id":10001,"permission":"ADMINISTER_PROJECTS",
                "holder":{"type":"group","parameter":"jira-admins"}}]}]}"#)
            .create_async()
            .await;

        let schemes = client
            .permissions()
            .list_schemes(&["permissions", "user"])
            .await
            .unwrap()
            .into_inner();
        let grant = &schemes[0].permissions[0];
        assert_eq!(grant.holder.as_ref().map(|h| h.holder_type.as_str()), Some("group"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_grant() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/permissionscheme/10000/permission")
            .match_body(Matcher::Json(json!({
                "holder": {"type": "group", "parameter": "developers"},
                "permission": "EDIT_ISSUES"
            })))
            .with_status(201)
            .with_body(r#"{"id":10069,"permission":"EDIT_ISSUES"}"#)
            .create_async()
            .await;

        let grant = PermissionGrantInput {
            holder: PermissionHolder::new("group", Some("developers".to_string())),
            permission: "EDIT_ISSUES".to_string(),
        };
        let created = client
            .permissions()
            .create_grant(10000, &grant, &[])
            .await
            .unwrap()
            .into_inner();
        assert_eq!(created.id, Some(10069));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_grants_unwraps_permissions() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/permissionscheme/10000/permission")
            .match_query(Matcher::UrlEncoded("expand".into(), "user,group".into()))
            .with_status(200)
            .with_body(r#"{"permissions":[
                {"id":10000,"holder":{"type":"group","parameter":"jira-core-users"},"permission":"ADMINISTER_PROJECTS"},
                {"id":10001,"holder":{"type":"anyone"},"permission":"BROWSE_PROJECTS"}
            ]}"#)
            .create_async()
            .await;

        let grants = client
            .permissions()
            .list_grants(10000, &["user", "group"])
            .await
            .unwrap()
            .into_inner();
        assert_eq!(grants.len(), 2);
        assert_eq!(grants[1].holder.as_ref().unwrap().holder_type, "anyone");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_assign_project_scheme() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("PUT", "/rest/api/3/project/PROJ/permissionscheme")
            .match_body(Matcher::Json(json!({"id": 10000})))
            .with_status(200)
            .with_body(r#"{"id":10000,"name":"Default"}"#)
            .create_async()
            .await;

        client.permissions().assign_project_scheme("PROJ", 10000).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_security_schemes() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/issuesecurityschemes")
            .match_query(Matcher::Regex("id=10000&id=10001".to_string()))
            .with_status(200)
            .with_body(r#"{"startAt":0,"maxResults":50,"total":1,"isLast":true,
                "values":[{"id":10000,"name":"Default","defaultSecurityLevelId":10021}]}"#)
            .create_async()
            .await;

        let options = ListSecuritySchemesOptions {
            ids: vec![10000, 10001],
            ..ListSecuritySchemesOptions::default()
        };
        let page = client
            .permissions()
            .list_security_schemes(&options)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(page.values[0].default_security_level_id, Some(10021));
        assert!(!page.has_more());
        mock.assert_async().await;
    }
}
