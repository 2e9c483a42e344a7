//! Saved filters, favourites and share permissions.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use crate::api::types::{Group, Page, Project, ProjectRole, User};
use crate::api::{Client, Query, Response, NO_BODY};
use crate::error::Result;

/// Filter operations.
#[derive(Debug, Clone, Copy)]
pub struct FiltersService<'a> {
    pub(super) client: &'a Client,
}

/// A saved JQL filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_url: Option<String>,
    #[serde(default)]
    pub favourite: bool,
    #[serde(default)]
    pub favourited_count: i64,
    #[serde(default)]
    pub share_permissions: Vec<SharePermission>,
    #[serde(default)]
    pub edit_permissions: Vec<SharePermission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscriptions: Option<FilterSubscriptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<String>,
}

/// Users and groups subscribed to a filter, with `expand=subscriptions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSubscriptions {
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub items: Vec<FilterSubscription>,
    #[serde(rename = "max-results", default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i64>,
    #[serde(rename = "start-index", default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<i64>,
    #[serde(rename = "end-index", default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<i64>,
}

/// A subscription to a filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSubscription {
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,
}

/// Who a filter or dashboard is shared with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharePermission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// `user`, `group`, `project`, `projectRole`, `global` or `loggedin`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub share_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<ProjectRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Body for creating or updating a filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favourite: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub share_permissions: Vec<SharePermission>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edit_permissions: Vec<SharePermission>,
}

impl FilterRequest {
    pub fn new(name: impl Into<String>, jql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            jql: Some(jql.into()),
            ..Self::default()
        }
    }
}

/// Query options shared by filter reads and writes.
#[derive(Debug, Clone, Default)]
pub struct FilterOptions {
    /// e.g. `sharedUsers`, `subscriptions`.
    pub expand: Vec<String>,
    /// Admins only: act regardless of share permissions.
    pub override_share_permissions: bool,
}

impl FilterOptions {
    fn query(&self) -> Query {
        Query::new()
            .joined("expand", &self.expand)
            .flag("overrideSharePermissions", self.override_share_permissions)
    }
}

/// Options for [`FiltersService::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchFiltersOptions {
    pub filter_name: Option<String>,
    pub account_id: Option<String>,
    pub group_name: Option<String>,
    pub group_id: Option<String>,
    pub project_id: Option<i64>,
    pub ids: Vec<i64>,
    /// e.g. `name`, `-favourite_count`.
    pub order_by: Option<String>,
    pub start_at: u32,
    pub max_results: u32,
    pub expand: Vec<String>,
    pub override_share_permissions: bool,
}

/// Body for adding a share permission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharePermissionRequest {
    #[serde(rename = "type")]
    pub share_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(rename = "groupname", skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_role_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// 1 for view, 3 for view and edit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rights: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ShareScope {
    #[serde(default)]
    scope: String,
}

impl<'a> FiltersService<'a> {
    fn path(filter_id: i64) -> String {
        format!("/rest/api/3/filter/{}", filter_id)
    }

    /// Create a filter.
    #[instrument(skip(self, filter, options), fields(name = %filter.name))]
    pub async fn create(&self, filter: &FilterRequest, options: &FilterOptions) -> Result<Response<Filter>> {
        let path = options.query().apply("/rest/api/3/filter");
        let response: Response<Filter> = self.client.post(&path, filter).await?;
        debug!(id = ?response.data().id, "Filter created");
        Ok(response)
    }

    /// Get a filter.
    #[instrument(skip(self, options))]
    pub async fn get(&self, filter_id: i64, options: &FilterOptions) -> Result<Response<Filter>> {
        let path = options.query().apply(Self::path(filter_id));
        self.client.get(&path).await
    }

    /// Update a filter.
    #[instrument(skip(self, filter, options))]
    pub async fn update(
        &self,
        filter_id: i64,
        filter: &FilterRequest,
        options: &FilterOptions,
    ) -> Result<Response<Filter>> {
        let path = options.query().apply(Self::path(filter_id));
        self.client.put(&path, filter).await
    }

    /// Delete a filter.
    #[instrument(skip(self))]
    pub async fn delete(&self, filter_id: i64) -> Result<Response<()>> {
        self.client.delete(&Self::path(filter_id)).await
    }

    /// List the filters owned by the user.
    pub async fn list_my(&self, expand: &[&str], include_favourites: bool) -> Result<Response<Vec<Filter>>> {
        let path = Query::new()
            .joined("expand", expand)
            .flag("includeFavourites", include_favourites)
            .apply("/rest/api/3/filter/my");
        self.client.get(&path).await
    }

    /// Search filters visible to the user.
    #[instrument(skip(self, options))]
    pub async fn search(&self, options: &SearchFiltersOptions) -> Result<Response<Page<Filter>>> {
        let path = Query::new()
            .opt_string("filterName", options.filter_name.as_deref())
            .opt_string("accountId", options.account_id.as_deref())
            .opt_string("groupname", options.group_name.as_deref())
            .opt_string("groupId", options.group_id.as_deref())
            .opt_int("projectId", options.project_id)
            .repeated("id", &options.ids)
            .opt_string("orderBy", options.order_by.as_deref())
            .int("startAt", options.start_at)
            .int("maxResults", options.max_results)
            .joined("expand", &options.expand)
            .flag("overrideSharePermissions", options.override_share_permissions)
            .apply("/rest/api/3/filter/search");
        self.client.get(&path).await
    }

    /// List the user's favourite filters.
    pub async fn list_favourite(&self, expand: &[&str]) -> Result<Response<Vec<Filter>>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply("/rest/api/3/filter/favourite");
        self.client.get(&path).await
    }

    /// Add a filter to the user's favourites.
    #[instrument(skip(self))]
    pub async fn set_favourite(&self, filter_id: i64, expand: &[&str]) -> Result<Response<Filter>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply(format!("{}/favourite", Self::path(filter_id)));
        self.client.call(Method::PUT, &path, NO_BODY).await
    }

    /// Remove a filter from the user's favourites.
    #[instrument(skip(self))]
    pub async fn remove_favourite(&self, filter_id: i64, expand: &[&str]) -> Result<Response<Filter>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply(format!("{}/favourite", Self::path(filter_id)));
        self.client.call(Method::DELETE, &path, NO_BODY).await
    }

    /// Get the default share scope for new filters: `GLOBAL`,
    /// `AUTHENTICATED` or `PRIVATE`.
    pub async fn get_default_share_scope(&self) -> Result<Response<String>> {
        let response: Response<ShareScope> =
            self.client.get("/rest/api/3/filter/defaultShareScope").await?;
        Ok(response.map(|s| s.scope))
    }

    /// Set the default share scope for new filters.
    pub async fn set_default_share_scope(&self, scope: &str) -> Result<Response<String>> {
        let body = ShareScope {
            scope: scope.to_string(),
        };
        let response: Response<ShareScope> = self
            .client
            .put("/rest/api/3/filter/defaultShareScope", &body)
            .await?;
        Ok(response.map(|s| s.scope))
    }

    /// List the share permissions of a filter.
    pub async fn list_share_permissions(&self, filter_id: i64) -> Result<Response<Vec<SharePermission>>> {
        let path = format!("{}/permission", Self::path(filter_id));
        self.client.get(&path).await
    }

    /// Share a filter. Returns every share permission of the filter.
    #[instrument(skip(self, permission))]
    pub async fn add_share_permission(
        &self,
        filter_id: i64,
        permission: &SharePermissionRequest,
    ) -> Result<Response<Vec<SharePermission>>> {
        let path = format!("{}/permission", Self::path(filter_id));
        self.client.post(&path, permission).await
    }

    /// Get one share permission of a filter.
    pub async fn get_share_permission(
        &self,
        filter_id: i64,
        permission_id: i64,
    ) -> Result<Response<SharePermission>> {
        let path = format!("{}/permission/{}", Self::path(filter_id), permission_id);
        self.client.get(&path).await
    }

    /// Remove a share permission from a filter.
    #[instrument(skip(self))]
    pub async fn delete_share_permission(&self, filter_id: i64, permission_id: i64) -> Result<Response<()>> {
        let path = format!("{}/permission/{}", Self::path(filter_id), permission_id);
        self.client.delete(&path).await
    }

    /// Transfer a filter to another user.
    #[instrument(skip(self))]
    pub async fn change_owner(&self, filter_id: i64, account_id: &str) -> Result<Response<()>> {
        let path = format!("{}/owner", Self::path(filter_id));
        self.client
            .call_empty(Method::PUT, &path, Some(&json!({ "accountId": account_id })))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use mockito::Matcher;

    const FILTER: &str = r#"{
        "id": "10000",
        "name": "My open bugs",
        "jql": "type = Bug AND resolution is EMPTY",
        "owner": {"accountId": "abc"},
        "favourite": true,
        "favouritedCount": 3,
        "sharePermissions": [{"id": 1, "type": "group", "group": {"name": "developers"}}]
    }"#;

    #[tokio::test]
    async fn test_create_filter() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/filter")
            .match_query(Matcher::UrlEncoded("expand".into(), "sharedUsers".into()))
            .match_body(Matcher::Json(json!({
                "name": "My open bugs",
                "jql": "type = Bug AND resolution is EMPTY",
                "favourite": true
            })))
            .with_status(200)
            .with_body(FILTER)
            .create_async()
            .await;

        let request = FilterRequest {
            favourite: Some(true),
            ..FilterRequest::new("My open bugs", "type = Bug AND resolution is EMPTY")
        };
        let options = FilterOptions {
            expand: vec!["sharedUsers".to_string()],
            ..FilterOptions::default()
        };
        let filter = client.filters().create(&request, &options).await.unwrap().into_inner();
        assert_eq!(filter.favourited_count, 3);
        assert_eq!(filter.share_permissions[0].share_type.as_deref(), Some("group"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_filters() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/filter/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("filterName".into(), "bugs".into()),
                Matcher::UrlEncoded("orderBy".into(), "-favourite_count".into()),
            ]))
            .with_status(200)
            .with_body(format!(
                r#"{{"startAt":0,"maxResults":50,"total":1,"isLast":true,"values":[{}]}}"#,
                FILTER
            ))
            .create_async()
            .await;

        let options = SearchFiltersOptions {
            filter_name: Some("bugs".to_string()),
            order_by: Some("-favourite_count".to_string()),
            ..SearchFiltersOptions::default()
        };
        let page = client.filters().search(&options).await.unwrap().into_inner();
        assert_eq!(page.values[0].name.as_deref(), Some("My open bugs"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_set_favourite_sends_no_body() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("PUT", "/rest/api/3/filter/10000/favourite")
            .match_body(Matcher::Exact(String::new()))
            .with_status(200)
            .with_body(FILTER)
            .create_async()
            .await;

        let filter = client.filters().set_favourite(10000, &[]).await.unwrap().into_inner();
        assert!(filter.favourite);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_default_share_scope() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/filter/defaultShareScope")
            .with_status(200)
            .with_body(r#"{"scope":"PRIVATE"}"#)
            .create_async()
            .await;
        let set = server
            .mock("PUT", "/rest/api/3/filter/defaultShareScope")
            .match_body(Matcher::Json(json!({"scope": "GLOBAL"})))
            .with_status(200)
            .with_body(r#"{"scope":"GLOBAL"}"#)
            .create_async()
            .await;

        let scope = client.filters().get_default_share_scope().await.unwrap();
        assert_eq!(scope.data(), "PRIVATE");
        let scope = client.filters().set_default_share_scope("GLOBAL").await.unwrap();
        assert_eq!(scope.into_inner(), "GLOBAL");
        set.assert_async().await;
    }

    #[tokio::test]
    async fn test_add_share_permission() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/filter/10000/permission")
            .match_body(Matcher::Json(json!({"type": "group", "groupname": "developers"})))
            .with_status(201)
            .with_body(r#"[{"id":1,"type":"group","group":{"name":"developers"}}]"#)
            .create_async()
            .await;

        let request = SharePermissionRequest {
            share_type: "group".to_string(),
            group_name: Some("developers".to_string()),
            ..SharePermissionRequest::default()
        };
        let permissions = client
            .filters()
            .add_share_permission(10000, &request)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(permissions.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_change_owner() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("PUT", "/rest/api/3/filter/10000/owner")
            .match_body(Matcher::Json(json!({"accountId": "def"})))
            .with_status(204)
            .create_async()
            .await;

        client.filters().change_owner(10000, "def").await.unwrap();
        mock.assert_async().await;
    }
}
