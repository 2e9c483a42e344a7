//! Dashboards and their gadgets.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::filters::SharePermission;
use super::{segment, PageOptions};
use crate::api::types::{Page, User};
use crate::api::{Client, Query, Response};
use crate::error::Result;

/// Dashboard operations.
#[derive(Debug, Clone, Copy)]
pub struct DashboardsService<'a> {
    pub(super) client: &'a Client,
}

/// A dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub is_favourite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<User>,
    #[serde(default)]
    pub popularity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
    #[serde(default)]
    pub share_permissions: Vec<SharePermission>,
    #[serde(default)]
    pub edit_permissions: Vec<SharePermission>,
    /// URL of the dashboard in the UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(default)]
    pub is_writable: bool,
    #[serde(default)]
    pub system_dashboard: bool,
}

/// A page of dashboards from [`DashboardsService::list`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardList {
    #[serde(default)]
    pub start_at: i64,
    #[serde(default)]
    pub max_results: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    #[serde(default)]
    pub dashboards: Vec<Dashboard>,
}

/// Options for [`DashboardsService::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchDashboardsOptions {
    pub dashboard_name: Option<String>,
    pub account_id: Option<String>,
    pub group_name: Option<String>,
    pub group_id: Option<String>,
    pub project_id: Option<i64>,
    /// e.g. `name`, `-popularity`.
    pub order_by: Option<String>,
    pub page: PageOptions,
    /// `active`, `archived` or `deleted`.
    pub status: Option<String>,
    pub expand: Vec<String>,
}

/// Body for creating, copying or updating a dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub share_permissions: Vec<SharePermission>,
    pub edit_permissions: Vec<SharePermission>,
}

impl DashboardRequest {
    /// A private dashboard with no share or edit permissions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A gadget on a dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardGadget {
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// `blue`, `red`, `yellow`, `green`, `cyan`, `purple`, `gray` or `white`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<GadgetPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Where a gadget sits on the dashboard grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GadgetPosition {
    #[serde(default)]
    pub row: i64,
    #[serde(default)]
    pub column: i64,
}

/// Filters for [`DashboardsService::list_gadgets`].
#[derive(Debug, Clone, Default)]
pub struct ListGadgetsOptions {
    pub module_keys: Vec<String>,
    pub uris: Vec<String>,
    pub gadget_ids: Vec<i64>,
}

/// Body for adding a gadget. Set either `module_key` or `uri`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddGadgetRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<GadgetPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "ignoreUriAndModuleKeyValidation", skip_serializing_if = "std::ops::Not::not")]
    pub ignore_validation: bool,
}

/// Body for changing a gadget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateGadgetRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<GadgetPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// A gadget that can be added to dashboards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableGadget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Body for changing several dashboards at once.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEditDashboardsRequest {
    /// `changeOwner`, `changePermission`, `addPermission` or `removePermission`.
    pub action: String,
    pub selected_dashboard_ids: Vec<String>,
    #[serde(rename = "changeOwnerDetails", skip_serializing_if = "Option::is_none")]
    pub new_owner: Option<BulkChangeOwner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission_details: Option<BulkPermissionDetails>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub extend_admin_permissions: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkChangeOwner {
    pub new_owner: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub auto_fix_name: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkPermissionDetails {
    pub share_permissions: Vec<SharePermission>,
    pub edit_permissions: Vec<SharePermission>,
}

/// Outcome of a bulk edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEditResult {
    #[serde(default)]
    pub action: Option<String>,
    /// Error messages keyed by dashboard ID.
    #[serde(default)]
    pub entity_errors: std::collections::HashMap<String, BulkEntityError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkEntityError {
    #[serde(default)]
    pub error_messages: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Gadgets<T> {
    #[serde(default = "Vec::new")]
    gadgets: Vec<T>,
}

impl<'a> DashboardsService<'a> {
    fn path(dashboard_id: &str) -> String {
        format!("/rest/api/3/dashboard/{}", segment(dashboard_id))
    }

    /// List dashboards. `filter` is `my` or `favourite`.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: Option<&str>, page: PageOptions) -> Result<Response<DashboardList>> {
        let query = Query::new().opt_string("filter", filter);
        let path = page.apply(query).apply("/rest/api/3/dashboard");
        self.client.get(&path).await
    }

    /// Search dashboards.
    #[instrument(skip(self, options))]
    pub async fn search(&self, options: &SearchDashboardsOptions) -> Result<Response<Page<Dashboard>>> {
        let query = Query::new()
            .opt_string("dashboardName", options.dashboard_name.as_deref())
            .opt_string("accountId", options.account_id.as_deref())
            .opt_string("groupname", options.group_name.as_deref())
            .opt_string("groupId", options.group_id.as_deref())
            .opt_int("projectId", options.project_id)
            .opt_string("orderBy", options.order_by.as_deref())
            .opt_string("status", options.status.as_deref())
            .joined("expand", &options.expand);
        let path = options.page.apply(query).apply("/rest/api/3/dashboard/search");
        self.client.get(&path).await
    }

    /// Get a dashboard.
    pub async fn get(&self, dashboard_id: &str) -> Result<Response<Dashboard>> {
        self.client.get(&Self::path(dashboard_id)).await
    }

    /// Create a dashboard.
    #[instrument(skip(self, dashboard), fields(name = %dashboard.name))]
    pub async fn create(&self, dashboard: &DashboardRequest) -> Result<Response<Dashboard>> {
        let response: Response<Dashboard> = self.client.post("/rest/api/3/dashboard", dashboard).await?;
        debug!(id = ?response.data().id, "Dashboard created");
        Ok(response)
    }

    /// Update a dashboard, replacing its permissions.
    #[instrument(skip(self, dashboard))]
    pub async fn update(&self, dashboard_id: &str, dashboard: &DashboardRequest) -> Result<Response<Dashboard>> {
        self.client.put(&Self::path(dashboard_id), dashboard).await
    }

    /// Delete a dashboard.
    #[instrument(skip(self))]
    pub async fn delete(&self, dashboard_id: &str) -> Result<Response<()>> {
        self.client.delete(&Self::path(dashboard_id)).await
    }

    /// Copy a dashboard. The request names and shares the copy.
    #[instrument(skip(self, dashboard))]
    pub async fn copy(&self, dashboard_id: &str, dashboard: &DashboardRequest) -> Result<Response<Dashboard>> {
        let path = format!("{}/copy", Self::path(dashboard_id));
        self.client.post(&path, dashboard).await
    }

    /// List the gadgets on a dashboard.
    pub async fn list_gadgets(
        &self,
        dashboard_id: &str,
        options: &ListGadgetsOptions,
    ) -> Result<Response<Vec<DashboardGadget>>> {
        let path = Query::new()
            .repeated("moduleKey", &options.module_keys)
            .repeated("uri", &options.uris)
            .repeated("gadgetId", &options.gadget_ids)
            .apply(format!("{}/gadget", Self::path(dashboard_id)));
        let response: Response<Gadgets<DashboardGadget>> = self.client.get(&path).await?;
        Ok(response.map(|g| g.gadgets))
    }

    /// Add a gadget to a dashboard.
    #[instrument(skip(self, gadget))]
    pub async fn add_gadget(
        &self,
        dashboard_id: &str,
        gadget: &AddGadgetRequest,
    ) -> Result<Response<DashboardGadget>> {
        let path = format!("{}/gadget", Self::path(dashboard_id));
        self.client.post(&path, gadget).await
    }

    /// Change a gadget's title, colour or position.
    #[instrument(skip(self, gadget))]
    pub async fn update_gadget(
        &self,
        dashboard_id: &str,
        gadget_id: i64,
        gadget: &UpdateGadgetRequest,
    ) -> Result<Response<()>> {
        let path = format!("{}/gadget/{}", Self::path(dashboard_id), gadget_id);
        self.client
            .call_empty(reqwest::Method::PUT, &path, Some(gadget))
            .await
    }

    /// Remove a gadget from a dashboard.
    #[instrument(skip(self))]
    pub async fn remove_gadget(&self, dashboard_id: &str, gadget_id: i64) -> Result<Response<()>> {
        let path = format!("{}/gadget/{}", Self::path(dashboard_id), gadget_id);
        self.client.delete(&path).await
    }

    /// List gadgets that can be added to dashboards.
    pub async fn list_available_gadgets(&self) -> Result<Response<Vec<AvailableGadget>>> {
        let response: Response<Gadgets<AvailableGadget>> =
            self.client.get("/rest/api/3/dashboard/gadgets").await?;
        Ok(response.map(|g| g.gadgets))
    }

    /// Change the owner or permissions of several dashboards.
    #[instrument(skip(self, request), fields(action = %request.action))]
    pub async fn bulk_edit(&self, request: &BulkEditDashboardsRequest) -> Result<Response<BulkEditResult>> {
        self.client.put("/rest/api/3/dashboard/bulk/edit", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_dashboards() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/dashboard")
            .match_query(Matcher::UrlEncoded("filter".into(), "favourite".into()))
            .with_status(200)
            .with_body(r#"{"startAt":0,"maxResults":20,"total":1,
                "dashboards":[{"id":"10000","name":"Team","isFavourite":true}]}"#)
            .create_async()
            .await;

        let list = client
            .dashboards()
            .list(Some("favourite"), PageOptions::default())
            .await
            .unwrap()
            .into_inner();
        assert_eq!(list.total, 1);
        assert!(list.dashboards[0].is_favourite);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_private_dashboard() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/dashboard")
            .match_body(Matcher::Json(json!({
                "name": "Release board",
                "sharePermissions": [],
                "editPermissions": []
            })))
            .with_status(200)
            .with_body(r#"{"id":"10001","name":"Release board"}"#)
            .create_async()
            .await;

        let dashboard = client
            .dashboards()
            .create(&DashboardRequest::new("Release board"))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(dashboard.id.as_deref(), Some("10001"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_gadgets() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/dashboard/10000/gadget")
            .with_status(200)
            .with_body(r#"{"gadgets":[{"id":1,"moduleKey":"com.atlassian.jira.gadgets:filter-results-gadget",
                "color":"blue","position":{"row":0,"column":1},"title":"Results"}]}"#)
            .create_async()
            .await;
        let update = server
            .mock("PUT", "/rest/api/3/dashboard/10000/gadget/1")
            .match_body(Matcher::Json(json!({"color": "red"})))
            .with_status(204)
            .create_async()
            .await;

        let gadgets = client
            .dashboards()
            .list_gadgets("10000", &ListGadgetsOptions::default())
            .await
            .unwrap()
            .into_inner();
        assert_eq!(gadgets[0].position, Some(GadgetPosition { row: 0, column: 1 }));

        let request = UpdateGadgetRequest {
            color: Some("red".to_string()),
            ..UpdateGadgetRequest::default()
        };
        client
            .dashboards()
            .update_gadget("10000", 1, &request)
            .await
            .unwrap();
        update.assert_async().await;
    }

    #[tokio::test]
    async fn test_bulk_edit_change_owner() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("PUT", "/rest/api/3/dashboard/bulk/edit")
            .match_body(Matcher::Json(json!({
                "action": "changeOwner",
                "selectedDashboardIds": ["10000", "10001"],
                "changeOwnerDetails": {"newOwner": "abc"}
            })))
            .with_status(200)
            .with_body(r#"{"action":"changeOwner","entityErrors":{"10001":{"errorMessages":["Not allowed"]}}}"#)
            .create_async()
            .await;

        let request = BulkEditDashboardsRequest {
            action: "changeOwner".to_string(),
            selected_dashboard_ids: vec!["10000".to_string(), "10001".to_string()],
            new_owner: Some(BulkChangeOwner {
                new_owner: "abc".to_string(),
                auto_fix_name: false,
            }),
            ..BulkEditDashboardsRequest::default()
        };
        let result = client.dashboards().bulk_edit(&request).await.unwrap().into_inner();
        assert_eq!(result.entity_errors["10001"].error_messages, vec!["Not allowed"]);
        mock.assert_async().await;
    }
}
