//! Application roles such as Jira Software and Jira Service Management.

use serde::{Deserialize, Serialize};

use super::segment;
use crate::api::types::Group;
use crate::api::{Client, Response};
use crate::error::Result;

/// Application role operations.
#[derive(Debug, Clone, Copy)]
pub struct ApplicationRolesService<'a> {
    pub(super) client: &'a Client,
}

/// An application role and its seat usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRole {
    /// e.g. `jira-software`.
    #[serde(default)]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub group_details: Vec<Group>,
    #[serde(default)]
    pub default_groups: Vec<String>,
    #[serde(default)]
    pub default_groups_details: Vec<Group>,
    #[serde(default)]
    pub selected_by_default: bool,
    #[serde(default)]
    pub defined: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_seats: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_seats: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_count_description: Option<String>,
    #[serde(default)]
    pub has_unlimited_seats: bool,
    #[serde(default)]
    pub platform: bool,
}

impl<'a> ApplicationRolesService<'a> {
    /// List every application role.
    pub async fn list(&self) -> Result<Response<Vec<ApplicationRole>>> {
        self.client.get("/rest/api/3/applicationrole").await
    }

    /// Get an application role by key.
    pub async fn get(&self, key: &str) -> Result<Response<ApplicationRole>> {
        let path = format!("/rest/api/3/applicationrole/{}", segment(key));
        self.client.get(&path).await
    }
}
