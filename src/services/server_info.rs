//! Server information.

use serde::{Deserialize, Serialize};

use crate::api::{Client, Response, Time};
use crate::error::Result;

/// Server information operations.
#[derive(Debug, Clone, Copy)]
pub struct ServerInfoService<'a> {
    pub(super) client: &'a Client,
}

/// Details about the Jira site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub version_numbers: Vec<i64>,
    /// `Cloud` for Jira Cloud sites.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_date: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_time: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scm_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_title: Option<String>,
    #[serde(default)]
    pub health_checks: Vec<HealthCheck>,
}

/// A server health check result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub passed: bool,
}

impl<'a> ServerInfoService<'a> {
    /// Get information about the Jira site.
    pub async fn get(&self) -> Result<Response<ServerInfo>> {
        self.client.get("/rest/api/3/serverInfo").await
    }
}
