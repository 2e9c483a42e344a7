//! Issue watchers.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use super::segment;
use crate::api::types::Watches;
use crate::api::{Client, Query, Response};
use crate::error::Result;

/// Watcher operations.
#[derive(Debug, Clone, Copy)]
pub struct WatchersService<'a> {
    pub(super) client: &'a Client,
}

/// Outcome of a bulk watch or unwatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkWatchersResult {
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub success: Vec<String>,
}

impl<'a> WatchersService<'a> {
    fn path(issue_id_or_key: &str) -> String {
        format!("/rest/api/3/issue/{}/watchers", segment(issue_id_or_key))
    }

    /// Get the watchers of an issue.
    #[instrument(skip(self))]
    pub async fn get(&self, issue_id_or_key: &str) -> Result<Response<Watches>> {
        self.client.get(&Self::path(issue_id_or_key)).await
    }

    /// Add a watcher. The body is the bare account ID as a JSON string.
    #[instrument(skip(self))]
    pub async fn add(&self, issue_id_or_key: &str, account_id: &str) -> Result<Response<()>> {
        self.client
            .call_empty(Method::POST, &Self::path(issue_id_or_key), Some(account_id))
            .await
    }

    /// Remove a watcher.
    #[instrument(skip(self))]
    pub async fn remove(&self, issue_id_or_key: &str, account_id: &str) -> Result<Response<()>> {
        let path = Query::new()
            .string("accountId", account_id)
            .apply(Self::path(issue_id_or_key));
        self.client.delete(&path).await
    }

    /// Make a user watch several issues.
    pub async fn bulk_add(
        &self,
        issue_ids: &[&str],
        account_id: &str,
    ) -> Result<Response<BulkWatchersResult>> {
        let body = json!({"issueIds": issue_ids, "accountId": account_id});
        self.client.post("/rest/api/3/issue/watching", &body).await
    }

    /// Stop a user watching several issues.
    pub async fn bulk_remove(
        &self,
        issue_ids: &[&str],
        account_id: &str,
    ) -> Result<Response<BulkWatchersResult>> {
        let body = json!({"issueIds": issue_ids, "accountId": account_id});
        self.client
            .call(Method::DELETE, "/rest/api/3/issue/watching", Some(&body))
            .await
    }
}
