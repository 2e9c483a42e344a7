//! Issue worklogs and worklog properties.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;

use super::{segment, PageOptions};
use crate::api::types::{EntityProperty, PropertyKeys, User, Visibility};
use crate::api::{AtlassianDoc, Client, Query, Response, Time};
use crate::error::Result;

/// Worklog operations.
#[derive(Debug, Clone, Copy)]
pub struct WorklogsService<'a> {
    pub(super) client: &'a Client,
}

/// Time logged against an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worklog {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_author: Option<User>,
    /// Comment in Atlassian Document Format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started: Option<Time>,
    /// Duration in Jira notation, such as `3h 20m`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<EntityProperty>>,
}

/// A page of worklogs on an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worklogs {
    #[serde(default)]
    pub start_at: i64,
    #[serde(default)]
    pub max_results: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub worklogs: Vec<Worklog>,
}

/// Body for adding or updating a worklog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started: Option<Time>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<EntityProperty>,
}

impl WorklogRequest {
    /// Log a duration in Jira notation, starting at `started`.
    pub fn new(time_spent: impl Into<String>, started: impl Into<Time>) -> Self {
        Self {
            time_spent: Some(time_spent.into()),
            started: Some(started.into()),
            ..Self::default()
        }
    }

    /// Attach a plain text comment.
    pub fn with_comment(mut self, text: &str) -> Self {
        self.comment = Some(AtlassianDoc::from_text(text).to_value());
        self
    }
}

/// Options for listing the worklogs of an issue.
#[derive(Debug, Clone, Default)]
pub struct ListWorklogsOptions {
    pub page: PageOptions,
    /// Only worklogs started at or after this UNIX time in milliseconds.
    pub started_after: Option<i64>,
    /// Only worklogs started before this UNIX time in milliseconds.
    pub started_before: Option<i64>,
    pub expand: Vec<String>,
}

/// Estimate handling and notification options for worklog changes.
#[derive(Debug, Clone, Default)]
pub struct WorklogOptions {
    /// Whether watchers are notified. Unset leaves the server default.
    pub notify_users: Option<bool>,
    /// `new`, `leave`, `manual` or `auto`.
    pub adjust_estimate: Option<String>,
    /// Remaining estimate when `adjust_estimate` is `new`.
    pub new_estimate: Option<String>,
    /// Amount to reduce the estimate by on add, with `manual`.
    pub reduce_by: Option<String>,
    /// Amount to increase the estimate by on delete, with `manual`.
    pub increase_by: Option<String>,
    pub override_editable_flag: bool,
    pub expand: Vec<String>,
}

impl WorklogOptions {
    fn query(&self) -> Query {
        Query::new()
            .opt_bool("notifyUsers", self.notify_users)
            .opt_string("adjustEstimate", self.adjust_estimate.as_deref())
            .opt_string("newEstimate", self.new_estimate.as_deref())
            .opt_string("reduceBy", self.reduce_by.as_deref())
            .opt_string("increaseBy", self.increase_by.as_deref())
            .flag("overrideEditableFlag", self.override_editable_flag)
            .joined("expand", &self.expand)
    }
}

/// A worklog ID with its change time, as returned by the updated/deleted feeds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogChange {
    pub worklog_id: i64,
    /// UNIX time in milliseconds.
    pub updated_time: i64,
}

/// One page of the worklog change feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogChanges {
    #[serde(default)]
    pub values: Vec<WorklogChange>,
    #[serde(default)]
    pub since: i64,
    #[serde(default)]
    pub until: i64,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
    #[serde(default)]
    pub last_page: bool,
}

impl<'a> WorklogsService<'a> {
    fn issue_path(issue_id_or_key: &str) -> String {
        format!("/rest/api/3/issue/{}/worklog", segment(issue_id_or_key))
    }

    fn worklog_path(issue_id_or_key: &str, worklog_id: &str) -> String {
        format!("{}/{}", Self::issue_path(issue_id_or_key), segment(worklog_id))
    }

    fn property_path(issue_id_or_key: &str, worklog_id: &str, property_key: &str) -> String {
        format!(
            "{}/properties/{}",
            Self::worklog_path(issue_id_or_key, worklog_id),
            segment(property_key)
        )
    }

    /// List the worklogs of an issue.
    #[instrument(skip(self, options))]
    pub async fn list(
        &self,
        issue_id_or_key: &str,
        options: &ListWorklogsOptions,
    ) -> Result<Response<Worklogs>> {
        let path = options
            .page
            .apply(Query::new())
            .opt_int("startedAfter", options.started_after)
            .opt_int("startedBefore", options.started_before)
            .joined("expand", &options.expand)
            .apply(Self::issue_path(issue_id_or_key));
        self.client.get(&path).await
    }

    /// Get a worklog.
    #[instrument(skip(self, expand))]
    pub async fn get(
        &self,
        issue_id_or_key: &str,
        worklog_id: &str,
        expand: &[&str],
    ) -> Result<Response<Worklog>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply(Self::worklog_path(issue_id_or_key, worklog_id));
        self.client.get(&path).await
    }

    /// Log work on an issue.
    #[instrument(skip(self, worklog, options))]
    pub async fn add(
        &self,
        issue_id_or_key: &str,
        worklog: &WorklogRequest,
        options: &WorklogOptions,
    ) -> Result<Response<Worklog>> {
        let path = options.query().apply(Self::issue_path(issue_id_or_key));
        self.client.post(&path, worklog).await
    }

    /// Update a worklog.
    #[instrument(skip(self, worklog, options))]
    pub async fn update(
        &self,
        issue_id_or_key: &str,
        worklog_id: &str,
        worklog: &WorklogRequest,
        options: &WorklogOptions,
    ) -> Result<Response<Worklog>> {
        let path = options
            .query()
            .apply(Self::worklog_path(issue_id_or_key, worklog_id));
        self.client.put(&path, worklog).await
    }

    /// Delete a worklog.
    #[instrument(skip(self, options))]
    pub async fn delete(
        &self,
        issue_id_or_key: &str,
        worklog_id: &str,
        options: &WorklogOptions,
    ) -> Result<Response<()>> {
        let path = options
            .query()
            .apply(Self::worklog_path(issue_id_or_key, worklog_id));
        self.client.delete(&path).await
    }

    /// Worklogs updated since a UNIX time in milliseconds.
    pub async fn list_updated(&self, since: i64, expand: &[&str]) -> Result<Response<WorklogChanges>> {
        let path = Query::new()
            .int("since", since)
            .joined("expand", expand)
            .apply("/rest/api/3/worklog/updated");
        self.client.get(&path).await
    }

    /// Worklogs deleted since a UNIX time in milliseconds.
    pub async fn list_deleted(&self, since: i64) -> Result<Response<WorklogChanges>> {
        let path = Query::new()
            .int("since", since)
            .apply("/rest/api/3/worklog/deleted");
        self.client.get(&path).await
    }

    /// Get worklogs by ID, across issues.
    pub async fn get_by_ids(&self, ids: &[i64], expand: &[&str]) -> Result<Response<Vec<Worklog>>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply("/rest/api/3/worklog/list");
        self.client.post(&path, &json!({ "ids": ids })).await
    }

    /// List the property keys of a worklog.
    pub async fn get_property_keys(
        &self,
        issue_id_or_key: &str,
        worklog_id: &str,
    ) -> Result<Response<Vec<String>>> {
        let path = format!("{}/properties", Self::worklog_path(issue_id_or_key, worklog_id));
        let response: Response<PropertyKeys> = self.client.get(&path).await?;
        Ok(response.map(|keys| keys.keys.into_iter().filter_map(|k| k.key).collect()))
    }

    /// Get a worklog property.
    pub async fn get_property(
        &self,
        issue_id_or_key: &str,
        worklog_id: &str,
        property_key: &str,
    ) -> Result<Response<EntityProperty>> {
        let path = Self::property_path(issue_id_or_key, worklog_id, property_key);
        self.client.get(&path).await
    }

    /// Set a worklog property to any JSON value.
    pub async fn set_property(
        &self,
        issue_id_or_key: &str,
        worklog_id: &str,
        property_key: &str,
        value: &Value,
    ) -> Result<Response<()>> {
        let path = Self::property_path(issue_id_or_key, worklog_id, property_key);
        self.client
            .call_empty(reqwest::Method::PUT, &path, Some(value))
            .await
    }

    /// Delete a worklog property.
    pub async fn delete_property(
        &self,
        issue_id_or_key: &str,
        worklog_id: &str,
        property_key: &str,
    ) -> Result<Response<()>> {
        let path = Self::property_path(issue_id_or_key, worklog_id, property_key);
        self.client.delete(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use chrono::{TimeZone, Utc};
    use mockito::Matcher;

    #[tokio::test]
    async fn test_add_worklog_with_estimate_options() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/issue/PROJ-1/worklog")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("adjustEstimate".into(), "manual".into()),
                Matcher::UrlEncoded("reduceBy".into(), "1h".into()),
                Matcher::UrlEncoded("notifyUsers".into(), "false".into()),
            ]))
            .match_body(Matcher::PartialJson(json!({
                "timeSpent": "1h",
                "started": "2024-01-15T09:00:00.000+0000"
            })))
            .with_status(201)
            .with_body(r#"{"id":"100","timeSpentSeconds":3600}"#)
            .create_async()
            .await;

        let started = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let request = WorklogRequest::new("1h", started).with_comment("pairing");
        let options = WorklogOptions {
            notify_users: Some(false),
            adjust_estimate: Some("manual".to_string()),
            reduce_by: Some("1h".to_string()),
            ..WorklogOptions::default()
        };
        let worklog = client
            .worklogs()
            .add("PROJ-1", &request, &options)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(worklog.time_spent_seconds, Some(3600));
        mock.assert_async().await;
    }

    #[test]
    fn test_default_options_send_nothing() {
        assert!(WorklogOptions::default().query().is_empty());
    }

    #[tokio::test]
    async fn test_list_updated() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/worklog/updated")
            .match_query(Matcher::UrlEncoded("since".into(), "1438013671562".into()))
            .with_status(200)
            .with_body(
                r#"{"values":[{"worklogId":103,"updatedTime":1438013671562}],"since":1438013671562,"until":1438013693136,"lastPage":true}"#,
            )
            .create_async()
            .await;

        let changes = client
            .worklogs()
            .list_updated(1438013671562, &[])
            .await
            .unwrap()
            .into_inner();
        assert_eq!(changes.values[0].worklog_id, 103);
        assert!(changes.last_page);
    }

    #[tokio::test]
    async fn test_delete_with_increase() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("DELETE", "/rest/api/3/issue/PROJ-1/worklog/100")
            .match_query(Matcher::UrlEncoded("increaseBy".into(), "30m".into()))
            .with_status(204)
            .create_async()
            .await;

        let options = WorklogOptions {
            adjust_estimate: Some("manual".to_string()),
            increase_by: Some("30m".to_string()),
            ..WorklogOptions::default()
        };
        client.worklogs().delete("PROJ-1", "100", &options).await.unwrap();
        mock.assert_async().await;
    }
}
