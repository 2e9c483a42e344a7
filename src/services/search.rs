//! JQL issue search and the issue picker.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use super::issues::Issue;
use crate::api::{Client, Query, Response};
use crate::error::Result;

/// Issue search.
#[derive(Debug, Clone, Copy)]
pub struct SearchService<'a> {
    pub(super) client: &'a Client,
}

/// Query options for [`SearchService::search`] and [`SearchService::search_legacy`].
///
/// Zero and empty values are left out. `next_page_token` is only understood
/// by the token-paged endpoint; `start_at` only by the legacy one.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub fields: Vec<String>,
    pub expand: Vec<String>,
    pub properties: Vec<String>,
    pub fields_by_keys: bool,
    pub max_results: u32,
    pub next_page_token: Option<String>,
    pub start_at: u32,
    /// `strict`, `warn` or `none`.
    pub validate_query: Option<String>,
}

/// A page of search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<String>,
    #[serde(default)]
    pub start_at: i64,
    #[serde(default)]
    pub max_results: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub issues: Vec<Issue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warning_messages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<HashMap<String, Value>>,
    /// Token for the next page; absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_last: Option<bool>,
}

impl SearchResult {
    /// Check if there are more pages of results.
    pub fn has_more(&self) -> bool {
        if self.next_page_token.is_some() {
            return true;
        }
        if let Some(is_last) = self.is_last {
            return !is_last;
        }
        self.start_at + (self.issues.len() as i64) < self.total
    }

    /// Get the starting index for the next offset-paged request.
    pub fn next_start(&self) -> i64 {
        self.start_at + self.issues.len() as i64
    }
}

/// JSON body for [`SearchService::search_post`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub jql: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expand: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fields_by_keys: bool,
}

impl SearchRequest {
    /// A request for `jql` with the server's default fields.
    pub fn new(jql: impl Into<String>) -> Self {
        Self {
            jql: jql.into(),
            ..Self::default()
        }
    }
}

/// Options for the issue picker.
#[derive(Debug, Clone, Default)]
pub struct PickerOptions {
    /// Text to match against issue keys and summaries.
    pub query: Option<String>,
    pub current_jql: Option<String>,
    pub current_issue_key: Option<String>,
    pub current_project_id: Option<String>,
    pub show_sub_tasks: bool,
    pub show_sub_task_parent: bool,
}

/// Issue picker suggestions, grouped into sections such as history and
/// current search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerSuggestions {
    #[serde(default)]
    pub sections: Vec<PickerSection>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default)]
    pub issues: Vec<PickerIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerIssue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Key with the matched part highlighted in HTML.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_text: Option<String>,
}

/// Issue IDs to check against a list of JQL queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub issue_ids: Vec<i64>,
    pub jqls: Vec<String>,
}

/// One entry per JQL query, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(default)]
    pub matches: Vec<MatchEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchEntry {
    #[serde(default)]
    pub matched_issues: Vec<i64>,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl<'a> SearchService<'a> {
    /// Search for issues using JQL with token paging.
    ///
    /// Pass the returned `next_page_token` back in `options` to fetch the
    /// following page.
    #[instrument(skip(self, options))]
    pub async fn search(
        &self,
        jql: &str,
        options: Option<&SearchOptions>,
    ) -> Result<Response<SearchResult>> {
        let mut query = Query::new().string("jql", jql);
        if let Some(o) = options {
            query = query
                .int("maxResults", o.max_results)
                .opt_string("nextPageToken", o.next_page_token.as_deref())
                .int("startAt", o.start_at)
                .repeated("fields", &o.fields)
                .repeated("expand", &o.expand)
                .repeated("properties", &o.properties)
                .opt_string("validateQuery", o.validate_query.as_deref())
                .flag("fieldsByKeys", o.fields_by_keys);
        }

        let response: Response<SearchResult> =
            self.client.get(&query.apply("/rest/api/3/search/jql")).await?;
        debug!(
            count = response.data().issues.len(),
            more = response.data().has_more(),
            "Search complete"
        );
        Ok(response)
    }

    /// Search with the parameters in a JSON body, for long JQL.
    #[instrument(skip(self, request))]
    pub async fn search_post(&self, request: &SearchRequest) -> Result<Response<SearchResult>> {
        self.client.post("/rest/api/3/search/jql", request).await
    }

    /// Search using the offset-paged `/search` endpoint.
    #[instrument(skip(self, options))]
    pub async fn search_legacy(
        &self,
        jql: &str,
        options: Option<&SearchOptions>,
    ) -> Result<Response<SearchResult>> {
        let mut query = Query::new().string("jql", jql);
        if let Some(o) = options {
            query = query
                .int("maxResults", o.max_results)
                .int("startAt", o.start_at)
                .repeated("fields", &o.fields)
                .repeated("expand", &o.expand);
        }
        self.client.get(&query.apply("/rest/api/3/search")).await
    }

    /// Suggest issues for a picker.
    pub async fn picker(&self, options: &PickerOptions) -> Result<Response<PickerSuggestions>> {
        let path = Query::new()
            .opt_string("query", options.query.as_deref())
            .opt_string("currentJQL", options.current_jql.as_deref())
            .opt_string("currentIssueKey", options.current_issue_key.as_deref())
            .opt_string("currentProjectId", options.current_project_id.as_deref())
            .flag("showSubTasks", options.show_sub_tasks)
            .flag("showSubTaskParent", options.show_sub_task_parent)
            .apply("/rest/api/3/issue/picker");
        self.client.get(&path).await
    }

    /// Check which issues match each JQL query.
    #[instrument(skip(self, request))]
    pub async fn match_issues(&self, request: &MatchRequest) -> Result<Response<MatchResult>> {
        self.client.post("/rest/api/3/jql/match", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_has_more_offset_paging() {
        let result = SearchResult {
            start_at: 0,
            total: 100,
            issues: vec![Issue::default(); 50],
            ..SearchResult::default()
        };
        assert!(result.has_more());
        assert_eq!(result.next_start(), 50);

        let last = SearchResult {
            start_at: 50,
            total: 100,
            issues: vec![Issue::default(); 50],
            ..SearchResult::default()
        };
        assert!(!last.has_more());
    }

    #[test]
    fn test_has_more_token_paging() {
        let result = SearchResult {
            next_page_token: Some("abc".to_string()),
            ..SearchResult::default()
        };
        assert!(result.has_more());
        assert!(!SearchResult::default().has_more());
    }

    #[tokio::test]
    async fn test_search_sends_jql_and_repeats_fields() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/search/jql")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("jql".into(), "project = PROJ AND status != Done".into()),
                Matcher::Regex("fields=summary&fields=status".to_string()),
                Matcher::UrlEncoded("maxResults".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"issues":[{"key":"PROJ-1"},{"key":"PROJ-2"}],"nextPageToken":"tok"}"#)
            .create_async()
            .await;

        let options = SearchOptions {
            fields: vec!["summary".to_string(), "status".to_string()],
            max_results: 2,
            ..SearchOptions::default()
        };
        let response = client
            .search()
            .search("project = PROJ AND status != Done", Some(&options))
            .await
            .unwrap();
        assert_eq!(response.data().issues.len(), 2);
        assert_eq!(response.pagination().next_page_token.as_deref(), Some("tok"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_post_does_not_escape_html() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/search/jql")
            .match_body(Matcher::Regex(r#""jql":"created >= -1d & summary ~ \\"<b>\\"""#.to_string()))
            .with_status(200)
            .with_body(r#"{"issues":[]}"#)
            .create_async()
            .await;

        let request = SearchRequest::new(r#"created >= -1d & summary ~ "<b>""#);
        client.search().search_post(&request).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_legacy_offset_paging() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("jql".into(), "assignee = currentUser()".into()),
                Matcher::UrlEncoded("startAt".into(), "50".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"startAt":50,"maxResults":50,"total":60,"issues":[{"key":"A-1"}]}"#)
            .create_async()
            .await;

        let options = SearchOptions {
            start_at: 50,
            ..SearchOptions::default()
        };
        let response = client
            .search()
            .search_legacy("assignee = currentUser()", Some(&options))
            .await
            .unwrap();
        assert_eq!(response.pagination().total, Some(60));
        assert_eq!(response.data().next_start(), 51);
    }

    #[tokio::test]
    async fn test_picker() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/issue/picker")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "login".into()),
                Matcher::UrlEncoded("showSubTasks".into(), "true".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"sections":[{"label":"History Search","id":"hs","issues":[
                {"id":10001,"key":"PROJ-1","keyHtml":"PROJ-1","summaryText":"Fix login"}]}]}"#)
            .create_async()
            .await;

        let options = PickerOptions {
            query: Some("login".to_string()),
            show_sub_tasks: true,
            ..PickerOptions::default()
        };
        let suggestions = client.search().picker(&options).await.unwrap().into_inner();
        assert_eq!(
            suggestions.sections[0].issues[0].summary_text.as_deref(),
            Some("Fix login")
        );
    }

    #[tokio::test]
    async fn test_match_issues() {
        let (mut server, client) = setup().await;
        server
            .mock("POST", "/rest/api/3/jql/match")
            .match_body(Matcher::Json(json!({"issueIds": [10001, 10002], "jqls": ["project = A"]})))
            .with_status(200)
            .with_body(r#"{"matches":[{"matchedIssues":[10001],"errors":[]}]}"#)
            .create_async()
            .await;

        let request = MatchRequest {
            issue_ids: vec![10001, 10002],
            jqls: vec!["project = A".to_string()],
        };
        let result = client.search().match_issues(&request).await.unwrap().into_inner();
        assert_eq!(result.matches[0].matched_issues, vec![10001]);
    }
}
