//! JQL tooling: autocomplete, parsing, sanitizing and function precomputations.

use std::collections::HashMap;
use std::fmt;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use super::search::{MatchRequest, MatchResult};
use super::PageOptions;
use crate::api::{Client, Query, Response};
use crate::error::Result;

/// JQL operations.
#[derive(Debug, Clone, Copy)]
pub struct JqlService<'a> {
    pub(super) client: &'a Client,
}

/// Fields, functions and reserved words usable in JQL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteData {
    #[serde(default)]
    pub visible_field_names: Vec<FieldReference>,
    #[serde(default)]
    pub visible_function_names: Vec<FunctionReference>,
    #[serde(default)]
    pub jql_reserved_words: Vec<String>,
}

/// A field as it can be referenced in JQL.
///
/// Jira reports the boolean attributes as the strings `"true"` and `"false"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orderable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searchable: Option<String>,
    /// Custom field ID, e.g. `cf[10061]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cfid: Option<String>,
    #[serde(default)]
    pub operators: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

/// A JQL function such as `currentUser()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionReference {
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_list: Option<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

/// What to suggest values for.
#[derive(Debug, Clone, Default)]
pub struct SuggestionsOptions {
    pub field_name: Option<String>,
    /// Partial value typed so far.
    pub field_value: Option<String>,
    /// e.g. `by`, `from`, `to` for `was` and `changed` predicates.
    pub predicate_name: Option<String>,
    pub predicate_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutocompleteSuggestion {
    #[serde(default)]
    pub value: String,
    /// May contain `<b>` tags around the matched part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Suggestions {
    #[serde(default)]
    results: Vec<AutocompleteSuggestion>,
}

/// How strictly [`JqlService::parse`] validates queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Validation {
    /// Fail on syntax errors and unknown fields or values.
    #[default]
    Strict,
    /// Report unknown fields and values as warnings.
    Warn,
    /// Syntax only.
    None,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Validation::Strict => "strict",
            Validation::Warn => "warn",
            Validation::None => "none",
        };
        f.write_str(value)
    }
}

/// A query as parsed by Jira.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<QueryStructure>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ParsedQuery {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStructure {
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Clause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
}

/// A node in the parsed `where` tree: a field comparison, a compound of
/// clauses joined by `operator`, or a `not`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<ClauseField>,
    /// `=`, `in`, `was`... for comparisons, `and`/`or` for compounds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operand: Option<Operand>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clauses: Vec<Clause>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseField {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property: Vec<FieldProperty>,
}

/// An entity property path such as `issue.property[myProp].a.b`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldProperty {
    #[serde(default)]
    pub entity: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
}

/// A value, list, function call or keyword on the right of an operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Operand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoded_operand: Option<String>,
}

/// A history predicate such as `by currentUser()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    #[serde(default)]
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operand: Option<Operand>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    #[serde(default)]
    pub fields: Vec<OrderByField>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderByField {
    #[serde(default)]
    pub field: ClauseField,
    /// `asc` or `desc`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ParsedQueries {
    #[serde(default)]
    queries: Vec<ParsedQuery>,
}

/// Outcome of [`JqlService::validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// A query to sanitize for a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizeInput {
    pub query: String,
    /// Sanitize as seen by this user; the caller when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

impl SanitizeInput {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            account_id: None,
        }
    }
}

/// A query with references the user cannot see replaced by IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizedQuery {
    #[serde(default)]
    pub initial_query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sanitized_query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<SanitizeErrors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SanitizeErrors {
    #[serde(default)]
    pub error_messages: Vec<String>,
    #[serde(default)]
    pub errors: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
struct SanitizedQueries {
    #[serde(default)]
    queries: Vec<SanitizedQuery>,
}

/// A cached value for a JQL function provided by an app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionPrecomputation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A page of precomputations. Paged by token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionPrecomputations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default)]
    pub values: Vec<FunctionPrecomputation>,
}

/// Filters for [`JqlService::get_function_precomputations`].
#[derive(Debug, Clone, Default)]
pub struct PrecomputationsOptions {
    pub function_keys: Vec<String>,
    pub page: PageOptions,
    /// e.g. `functionKey`, `-updated`.
    pub order_by: Option<String>,
    /// `USED`, `UNUSED` or `ALL`.
    pub filter: Option<String>,
}

/// A new value, or an error, for one precomputation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrecomputationUpdate {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Queries with user names and keys replaced by account IDs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertedQueries {
    /// Converted queries, in request order.
    #[serde(default)]
    pub query_strings: Vec<String>,
    #[serde(default)]
    pub queries_with_unknown_users: Vec<QueryWithUnknownUsers>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryWithUnknownUsers {
    #[serde(default)]
    pub original_query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_query: Option<String>,
}

const AUTOCOMPLETE_PATH: &str = "/rest/api/3/jql/autocompletedata";
const COMPUTATION_PATH: &str = "/rest/api/3/jql/function/computation";

impl<'a> JqlService<'a> {
    /// Get reference data for building JQL.
    pub async fn get_autocomplete_data(&self) -> Result<Response<AutocompleteData>> {
        self.client.get(AUTOCOMPLETE_PATH).await
    }

    /// Get value suggestions for a field or predicate.
    pub async fn get_suggestions(
        &self,
        options: &SuggestionsOptions,
    ) -> Result<Response<Vec<AutocompleteSuggestion>>> {
        let path = Query::new()
            .opt_string("fieldName", options.field_name.as_deref())
            .opt_string("fieldValue", options.field_value.as_deref())
            .opt_string("predicateName", options.predicate_name.as_deref())
            .opt_string("predicateValue", options.predicate_value.as_deref())
            .apply(format!("{}/suggestions", AUTOCOMPLETE_PATH));
        let response: Response<Suggestions> = self.client.get(&path).await?;
        Ok(response.map(|r| r.results))
    }

    /// Get every field that can be referenced in JQL.
    pub async fn get_field_reference_data(&self) -> Result<Response<Vec<FieldReference>>> {
        self.get_visible_fields(None, None).await
    }

    /// Get the fields visible in a project, optionally narrowed to an issue type.
    pub async fn get_visible_fields(
        &self,
        project_key: Option<&str>,
        issue_type_id: Option<&str>,
    ) -> Result<Response<Vec<FieldReference>>> {
        let path = Query::new()
            .opt_string("projectKey", project_key)
            .opt_string("issueTypeId", issue_type_id)
            .apply(format!("{}/fields", AUTOCOMPLETE_PATH));
        self.client.get(&path).await
    }

    /// Parse queries into their abstract syntax trees.
    #[instrument(skip(self, queries), fields(count = queries.len()))]
    pub async fn parse(&self, queries: &[&str], validation: Validation) -> Result<Response<Vec<ParsedQuery>>> {
        let path = Query::new()
            .set("validation", validation)
            .apply("/rest/api/3/jql/parse");
        let body = json!({ "queries": queries });
        let response: Response<ParsedQueries> = self.client.post(&path, &body).await?;
        Ok(response.map(|r| r.queries))
    }

    /// Check a single query with strict validation.
    pub async fn validate(&self, jql: &str) -> Result<Response<ValidationResult>> {
        let response = self.parse(&[jql], Validation::Strict).await?;
        Ok(response.map(|queries| {
            let errors = queries
                .into_iter()
                .next()
                .map(|q| q.errors)
                .unwrap_or_default();
            ValidationResult {
                valid: errors.is_empty(),
                errors,
            }
        }))
    }

    /// Replace references a user cannot see with IDs.
    pub async fn sanitize(&self, queries: &[SanitizeInput]) -> Result<Response<Vec<SanitizedQuery>>> {
        let body = json!({ "queries": queries });
        let response: Response<SanitizedQueries> =
            self.client.post("/rest/api/3/jql/sanitize", &body).await?;
        Ok(response.map(|r| r.queries))
    }

    /// Get precomputed values of app-provided JQL functions.
    pub async fn get_function_precomputations(
        &self,
        options: &PrecomputationsOptions,
    ) -> Result<Response<FunctionPrecomputations>> {
        let path = options
            .page
            .apply(Query::new().repeated("functionKey", &options.function_keys))
            .opt_string("orderBy", options.order_by.as_deref())
            .opt_string("filter", options.filter.as_deref())
            .apply(COMPUTATION_PATH);
        self.client.get(&path).await
    }

    /// Store new values for app-provided JQL functions.
    #[instrument(skip(self, updates), fields(count = updates.len()))]
    pub async fn update_function_precomputations(
        &self,
        updates: &[PrecomputationUpdate],
    ) -> Result<Response<()>> {
        let body = json!({ "values": updates });
        let response = self
            .client
            .call_empty(Method::POST, COMPUTATION_PATH, Some(&body))
            .await?;
        debug!(count = updates.len(), "Function precomputations updated");
        Ok(response)
    }

    /// Check which issues match each query.
    pub async fn match_issues(&self, request: &MatchRequest) -> Result<Response<MatchResult>> {
        self.client.search().match_issues(request).await
    }

    /// Convert user names and keys in queries to account IDs.
    pub async fn migrate(&self, queries: &[&str]) -> Result<Response<ConvertedQueries>> {
        let body = json!({ "queryStrings": queries });
        self.client.post("/rest/api/3/jql/pdcleaner", &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_suggestions() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/jql/autocompletedata/suggestions")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("fieldName".into(), "reporter".into()),
                Matcher::UrlEncoded("fieldValue".into(), "Ma".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"results":[{"value":"Mary","displayName":"<b>Ma</b>ry - mary@example.com"}]}"#)
            .create_async()
            .await;

        let options = SuggestionsOptions {
            field_name: Some("reporter".to_string()),
            field_value: Some("Ma".to_string()),
            ..SuggestionsOptions::default()
        };
        let suggestions = client.jql().get_suggestions(&options).await.unwrap().into_inner();
        assert_eq!(suggestions[0].value, "Mary");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_visible_fields() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/jql/autocompletedata/fields")
            .match_query(Matcher::UrlEncoded("projectKey".into(), "PROJ".into()))
            .with_status(200)
            .with_body(r#"[{"value":"summary","displayName":"Summary","orderable":"true",
                "searchable":"true","operators":["~","!~"],"types":["java.lang.String"]}]"#)
            .create_async()
            .await;

        let fields = client
            .jql()
            .get_visible_fields(Some("PROJ"), None)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(fields[0].operators, vec!["~", "!~"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_parse_structure() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/jql/parse")
            .match_query(Matcher::UrlEncoded("validation".into(), "warn".into()))
            .match_body(Matcher::Json(json!({"queries": ["summary ~ test AND project = PROJ ORDER BY key desc"]})))
            .with_status(200)
            .with_body(r#"{"queries":[{"query":"summary ~ test AND project = PROJ ORDER BY key desc",
                "structure":{"where":{"clauses":[
                    {"field":{"name":"summary"},"operator":"~","operand":{"value":"test"}},
                    {"field":{"name":"project"},"operator":"=","operand":{"value":"PROJ"}}],
                  "operator":"and"},
                 "orderBy":{"fields":[{"field":{"name":"key"},"direction":"desc"}]}}}]}"#)
            .create_async()
            .await;

        let parsed = client
            .jql()
            .parse(&["summary ~ test AND project = PROJ ORDER BY key desc"], Validation::Warn)
            .await
            .unwrap()
            .into_inner();
        let structure = parsed[0].structure.as_ref().unwrap();
        let clause = structure.where_clause.as_ref().unwrap();
        assert_eq!(clause.operator.as_deref(), Some("and"));
        assert_eq!(clause.clauses.len(), 2);
        assert_eq!(
            clause.clauses[1].operand.as_ref().and_then(|o| o.value.as_deref()),
            Some("PROJ")
        );
        assert_eq!(
            structure.order_by.as_ref().unwrap().fields[0].direction.as_deref(),
            Some("desc")
        );
        assert!(parsed[0].is_valid());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_validate_reports_errors() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/jql/parse")
            .match_query(Matcher::UrlEncoded("validation".into(), "strict".into()))
            .with_status(200)
            .with_body(r#"{"queries":[{"query":"invalid query","errors":[
                "Error in the JQL Query: Expecting operator but got 'query'."]}]}"#)
            .create_async()
            .await;

        let result = client.jql().validate("invalid query").await.unwrap().into_inner();
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_validate_accepts_clean_query() {
        let (mut server, client) = setup().await;
        server
            .mock("POST", "/rest/api/3/jql/parse")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"queries":[{"query":"project = PROJ"}]}"#)
            .create_async()
            .await;

        let result = client.jql().validate("project = PROJ").await.unwrap().into_inner();
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_sanitize() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/jql/sanitize")
            .match_body(Matcher::Json(json!({
                "queries": [{"query": "project = 'Sample project'", "accountId": "5b10ac8d82e05b22cc7d4ef5"}]
            })))
            .with_status(200)
            .with_body(r#"{"queries":[{"initialQuery":"project = 'Sample project'",
                "sanitizedQuery":"project = 12345","accountId":"5b10ac8d82e05b22cc7d4ef5"}]}"#)
            .create_async()
            .await;

        let input = SanitizeInput {
            account_id: Some("5b10ac8d82e05b22cc7d4ef5".to_string()),
            ..SanitizeInput::new("project = 'Sample project'")
        };
        let sanitized = client.jql().sanitize(&[input]).await.unwrap().into_inner();
        assert_eq!(sanitized[0].sanitized_query.as_deref(), Some("project = 12345"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_precomputations() {
        let (mut server, client) = setup().await;
        let get = server
            .mock("GET", "/rest/api/3/jql/function/computation")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("functionKey".into(), "app/issuesWithText".into()),
                Matcher::UrlEncoded("filter".into(), "USED".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"nextPageToken":"abc","values":[{"id":"cf75a1d0","arguments":["Test"],
                "field":"issue","operator":"in","value":"issue in (TEST-1, TEST-2)"}]}"#)
            .create_async()
            .await;
        let update = server
            .mock("POST", "/rest/api/3/jql/function/computation")
            .match_body(Matcher::Json(json!({
                "values": [{"id": "cf75a1d0", "value": "issue in (TEST-1)"}]
            })))
            .with_status(204)
            .create_async()
            .await;

        let options = PrecomputationsOptions {
            function_keys: vec!["app/issuesWithText".to_string()],
            filter: Some("USED".to_string()),
            ..PrecomputationsOptions::default()
        };
        let page = client
            .jql()
            .get_function_precomputations(&options)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(page.next_page_token.as_deref(), Some("abc"));
        assert_eq!(page.values[0].arguments, vec!["Test"]);

        let updates = [PrecomputationUpdate {
            id: "cf75a1d0".to_string(),
            value: Some("issue in (TEST-1)".to_string()),
            error: None,
        }];
        client
            .jql()
            .update_function_precomputations(&updates)
            .await
            .unwrap();
        get.assert_async().await;
        update.assert_async().await;
    }

    #[tokio::test]
    async fn test_migrate() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/jql/pdcleaner")
            .match_body(Matcher::Json(json!({"queryStrings": ["assignee = mia"]})))
            .with_status(200)
            .with_body(r#"{"queryStrings":["assignee = 5b10ac8d82e05b22cc7d4ef5"],
                "queriesWithUnknownUsers":[]}"#)
            .create_async()
            .await;

        let converted = client.jql().migrate(&["assignee = mia"]).await.unwrap().into_inner();
        assert_eq!(converted.query_strings, vec!["assignee = 5b10ac8d82e05b22cc7d4ef5"]);
        assert!(converted.queries_with_unknown_users.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_match_issues() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/jql/match")
            .match_body(Matcher::Json(json!({"issueIds": [10001, 10002], "jqls": ["project = PROJ"]})))
            .with_status(200)
            .with_body(r#"{"matches":[{"matchedIssues":[10001],"errors":[]}]}"#)
            .create_async()
            .await;

        let request = MatchRequest {
            issue_ids: vec![10001, 10002],
            jqls: vec!["project = PROJ".to_string()],
        };
        let result = client.jql().match_issues(&request).await.unwrap().into_inner();
        assert_eq!(result.matches[0].matched_issues, vec![10001]);
        mock.assert_async().await;
    }
}
