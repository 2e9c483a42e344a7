//! System and custom fields, custom field contexts and select options.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{segment, PageOptions};
use crate::api::types::{Page, Schema, Scope};
use crate::api::{Client, Query, Response, NO_BODY};
use crate::error::Result;

/// Field operations.
#[derive(Debug, Clone, Copy)]
pub struct FieldsService<'a> {
    pub(super) client: &'a Client,
}

/// A system or custom field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub custom: bool,
    #[serde(default)]
    pub orderable: bool,
    #[serde(default)]
    pub navigable: bool,
    #[serde(default)]
    pub searchable: bool,
    /// Names usable for the field in JQL.
    #[serde(default)]
    pub clause_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub searcher_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub untranslated_name: Option<String>,
}

/// Body for creating a custom field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFieldRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// e.g. `com.atlassian.jira.plugin.system.customfieldtypes:textfield`.
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searcher_key: Option<String>,
}

impl CreateFieldRequest {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            ..Self::default()
        }
    }
}

/// Body for changing a custom field. Unset values are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFieldRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searcher_key: Option<String>,
}

/// Options for [`FieldsService::search`].
#[derive(Debug, Clone, Default)]
pub struct SearchFieldsOptions {
    pub page: PageOptions,
    /// `custom` or `system`.
    pub types: Vec<String>,
    pub ids: Vec<String>,
    pub query: Option<String>,
    /// e.g. `name`, `-lastUsed`, `screensCount`.
    pub order_by: Option<String>,
    pub expand: Vec<String>,
}

/// A custom field context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_global_context: bool,
    #[serde(default)]
    pub is_any_issue_type: bool,
}

/// Options for [`FieldsService::list_contexts`].
#[derive(Debug, Clone, Default)]
pub struct ListContextsOptions {
    pub page: PageOptions,
    pub is_any_issue_type: bool,
    pub is_global_context: bool,
    pub context_ids: Vec<i64>,
}

/// Body for creating a field context. Empty lists mean global or any issue type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateContextRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub project_ids: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issue_type_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
struct UpdateContextBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

/// An option of a select or multi-select field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    /// Parent option ID for cascading selects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_id: Option<String>,
}

/// An option to create, or to update when `id` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOptionInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub value: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_id: Option<String>,
}

impl FieldOptionInput {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
struct OptionsBody<'a> {
    options: &'a [FieldOptionInput],
}

#[derive(Debug, Default, Deserialize)]
struct OptionsResult {
    #[serde(default)]
    options: Vec<FieldOption>,
}

impl<'a> FieldsService<'a> {
    fn path(field_id: &str) -> String {
        format!("/rest/api/3/field/{}", segment(field_id))
    }

    fn context_path(field_id: &str, context_id: i64) -> String {
        format!("{}/context/{}", Self::path(field_id), context_id)
    }

    /// List every system and custom field.
    pub async fn list(&self) -> Result<Response<Vec<Field>>> {
        self.client.get("/rest/api/3/field").await
    }

    /// Create a custom field.
    #[instrument(skip(self, field), fields(name = %field.name))]
    pub async fn create(&self, field: &CreateFieldRequest) -> Result<Response<Field>> {
        let response: Response<Field> = self.client.post("/rest/api/3/field", field).await?;
        debug!(id = ?response.data().id, "Custom field created");
        Ok(response)
    }

    /// Update a custom field.
    #[instrument(skip(self, field))]
    pub async fn update(&self, field_id: &str, field: &UpdateFieldRequest) -> Result<Response<()>> {
        self.client
            .call_empty(Method::PUT, &Self::path(field_id), Some(field))
            .await
    }

    /// Delete a custom field.
    ///
    /// Jira deletes fields asynchronously; the response carries the task
    /// location in its headers.
    #[instrument(skip(self))]
    pub async fn delete(&self, field_id: &str) -> Result<Response<()>> {
        self.client.delete(&Self::path(field_id)).await
    }

    /// Search fields, one page at a time.
    #[instrument(skip(self, options))]
    pub async fn search(&self, options: &SearchFieldsOptions) -> Result<Response<Page<Field>>> {
        let query = options
            .page
            .apply(Query::new())
            .repeated("type", &options.types)
            .repeated("id", &options.ids)
            .opt_string("query", options.query.as_deref())
            .opt_string("orderBy", options.order_by.as_deref())
            .joined("expand", &options.expand);
        self.client
            .get(&query.apply("/rest/api/3/field/search"))
            .await
    }

    /// Move a custom field to the trash.
    #[instrument(skip(self))]
    pub async fn trash(&self, field_id: &str) -> Result<Response<()>> {
        let path = format!("{}/trash", Self::path(field_id));
        self.client.call_empty(Method::POST, &path, NO_BODY).await
    }

    /// Restore a custom field from the trash.
    #[instrument(skip(self))]
    pub async fn restore(&self, field_id: &str) -> Result<Response<()>> {
        let path = format!("{}/restore", Self::path(field_id));
        self.client.call_empty(Method::POST, &path, NO_BODY).await
    }

    /// List the contexts of a custom field.
    pub async fn list_contexts(
        &self,
        field_id: &str,
        options: &ListContextsOptions,
    ) -> Result<Response<Page<FieldContext>>> {
        let query = options
            .page
            .apply(Query::new())
            .flag("isAnyIssueType", options.is_any_issue_type)
            .flag("isGlobalContext", options.is_global_context)
            .repeated("contextId", &options.context_ids);
        let path = query.apply(format!("{}/context", Self::path(field_id)));
        self.client.get(&path).await
    }

    /// Create a context for a custom field.
    #[instrument(skip(self, context))]
    pub async fn create_context(
        &self,
        field_id: &str,
        context: &CreateContextRequest,
    ) -> Result<Response<FieldContext>> {
        let path = format!("{}/context", Self::path(field_id));
        self.client.post(&path, context).await
    }

    /// Rename a context or change its description.
    #[instrument(skip(self))]
    pub async fn update_context(
        &self,
        field_id: &str,
        context_id: i64,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Response<()>> {
        let body = UpdateContextBody { name, description };
        self.client
            .call_empty(Method::PUT, &Self::context_path(field_id, context_id), Some(&body))
            .await
    }

    /// Delete a context.
    #[instrument(skip(self))]
    pub async fn delete_context(&self, field_id: &str, context_id: i64) -> Result<Response<()>> {
        self.client
            .delete(&Self::context_path(field_id, context_id))
            .await
    }

    /// List the options of a context.
    pub async fn list_context_options(
        &self,
        field_id: &str,
        context_id: i64,
        option_ids: &[i64],
        page: PageOptions,
    ) -> Result<Response<Page<FieldOption>>> {
        let query = page.apply(Query::new()).repeated("optionId", option_ids);
        let path = query.apply(format!("{}/option", Self::context_path(field_id, context_id)));
        self.client.get(&path).await
    }

    /// Add options to a context.
    #[instrument(skip(self, options), fields(count = options.len()))]
    pub async fn create_context_options(
        &self,
        field_id: &str,
        context_id: i64,
        options: &[FieldOptionInput],
    ) -> Result<Response<Vec<FieldOption>>> {
        let path = format!("{}/option", Self::context_path(field_id, context_id));
        let response: Response<OptionsResult> =
            self.client.post(&path, &OptionsBody { options }).await?;
        Ok(response.map(|r| r.options))
    }

    /// Change options of a context. Each input must carry its `id`.
    #[instrument(skip(self, options), fields(count = options.len()))]
    pub async fn update_context_options(
        &self,
        field_id: &str,
        context_id: i64,
        options: &[FieldOptionInput],
    ) -> Result<Response<Vec<FieldOption>>> {
        let path = format!("{}/option", Self::context_path(field_id, context_id));
        let response: Response<OptionsResult> =
            self.client.put(&path, &OptionsBody { options }).await?;
        Ok(response.map(|r| r.options))
    }

    /// Delete an option from a context.
    #[instrument(skip(self))]
    pub async fn delete_context_option(
        &self,
        field_id: &str,
        context_id: i64,
        option_id: i64,
    ) -> Result<Response<()>> {
        let path = format!(
            "{}/option/{}",
            Self::context_path(field_id, context_id),
            option_id
        );
        self.client.delete(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_fields() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/field")
            .with_status(200)
            .with_body(r#"[
                {"id":"summary","name":"Summary","custom":false,"navigable":true,
                 "clauseNames":["summary"],"schema":{"type":"string","system":"summary"}},
                {"id":"customfield_10010","name":"Story Points","custom":true,
                 "schema":{"type":"number","custom":"com.atlassian.jira.plugin.system.customfieldtypes:float","customId":10010}}
            ]"#)
            .create_async()
            .await;

        let fields = client.fields().list().await.unwrap().into_inner();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].clause_names, vec!["summary"]);
        assert!(fields[1].custom);
        assert_eq!(fields[1].schema.as_ref().unwrap().custom_id, Some(10010));
    }

    #[tokio::test]
    async fn test_create_field_sends_type() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/field")
            .match_body(Matcher::Json(json!({
                "name": "Sprint goal",
                "type": "com.atlassian.jira.plugin.system.customfieldtypes:textfield"
            })))
            .with_status(201)
            .with_body(r#"{"id":"customfield_10100","name":"Sprint goal","custom":true}"#)
            .create_async()
            .await;

        let request = CreateFieldRequest::new(
            "Sprint goal",
            "com.atlassian.jira.plugin.system.customfieldtypes:textfield",
        );
        let field = client.fields().create(&request).await.unwrap().into_inner();
        assert_eq!(field.id.as_deref(), Some("customfield_10100"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_fields() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/field/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("type".into(), "custom".into()),
                Matcher::UrlEncoded("query".into(), "points".into()),
                Matcher::UrlEncoded("maxResults".into(), "10".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"startAt":0,"maxResults":10,"total":1,"isLast":true,
                "values":[{"id":"customfield_10010","name":"Story Points"}]}"#)
            .create_async()
            .await;

        let options = SearchFieldsOptions {
            page: PageOptions::new(0, 10),
            types: vec!["custom".to_string()],
            query: Some("points".to_string()),
            ..SearchFieldsOptions::default()
        };
        let page = client.fields().search(&options).await.unwrap().into_inner();
        assert_eq!(page.total, 1);
        assert!(!page.has_more());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_trash_and_restore() {
        let (mut server, client) = setup().await;
        let trash = server
            .mock("POST", "/rest/api/3/field/customfield_10010/trash")
            .with_status(204)
            .create_async()
            .await;
        let restore = server
            .mock("POST", "/rest/api/3/field/customfield_10010/restore")
            .with_status(204)
            .create_async()
            .await;

        client.fields().trash("customfield_10010").await.unwrap();
        client.fields().restore("customfield_10010").await.unwrap();
        trash.assert_async().await;
        restore.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_context_sends_only_given_values() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("PUT", "/rest/api/3/field/customfield_10010/context/10100")
            .match_body(Matcher::Json(json!({"name": "Default"})))
            .with_status(204)
            .create_async()
            .await;

        client
            .fields()
            .update_context("customfield_10010", 10100, Some("Default"), None)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_context_options() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/field/customfield_10020/context/10100/option")
            .match_body(Matcher::Json(json!({
                "options": [{"value": "Red"}, {"value": "Blue", "disabled": true}]
            })))
            .with_status(200)
            .with_body(r#"{"options":[{"id":"1","value":"Red","disabled":false},
                {"id":"2","value":"Blue","disabled":true}]}"#)
            .create_async()
            .await;

        let inputs = [
            FieldOptionInput::new("Red"),
            FieldOptionInput {
                disabled: true,
                ..FieldOptionInput::new("Blue")
            },
        ];
        let options = client
            .fields()
            .create_context_options("customfield_10020", 10100, &inputs)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(options.len(), 2);
        assert!(options[1].disabled);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_context_options() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/field/customfield_10020/context/10100/option")
            .match_query(Matcher::UrlEncoded("optionId".into(), "1".into()))
            .with_status(200)
            .with_body(r#"{"startAt":0,"maxResults":100,"total":1,"isLast":true,
                "values":[{"id":"1","value":"Red"}]}"#)
            .create_async()
            .await;

        let page = client
            .fields()
            .list_context_options("customfield_10020", 10100, &[1], PageOptions::default())
            .await
            .unwrap()
            .into_inner();
        assert_eq!(page.values[0].value.as_deref(), Some("Red"));
    }
}
