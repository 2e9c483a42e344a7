//! Screens, screen tabs, tab fields and screen schemes.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use super::{segment, PageOptions};
use crate::api::types::{Page, Scope};
use crate::api::{Client, Query, Response, NO_BODY};
use crate::error::Result;

/// Screen operations.
#[derive(Debug, Clone, Copy)]
pub struct ScreensService<'a> {
    pub(super) client: &'a Client,
}

/// A screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

/// Options for [`ScreensService::list`].
#[derive(Debug, Clone, Default)]
pub struct ListScreensOptions {
    pub page: PageOptions,
    pub ids: Vec<i64>,
    pub query_string: Option<String>,
    /// `GLOBAL`, `TEMPLATE` or `PROJECT`.
    pub scope: Vec<String>,
    pub order_by: Option<String>,
}

/// Body for creating or changing a screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScreenRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ScreenRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: None,
        }
    }
}

/// A tab on a screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenTab {
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A field on a screen tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenTabField {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Where to move a field on a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPosition {
    Earlier,
    Later,
    First,
    Last,
    /// After the field with this ID.
    After(String),
}

/// A screen scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenScheme {
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screens: Option<ScreenTypes>,
}

/// The screen used for each issue operation. `default` covers the unset ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenTypes {
    #[serde(default)]
    pub default: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create: Option<i64>,
}

/// Options for [`ScreensService::list_schemes`].
#[derive(Debug, Clone, Default)]
pub struct ListScreenSchemesOptions {
    pub page: PageOptions,
    pub ids: Vec<i64>,
    pub expand: Option<String>,
    pub query_string: Option<String>,
    pub order_by: Option<String>,
}

/// Body for creating or changing a screen scheme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScreenSchemeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screens: Option<ScreenTypes>,
}

const SCREENS_PATH: &str = "/rest/api/3/screens";
const SCHEME_PATH: &str = "/rest/api/3/screenscheme";

impl<'a> ScreensService<'a> {
    fn path(screen_id: i64) -> String {
        format!("{}/{}", SCREENS_PATH, screen_id)
    }

    fn tab_path(screen_id: i64, tab_id: i64) -> String {
        format!("{}/tabs/{}", Self::path(screen_id), tab_id)
    }

    /// List screens.
    pub async fn list(&self, options: &ListScreensOptions) -> Result<Response<Page<Screen>>> {
        let query = options
            .page
            .apply(Query::new())
            .repeated("id", &options.ids)
            .opt_string("queryString", options.query_string.as_deref())
            .repeated("scope", &options.scope)
            .opt_string("orderBy", options.order_by.as_deref());
        self.client.get(&query.apply(SCREENS_PATH)).await
    }

    /// Create a screen with a single default tab.
    #[instrument(skip(self, screen), fields(name = ?screen.name))]
    pub async fn create(&self, screen: &ScreenRequest) -> Result<Response<Screen>> {
        let response: Response<Screen> = self.client.post(SCREENS_PATH, screen).await?;
        debug!(id = response.data().id, "Screen created");
        Ok(response)
    }

    /// Update a screen.
    #[instrument(skip(self, screen))]
    pub async fn update(&self, screen_id: i64, screen: &ScreenRequest) -> Result<Response<Screen>> {
        self.client.put(&Self::path(screen_id), screen).await
    }

    /// Delete a screen. Screens used by a scheme cannot be deleted.
    #[instrument(skip(self))]
    pub async fn delete(&self, screen_id: i64) -> Result<Response<()>> {
        self.client.delete(&Self::path(screen_id)).await
    }

    /// List the tabs of a screen.
    pub async fn list_tabs(&self, screen_id: i64, project_key: Option<&str>) -> Result<Response<Vec<ScreenTab>>> {
        let path = Query::new()
            .opt_string("projectKey", project_key)
            .apply(format!("{}/tabs", Self::path(screen_id)));
        self.client.get(&path).await
    }

    /// Add a tab to a screen.
    #[instrument(skip(self))]
    pub async fn create_tab(&self, screen_id: i64, name: &str) -> Result<Response<ScreenTab>> {
        let path = format!("{}/tabs", Self::path(screen_id));
        self.client.post(&path, &json!({ "name": name })).await
    }

    /// Rename a tab.
    #[instrument(skip(self))]
    pub async fn update_tab(&self, screen_id: i64, tab_id: i64, name: &str) -> Result<Response<ScreenTab>> {
        self.client
            .put(&Self::tab_path(screen_id, tab_id), &json!({ "name": name }))
            .await
    }

    /// Delete a tab.
    #[instrument(skip(self))]
    pub async fn delete_tab(&self, screen_id: i64, tab_id: i64) -> Result<Response<()>> {
        self.client.delete(&Self::tab_path(screen_id, tab_id)).await
    }

    /// Move a tab to a zero-based position.
    #[instrument(skip(self))]
    pub async fn move_tab(&self, screen_id: i64, tab_id: i64, position: u32) -> Result<Response<()>> {
        let path = format!("{}/move/{}", Self::tab_path(screen_id, tab_id), position);
        self.client.call_empty(Method::POST, &path, NO_BODY).await
    }

    /// List the fields on a tab.
    pub async fn list_tab_fields(
        &self,
        screen_id: i64,
        tab_id: i64,
        project_key: Option<&str>,
    ) -> Result<Response<Vec<ScreenTabField>>> {
        let path = Query::new()
            .opt_string("projectKey", project_key)
            .apply(format!("{}/fields", Self::tab_path(screen_id, tab_id)));
        self.client.get(&path).await
    }

    /// Add a field to a tab.
    #[instrument(skip(self))]
    pub async fn add_tab_field(
        &self,
        screen_id: i64,
        tab_id: i64,
        field_id: &str,
    ) -> Result<Response<ScreenTabField>> {
        let path = format!("{}/fields", Self::tab_path(screen_id, tab_id));
        self.client.post(&path, &json!({ "fieldId": field_id })).await
    }

    /// Remove a field from a tab.
    #[instrument(skip(self))]
    pub async fn remove_tab_field(&self, screen_id: i64, tab_id: i64, field_id: &str) -> Result<Response<()>> {
        let path = format!(
            "{}/fields/{}",
            Self::tab_path(screen_id, tab_id),
            segment(field_id)
        );
        self.client.delete(&path).await
    }

    /// Move a field on a tab.
    #[instrument(skip(self))]
    pub async fn move_tab_field(
        &self,
        screen_id: i64,
        tab_id: i64,
        field_id: &str,
        position: &FieldPosition,
    ) -> Result<Response<()>> {
        let body = match position {
            FieldPosition::Earlier => json!({ "position": "Earlier" }),
            FieldPosition::Later => json!({ "position": "Later" }),
            FieldPosition::First => json!({ "position": "First" }),
            FieldPosition::Last => json!({ "position": "Last" }),
            FieldPosition::After(id) => json!({ "after": id }),
        };
        let path = format!(
            "{}/fields/{}/move",
            Self::tab_path(screen_id, tab_id),
            segment(field_id)
        );
        self.client.call_empty(Method::POST, &path, Some(&body)).await
    }

    /// List the screens a field appears on.
    pub async fn list_field_screens(
        &self,
        field_id: &str,
        expand: &[&str],
        page: PageOptions,
    ) -> Result<Response<Page<Screen>>> {
        let query = page.apply(Query::new()).joined("expand", expand);
        let path = query.apply(format!("/rest/api/3/field/{}/screens", segment(field_id)));
        self.client.get(&path).await
    }

    /// List screen schemes.
    pub async fn list_schemes(
        &self,
        options: &ListScreenSchemesOptions,
    ) -> Result<Response<Page<ScreenScheme>>> {
        let query = options
            .page
            .apply(Query::new())
            .repeated("id", &options.ids)
            .opt_string("expand", options.expand.as_deref())
            .opt_string("queryString", options.query_string.as_deref())
            .opt_string("orderBy", options.order_by.as_deref());
        self.client.get(&query.apply(SCHEME_PATH)).await
    }

    /// Create a screen scheme.
    #[instrument(skip(self, scheme), fields(name = ?scheme.name))]
    pub async fn create_scheme(&self, scheme: &ScreenSchemeRequest) -> Result<Response<ScreenScheme>> {
        self.client.post(SCHEME_PATH, scheme).await
    }

    /// Update a screen scheme.
    #[instrument(skip(self, scheme))]
    pub async fn update_scheme(&self, scheme_id: i64, scheme: &ScreenSchemeRequest) -> Result<Response<()>> {
        let path = format!("{}/{}", SCHEME_PATH, scheme_id);
        self.client.call_empty(Method::PUT, &path, Some(scheme)).await
    }

    /// Delete a screen scheme.
    #[instrument(skip(self))]
    pub async fn delete_scheme(&self, scheme_id: i64) -> Result<Response<()>> {
        self.client
            .delete(&format!("{}/{}", SCHEME_PATH, scheme_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_list_screens() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/screens")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("scope".into(), "GLOBAL".into()),
                Matcher::UrlEncoded("queryString".into(), "Default".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"startAt":0,"maxResults":100,"total":1,"isLast":true,
                "values":[{"id":1,"name":"Default Screen"}]}"#)
            .create_async()
            .await;

        let options = ListScreensOptions {
            query_string: Some("Default".to_string()),
            scope: vec!["GLOBAL".to_string()],
            ..ListScreensOptions::default()
        };
        let page = client.screens().list(&options).await.unwrap().into_inner();
        assert_eq!(page.values[0].id, 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_tab_lifecycle() {
        let (mut server, client) = setup().await;
        let create = server
            .mock("POST", "/rest/api/3/screens/1/tabs")
            .match_body(Matcher::Json(json!({"name": "Details"})))
            .with_status(200)
            .with_body(r#"{"id":10,"name":"Details"}"#)
            .create_async()
            .await;
        let mv = server
            .mock("POST", "/rest/api/3/screens/1/tabs/10/move/0")
            .with_status(204)
            .create_async()
            .await;

        let tab = client.screens().create_tab(1, "Details").await.unwrap().into_inner();
        client.screens().move_tab(1, tab.id, 0).await.unwrap();
        create.assert_async().await;
        mv.assert_async().await;
    }

    #[tokio::test]
    async fn test_add_and_move_tab_field() {
        let (mut server, client) = setup().await;
        let add = server
            .mock("POST", "/rest/api/3/screens/1/tabs/10/fields")
            .match_body(Matcher::Json(json!({"fieldId": "customfield_10010"})))
            .with_status(200)
            .with_body(r#"{"id":"customfield_10010","name":"Story Points"}"#)
            .create_async()
            .await;
        let mv = server
            .mock("POST", "/rest/api/3/screens/1/tabs/10/fields/customfield_10010/move")
            .match_body(Matcher::Json(json!({"after": "summary"})))
            .with_status(204)
            .create_async()
            .await;

        client
            .screens()
            .add_tab_field(1, 10, "customfield_10010")
            .await
            .unwrap();
        client
            .screens()
            .move_tab_field(1, 10, "customfield_10010", &FieldPosition::After("summary".to_string()))
            .await
            .unwrap();
        add.assert_async().await;
        mv.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_scheme() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/screenscheme")
            .match_body(Matcher::Json(json!({
                "name": "Bug scheme",
                "screens": {"default": 1, "create": 2}
            })))
            .with_status(201)
            .with_body(r#"{"id":10010}"#)
            .create_async()
            .await;

        let request = ScreenSchemeRequest {
            name: Some("Bug scheme".to_string()),
            screens: Some(ScreenTypes {
                default: 1,
                create: Some(2),
                ..ScreenTypes::default()
            }),
            ..ScreenSchemeRequest::default()
        };
        let scheme = client.screens().create_scheme(&request).await.unwrap().into_inner();
        assert_eq!(scheme.id, 10010);
        mock.assert_async().await;
    }
}
