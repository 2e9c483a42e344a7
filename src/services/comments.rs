//! Issue comments and comment properties.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::instrument;

use super::{segment, PageOptions};
use crate::api::types::{Comment, EntityProperty, Page, PropertyKeys, Visibility};
use crate::api::{AtlassianDoc, Client, Query, Response};
use crate::error::Result;

/// Comment operations.
#[derive(Debug, Clone, Copy)]
pub struct CommentsService<'a> {
    pub(super) client: &'a Client,
}

/// A page of comments on an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comments {
    #[serde(default)]
    pub start_at: i64,
    #[serde(default)]
    pub max_results: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Options for listing the comments of an issue.
#[derive(Debug, Clone, Default)]
pub struct ListCommentsOptions {
    pub page: PageOptions,
    /// `created` or `-created`.
    pub order_by: Option<String>,
    /// For example `renderedBody`.
    pub expand: Vec<String>,
}

/// Body for adding or updating a comment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentRequest {
    /// Comment body in Atlassian Document Format.
    pub body: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

impl CommentRequest {
    /// A comment with a plain text body.
    pub fn text(text: &str) -> Self {
        Self {
            body: AtlassianDoc::from_text(text).to_value(),
            visibility: None,
        }
    }
}

/// Options for updating a comment.
#[derive(Debug, Clone, Default)]
pub struct UpdateCommentOptions {
    /// Whether watchers are notified. Unset leaves the server default.
    pub notify_users: Option<bool>,
    pub override_editable_flag: bool,
    pub expand: Vec<String>,
}

impl<'a> CommentsService<'a> {
    fn issue_path(issue_id_or_key: &str) -> String {
        format!("/rest/api/3/issue/{}/comment", segment(issue_id_or_key))
    }

    fn comment_path(issue_id_or_key: &str, comment_id: &str) -> String {
        format!("{}/{}", Self::issue_path(issue_id_or_key), segment(comment_id))
    }

    fn property_path(comment_id: &str, property_key: &str) -> String {
        format!(
            "/rest/api/3/comment/{}/properties/{}",
            segment(comment_id),
            segment(property_key)
        )
    }

    /// List the comments of an issue.
    #[instrument(skip(self, options))]
    pub async fn list(
        &self,
        issue_id_or_key: &str,
        options: &ListCommentsOptions,
    ) -> Result<Response<Comments>> {
        let path = options
            .page
            .apply(Query::new())
            .opt_string("orderBy", options.order_by.as_deref())
            .joined("expand", &options.expand)
            .apply(Self::issue_path(issue_id_or_key));
        self.client.get(&path).await
    }

    /// Get a comment.
    #[instrument(skip(self, expand))]
    pub async fn get(
        &self,
        issue_id_or_key: &str,
        comment_id: &str,
        expand: &[&str],
    ) -> Result<Response<Comment>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply(Self::comment_path(issue_id_or_key, comment_id));
        self.client.get(&path).await
    }

    /// Add a comment to an issue.
    #[instrument(skip(self, comment, expand))]
    pub async fn add(
        &self,
        issue_id_or_key: &str,
        comment: &CommentRequest,
        expand: &[&str],
    ) -> Result<Response<Comment>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply(Self::issue_path(issue_id_or_key));
        self.client.post(&path, comment).await
    }

    /// Update a comment.
    #[instrument(skip(self, comment, options))]
    pub async fn update(
        &self,
        issue_id_or_key: &str,
        comment_id: &str,
        comment: &CommentRequest,
        options: &UpdateCommentOptions,
    ) -> Result<Response<Comment>> {
        let path = Query::new()
            .opt_bool("notifyUsers", options.notify_users)
            .flag("overrideEditableFlag", options.override_editable_flag)
            .joined("expand", &options.expand)
            .apply(Self::comment_path(issue_id_or_key, comment_id));
        self.client.put(&path, comment).await
    }

    /// Delete a comment.
    #[instrument(skip(self))]
    pub async fn delete(&self, issue_id_or_key: &str, comment_id: &str) -> Result<Response<()>> {
        self.client
            .delete(&Self::comment_path(issue_id_or_key, comment_id))
            .await
    }

    /// Get comments by ID, across issues.
    pub async fn get_by_ids(&self, ids: &[i64], expand: &[&str]) -> Result<Response<Page<Comment>>> {
        let path = Query::new()
            .joined("expand", expand)
            .apply("/rest/api/3/comment/list");
        self.client.post(&path, &json!({ "ids": ids })).await
    }

    /// List the property keys of a comment.
    pub async fn get_property_keys(&self, comment_id: &str) -> Result<Response<Vec<String>>> {
        let path = format!("/rest/api/3/comment/{}/properties", segment(comment_id));
        let response: Response<PropertyKeys> = self.client.get(&path).await?;
        Ok(response.map(|keys| keys.keys.into_iter().filter_map(|k| k.key).collect()))
    }

    /// Get a comment property.
    pub async fn get_property(
        &self,
        comment_id: &str,
        property_key: &str,
    ) -> Result<Response<EntityProperty>> {
        self.client
            .get(&Self::property_path(comment_id, property_key))
            .await
    }

    /// Set a comment property to any JSON value.
    pub async fn set_property(
        &self,
        comment_id: &str,
        property_key: &str,
        value: &Value,
    ) -> Result<Response<()>> {
        self.client
            .call_empty(
                reqwest::Method::PUT,
                &Self::property_path(comment_id, property_key),
                Some(value),
            )
            .await
    }

    /// Delete a comment property.
    pub async fn delete_property(&self, comment_id: &str, property_key: &str) -> Result<Response<()>> {
        self.client
            .delete(&Self::property_path(comment_id, property_key))
            .await
    }
}
