//! Links between issues.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use super::issue_link_types::IssueLinkType;
use super::segment;
use crate::api::types::{IssueType, Priority, Status, Visibility};
use crate::api::{Client, Response};
use crate::error::Result;

/// Issue link operations.
#[derive(Debug, Clone, Copy)]
pub struct IssueLinksService<'a> {
    pub(super) client: &'a Client,
}

/// A link between two issues.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub link_type: Option<IssueLinkType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inward_issue: Option<LinkedIssue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outward_issue: Option<LinkedIssue>,
}

/// The issue on one end of a link.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedIssue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<LinkedIssueFields>,
}

/// The subset of fields Jira includes for linked issues.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkedIssueFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuetype: Option<IssueType>,
}

/// Reference to an existing issue by ID or key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl IssueRef {
    /// Refer to an issue by key.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            id: None,
        }
    }
}

/// Reference to a link type by ID or name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkTypeRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A comment added to the outward issue when the link is created.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LinkComment {
    /// Comment body in Atlassian Document Format.
    pub body: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

/// Body for creating a link.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueLinkRequest {
    #[serde(rename = "type")]
    pub link_type: LinkTypeRef,
    pub inward_issue: IssueRef,
    pub outward_issue: IssueRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<LinkComment>,
}

impl IssueLinkRequest {
    /// Link two issues by key with a named link type.
    pub fn new(link_type: impl Into<String>, inward_key: impl Into<String>, outward_key: impl Into<String>) -> Self {
        Self {
            link_type: LinkTypeRef {
                name: Some(link_type.into()),
                id: None,
            },
            inward_issue: IssueRef::key(inward_key),
            outward_issue: IssueRef::key(outward_key),
            comment: None,
        }
    }
}

impl<'a> IssueLinksService<'a> {
    /// Get a link.
    pub async fn get(&self, link_id: &str) -> Result<Response<IssueLink>> {
        let path = format!("/rest/api/3/issueLink/{}", segment(link_id));
        self.client.get(&path).await
    }

    /// Create a link between two issues.
    #[instrument(skip(self, request))]
    pub async fn create(&self, request: &IssueLinkRequest) -> Result<Response<()>> {
        self.client
            .call_empty(reqwest::Method::POST, "/rest/api/3/issueLink", Some(request))
            .await
    }

    /// Delete a link.
    #[instrument(skip(self))]
    pub async fn delete(&self, link_id: &str) -> Result<Response<()>> {
        let path = format!("/rest/api/3/issueLink/{}", segment(link_id));
        self.client.delete(&path).await
    }
}
