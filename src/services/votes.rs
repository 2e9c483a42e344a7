//! Issue votes.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::segment;
use crate::api::types::User;
use crate::api::{Client, Response, NO_BODY};
use crate::error::Result;

/// Vote operations.
#[derive(Debug, Clone, Copy)]
pub struct VotesService<'a> {
    pub(super) client: &'a Client,
}

/// Vote details for an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Votes {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    /// Number of votes.
    #[serde(default)]
    pub votes: i64,
    /// Whether the current user has voted.
    #[serde(default)]
    pub has_voted: bool,
    /// Voters, when the caller may view them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voters: Option<Vec<User>>,
}

impl<'a> VotesService<'a> {
    fn path(issue_id_or_key: &str) -> String {
        format!("/rest/api/3/issue/{}/votes", segment(issue_id_or_key))
    }

    /// Get the votes on an issue.
    #[instrument(skip(self))]
    pub async fn get(&self, issue_id_or_key: &str) -> Result<Response<Votes>> {
        self.client.get(&Self::path(issue_id_or_key)).await
    }

    /// Vote for an issue as the current user.
    #[instrument(skip(self))]
    pub async fn add(&self, issue_id_or_key: &str) -> Result<Response<()>> {
        self.client
            .call_empty(Method::POST, &Self::path(issue_id_or_key), NO_BODY)
            .await
    }

    /// Remove the current user's vote.
    #[instrument(skip(self))]
    pub async fn remove(&self, issue_id_or_key: &str) -> Result<Response<()>> {
        self.client.delete(&Self::path(issue_id_or_key)).await
    }
}
