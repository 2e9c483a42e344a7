//! Issue resolutions.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use super::{segment, MoveBody, PageOptions, Position};
use crate::api::types::{Page, Resolution};
use crate::api::{Client, Query, Response};
use crate::error::Result;

/// Resolution operations.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionsService<'a> {
    pub(super) client: &'a Client,
}

/// Body for creating or renaming a resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ResolutionRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CreatedId {
    #[serde(default)]
    id: String,
}

const RESOLUTION_PATH: &str = "/rest/api/3/resolution";

impl<'a> ResolutionsService<'a> {
    fn path(resolution_id: &str) -> String {
        format!("{}/{}", RESOLUTION_PATH, segment(resolution_id))
    }

    /// List every resolution.
    pub async fn list(&self) -> Result<Response<Vec<Resolution>>> {
        self.client.get(RESOLUTION_PATH).await
    }

    pub async fn get(&self, resolution_id: &str) -> Result<Response<Resolution>> {
        self.client.get(&Self::path(resolution_id)).await
    }

    /// Search resolutions by ID, or find the default one.
    pub async fn search(
        &self,
        ids: &[&str],
        only_default: bool,
        page: PageOptions,
    ) -> Result<Response<Page<Resolution>>> {
        let query = page
            .apply(Query::new())
            .repeated("id", ids)
            .flag("onlyDefault", only_default);
        self.client
            .get(&query.apply("/rest/api/3/resolution/search"))
            .await
    }

    /// Create a resolution and return its ID.
    #[instrument(skip(self, resolution), fields(name = ?resolution.name))]
    pub async fn create(&self, resolution: &ResolutionRequest) -> Result<Response<String>> {
        let response: Response<CreatedId> = self.client.post(RESOLUTION_PATH, resolution).await?;
        Ok(response.map(|r| r.id))
    }

    #[instrument(skip(self, resolution))]
    pub async fn update(&self, resolution_id: &str, resolution: &ResolutionRequest) -> Result<Response<()>> {
        self.client
            .call_empty(Method::PUT, &Self::path(resolution_id), Some(resolution))
            .await
    }

    /// Delete a resolution. Issues using it are moved to `replace_with`.
    #[instrument(skip(self))]
    pub async fn delete(&self, resolution_id: &str, replace_with: &str) -> Result<Response<()>> {
        let path = Query::new()
            .string("replaceWith", replace_with)
            .apply(Self::path(resolution_id));
        self.client.delete(&path).await
    }

    /// Make a resolution the default.
    #[instrument(skip(self))]
    pub async fn set_default(&self, resolution_id: &str) -> Result<Response<()>> {
        self.client
            .call_empty(
                Method::PUT,
                "/rest/api/3/resolution/default",
                Some(&json!({ "id": resolution_id })),
            )
            .await
    }

    /// Change the order of resolutions.
    #[instrument(skip(self))]
    pub async fn move_resolutions(&self, ids: &[&str], position: &Position) -> Result<Response<()>> {
        self.client
            .call_empty(
                Method::PUT,
                "/rest/api/3/resolution/move",
                Some(&MoveBody::new(ids, position)),
            )
            .await
    }
}
