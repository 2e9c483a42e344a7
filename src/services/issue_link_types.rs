//! Issue link types.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::segment;
use crate::api::{Client, Response};
use crate::error::Result;

/// Issue link type operations.
#[derive(Debug, Clone, Copy)]
pub struct IssueLinkTypesService<'a> {
    pub(super) client: &'a Client,
}

/// A kind of link between issues, such as "Blocks".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLinkType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description of the inward end (e.g., "is blocked by").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inward: Option<String>,
    /// Description of the outward end (e.g., "blocks").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outward: Option<String>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueLinkTypes {
    #[serde(default)]
    issue_link_types: Vec<IssueLinkType>,
}

/// Body for creating or updating a link type. Unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IssueLinkTypeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inward: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outward: Option<String>,
}

impl IssueLinkTypeRequest {
    /// A complete request, as needed for creation.
    pub fn new(name: impl Into<String>, inward: impl Into<String>, outward: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            inward: Some(inward.into()),
            outward: Some(outward.into()),
        }
    }
}

impl<'a> IssueLinkTypesService<'a> {
    /// List all link types.
    pub async fn list(&self) -> Result<Response<Vec<IssueLinkType>>> {
        let response: Response<IssueLinkTypes> = self.client.get("/rest/api/3/issueLinkType").await?;
        Ok(response.map(|r| r.issue_link_types))
    }

    /// Get a link type.
    pub async fn get(&self, link_type_id: &str) -> Result<Response<IssueLinkType>> {
        let path = format!("/rest/api/3/issueLinkType/{}", segment(link_type_id));
        self.client.get(&path).await
    }

    /// Create a link type.
    #[instrument(skip(self, request))]
    pub async fn create(&self, request: &IssueLinkTypeRequest) -> Result<Response<IssueLinkType>> {
        self.client.post("/rest/api/3/issueLinkType", request).await
    }

    /// Update a link type.
    #[instrument(skip(self, request))]
    pub async fn update(
        &self,
        link_type_id: &str,
        request: &IssueLinkTypeRequest,
    ) -> Result<Response<IssueLinkType>> {
        let path = format!("/rest/api/3/issueLinkType/{}", segment(link_type_id));
        self.client.put(&path, request).await
    }

    /// Delete a link type.
    #[instrument(skip(self))]
    pub async fn delete(&self, link_type_id: &str) -> Result<Response<()>> {
        let path = format!("/rest/api/3/issueLinkType/{}", segment(link_type_id));
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
    async fn test_list_unwraps_envelope() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/issueLinkType")
            .with_status(200)
            .with_body(r#"{"issueLinkTypes":[{"id":"1000","name":"Blocks","inward":"is blocked by","outward":"blocks"}]}"#)
            .create_async()
            .await;

        let types = client.issue_link_types().list().await.unwrap().into_inner();
        assert_eq!(types.len(), 1);
        assert_eq!(types[0].outward.as_deref(), Some("blocks"));
    }

    #[tokio::test]
    async fn test_update_sends_only_set_fields() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("PUT", "/rest/api/3/issueLinkType/1000")
            .match_body(Matcher::Json(json!({"name": "Depends"})))
            .with_status(200)
            .with_body(r#"{"id":"1000","name":"Depends"}"#)
            .create_async()
            .await;

        let request = IssueLinkTypeRequest {
            name: Some("Depends".to_string()),
            ..IssueLinkTypeRequest::default()
        };
        let updated = client
            .issue_link_types()
            .update("1000", &request)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(updated.name.as_deref(), Some("Depends"));
        mock.assert_async().await;
    }
}
