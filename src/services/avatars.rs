//! System, project and issue type avatars.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use super::segment;
use crate::api::{Client, Query, Response, NO_BODY};
use crate::error::Result;

const PNG: &str = "image/png";

/// Avatar operations.
#[derive(Debug, Clone, Copy)]
pub struct AvatarsService<'a> {
    pub(super) client: &'a Client,
}

/// The kind of entity an avatar belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarType {
    Project,
    IssueType,
    User,
    Priority,
}

impl fmt::Display for AvatarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Project => "project",
            Self::IssueType => "issuetype",
            Self::User => "user",
            Self::Priority => "priority",
        };
        f.write_str(name)
    }
}

/// An avatar image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Avatar {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// ID of the owning entity, absent for system avatars.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default)]
    pub is_system_avatar: bool,
    #[serde(default)]
    pub is_selected: bool,
    #[serde(default)]
    pub is_deletable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Image URLs keyed by size such as `16x16`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub urls: HashMap<String, String>,
}

/// System and custom avatars available to an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatars {
    #[serde(default)]
    pub system: Vec<Avatar>,
    #[serde(default)]
    pub custom: Vec<Avatar>,
}

/// The square to crop out of an uploaded image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvatarCrop {
    pub x: u32,
    pub y: u32,
    /// Edge length of the square; zero lets the server pick.
    pub size: u32,
}

impl AvatarCrop {
    fn query(&self) -> Query {
        Query::new()
            .set("x", self.x)
            .set("y", self.y)
            .set("size", self.size)
    }
}

#[derive(Debug, Default, Deserialize)]
struct SystemAvatars {
    #[serde(default)]
    system: Vec<Avatar>,
}

impl<'a> AvatarsService<'a> {
    /// List the system avatars for an entity type.
    #[instrument(skip(self))]
    pub async fn get_system_avatars(&self, avatar_type: AvatarType) -> Result<Response<Vec<Avatar>>> {
        let path = format!("/rest/api/3/avatar/{}/system", avatar_type);
        let response: Response<SystemAvatars> = self.client.get(&path).await?;
        Ok(response.map(|a| a.system))
    }

    /// List the avatars available to a project.
    #[instrument(skip(self))]
    pub async fn get_project_avatars(&self, project_id_or_key: &str) -> Result<Response<Avatars>> {
        let path = format!("/rest/api/3/project/{}/avatars", segment(project_id_or_key));
        self.client.get(&path).await
    }

    /// Select the avatar shown for a project.
    #[instrument(skip(self))]
    pub async fn set_project_avatar(&self, project_id_or_key: &str, avatar_id: &str) -> Result<Response<()>> {
        let path = format!("/rest/api/3/project/{}/avatar", segment(project_id_or_key));
        self.client
            .call_empty(Method::PUT, &path, Some(&json!({ "id": avatar_id })))
            .await
    }

    /// Delete a custom project avatar.
    #[instrument(skip(self))]
    pub async fn delete_project_avatar(&self, project_id_or_key: &str, avatar_id: i64) -> Result<Response<()>> {
        let path = format!(
            "/rest/api/3/project/{}/avatar/{}",
            segment(project_id_or_key),
            avatar_id
        );
        self.client.delete(&path).await
    }

    /// Upload a PNG as a custom project avatar.
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub async fn load_project_avatar(
        &self,
        project_id_or_key: &str,
        crop: AvatarCrop,
        image: Bytes,
    ) -> Result<Response<Avatar>> {
        let path = crop.query().apply(format!(
            "/rest/api/3/project/{}/avatar2",
            segment(project_id_or_key)
        ));
        self.upload(&path, image).await
    }

    /// List the avatars available to an issue type.
    #[instrument(skip(self))]
    pub async fn get_issue_type_avatars(&self, issue_type_id: &str) -> Result<Response<Avatars>> {
        let path = format!("/rest/api/3/issuetype/{}/avatars", segment(issue_type_id));
        self.client.get(&path).await
    }

    /// Upload a PNG as a custom issue type avatar.
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub async fn load_issue_type_avatar(
        &self,
        issue_type_id: &str,
        crop: AvatarCrop,
        image: Bytes,
    ) -> Result<Response<Avatar>> {
        let path = crop.query().apply(format!(
            "/rest/api/3/issuetype/{}/avatar2",
            segment(issue_type_id)
        ));
        self.upload(&path, image).await
    }

    /// Fetch an avatar image for any owner.
    ///
    /// `avatar_id` picks a specific avatar, otherwise the owner's current one
    /// is returned. `size` is `xsmall`, `small`, `medium`, `large` or
    /// `xlarge`. The body is returned unread for streaming.
    #[instrument(skip(self))]
    pub async fn get_universal_avatar(
        &self,
        avatar_type: AvatarType,
        owner_id: &str,
        avatar_id: Option<i64>,
        size: Option<&str>,
    ) -> Result<reqwest::Response> {
        let path = Query::new()
            .opt_int("id", avatar_id)
            .opt_string("size", size)
            .apply(format!(
                "/rest/api/3/universal_avatar/view/type/{}/owner/{}",
                avatar_type,
                segment(owner_id)
            ));
        let request = self.client.new_request(Method::GET, &path, NO_BODY)?;
        self.client.execute_stream(request).await
    }

    async fn upload(&self, path: &str, image: Bytes) -> Result<Response<Avatar>> {
        debug!(path, "Uploading avatar");
        let request = self.client.new_raw_request(Method::POST, path, PNG, image)?;
        self.client.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use mockito::Matcher;

    #[test]
    fn test_avatar_type_names() {
        assert_eq!(AvatarType::IssueType.to_string(), "issuetype");
        assert_eq!(AvatarType::Project.to_string(), "project");
    }

    #[tokio::test]
    async fn test_get_system_avatars() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/avatar/project/system")
            .with_status(200)
            .with_body(r#"{"system":[{"id":"1000","isSystemAvatar":true,"isDeletable":false}]}"#)
            .create_async()
            .await;

        let avatars = client
            .avatars()
            .get_system_avatars(AvatarType::Project)
            .await
            .unwrap()
            .into_inner();
        assert_eq!(avatars.len(), 1);
        assert!(avatars[0].is_system_avatar);
    }

    #[tokio::test]
    async fn test_set_project_avatar() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("PUT", "/rest/api/3/project/PROJ/avatar")
            .match_body(Matcher::Json(serde_json::json!({"id": "10010"})))
            .with_status(204)
            .create_async()
            .await;

        client.avatars().set_project_avatar("PROJ", "10010").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_load_project_avatar_sends_png() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/project/PROJ/avatar2")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("x".into(), "0".into()),
                Matcher::UrlEncoded("y".into(), "0".into()),
                Matcher::UrlEncoded("size".into(), "48".into()),
            ]))
            .match_header("content-type", "image/png")
            .match_header("x-atlassian-token", "no-check")
            .match_body(vec![0x89, b'P', b'N', b'G'])
            .with_status(201)
            .with_body(r#"{"id":"10020","isDeletable":true}"#)
            .create_async()
            .await;

        let crop = AvatarCrop { x: 0, y: 0, size: 48 };
        let avatar = client
            .avatars()
            .load_project_avatar("PROJ", crop, Bytes::from_static(&[0x89, b'P', b'N', b'G']))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(avatar.id.as_deref(), Some("10020"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_universal_avatar_streams_bytes() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/universal_avatar/view/type/user/owner/abc")
            .match_query(Matcher::UrlEncoded("size".into(), "small".into()))
            .with_status(200)
            .with_header("content-type", "image/png")
            .with_body(b"\x89PNG")
            .create_async()
            .await;

        let response = client
            .avatars()
            .get_universal_avatar(AvatarType::User, "abc", None, Some("small"))
            .await
            .unwrap();
        assert_eq!(response.bytes().await.unwrap().as_ref(), b"\x89PNG");
    }

    #[tokio::test]
    async fn test_universal_avatar_error_status() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/universal_avatar/view/type/user/owner/missing")
            .with_status(404)
            .create_async()
            .await;

        let err = client
            .avatars()
            .get_universal_avatar(AvatarType::User, "missing", None, None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
