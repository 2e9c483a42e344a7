//! Issue attachments: metadata, uploads and binary downloads.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::segment;
use crate::api::types::User;
use crate::api::{Client, Query, Response, Time, NO_BODY};
use crate::error::Result;

/// Form field name Jira expects for uploaded files.
const FILE_FIELD: &str = "file";

/// Attachment operations.
#[derive(Debug, Clone, Copy)]
pub struct AttachmentsService<'a> {
    pub(super) client: &'a Client,
}

/// An issue attachment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Time>,
    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// URL of the attachment content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Site-wide attachment settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Maximum upload size in bytes.
    #[serde(default)]
    pub upload_limit: i64,
}

/// The listing of an archive attachment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub entries: Vec<ArchiveEntry>,
    #[serde(default)]
    pub total_entry_count: i64,
}

/// One file inside an archive attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveEntry {
    #[serde(default)]
    pub entry_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Human readable size for `expand_human`, bytes for `expand_raw`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Thumbnail size and fallback options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThumbnailOptions {
    pub width: u32,
    pub height: u32,
    /// Return a default thumbnail when none can be generated.
    pub fallback_to_default: bool,
}

impl<'a> AttachmentsService<'a> {
    /// Get the attachment settings (enabled flag and upload limit).
    pub async fn get_settings(&self) -> Result<Response<AttachmentSettings>> {
        self.client.get("/rest/api/3/attachment/meta").await
    }

    /// Get attachment metadata.
    #[instrument(skip(self))]
    pub async fn get(&self, attachment_id: &str) -> Result<Response<Attachment>> {
        let path = format!("/rest/api/3/attachment/{}", segment(attachment_id));
        self.client.get(&path).await
    }

    /// Delete an attachment.
    #[instrument(skip(self))]
    pub async fn delete(&self, attachment_id: &str) -> Result<Response<()>> {
        let path = format!("/rest/api/3/attachment/{}", segment(attachment_id));
        self.client.delete(&path).await
    }

    /// List the contents of an archive attachment with human readable sizes.
    pub async fn expand_human(&self, attachment_id: &str) -> Result<Response<ExpandedContent>> {
        let path = format!("/rest/api/3/attachment/{}/expand/human", segment(attachment_id));
        self.client.get(&path).await
    }

    /// List the contents of an archive attachment.
    pub async fn expand_raw(&self, attachment_id: &str) -> Result<Response<ExpandedContent>> {
        let path = format!("/rest/api/3/attachment/{}/expand/raw", segment(attachment_id));
        self.client.get(&path).await
    }

    /// Download attachment content as a stream.
    ///
    /// The status is checked before returning; read the body with
    /// [`reqwest::Response::chunk`] or `bytes()`.
    #[instrument(skip(self))]
    pub async fn download(&self, attachment_id: &str) -> Result<reqwest::Response> {
        let path = format!("/rest/api/3/attachment/content/{}", segment(attachment_id));
        let request = self.client.new_request(Method::GET, &path, NO_BODY)?;
        self.client.execute_stream(request).await
    }

    /// Download an attachment thumbnail as a stream.
    ///
    /// Like [`download`](Self::download), the body is left unread.
    #[instrument(skip(self, options))]
    pub async fn get_thumbnail(
        &self,
        attachment_id: &str,
        options: &ThumbnailOptions,
    ) -> Result<reqwest::Response> {
        let path = Query::new()
            .int("width", options.width)
            .int("height", options.height)
            .flag("fallbackToDefault", options.fallback_to_default)
            .apply(format!(
                "/rest/api/3/attachment/thumbnail/{}",
                segment(attachment_id)
            ));
        let request = self.client.new_request(Method::GET, &path, NO_BODY)?;
        self.client.execute_stream(request).await
    }

    /// Upload files from disk to an issue.
    #[instrument(skip(self, paths), fields(count = paths.len()))]
    pub async fn add_to_issue<P: AsRef<Path>>(
        &self,
        issue_id_or_key: &str,
        paths: &[P],
    ) -> Result<Response<Vec<Attachment>>> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let data = tokio::fs::read(path).await?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "attachment".to_string());
            files.push((filename, data));
        }
        self.upload(issue_id_or_key, files).await
    }

    /// Upload in-memory content to an issue as a single file.
    #[instrument(skip(self, data))]
    pub async fn add_to_issue_from_bytes(
        &self,
        issue_id_or_key: &str,
        filename: &str,
        data: impl Into<Vec<u8>>,
    ) -> Result<Response<Vec<Attachment>>> {
        self.upload(issue_id_or_key, vec![(filename.to_string(), data.into())])
            .await
    }

    async fn upload(
        &self,
        issue_id_or_key: &str,
        files: Vec<(String, Vec<u8>)>,
    ) -> Result<Response<Vec<Attachment>>> {
        let path = format!("/rest/api/3/issue/{}/attachments", segment(issue_id_or_key));
        debug!(files = files.len(), "Uploading attachments");

        let form = files.into_iter().fold(Form::new(), |form, (filename, data)| {
            form.part(FILE_FIELD, Part::bytes(data).file_name(filename))
        });
        let request = self.client.new_multipart_request(Method::POST, &path, form)?;
        self.client.execute(request).await
    }
}
