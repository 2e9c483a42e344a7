//! Response envelope returned by every API call.

use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

/// Pagination fields found at the top level of a list response.
///
/// Jira uses two conventions: classic offset paging (`startAt`, `maxResults`,
/// `total`, `isLast`) and token paging (`nextPageToken`). Fields the payload
/// does not carry are left as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Index of the first returned item.
    #[serde(default)]
    pub start_at: Option<i64>,
    /// Page size used by the server.
    #[serde(default)]
    pub max_results: Option<i64>,
    /// Total number of items.
    #[serde(default)]
    pub total: Option<i64>,
    /// Whether this is the last page.
    #[serde(default)]
    pub is_last: Option<bool>,
    /// Token for the next page of token-paged endpoints.
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl Pagination {
    /// Extract pagination fields from a JSON object body.
    ///
    /// Anything that is not an object with well-typed fields yields the
    /// empty value. Fields other than the five above are skipped without
    /// being materialized, so this is a scan rather than a second decode.
    pub(crate) fn from_body(body: &[u8]) -> Self {
        let starts_with_object = body
            .iter()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|b| *b == b'{');
        if !starts_with_object {
            return Self::default();
        }
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// Check if any pagination field was present.
    pub fn is_paged(&self) -> bool {
        *self != Self::default()
    }
}

/// A decoded API response together with its HTTP metadata.
#[derive(Debug)]
pub struct Response<T> {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    pagination: Pagination,
    data: T,
}

impl<T> Response<T> {
    pub(crate) fn new(
        status: StatusCode,
        headers: HeaderMap,
        url: Url,
        pagination: Pagination,
        data: T,
    ) -> Self {
        Self {
            status,
            headers,
            url,
            pagination,
            data,
        }
    }

    /// The HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The URL the request was sent to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Pagination fields found in the body.
    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    /// The decoded body.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Consume the envelope and return the decoded body.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Transform the decoded body, keeping the HTTP metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            status: self.status,
            headers: self.headers,
            url: self.url,
            pagination: self.pagination,
            data: f(self.data),
        }
    }
}
