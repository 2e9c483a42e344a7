//! Error payloads returned by the Jira API.

use std::collections::BTreeMap;
use std::fmt;

use reqwest::{Method, StatusCode};
use serde::Deserialize;

/// Coarse classification of a failed API call by status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 401: invalid email or API token.
    Unauthorized,
    /// 403: the user lacks access to the resource.
    Forbidden,
    /// 404: the resource does not exist or is not visible.
    NotFound,
    /// 409: the resource was modified concurrently.
    Conflict,
    /// 429: rate limited.
    RateLimited,
    /// 5xx.
    Server,
    /// Any other non-2xx status (validation failures and the like).
    Client,
}

impl ErrorKind {
    /// Classify an HTTP status code.
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            409 => ErrorKind::Conflict,
            429 => ErrorKind::RateLimited,
            500..=599 => ErrorKind::Server,
            _ => ErrorKind::Client,
        }
    }
}

/// Wire shape of a Jira error body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    error_messages: Option<Vec<String>>,
    #[serde(default)]
    errors: Option<BTreeMap<String, String>>,
}

/// A non-2xx response from the Jira API.
///
/// Carries the status code and the originating request so callers can branch
/// on the status (for example treating 404 specially).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The HTTP status code returned by the server.
    pub status: StatusCode,
    /// The method of the request that failed.
    pub method: Method,
    /// The full URL of the request that failed.
    pub url: String,
    /// Human-readable messages from `errorMessages`.
    pub error_messages: Vec<String>,
    /// Field-level messages from `errors`.
    pub errors: BTreeMap<String, String>,
}

impl ApiError {
    /// Build an error from a failed response body.
    ///
    /// The body is parsed on a best-effort basis: an empty or unparsable body
    /// yields an error that only carries the status code.
    pub fn from_response(status: StatusCode, method: Method, url: impl Into<String>, body: &[u8]) -> Self {
        let parsed = if body.is_empty() {
            ErrorBody::default()
        } else {
            serde_json::from_slice::<ErrorBody>(body).unwrap_or_default()
        };

        Self {
            status,
            method,
            url: url.into(),
            error_messages: parsed.error_messages.unwrap_or_default(),
            errors: parsed.errors.unwrap_or_default(),
        }
    }

    /// Classify this error by its status code.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::from_status(self.status)
    }

    /// Check if the resource was not found.
    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    /// All messages carried by the error, field errors rendered as "field: message".
    pub fn messages(&self) -> Vec<String> {
        if !self.error_messages.is_empty() {
            return self.error_messages.clone();
        }
        self.errors
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.method, self.url, self.status.as_u16())?;
        let messages = self.messages();
        if !messages.is_empty() {
            write!(f, " {}", messages.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_error(status: StatusCode, body: &str) -> ApiError {
        ApiError::from_response(
            status,
            Method::GET,
            "https://example.atlassian.net/rest/api/3/issue/PROJ-1",
            body.as_bytes(),
        )
    }

    #[test]
    fn test_kind_from_status() {
        assert_eq!(ErrorKind::from_status(StatusCode::UNAUTHORIZED), ErrorKind::Unauthorized);
        assert_eq!(ErrorKind::from_status(StatusCode::FORBIDDEN), ErrorKind::Forbidden);
        assert_eq!(ErrorKind::from_status(StatusCode::NOT_FOUND), ErrorKind::NotFound);
        assert_eq!(ErrorKind::from_status(StatusCode::CONFLICT), ErrorKind::Conflict);
        assert_eq!(ErrorKind::from_status(StatusCode::TOO_MANY_REQUESTS), ErrorKind::RateLimited);
        assert_eq!(ErrorKind::from_status(StatusCode::BAD_GATEWAY), ErrorKind::Server);
        assert_eq!(ErrorKind::from_status(StatusCode::BAD_REQUEST), ErrorKind::Client);
    }

    #[test]
    fn test_display_with_error_messages() {
        let err = api_error(
            StatusCode::NOT_FOUND,
            r#"{"errorMessages":["Issue does not exist","Or no permission"]}"#,
        );
        assert_eq!(
            err.to_string(),
            "GET https://example.atlassian.net/rest/api/3/issue/PROJ-1: 404 Issue does not exist, Or no permission"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_display_with_field_errors() {
        let err = api_error(
            StatusCode::BAD_REQUEST,
            r#"{"errorMessages":[],"errors":{"summary":"Summary is required","project":"Project is required"}}"#,
        );
        assert_eq!(
            err.to_string(),
            "GET https://example.atlassian.net/rest/api/3/issue/PROJ-1: 400 project: Project is required, summary: Summary is required"
        );
        assert_eq!(err.kind(), ErrorKind::Client);
    }

    #[test]
    fn test_display_with_empty_body() {
        let err = api_error(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(
            err.to_string(),
            "GET https://example.atlassian.net/rest/api/3/issue/PROJ-1: 500"
        );
        assert!(err.messages().is_empty());
    }

    #[test]
    fn test_unparsable_body_keeps_status() {
        let err = api_error(StatusCode::BAD_GATEWAY, "<html>upstream down</html>");
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert!(err.error_messages.is_empty());
        assert!(err.errors.is_empty());
    }
}
