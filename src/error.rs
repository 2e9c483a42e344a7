//! Centralized error types for jira-cloud.
//!
//! Every fallible operation in the crate returns [`Error`]. Failures before a
//! request is sent (`InvalidBaseUrl`, `InvalidPath`, `Serialization`) are kept
//! apart from server rejections (`Api`) and unreadable success bodies
//! (`Decode`). Transport failures are passed through from `reqwest` as-is.

use reqwest::StatusCode;
use thiserror::Error;

use crate::api::{ApiError, ErrorKind};
use crate::config::ConfigError;

/// The main error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The base URL could not be parsed or cannot carry a path.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The request path could not be resolved against the base URL.
    #[error("invalid request path: {0}")]
    InvalidPath(String),

    /// The request body could not be encoded as JSON.
    #[error("failed to encode request body: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The server answered with a non-2xx status.
    #[error("{0}")]
    Api(#[from] ApiError),

    /// A 2xx response body could not be decoded into the expected type.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        /// The URL of the request whose response was unreadable.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Network or HTTP transport error.
    #[error(transparent)]
    Network(#[from] reqwest::Error),

    /// Configuration-related errors.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Keyring error when storing or retrieving tokens.
    #[error("keyring error: {0}")]
    Keyring(String),

    /// Local I/O failure (reading upload files and the like).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The HTTP status carried by an API error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Api(e) => Some(e.status),
            Error::Network(e) => e.status(),
            _ => None,
        }
    }

    /// The API error payload, if the server rejected the request.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Check if the server reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        self.as_api_error().is_some_and(ApiError::is_not_found)
    }

    /// Check if the failure is likely to go away on its own.
    ///
    /// True for rate limiting, server errors, timeouts and connection
    /// failures. The client never retries; this is for callers that do.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Api(e) => matches!(e.kind(), ErrorKind::RateLimited | ErrorKind::Server),
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Get a short message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidBaseUrl(_) => "Invalid Jira URL in configuration.".to_string(),
            Error::InvalidPath(path) => format!("Invalid request path '{}'.", path),
            Error::Serialization(_) => "Could not encode the request. Internal error.".to_string(),
            Error::Api(e) => match e.kind() {
                ErrorKind::Unauthorized => {
                    "Authentication failed. Please check your email and API token.".to_string()
                }
                ErrorKind::Forbidden => {
                    "Access denied. You don't have permission to access this resource.".to_string()
                }
                ErrorKind::NotFound => "The requested resource was not found.".to_string(),
                ErrorKind::Conflict => {
                    "The resource was modified by someone else. Refresh and try again.".to_string()
                }
                ErrorKind::RateLimited => {
                    "Too many requests. Please wait a moment and try again.".to_string()
                }
                ErrorKind::Server => "Jira server error. Please try again later.".to_string(),
                ErrorKind::Client => {
                    let messages = e.messages();
                    if messages.is_empty() {
                        format!("Jira rejected the request ({}).", e.status.as_u16())
                    } else {
                        messages.join(", ")
                    }
                }
            },
            Error::Decode { .. } => "Unexpected response from Jira.".to_string(),
            Error::Network(_) => {
                "Connection failed. Please check your internet connection.".to_string()
            }
            Error::Config(e) => format!("Configuration error: {}", e),
            Error::Keyring(_) => {
                "Could not access secure storage. Please store your API token again.".to_string()
            }
            Error::Io(_) => "A file operation failed. Please check file permissions.".to_string(),
        }
    }
}

/// Result type for jira-cloud operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    fn api(status: StatusCode, body: &str) -> Error {
        Error::Api(ApiError::from_response(
            status,
            Method::GET,
            "https://example.atlassian.net/rest/api/3/myself",
            body.as_bytes(),
        ))
    }

    #[test]
    fn test_status_of_api_error() {
        let err = api(StatusCode::NOT_FOUND, "");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_status_absent_for_local_errors() {
        let err = Error::InvalidPath("http://evil.example.com/".to_string());
        assert_eq!(err.status(), None);
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_is_transient() {
        assert!(api(StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(api(StatusCode::SERVICE_UNAVAILABLE, "").is_transient());
        assert!(!api(StatusCode::UNAUTHORIZED, "").is_transient());
        assert!(!api(StatusCode::BAD_REQUEST, "").is_transient());
    }

    #[test]
    fn test_user_message_unauthorized() {
        let msg = api(StatusCode::UNAUTHORIZED, "").user_message();
        assert!(msg.contains("Authentication failed"));
        assert!(msg.contains("API token"));
    }

    #[test]
    fn test_user_message_client_error_uses_payload() {
        let err = api(
            StatusCode::BAD_REQUEST,
            r#"{"errors":{"summary":"You must specify a summary of the issue."}}"#,
        );
        assert_eq!(
            err.user_message(),
            "summary: You must specify a summary of the issue."
        );
    }

    #[test]
    fn test_display_passes_api_error_through() {
        let err = api(StatusCode::NOT_FOUND, r#"{"errorMessages":["Issue does not exist"]}"#);
        assert!(err.to_string().contains("Issue does not exist"));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_from_config_error() {
        let err: Error = ConfigError::ProfileNotFound("work".to_string()).into();
        assert!(matches!(err, Error::Config(ConfigError::ProfileNotFound(_))));
        assert!(err.user_message().contains("work"));
    }
}
