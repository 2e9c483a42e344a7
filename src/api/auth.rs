//! Authentication handling for Jira Cloud.
//!
//! Two strategies are supported: Basic auth (email + API token) and bearer
//! tokens. Both are reduced to a single `Authorization` header value when the
//! credentials are constructed, so the raw token is never kept around.
//! API tokens can also be kept in the OS keyring, keyed by profile name.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::warn;

use crate::error::{Error, Result};

/// The keyring service name for stored API tokens.
const KEYRING_SERVICE: &str = "jira-cloud";

/// Credentials attached to every outgoing request.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// Basic authentication with an Atlassian account email and API token.
    Basic {
        /// The account email address.
        email: String,
        /// The complete "Basic ..." header value.
        header: String,
    },
    /// Bearer token authentication (OAuth 2.0 access tokens, PATs).
    Bearer {
        /// The complete "Bearer ..." header value.
        header: String,
    },
}

impl Auth {
    /// Create Basic auth credentials from email and API token.
    ///
    /// The token is immediately encoded and the raw token is not stored.
    pub fn basic(email: &str, token: &str) -> Self {
        Auth::Basic {
            email: email.to_string(),
            header: build_basic_header(email, token),
        }
    }

    /// Create bearer token credentials.
    pub fn bearer(token: &str) -> Self {
        Auth::Bearer {
            header: format!("Bearer {}", token),
        }
    }

    /// Create Basic auth credentials using a token from the OS keyring.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be retrieved from the keyring.
    pub fn from_keyring(profile_name: &str, email: &str) -> Result<Self> {
        let token = get_token(profile_name)?;
        Ok(Self::basic(email, &token))
    }

    /// Get the authorization header value for HTTP requests.
    pub fn header_value(&self) -> &str {
        match self {
            Auth::Basic { header, .. } | Auth::Bearer { header } => header,
        }
    }

    /// Get the email address for Basic credentials.
    pub fn email(&self) -> Option<&str> {
        match self {
            Auth::Basic { email, .. } => Some(email),
            Auth::Bearer { .. } => None,
        }
    }

    /// Set the `Authorization` header on an outgoing request.
    ///
    /// A value that is not a legal header (control characters in the token)
    /// is dropped with a warning; the server will then reject the request.
    pub fn apply(&self, headers: &mut HeaderMap) {
        match HeaderValue::from_str(self.header_value()) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("Credentials contain characters not allowed in a header, sending request unauthenticated"),
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Basic { email, .. } => f
                .debug_struct("Basic")
                .field("email", email)
                .field("header", &"<redacted>")
                .finish(),
            Auth::Bearer { .. } => f.debug_struct("Bearer").field("header", &"<redacted>").finish(),
        }
    }
}

/// Build the Basic Auth header value.
///
/// Encodes "email:token" in Base64 and prepends "Basic ".
fn build_basic_header(email: &str, token: &str) -> String {
    let credentials = format!("{}:{}", email, token);
    let encoded = BASE64.encode(credentials.as_bytes());
    format!("Basic {}", encoded)
}

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry> {
    keyring::Entry::new(KEYRING_SERVICE, profile_name)
        .map_err(|e| Error::Keyring(format!("failed to access keyring: {}", e)))
}

/// Store an API token in the OS keyring under the profile name.
///
/// # Errors
///
/// Returns an error if the token cannot be stored in the keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<()> {
    keyring_entry(profile_name)?
        .set_password(token)
        .map_err(|e| Error::Keyring(format!("failed to store token: {}", e)))
}

/// Retrieve an API token from the OS keyring.
///
/// # Errors
///
/// Returns an error if no token is stored or the keyring is unavailable.
pub fn get_token(profile_name: &str) -> Result<String> {
    keyring_entry(profile_name)?
        .get_password()
        .map_err(|e| Error::Keyring(format!("failed to retrieve token: {}", e)))
}

/// Delete an API token from the OS keyring.
///
/// # Errors
///
/// Returns an error if the token cannot be deleted from the keyring.
pub fn delete_token(profile_name: &str) -> Result<()> {
    keyring_entry(profile_name)?
        .delete_password()
        .map_err(|e| Error::Keyring(format!("failed to delete token: {}", e)))
}

/// Check if a token exists in the OS keyring for a profile.
pub fn has_token(profile_name: &str) -> bool {
    get_token(profile_name).is_ok()
}
