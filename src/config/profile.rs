//! Named Jira site profiles.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Result};

/// Connection details for one Jira Cloud site.
///
/// The API token is not part of the profile; it lives in the OS keyring
/// under the profile name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    /// Unique profile name, also the keyring key for the token.
    pub name: String,

    /// The site URL (e.g., "https://company.atlassian.net").
    pub url: String,

    /// The Atlassian account email used for Basic auth.
    pub email: String,
}

impl Profile {
    /// Create a new profile.
    pub fn new(name: impl Into<String>, url: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            email: email.into(),
        }
    }

    /// Validate this profile.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the name is empty or contains
    /// whitespace, the URL is not http(s), or the email has no `@`.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ConfigError::Validation(
                "profile name cannot be empty".to_string(),
            ));
        }

        if self.name.contains(char::is_whitespace) {
            return Err(ConfigError::Validation(format!(
                "profile name '{}' cannot contain whitespace",
                self.name
            )));
        }

        if self.url.is_empty() {
            return Err(ConfigError::Validation(format!(
                "profile '{}': URL cannot be empty",
                self.name
            )));
        }

        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(ConfigError::Validation(format!(
                "profile '{}': URL must start with http:// or https://",
                self.name
            )));
        }

        if self.email.is_empty() {
            return Err(ConfigError::Validation(format!(
                "profile '{}': email cannot be empty",
                self.name
            )));
        }

        if !self.email.contains('@') {
            return Err(ConfigError::Validation(format!(
                "profile '{}': '{}' does not appear to be a valid email address",
                self.name, self.email
            )));
        }

        Ok(())
    }
}
