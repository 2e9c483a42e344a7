//! Client settings loaded from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ConfigError, Profile, Result};
use crate::api::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};

/// Client-wide settings and the known profiles.
///
/// ```toml
/// default_profile = "work"
/// timeout_secs = 60
///
/// [[profiles]]
/// name = "work"
/// url = "https://company.atlassian.net"
/// email = "me@company.com"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// The `User-Agent` header value.
    pub user_agent: String,
    /// Overall request timeout in seconds.
    pub timeout_secs: u64,
    /// The profile used when none is named.
    pub default_profile: Option<String>,
    /// Known profiles.
    pub profiles: Vec<Profile>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_profile: None,
            profiles: Vec::new(),
        }
    }
}

impl Settings {
    /// Parse settings from a TOML string and validate every profile.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), profiles = settings.profiles.len(), "Settings loaded");
        Ok(settings)
    }

    /// Validate the settings.
    ///
    /// Profile names must be unique and the default profile, when set, must
    /// exist.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        for (i, profile) in self.profiles.iter().enumerate() {
            profile.validate()?;
            if self.profiles[..i].iter().any(|p| p.name == profile.name) {
                return Err(ConfigError::Validation(format!(
                    "duplicate profile name '{}'",
                    profile.name
                )));
            }
        }

        if let Some(name) = &self.default_profile {
            self.profile(name)?;
        }

        Ok(())
    }

    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))
    }

    /// The default profile, or the only profile when exactly one exists.
    pub fn default_profile(&self) -> Result<&Profile> {
        match (&self.default_profile, self.profiles.as_slice()) {
            (Some(name), _) => self.profile(name),
            (None, [only]) => Ok(only),
            (None, _) => Err(ConfigError::ProfileNotFound("default".to_string())),
        }
    }
}
