//! Optional file-based configuration.
//!
//! Clients can always be built programmatically. This module adds named
//! profiles and client settings loaded from a TOML file, with API tokens kept
//! in the OS keyring.

mod profile;
mod settings;

use std::path::PathBuf;

use thiserror::Error;

pub use profile::Profile;
pub use settings::Settings;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`Settings`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value failed validation.
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// No profile with the requested name exists.
    #[error("profile '{0}' not found")]
    ProfileNotFound(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
