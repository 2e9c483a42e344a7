//! Logging configuration using the tracing ecosystem.
//!
//! The library itself only emits `tracing` events and spans. Applications
//! that do not install their own subscriber can call [`init`] to get:
//! - Output to stderr, or to a daily rotating file
//! - Level configuration via the `RUST_LOG` environment variable
//! - File and line numbers on every event

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Default log filter if `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "jira_cloud=info,warn";

const LOG_FILE_PREFIX: &str = "jira-cloud.log";

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Write to standard error.
    Stderr,
    /// Write to a daily rotating file in the given directory.
    File(PathBuf),
}

/// Logging options for [`init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is not set.
    pub default_filter: String,
    /// Output destination.
    pub target: LogTarget,
    /// Whether to emit ANSI colours (stderr only).
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_filter: DEFAULT_LOG_FILTER.to_string(),
            target: LogTarget::Stderr,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Log to a daily rotating file in the default log directory.
    pub fn file() -> anyhow::Result<Self> {
        Ok(Self {
            target: LogTarget::File(default_log_directory()?),
            ansi: false,
            ..Self::default()
        })
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Install a global tracing subscriber.
///
/// When logging to a file the returned [`WorkerGuard`] must be kept alive
/// for the lifetime of the program; dropping it flushes and stops the
/// background writer.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a global
/// subscriber is already installed.
///
/// # Example
///
/// ```no_run
/// use jira_cloud::logging::{self, LogConfig};
///
/// let _guard = logging::init(LogConfig::default())?;
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn init(config: LogConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = config.filter();

    let guard = match &config.target {
        LogTarget::Stderr => {
            let subscriber = tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_ansi(config.ansi)
                        .with_target(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(filter);
            tracing::subscriber::set_global_default(subscriber)?;
            None
        }
        LogTarget::File(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(file_appender);

            let subscriber = tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(filter);
            tracing::subscriber::set_global_default(subscriber)?;
            tracing::debug!(log_dir = %dir.display(), "Log directory");
            Some(guard)
        }
    };

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "jira-cloud logging initialized");
    Ok(guard)
}

/// The platform-specific log directory, `<local data dir>/jira-cloud/logs`.
pub fn default_log_directory() -> anyhow::Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(base_dir.join("jira-cloud").join("logs"))
}
