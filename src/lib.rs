//! jira-cloud: a typed client for the Jira Cloud REST API v3.
//!
//! Build a [`Client`] and reach each resource group through its service
//! accessor:
//!
//! ```no_run
//! # async fn run() -> jira_cloud::Result<()> {
//! let client = jira_cloud::Client::builder("https://company.atlassian.net")
//!     .with_basic_auth("me@company.com", "api-token")
//!     .build()?;
//!
//! let issue = client.issues().get("PROJ-1", None).await?.into_inner();
//! println!("{}", issue.key.unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! Every call returns a [`Response`] holding the decoded body together with
//! the HTTP status, headers and any pagination fields. Non-2xx statuses come
//! back as [`Error::Api`] carrying the server's messages.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod services;

pub use api::{Auth, Client, ClientBuilder, Response};
pub use error::{Error, Result};
