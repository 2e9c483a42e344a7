//! Jira REST transport and shared value types.
//!
//! This module provides the client that builds, authenticates and sends
//! requests, plus the types decoded from responses.

mod adf;
mod auth;
mod client;
mod error;
mod query;
mod response;
mod time;
pub mod types;

pub use adf::AtlassianDoc;
pub use auth::{delete_token, get_token, has_token, store_token, Auth};
pub use client::{
    Client, ClientBuilder, API_VERSION, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
    NO_BODY,
};
pub use error::{ApiError, ErrorKind};
pub use query::Query;
pub use response::{Pagination, Response};
pub use time::{Date, Time};
pub use types::Page;
