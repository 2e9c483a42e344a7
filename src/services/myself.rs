//! The calling user and their preferences.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::types::User;
use crate::api::{Client, Query, Response};
use crate::error::Result;

/// Operations on the authenticated user.
#[derive(Debug, Clone, Copy)]
pub struct MyselfService<'a> {
    pub(super) client: &'a Client,
}

/// The caller's locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    /// e.g. `en_US`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

const PREFERENCES_PATH: &str = "/rest/api/3/mypreferences";
const LOCALE_PATH: &str = "/rest/api/3/mypreferences/locale";

impl<'a> MyselfService<'a> {
    /// Get the authenticated user, e.g. with `groups` or `applicationRoles` expanded.
    pub async fn get(&self, expand: &[&str]) -> Result<Response<User>> {
        let path = Query::new().joined("expand", expand).apply("/rest/api/3/myself");
        self.client.get(&path).await
    }

    /// Get the value of a preference.
    ///
    /// Jira may answer with a JSON string or with bare text; both are accepted.
    pub async fn get_preference(&self, key: &str) -> Result<Response<String>> {
        let path = Query::new().set("key", key).apply(PREFERENCES_PATH);
        let response = self.client.get_bytes(&path).await?;
        Ok(response.map(|body| {
            serde_json::from_slice::<String>(&body)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned())
        }))
    }

    /// Set the value of a preference.
    #[instrument(skip(self, value))]
    pub async fn set_preference(&self, key: &str, value: &str) -> Result<Response<()>> {
        let path = Query::new().set("key", key).apply(PREFERENCES_PATH);
        self.client.call_empty(Method::PUT, &path, Some(value)).await
    }

    /// Delete a preference.
    #[instrument(skip(self))]
    pub async fn delete_preference(&self, key: &str) -> Result<Response<()>> {
        let path = Query::new().set("key", key).apply(PREFERENCES_PATH);
        self.client.delete(&path).await
    }

    /// Get the caller's locale.
    pub async fn get_locale(&self) -> Result<Response<Locale>> {
        self.client.get(LOCALE_PATH).await
    }

    /// Set the caller's locale.
    #[instrument(skip(self))]
    pub async fn set_locale(&self, locale: &str) -> Result<Response<()>> {
        let body = Locale {
            locale: Some(locale.to_string()),
        };
        self.client.call_empty(Method::PUT, LOCALE_PATH, Some(&body)).await
    }

    /// Reset the caller's locale to the instance default.
    #[instrument(skip(self))]
    pub async fn delete_locale(&self) -> Result<Response<()>> {
        self.client.delete(LOCALE_PATH).await
    }
}
