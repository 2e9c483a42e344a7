//! Users: lookup, search, groups and default issue navigator columns.

use std::collections::HashMap;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use super::PageOptions;
use crate::api::types::{Page, User};
use crate::api::{Client, Query, Response};
use crate::error::Result;

/// User operations.
#[derive(Debug, Clone, Copy)]
pub struct UsersService<'a> {
    pub(super) client: &'a Client,
}

/// Options for [`UsersService::search`].
#[derive(Debug, Clone, Default)]
pub struct UserSearchOptions {
    /// Matched against display name and email address.
    pub query: Option<String>,
    pub account_id: Option<String>,
    pub page: PageOptions,
    /// A user property query such as `thepropertykey.something.nested=1`.
    pub property: Option<String>,
}

/// Fields for creating a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Products the user gets access to, e.g. `jira-software`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub products: Vec<String>,
}

/// Account ID for a legacy user key or username.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountIdMigration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

/// A column in the issue navigator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// The field ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A group a user belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// Options for [`UsersService::find_assignable`].
///
/// One of `project` or `issue_key` is required by the server.
#[derive(Debug, Clone, Default)]
pub struct FindAssignableOptions {
    pub query: Option<String>,
    pub session_id: Option<String>,
    pub account_id: Option<String>,
    pub project: Option<String>,
    pub issue_key: Option<String>,
    pub page: PageOptions,
    /// The transition the user would be assigned during.
    pub action_descriptor_id: Option<i64>,
    pub recommend: bool,
}

/// Options for [`UsersService::find_with_permissions`].
#[derive(Debug, Clone, Default)]
pub struct FindWithPermissionsOptions {
    /// Permission keys such as `BROWSE` or `EDIT_ISSUES`; all must be held.
    pub permissions: Vec<String>,
    pub query: Option<String>,
    pub account_id: Option<String>,
    pub issue_key: Option<String>,
    pub project_key: Option<String>,
    pub page: PageOptions,
}

/// Options for [`UsersService::find_for_picker`].
#[derive(Debug, Clone, Default)]
pub struct UserPickerOptions {
    pub query: String,
    pub max_results: u32,
    pub show_avatar: bool,
    pub exclude_account_ids: Vec<String>,
    pub avatar_size: Option<String>,
    pub exclude_connect_users: bool,
}

/// Users matching a picker query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPickerResult {
    #[serde(default)]
    pub users: Vec<UserPickerUser>,
    #[serde(default)]
    pub total: i64,
    /// e.g. "Showing 20 of 25 matching users".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPickerUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    /// Display name with the match highlighted in HTML.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// A user's email address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEmail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Email addresses keyed by account ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEmails {
    #[serde(default)]
    pub emails: HashMap<String, String>,
}

const COLUMNS_PATH: &str = "/rest/api/3/user/columns";

impl<'a> UsersService<'a> {
    /// Search users by name or email.
    #[instrument(skip(self, options))]
    pub async fn search(&self, options: &UserSearchOptions) -> Result<Response<Vec<User>>> {
        let query = Query::new()
            .opt_string("query", options.query.as_deref())
            .opt_string("accountId", options.account_id.as_deref())
            .opt_string("property", options.property.as_deref());
        let path = options.page.apply(query).apply("/rest/api/3/user/search");

        let response: Response<Vec<User>> = self.client.get(&path).await?;
        debug!(count = response.data().len(), "Users found");
        Ok(response)
    }

    /// Get a user by account ID.
    #[instrument(skip(self))]
    pub async fn get(&self, account_id: &str, expand: &[&str]) -> Result<Response<User>> {
        let path = Query::new()
            .string("accountId", account_id)
            .joined("expand", expand)
            .apply("/rest/api/3/user");
        self.client.get(&path).await
    }

    /// Create a user. Requires site administration rights.
    #[instrument(skip(self, user))]
    pub async fn create(&self, user: &CreateUserRequest) -> Result<Response<User>> {
        self.client.post("/rest/api/3/user", user).await
    }

    /// Delete a user.
    #[instrument(skip(self))]
    pub async fn delete(&self, account_id: &str) -> Result<Response<()>> {
        let path = Query::new()
            .string("accountId", account_id)
            .apply("/rest/api/3/user");
        self.client.delete(&path).await
    }

    /// Get a page of users by account ID.
    #[instrument(skip(self, account_ids), fields(count = account_ids.len()))]
    pub async fn bulk_get(&self, account_ids: &[&str], page: PageOptions) -> Result<Response<Page<User>>> {
        let query = Query::new().repeated("accountId", account_ids);
        let path = page.apply(query).apply("/rest/api/3/user/bulk");
        self.client.get(&path).await
    }

    /// Look up account IDs for legacy user keys and usernames.
    pub async fn bulk_get_migration(
        &self,
        user_keys: &[&str],
        usernames: &[&str],
        page: PageOptions,
    ) -> Result<Response<Vec<AccountIdMigration>>> {
        let query = page
            .apply(Query::new())
            .repeated("key", user_keys)
            .repeated("username", usernames);
        self.client
            .get(&query.apply("/rest/api/3/user/bulk/migration"))
            .await
    }

    /// Get the default issue navigator columns of a user, or of the caller
    /// when `account_id` is `None`.
    pub async fn get_default_columns(&self, account_id: Option<&str>) -> Result<Response<Vec<ColumnItem>>> {
        let path = Query::new()
            .opt_string("accountId", account_id)
            .apply(COLUMNS_PATH);
        self.client.get(&path).await
    }

    /// Set the default issue navigator columns.
    #[instrument(skip(self, columns))]
    pub async fn set_default_columns(
        &self,
        account_id: Option<&str>,
        columns: &[&str],
    ) -> Result<Response<()>> {
        let path = Query::new()
            .opt_string("accountId", account_id)
            .apply(COLUMNS_PATH);
        self.client
            .call_empty(Method::PUT, &path, Some(&json!({ "columns": columns })))
            .await
    }

    /// Reset the default issue navigator columns to the system default.
    pub async fn reset_default_columns(&self, account_id: Option<&str>) -> Result<Response<()>> {
        let path = Query::new()
            .opt_string("accountId", account_id)
            .apply(COLUMNS_PATH);
        self.client.delete(&path).await
    }

    /// List the groups a user belongs to.
    pub async fn get_groups(&self, account_id: &str) -> Result<Response<Vec<GroupName>>> {
        let path = Query::new()
            .string("accountId", account_id)
            .apply("/rest/api/3/user/groups");
        self.client.get(&path).await
    }

    /// Find users who can be assigned issues in a project or to an issue.
    #[instrument(skip(self, options))]
    pub async fn find_assignable(&self, options: &FindAssignableOptions) -> Result<Response<Vec<User>>> {
        let query = Query::new()
            .opt_string("query", options.query.as_deref())
            .opt_string("sessionId", options.session_id.as_deref())
            .opt_string("accountId", options.account_id.as_deref())
            .opt_string("project", options.project.as_deref())
            .opt_string("issueKey", options.issue_key.as_deref())
            .opt_int("actionDescriptorId", options.action_descriptor_id)
            .flag("recommend", options.recommend);
        let path = options
            .page
            .apply(query)
            .apply("/rest/api/3/user/assignable/search");
        self.client.get(&path).await
    }

    /// Find users who can be assigned issues in all of the given projects.
    pub async fn find_assignable_multi_project(
        &self,
        project_keys: &[&str],
        query: Option<&str>,
        page: PageOptions,
    ) -> Result<Response<Vec<User>>> {
        let q = Query::new()
            .joined("projectKeys", project_keys)
            .opt_string("query", query);
        let path = page
            .apply(q)
            .apply("/rest/api/3/user/assignable/multiProjectSearch");
        self.client.get(&path).await
    }

    /// Find users holding every one of a set of permissions.
    pub async fn find_with_permissions(
        &self,
        options: &FindWithPermissionsOptions,
    ) -> Result<Response<Vec<User>>> {
        let query = Query::new()
            .joined("permissions", &options.permissions)
            .opt_string("query", options.query.as_deref())
            .opt_string("accountId", options.account_id.as_deref())
            .opt_string("issueKey", options.issue_key.as_deref())
            .opt_string("projectKey", options.project_key.as_deref());
        let path = options
            .page
            .apply(query)
            .apply("/rest/api/3/user/permission/search");
        self.client.get(&path).await
    }

    /// Find users for a picker, with the matched text highlighted.
    pub async fn find_for_picker(&self, options: &UserPickerOptions) -> Result<Response<UserPickerResult>> {
        let path = Query::new()
            .string("query", &options.query)
            .int("maxResults", options.max_results)
            .flag("showAvatar", options.show_avatar)
            .repeated("excludeAccountIds", &options.exclude_account_ids)
            .opt_string("avatarSize", options.avatar_size.as_deref())
            .flag("excludeConnectUsers", options.exclude_connect_users)
            .apply("/rest/api/3/user/picker");
        self.client.get(&path).await
    }

    /// List all users, including inactive and app users.
    pub async fn list_all(&self, page: PageOptions) -> Result<Response<Vec<User>>> {
        let path = page.apply(Query::new()).apply("/rest/api/3/users/search");
        self.client.get(&path).await
    }

    /// Get a user's email address regardless of privacy settings.
    ///
    /// Only available to Connect and Forge apps with the right scope.
    pub async fn get_email(&self, account_id: &str) -> Result<Response<UserEmail>> {
        let path = Query::new()
            .string("accountId", account_id)
            .apply("/rest/api/3/user/email");
        self.client.get(&path).await
    }

    /// Get email addresses for several users.
    pub async fn bulk_get_email(&self, account_ids: &[&str]) -> Result<Response<UserEmails>> {
        let path = Query::new()
            .repeated("accountId", account_ids)
            .apply("/rest/api/3/user/email/bulk");
        self.client.get(&path).await
    }
}
