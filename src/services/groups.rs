//! User groups and group membership.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use super::PageOptions;
use crate::api::types::{Group, Page, User};
use crate::api::{Client, Query, Response};
use crate::error::Result;

/// Group operations.
///
/// Groups are addressed by name, passed as the `groupname` query parameter.
#[derive(Debug, Clone, Copy)]
pub struct GroupsService<'a> {
    pub(super) client: &'a Client,
}

/// Options for [`GroupsService::bulk_get`].
#[derive(Debug, Clone, Default)]
pub struct BulkGetGroupsOptions {
    pub page: PageOptions,
    pub group_ids: Vec<String>,
    pub group_names: Vec<String>,
}

/// Options for [`GroupsService::find`].
#[derive(Debug, Clone, Default)]
pub struct FindGroupsOptions {
    pub account_id: Option<String>,
    pub query: Option<String>,
    /// Group names to leave out.
    pub exclude: Vec<String>,
    pub exclude_ids: Vec<String>,
    pub max_results: u32,
    pub case_insensitive: bool,
}

/// Groups matching a picker query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundGroups {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub groups: Vec<GroupSuggestion>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSuggestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Name with the match highlighted in HTML.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default)]
    pub labels: Vec<GroupLabel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

/// A label shown next to a group suggestion, such as "Admin".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLabel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// `ADMIN`, `SINGLE` or `MULTIPLE`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub label_type: Option<String>,
}

const GROUP_PATH: &str = "/rest/api/3/group";

impl<'a> GroupsService<'a> {
    /// Create a group.
    #[instrument(skip(self))]
    pub async fn create(&self, name: &str) -> Result<Response<Group>> {
        self.client.post(GROUP_PATH, &json!({ "name": name })).await
    }

    /// Delete a group, moving its restrictions to `swap_group` if given.
    #[instrument(skip(self))]
    pub async fn delete(&self, group_name: &str, swap_group: Option<&str>) -> Result<Response<()>> {
        let path = Query::new()
            .string("groupname", group_name)
            .opt_string("swapGroup", swap_group)
            .apply(GROUP_PATH);
        self.client.delete(&path).await
    }

    /// Get a group. `expand=users` includes the members.
    #[instrument(skip(self))]
    pub async fn get(&self, group_name: &str, expand: &[&str]) -> Result<Response<Group>> {
        let path = Query::new()
            .string("groupname", group_name)
            .repeated("expand", expand)
            .apply(GROUP_PATH);
        self.client.get(&path).await
    }

    /// Get a page of groups by ID or name.
    pub async fn bulk_get(&self, options: &BulkGetGroupsOptions) -> Result<Response<Page<Group>>> {
        let query = options
            .page
            .apply(Query::new())
            .repeated("groupId", &options.group_ids)
            .repeated("groupName", &options.group_names);
        self.client
            .get(&query.apply("/rest/api/3/group/bulk"))
            .await
    }

    /// Get a page of group members.
    #[instrument(skip(self))]
    pub async fn get_members(
        &self,
        group_name: &str,
        include_inactive_users: bool,
        page: PageOptions,
    ) -> Result<Response<Page<User>>> {
        let query = Query::new()
            .string("groupname", group_name)
            .flag("includeInactiveUsers", include_inactive_users);
        let path = page.apply(query).apply("/rest/api/3/group/member");

        let response: Response<Page<User>> = self.client.get(&path).await?;
        debug!(total = response.data().total, "Group members fetched");
        Ok(response)
    }

    /// Add a user to a group.
    #[instrument(skip(self))]
    pub async fn add_user(&self, group_name: &str, account_id: &str) -> Result<Response<Group>> {
        let path = Query::new()
            .string("groupname", group_name)
            .apply("/rest/api/3/group/user");
        self.client
            .post(&path, &json!({ "accountId": account_id }))
            .await
    }

    /// Remove a user from a group.
    #[instrument(skip(self))]
    pub async fn remove_user(&self, group_name: &str, account_id: &str) -> Result<Response<()>> {
        let path = Query::new()
            .string("groupname", group_name)
            .string("accountId", account_id)
            .apply("/rest/api/3/group/user");
        self.client.delete(&path).await
    }

    /// Suggest groups matching a query.
    pub async fn find(&self, options: &FindGroupsOptions) -> Result<Response<FoundGroups>> {
        let path = Query::new()
            .opt_string("accountId", options.account_id.as_deref())
            .opt_string("query", options.query.as_deref())
            .repeated("exclude", &options.exclude)
            .repeated("excludeId", &options.exclude_ids)
            .int("maxResults", options.max_results)
            .flag("caseInsensitive", options.case_insensitive)
            .apply("/rest/api/3/groups/picker");
        self.client.get(&path).await
    }
}
