//! Issues: CRUD, transitions, changelogs, notifications and metadata.

use std::collections::HashMap;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use super::attachments::Attachment;
use super::comments::Comments;
use super::issue_links::IssueLink;
use super::votes::Votes;
use super::worklogs::Worklogs;
use super::{segment, PageOptions};
use crate::api::types::{
    Component, EntityProperty, FieldMeta, Group, IssueType, Priority, Project, Resolution, Schema,
    Status, Transition, User, Version, Watches,
};
use crate::api::{AtlassianDoc, Client, Date, Query, Response, Time, NO_BODY};
use crate::error::Result;

/// Issue operations.
#[derive(Debug, Clone, Copy)]
pub struct IssuesService<'a> {
    pub(super) client: &'a Client,
}

/// A Jira issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The issue key (e.g., "PROJ-123").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<IssueFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<Changelog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<Operations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editmeta: Option<EditMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transitions: Option<Vec<Transition>>,
    /// Field ID to display name, with `expand=names`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<HashMap<String, String>>,
    /// Field ID to schema, with `expand=schema`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<HashMap<String, Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_fields: Option<HashMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Vec<EntityProperty>>,
}

impl Issue {
    /// Get the issue summary.
    pub fn summary(&self) -> &str {
        self.fields
            .as_ref()
            .and_then(|f| f.summary.as_deref())
            .unwrap_or_default()
    }

    /// Get the status name.
    pub fn status_name(&self) -> Option<&str> {
        self.fields.as_ref()?.status.as_ref()?.name.as_deref()
    }

    /// Get the assignee display name or "Unassigned".
    pub fn assignee_name(&self) -> &str {
        self.fields
            .as_ref()
            .and_then(|f| f.assignee.as_ref())
            .map(User::name)
            .unwrap_or("Unassigned")
    }

    /// Get the description rendered as plain text.
    pub fn description_text(&self) -> String {
        self.fields
            .as_ref()
            .and_then(|f| f.description.as_ref())
            .and_then(AtlassianDoc::from_value)
            .map(|doc| doc.to_plain_text())
            .unwrap_or_default()
    }

    /// Get a custom field value by ID (e.g., "customfield_10016").
    pub fn custom_field(&self, field_id: &str) -> Option<&Value> {
        self.fields.as_ref()?.custom_fields.get(field_id)
    }
}

/// Issue fields.
///
/// System fields are typed; everything else, including custom fields, is
/// kept in `custom_fields` keyed by field ID.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Description in Atlassian Document Format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuetype: Option<IssueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolutiondate: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<Time>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duedate: Option<Date>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watches: Option<Watches>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporter: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<Votes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<Comments>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<Component>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregateprogress: Option<Progress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timetracking: Option<TimeTracking>,
    /// Seconds spent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timespent: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeestimate: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeoriginalestimate: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worklog: Option<Worklogs>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuelinks: Option<Vec<IssueLink>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Vec<Attachment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<Issue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<Issue>>,
    #[serde(rename = "fixVersions", default, skip_serializing_if = "Option::is_none")]
    pub fix_versions: Option<Vec<Version>>,
    /// Affected versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<Vec<Version>>,
    /// Environment in Atlassian Document Format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityLevel>,
    /// Every field not listed above, keyed by field ID.
    #[serde(flatten)]
    pub custom_fields: HashMap<String, Value>,
}

/// An issue security level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityLevel {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Progress in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<i64>,
}

/// Time tracking estimates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeTracking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_estimate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_estimate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_estimate_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_estimate_seconds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_seconds: Option<i64>,
}

/// A page of an issue's change history.
///
/// `GET issue/{key}/changelog` pages through `values`; an issue expanded
/// with `changelog` carries `histories` instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Changelog {
    #[serde(default)]
    pub start_at: i64,
    #[serde(default)]
    pub max_results: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_last: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub histories: Vec<ChangeHistory>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<ChangeHistory>,
}

impl Changelog {
    /// The change entries, whichever shape the server used.
    pub fn entries(&self) -> &[ChangeHistory] {
        if self.values.is_empty() {
            &self.histories
        } else {
            &self.values
        }
    }
}

/// One change set in the history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<Time>,
    #[serde(default)]
    pub items: Vec<ChangeItem>,
}

/// A single field change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(rename = "fieldtype", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_string: Option<String>,
}

/// UI operations available on an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operations {
    #[serde(default)]
    pub link_groups: Vec<LinkGroup>,
}

/// A group of UI links.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<SimpleLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
    #[serde(default)]
    pub links: Vec<SimpleLink>,
    #[serde(default)]
    pub groups: Vec<LinkGroup>,
}

/// A UI link.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i64>,
}

/// Fields that can be edited on an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditMeta {
    #[serde(default)]
    pub fields: HashMap<String, FieldMeta>,
}

/// Options for fetching an issue.
#[derive(Debug, Clone, Default)]
pub struct GetIssueOptions {
    /// Fields to return, e.g. `summary`, `*all` or `-comment`.
    pub fields: Vec<String>,
    /// Expansions such as `renderedFields`, `names`, `changelog`.
    pub expand: Vec<String>,
    /// Issue property keys to include.
    pub properties: Vec<String>,
    pub fields_by_keys: bool,
    /// Add the issue to the user's "recently viewed" list.
    pub update_history: bool,
}

/// Body for creating, updating or transitioning an issue.
///
/// `fields` sets values directly; `update` applies operations such as
/// `{"labels": [{"add": "x"}]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub fields: serde_json::Map<String, Value>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub update: serde_json::Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_metadata: Option<HistoryMetadata>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<EntityProperty>,
}

impl IssueRequest {
    /// Start a create request for a project and issue type, by key and name.
    pub fn create(project_key: &str, issue_type: &str, summary: &str) -> Self {
        Self::default()
            .field("project", json!({ "key": project_key }))
            .field("issuetype", json!({ "name": issue_type }))
            .field("summary", json!(summary))
    }

    /// Set a field value.
    pub fn field(mut self, field_id: &str, value: Value) -> Self {
        self.fields.insert(field_id.to_string(), value);
        self
    }

    /// Set the description from plain text.
    pub fn description(self, text: &str) -> Self {
        self.field("description", AtlassianDoc::from_text(text).to_value())
    }

    /// Add an update operation for a field.
    pub fn update_op(mut self, field_id: &str, operation: &str, value: Value) -> Self {
        let ops = self
            .update
            .entry(field_id.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(ops) = ops {
            ops.push(json!({ operation: value }));
        }
        self
    }

    /// Perform a transition as part of the request.
    pub fn with_transition(mut self, transition_id: &str) -> Self {
        self.transition = Some(TransitionInput {
            id: transition_id.to_string(),
            looped: None,
        });
        self
    }
}

/// Transition to perform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransitionInput {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub looped: Option<bool>,
}

/// Audit details recorded with a change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMetadata {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub metadata_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_description_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_description_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<HistoryMetadataParticipant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generator: Option<HistoryMetadataParticipant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<HistoryMetadataParticipant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<HashMap<String, String>>,
}

/// A participant in a history metadata record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMetadataParticipant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name_key: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub participant_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A newly created issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatedIssue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<TransitionResult>,
}

/// Outcome of a transition performed during creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResult {
    #[serde(default)]
    pub status: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_collection: Option<ErrorCollection>,
}

/// Errors reported for one element of a bulk operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorCollection {
    #[serde(default)]
    pub error_messages: Vec<String>,
    #[serde(default)]
    pub errors: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<i64>,
}

/// Result of a bulk create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkCreateResult {
    #[serde(default)]
    pub issues: Vec<CreatedIssue>,
    #[serde(default)]
    pub errors: Vec<BulkOperationError>,
}

/// A failed element of a bulk create.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationError {
    #[serde(default)]
    pub status: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_errors: Option<ErrorCollection>,
    /// Index of the failed request in the submitted list.
    #[serde(default)]
    pub failed_element_number: i64,
}

/// Options for updating an issue.
#[derive(Debug, Clone, Default)]
pub struct UpdateIssueOptions {
    /// Whether watchers are notified. Unset leaves the server default
    /// (notify); `Some(false)` suppresses notifications.
    pub notify_users: Option<bool>,
    pub override_screen_security: bool,
    pub override_editable_flag: bool,
    /// Return the updated issue in the response body.
    pub return_issue: bool,
    pub expand: Vec<String>,
}

/// Options for listing transitions.
#[derive(Debug, Clone, Default)]
pub struct GetTransitionsOptions {
    pub transition_id: Option<String>,
    pub skip_remote_only_condition: bool,
    pub include_unavailable_transitions: bool,
    pub sort_by_ops_bar_and_status: bool,
    /// `transitions.fields` includes screen fields.
    pub expand: Vec<String>,
}

/// Options for fetching edit metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct EditMetaOptions {
    pub override_screen_security: bool,
    pub override_editable_flag: bool,
}

/// Filters for create metadata.
#[derive(Debug, Clone, Default)]
pub struct CreateMetaOptions {
    pub project_ids: Vec<String>,
    pub project_keys: Vec<String>,
    pub issue_type_ids: Vec<String>,
    pub issue_type_names: Vec<String>,
    /// `projects.issuetypes.fields` includes field metadata.
    pub expand: Vec<String>,
}

/// Projects and issue types the user can create issues in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expand: Option<String>,
    #[serde(default)]
    pub projects: Vec<CreateMetaProject>,
}

/// A project in the create metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMetaProject {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_urls: Option<HashMap<String, String>>,
    #[serde(rename = "issuetypes", default)]
    pub issue_types: Vec<CreateMetaIssueType>,
}

/// An issue type in the create metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMetaIssueType {
    #[serde(rename = "self", default, skip_serializing_if = "Option::is_none")]
    pub self_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub subtask: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<i64>,
    #[serde(default)]
    pub fields: HashMap<String, FieldMeta>,
}

/// An email notification about an issue.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NotificationRecipients>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restrict: Option<NotificationRestrict>,
}

/// Who receives a notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationRecipients {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub reporter: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub assignee: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub watchers: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub voters: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<User>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,
}

/// Restricts notification recipients to groups or permissions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NotificationRestrict {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<RestrictedPermission>,
}

/// A permission a recipient must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestrictedPermission {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Transitions {
    #[serde(default)]
    transitions: Vec<Transition>,
}

impl<'a> IssuesService<'a> {
    fn path(issue_id_or_key: &str) -> String {
        format!("/rest/api/3/issue/{}", segment(issue_id_or_key))
    }

    /// Get an issue.
    #[instrument(skip(self, options))]
    pub async fn get(
        &self,
        issue_id_or_key: &str,
        options: Option<&GetIssueOptions>,
    ) -> Result<Response<Issue>> {
        debug!("Fetching issue");
        let query = match options {
            Some(o) => Query::new()
                .joined("fields", &o.fields)
                .joined("expand", &o.expand)
                .joined("properties", &o.properties)
                .flag("fieldsByKeys", o.fields_by_keys)
                .flag("updateHistory", o.update_history),
            None => Query::new(),
        };
        self.client.get(&query.apply(Self::path(issue_id_or_key))).await
    }

    /// Create an issue.
    #[instrument(skip(self, issue))]
    pub async fn create(&self, issue: &IssueRequest) -> Result<Response<CreatedIssue>> {
        let response: Response<CreatedIssue> = self.client.post("/rest/api/3/issue", issue).await?;
        debug!(key = ?response.data().key, "Issue created");
        Ok(response)
    }

    /// Create up to 50 issues in one call.
    #[instrument(skip(self, issues), fields(count = issues.len()))]
    pub async fn create_bulk(&self, issues: &[IssueRequest]) -> Result<Response<BulkCreateResult>> {
        let body = BulkCreateBody {
            issue_updates: issues,
        };
        self.client.post("/rest/api/3/issue/bulk", &body).await
    }

    /// Update an issue.
    ///
    /// With `return_issue` set the updated issue is returned; otherwise the
    /// data is `None`.
    #[instrument(skip(self, issue, options))]
    pub async fn update(
        &self,
        issue_id_or_key: &str,
        issue: &IssueRequest,
        options: &UpdateIssueOptions,
    ) -> Result<Response<Option<Issue>>> {
        let path = Query::new()
            .opt_bool("notifyUsers", options.notify_users)
            .flag("overrideScreenSecurity", options.override_screen_security)
            .flag("overrideEditableFlag", options.override_editable_flag)
            .flag("returnIssue", options.return_issue)
            .joined("expand", &options.expand)
            .apply(Self::path(issue_id_or_key));
        self.client.put(&path, issue).await
    }

    /// Delete an issue, optionally with its subtasks.
    #[instrument(skip(self))]
    pub async fn delete(&self, issue_id_or_key: &str, delete_subtasks: bool) -> Result<Response<()>> {
        let path = Query::new()
            .flag("deleteSubtasks", delete_subtasks)
            .apply(Self::path(issue_id_or_key));
        self.client.delete(&path).await
    }

    /// Assign an issue to a user by account ID.
    #[instrument(skip(self))]
    pub async fn assign(&self, issue_id_or_key: &str, account_id: &str) -> Result<Response<()>> {
        let path = format!("{}/assignee", Self::path(issue_id_or_key));
        self.client
            .call_empty(Method::PUT, &path, Some(&json!({ "accountId": account_id })))
            .await
    }

    /// Remove the assignee of an issue.
    #[instrument(skip(self))]
    pub async fn unassign(&self, issue_id_or_key: &str) -> Result<Response<()>> {
        let path = format!("{}/assignee", Self::path(issue_id_or_key));
        self.client
            .call_empty(Method::PUT, &path, Some(&json!({ "accountId": null })))
            .await
    }

    /// List the transitions available on an issue.
    #[instrument(skip(self, options))]
    pub async fn get_transitions(
        &self,
        issue_id_or_key: &str,
        options: &GetTransitionsOptions,
    ) -> Result<Response<Vec<Transition>>> {
        let path = Query::new()
            .opt_string("transitionId", options.transition_id.as_deref())
            .flag("skipRemoteOnlyCondition", options.skip_remote_only_condition)
            .flag(
                "includeUnavailableTransitions",
                options.include_unavailable_transitions,
            )
            .flag("sortByOpsBarAndStatus", options.sort_by_ops_bar_and_status)
            .joined("expand", &options.expand)
            .apply(format!("{}/transitions", Self::path(issue_id_or_key)));
        let response: Response<Transitions> = self.client.get(&path).await?;
        Ok(response.map(|t| t.transitions))
    }

    /// Perform a transition. The request must carry `transition`.
    #[instrument(skip(self, request))]
    pub async fn do_transition(
        &self,
        issue_id_or_key: &str,
        request: &IssueRequest,
    ) -> Result<Response<()>> {
        let path = format!("{}/transitions", Self::path(issue_id_or_key));
        self.client
            .call_empty(Method::POST, &path, Some(request))
            .await
    }

    /// Get a page of the issue's change history.
    #[instrument(skip(self))]
    pub async fn get_changelog(
        &self,
        issue_id_or_key: &str,
        page: PageOptions,
    ) -> Result<Response<Changelog>> {
        let path = page
            .apply(Query::new())
            .apply(format!("{}/changelog", Self::path(issue_id_or_key)));
        self.client.get(&path).await
    }

    /// Send an email notification about an issue.
    #[instrument(skip(self, notification))]
    pub async fn notify(
        &self,
        issue_id_or_key: &str,
        notification: &Notification,
    ) -> Result<Response<()>> {
        let path = format!("{}/notify", Self::path(issue_id_or_key));
        self.client
            .call_empty(Method::POST, &path, Some(notification))
            .await
    }

    /// Get the fields that can be edited on an issue.
    pub async fn get_edit_meta(
        &self,
        issue_id_or_key: &str,
        options: EditMetaOptions,
    ) -> Result<Response<EditMeta>> {
        let path = Query::new()
            .flag("overrideScreenSecurity", options.override_screen_security)
            .flag("overrideEditableFlag", options.override_editable_flag)
            .apply(format!("{}/editmeta", Self::path(issue_id_or_key)));
        self.client.get(&path).await
    }

    /// Get the projects, issue types and fields available for creation.
    pub async fn get_create_meta(&self, options: &CreateMetaOptions) -> Result<Response<CreateMeta>> {
        let path = Query::new()
            .joined("projectIds", &options.project_ids)
            .joined("projectKeys", &options.project_keys)
            .joined("issuetypeIds", &options.issue_type_ids)
            .joined("issuetypeNames", &options.issue_type_names)
            .joined("expand", &options.expand)
            .apply("/rest/api/3/issue/createmeta");
        self.client.get(&path).await
    }

    /// Archive issues by ID or key.
    #[instrument(skip(self))]
    pub async fn archive(&self, issue_ids_or_keys: &[&str]) -> Result<Response<()>> {
        let body = json!({ "issueIdsOrKeys": issue_ids_or_keys });
        self.client
            .call_empty(Method::PUT, "/rest/api/3/issue/archive", Some(&body))
            .await
    }

    /// Restore archived issues by ID or key.
    #[instrument(skip(self))]
    pub async fn unarchive(&self, issue_ids_or_keys: &[&str]) -> Result<Response<()>> {
        let body = json!({ "issueIdsOrKeys": issue_ids_or_keys });
        self.client
            .call_empty(Method::PUT, "/rest/api/3/issue/unarchive", Some(&body))
            .await
    }

    /// Fetch the raw issue JSON without typed decoding.
    pub async fn get_raw(&self, issue_id_or_key: &str) -> Result<Response<Value>> {
        self.client
            .call(Method::GET, &Self::path(issue_id_or_key), NO_BODY)
            .await
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BulkCreateBody<'b> {
    issue_updates: &'b [IssueRequest],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::setup;
    use mockito::Matcher;

    const ISSUE: &str = r#"{
        "id": "10001",
        "key": "TEST-123",
        "self": "https://example.atlassian.net/rest/api/3/issue/10001",
        "fields": {
            "summary": "Test issue",
            "description": {"type": "doc", "version": 1, "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "Details here"}]}
            ]},
            "status": {"id": "1", "name": "Open"},
            "issuetype": {"id": "10000", "name": "Bug"},
            "priority": null,
            "assignee": {"accountId": "abc", "displayName": "John Doe"},
            "labels": ["backend"],
            "created": "2024-01-15T10:30:00.000+0000",
            "duedate": "2024-02-01",
            "customfield_10016": 5.0,
            "customfield_10020": null
        }
    }"#;

    #[tokio::test]
    async fn test_get_issue() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/issue/TEST-123")
            .match_header("accept", "application/json")
            .match_header("authorization", Matcher::Regex("^Basic ".to_string()))
            .with_status(200)
            .with_body(ISSUE)
            .create_async()
            .await;

        let issue = client.issues().get("TEST-123", None).await.unwrap().into_inner();
        assert_eq!(issue.key.as_deref(), Some("TEST-123"));
        assert_eq!(issue.summary(), "Test issue");
        assert_eq!(issue.status_name(), Some("Open"));
        assert_eq!(issue.assignee_name(), "John Doe");
        assert_eq!(issue.description_text(), "Details here");
        assert_eq!(issue.custom_field("customfield_10016"), Some(&json!(5.0)));
        assert_eq!(issue.custom_field("customfield_10020"), Some(&Value::Null));

        let fields = issue.fields.unwrap();
        assert!(fields.priority.is_none());
        assert_eq!(fields.duedate.unwrap().to_string(), "2024-02-01");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_issue_with_options() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("GET", "/rest/api/3/issue/TEST-123")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("fields".into(), "summary,status".into()),
                Matcher::UrlEncoded("expand".into(), "names".into()),
                Matcher::UrlEncoded("updateHistory".into(), "true".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"key":"TEST-123"}"#)
            .create_async()
            .await;

        let options = GetIssueOptions {
            fields: vec!["summary".to_string(), "status".to_string()],
            expand: vec!["names".to_string()],
            update_history: true,
            ..GetIssueOptions::default()
        };
        client.issues().get("TEST-123", Some(&options)).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_missing_issue() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/issue/NOPE-1")
            .with_status(404)
            .with_body(r#"{"errorMessages":["Issue does not exist or you do not have permission to see it."],"errors":{}}"#)
            .create_async()
            .await;

        let err = client.issues().get("NOPE-1", None).await.unwrap_err();
        assert_eq!(err.status(), Some(reqwest::StatusCode::NOT_FOUND));
        assert!(err.to_string().contains("Issue does not exist"));
    }

    #[tokio::test]
    async fn test_create_issue() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("POST", "/rest/api/3/issue")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "fields": {
                    "project": {"key": "PROJ"},
                    "issuetype": {"name": "Task"},
                    "summary": "Write docs",
                    "labels": ["docs"]
                }
            })))
            .with_status(201)
            .with_body(r#"{"id":"10002","key":"PROJ-2","self":"https://x/rest/api/3/issue/10002"}"#)
            .create_async()
            .await;

        let request = IssueRequest::create("PROJ", "Task", "Write docs").field("labels", json!(["docs"]));
        let created = client.issues().create(&request).await.unwrap();
        assert_eq!(created.status(), 201);
        assert_eq!(created.data().key.as_deref(), Some("PROJ-2"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_bulk_reports_errors() {
        let (mut server, client) = setup().await;
        server
            .mock("POST", "/rest/api/3/issue/bulk")
            .match_body(Matcher::Regex(r#"^\{"issueUpdates":\["#.to_string()))
            .with_status(201)
            .with_body(
                r#"{"issues":[{"key":"PROJ-3"}],"errors":[{"status":400,"failedElementNumber":1,
                    "elementErrors":{"errors":{"summary":"required"}}}]}"#,
            )
            .create_async()
            .await;

        let requests = vec![
            IssueRequest::create("PROJ", "Task", "ok"),
            IssueRequest::create("PROJ", "Task", ""),
        ];
        let result = client.issues().create_bulk(&requests).await.unwrap().into_inner();
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.errors[0].failed_element_number, 1);
        assert_eq!(
            result.errors[0].element_errors.as_ref().unwrap().errors["summary"],
            "required"
        );
    }

    #[tokio::test]
    async fn test_update_notify_users_tri_state() {
        let (mut server, client) = setup().await;
        let silent = server
            .mock("PUT", "/rest/api/3/issue/PROJ-1")
            .match_query(Matcher::UrlEncoded("notifyUsers".into(), "false".into()))
            .with_status(204)
            .create_async()
            .await;

        let request = IssueRequest::default().update_op("labels", "add", json!("urgent"));
        let options = UpdateIssueOptions {
            notify_users: Some(false),
            ..UpdateIssueOptions::default()
        };
        let response = client.issues().update("PROJ-1", &request, &options).await.unwrap();
        assert!(response.data().is_none());
        silent.assert_async().await;

        let default = server
            .mock("PUT", "/rest/api/3/issue/PROJ-2")
            .match_body(Matcher::Json(json!({"update": {"labels": [{"add": "urgent"}]}})))
            .with_status(204)
            .create_async()
            .await;
        client
            .issues()
            .update("PROJ-2", &request, &UpdateIssueOptions::default())
            .await
            .unwrap();
        default.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_returning_issue() {
        let (mut server, client) = setup().await;
        server
            .mock("PUT", "/rest/api/3/issue/TEST-123")
            .match_query(Matcher::UrlEncoded("returnIssue".into(), "true".into()))
            .with_status(200)
            .with_body(ISSUE)
            .create_async()
            .await;

        let options = UpdateIssueOptions {
            return_issue: true,
            ..UpdateIssueOptions::default()
        };
        let request = IssueRequest::default().field("summary", json!("Test issue"));
        let issue = client
            .issues()
            .update("TEST-123", &request, &options)
            .await
            .unwrap()
            .into_inner()
            .unwrap();
        assert_eq!(issue.summary(), "Test issue");
    }

    #[tokio::test]
    async fn test_assign_and_unassign() {
        let (mut server, client) = setup().await;
        let assign = server
            .mock("PUT", "/rest/api/3/issue/PROJ-1/assignee")
            .match_body(Matcher::Json(json!({"accountId": "abc"})))
            .with_status(204)
            .create_async()
            .await;
        let unassign = server
            .mock("PUT", "/rest/api/3/issue/PROJ-1/assignee")
            .match_body(Matcher::Json(json!({"accountId": null})))
            .with_status(204)
            .create_async()
            .await;

        client.issues().assign("PROJ-1", "abc").await.unwrap();
        client.issues().unassign("PROJ-1").await.unwrap();
        assign.assert_async().await;
        unassign.assert_async().await;
    }

    #[tokio::test]
    async fn test_transitions() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/issue/PROJ-1/transitions")
            .with_status(200)
            .with_body(r#"{"transitions":[{"id":"11","name":"To Do"},{"id":"21","name":"In Progress"}]}"#)
            .create_async()
            .await;
        let perform = server
            .mock("POST", "/rest/api/3/issue/PROJ-1/transitions")
            .match_body(Matcher::Json(json!({"transition": {"id": "21"}})))
            .with_status(204)
            .create_async()
            .await;

        let transitions = client
            .issues()
            .get_transitions("PROJ-1", &GetTransitionsOptions::default())
            .await
            .unwrap()
            .into_inner();
        assert_eq!(transitions.len(), 2);

        let request = IssueRequest::default().with_transition("21");
        client.issues().do_transition("PROJ-1", &request).await.unwrap();
        perform.assert_async().await;
    }

    #[tokio::test]
    async fn test_changelog_entries() {
        let (mut server, client) = setup().await;
        server
            .mock("GET", "/rest/api/3/issue/PROJ-1/changelog")
            .match_query(Matcher::UrlEncoded("maxResults".into(), "100".into()))
            .with_status(200)
            .with_body(r#"{"startAt":0,"maxResults":100,"total":1,"isLast":true,"values":[
                {"id":"1","created":"2024-01-15T10:30:00.000+0000","items":[
                    {"field":"status","fieldtype":"jira","fromString":"Open","toString":"Done"}]}]}"#)
            .create_async()
            .await;

        let changelog = client
            .issues()
            .get_changelog("PROJ-1", PageOptions::new(0, 100))
            .await
            .unwrap()
            .into_inner();
        let entries = changelog.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].items[0].to_string.as_deref(), Some("Done"));
        assert_eq!(entries[0].items[0].field_type.as_deref(), Some("jira"));
    }

    #[test]
    fn test_notification_skips_unset_recipients() {
        let notification = Notification {
            subject: Some("Heads up".to_string()),
            to: Some(NotificationRecipients {
                assignee: true,
                ..NotificationRecipients::default()
            }),
            ..Notification::default()
        };
        assert_eq!(
            serde_json::to_value(&notification).unwrap(),
            json!({"subject": "Heads up", "to": {"assignee": true}})
        );
    }

    #[test]
    fn test_issue_fields_round_trip_custom_fields() {
        let issue: Issue = serde_json::from_str(ISSUE).unwrap();
        let encoded = serde_json::to_value(&issue).unwrap();
        assert_eq!(encoded["fields"]["customfield_10016"], json!(5.0));
        assert_eq!(encoded["fields"]["created"], json!("2024-01-15T10:30:00.000+0000"));
        assert!(encoded["fields"].get("priority").is_none());
    }

    #[tokio::test]
    async fn test_archive() {
        let (mut server, client) = setup().await;
        let mock = server
            .mock("PUT", "/rest/api/3/issue/archive")
            .match_body(Matcher::Json(json!({"issueIdsOrKeys": ["PROJ-1", "PROJ-2"]})))
            .with_status(200)
            .with_body(r#"{"numberOfIssuesUpdated":2}"#)
            .create_async()
            .await;

        client.issues().archive(&["PROJ-1", "PROJ-2"]).await.unwrap();
        mock.assert_async().await;
    }
}
