//! Workflows, transition properties and transition rules.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

use super::{segment, PageOptions};
use crate::api::types::{Page, Scope};
use crate::api::{Client, Query, Response};
use crate::error::Result;

/// Workflow operations.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowsService<'a> {
    pub(super) client: &'a Client,
}

/// A workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<WorkflowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(default)]
    pub transitions: Vec<WorkflowTransition>,
    #[serde(default)]
    pub statuses: Vec<WorkflowStatus>,
}

impl Workflow {
    /// The workflow name, if the ID was returned.
    pub fn name(&self) -> Option<&str> {
        self.id.as_ref().and_then(|id| id.name.as_deref())
    }
}

/// Identifies a workflow by name and, for drafts, entity ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowId {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
}

/// A transition between workflow statuses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTransition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Source status IDs. Empty for global transitions.
    #[serde(default)]
    pub from: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// `global`, `initial` or `directed`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub transition_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<TransitionScreen>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<TransitionRules>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionScreen {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Conditions, validators and post functions on a transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRules {
    #[serde(default)]
    pub conditions: Vec<WorkflowRule>,
    #[serde(default)]
    pub validators: Vec<WorkflowRule>,
    #[serde(default)]
    pub post_functions: Vec<WorkflowRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions_tree: Option<ConditionGroup>,
}

/// A single condition, validator or post function.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRule {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<serde_json::Value>,
}

/// A nested group of conditions joined by `AND` or `OR`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default)]
    pub conditions: Vec<WorkflowRule>,
    #[serde(default)]
    pub condition_groups: Vec<ConditionGroup>,
}

/// A status within a workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

/// Options for [`WorkflowsService::list`].
#[derive(Debug, Clone, Default)]
pub struct ListWorkflowsOptions {
    pub page: PageOptions,
    pub workflow_names: Vec<String>,
    /// e.g. `transitions`, `statuses`, `default`.
    pub expand: Option<String>,
    pub query_string: Option<String>,
    pub order_by: Option<String>,
    /// Only workflows used by a scheme.
    pub is_active: Option<bool>,
}

/// Body for creating a workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateWorkflowRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub transitions: Vec<NewTransition>,
    pub statuses: Vec<NewWorkflowStatus>,
}

/// A transition to create with a workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewTransition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub from: Vec<String>,
    pub to: String,
    /// `global`, `initial` or `directed`.
    #[serde(rename = "type")]
    pub transition_type: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, String>,
}

/// A status to include in a new workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewWorkflowStatus {
    pub id: String,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, String>,
}

impl NewWorkflowStatus {
    pub fn new(status_id: impl Into<String>) -> Self {
        Self {
            id: status_id.into(),
            properties: HashMap::new(),
        }
    }
}

/// A property set on a transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionProperty {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Selects a transition property and the workflow holding it.
#[derive(Debug, Clone, Default)]
pub struct TransitionPropertyOptions {
    pub workflow_name: String,
    /// `live` or `draft`.
    pub workflow_mode: Option<String>,
    pub include_reserved_keys: bool,
}

impl TransitionPropertyOptions {
    pub fn new(workflow_name: impl Into<String>) -> Self {
        Self {
            workflow_name: workflow_name.into(),
            ..Self::default()
        }
    }

    fn query(&self) -> Query {
        Query::new()
            .string("workflowName", &self.workflow_name)
            .opt_string("workflowMode", self.workflow_mode.as_deref())
    }
}

/// Options for [`WorkflowsService::get_transition_rule_configurations`].
#[derive(Debug, Clone, Default)]
pub struct RuleConfigurationOptions {
    pub page: PageOptions,
    /// `postfunction`, `condition` or `validator`. At least one is required.
    pub types: Vec<String>,
    pub keys: Vec<String>,
    pub workflow_names: Vec<String>,
    pub with_tags: Vec<String>,
    pub draft: bool,
    pub expand: Vec<String>,
}

/// The Connect and Forge rules of one workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTransitionRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_id: Option<WorkflowId>,
    #[serde(default)]
    pub post_functions: Vec<AppRule>,
    #[serde(default)]
    pub conditions: Vec<AppRule>,
    #[serde(default)]
    pub validators: Vec<AppRule>,
}

/// An app-provided transition rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<serde_json::Value>,
}

impl<'a> WorkflowsService<'a> {
    fn properties_path(transition_id: i64) -> String {
        format!("/rest/api/3/workflow/transitions/{}/properties", transition_id)
    }

    /// Search workflows.
    #[instrument(skip(self, options))]
    pub async fn list(&self, options: &ListWorkflowsOptions) -> Result<Response<Page<Workflow>>> {
        let query = options
            .page
            .apply(Query::new())
            .repeated("workflowName", &options.workflow_names)
            .opt_string("expand", options.expand.as_deref())
            .opt_string("queryString", options.query_string.as_deref())
            .opt_string("orderBy", options.order_by.as_deref())
            .opt_bool("isActive", options.is_active);
        self.client
            .get(&query.apply("/rest/api/3/workflow/search"))
            .await
    }

    /// Create a workflow.
    #[instrument(skip(self, workflow), fields(name = %workflow.name))]
    pub async fn create(&self, workflow: &CreateWorkflowRequest) -> Result<Response<WorkflowId>> {
        let response: Response<WorkflowId> = self.client.post("/rest/api/3/workflow", workflow).await?;
        debug!(entity_id = ?response.data().entity_id, "Workflow created");
        Ok(response)
    }

    /// Delete an inactive workflow by entity ID.
    #[instrument(skip(self))]
    pub async fn delete(&self, entity_id: &str) -> Result<Response<()>> {
        let path = format!("/rest/api/3/workflow/{}", segment(entity_id));
        self.client.delete(&path).await
    }

    /// Get the properties of a transition. `key` limits the result to one property.
    pub async fn get_transition_properties(
        &self,
        transition_id: i64,
        key: Option<&str>,
        options: &TransitionPropertyOptions,
    ) -> Result<Response<Vec<TransitionProperty>>> {
        let path = options
            .query()
            .flag("includeReservedKeys", options.include_reserved_keys)
            .opt_string("key", key)
            .apply(Self::properties_path(transition_id));
        self.client.get(&path).await
    }

    /// Add a property to a transition.
    #[instrument(skip(self, options), fields(workflow = %options.workflow_name))]
    pub async fn create_transition_property(
        &self,
        transition_id: i64,
        key: &str,
        value: &str,
        options: &TransitionPropertyOptions,
    ) -> Result<Response<TransitionProperty>> {
        let path = options
            .query()
            .string("key", key)
            .apply(Self::properties_path(transition_id));
        self.client.post(&path, &json!({ "value": value })).await
    }

    /// Change the value of a transition property.
    #[instrument(skip(self, options), fields(workflow = %options.workflow_name))]
    pub async fn update_transition_property(
        &self,
        transition_id: i64,
        key: &str,
        value: &str,
        options: &TransitionPropertyOptions,
    ) -> Result<Response<TransitionProperty>> {
        let path = options
            .query()
            .string("key", key)
            .apply(Self::properties_path(transition_id));
        self.client.put(&path, &json!({ "value": value })).await
    }

    /// Remove a property from a transition.
    #[instrument(skip(self, options), fields(workflow = %options.workflow_name))]
    pub async fn delete_transition_property(
        &self,
        transition_id: i64,
        key: &str,
        options: &TransitionPropertyOptions,
    ) -> Result<Response<()>> {
        let path = options
            .query()
            .string("key", key)
            .apply(Self::properties_path(transition_id));
        self.client.delete(&path).await
    }

    /// Get the app-provided rules configured on workflow transitions.
    pub async fn get_transition_rule_configurations(
        &self,
        options: &RuleConfigurationOptions,
    ) -> Result<Response<Page<WorkflowTransitionRules>>> {
        let query = options
            .page
            .apply(Query::new())
            .repeated("types", &options.types)
            .repeated("keys", &options.keys)
            .repeated("workflowNames", &options.workflow_names)
            .repeated("withTags", &options.with_tags)
            .flag("draft", options.draft)
            .joined("expand", &options.expand);
        self.client
            .get(&query.apply("/rest/api/3/workflow/rule/config"))
            .await
    }
}
