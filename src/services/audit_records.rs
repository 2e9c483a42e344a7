//! The audit log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::api::{Client, Query, Response};
use crate::error::Result;

/// Audit log operations.
#[derive(Debug, Clone, Copy)]
pub struct AuditRecordsService<'a> {
    pub(super) client: &'a Client,
}

/// One audit log entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_account_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_item: Option<AssociatedItem>,
    #[serde(default)]
    pub changed_values: Vec<ChangedValue>,
    #[serde(default)]
    pub associated_items: Vec<AssociatedItem>,
}

/// An entity touched by an audited change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociatedItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedValue {
    #[serde(default)]
    pub field_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_to: Option<String>,
}

/// A window of the audit log. Paged by offset rather than `startAt`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecords {
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub limit: i64,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub records: Vec<AuditRecord>,
}

impl AuditRecords {
    /// Check if records remain past this window.
    pub fn has_more(&self) -> bool {
        self.offset + (self.records.len() as i64) < self.total
    }
}

/// Filters for [`AuditRecordsService::list`].
#[derive(Debug, Clone, Default)]
pub struct ListAuditRecordsOptions {
    pub offset: u32,
    pub limit: u32,
    /// Matched against summary, category, object and author.
    pub filter: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl<'a> AuditRecordsService<'a> {
    /// List audit records, newest first.
    pub async fn list(&self, options: &ListAuditRecordsOptions) -> Result<Response<AuditRecords>> {
        let from = options.from.map(|d| d.format("%Y-%m-%d").to_string());
        let to = options.to.map(|d| d.format("%Y-%m-%d").to_string());
        let path = Query::new()
            .int("offset", options.offset)
            .int("limit", options.limit)
            .opt_string("filter", options.filter.as_deref())
            .opt_string("from", from.as_deref())
            .opt_string("to", to.as_deref())
            .apply("/rest/api/3/auditing/record");
        self.client.get(&path).await
    }
}
