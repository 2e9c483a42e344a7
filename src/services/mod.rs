//! Typed façades over the Jira REST resource groups.
//!
//! Each service borrows the [`Client`] and is obtained through an accessor
//! such as [`Client::issues`]. Service methods only assemble a path, query
//! string and body; sending and decoding is done by the client.

use crate::api::{Client, Query};

pub mod application_roles;
pub mod attachments;
pub mod audit_records;
pub mod avatars;
pub mod comments;
pub mod components;
pub mod dashboards;
pub mod fields;
pub mod filters;
pub mod groups;
pub mod issue_link_types;
pub mod issue_links;
pub mod issue_types;
pub mod issues;
pub mod jql;
pub mod labels;
pub mod myself;
pub mod permissions;
pub mod priorities;
pub mod project_roles;
pub mod projects;
pub mod resolutions;
pub mod screens;
pub mod search;
pub mod server_info;
pub mod statuses;
pub mod users;
pub mod versions;
pub mod votes;
pub mod watchers;
pub mod workflow_schemes;
pub mod workflows;
pub mod worklogs;

/// Encode a value for use as a single path segment.
pub(crate) fn segment(value: impl std::fmt::Display) -> String {
    urlencoding::encode(&value.to_string()).into_owned()
}

/// Offset paging parameters shared by list endpoints.
///
/// Zero values are left out of the query so the server default applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageOptions {
    /// Index of the first item to return.
    pub start_at: u32,
    /// Maximum number of items to return.
    pub max_results: u32,
}

impl PageOptions {
    /// Create paging options.
    pub fn new(start_at: u32, max_results: u32) -> Self {
        Self {
            start_at,
            max_results,
        }
    }

    pub(crate) fn apply(&self, query: Query) -> Query {
        query
            .int("startAt", self.start_at)
            .int("maxResults", self.max_results)
    }
}

/// Where to move items in an ordered list such as priorities or a scheme's issue types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    First,
    Last,
    /// Directly after the item with this ID.
    After(String),
}

#[derive(Debug, serde::Serialize)]
pub(crate) struct MoveBody<'a> {
    pub ids: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<&'a str>,
}

impl Position {
    /// Split into the `position` and `after` body values.
    pub(crate) fn parts(&self) -> (Option<&str>, Option<&str>) {
        match self {
            Position::First => (Some("First"), None),
            Position::Last => (Some("Last"), None),
            Position::After(id) => (None, Some(id.as_str())),
        }
    }
}

impl<'a> MoveBody<'a> {
    pub(crate) fn new(ids: &'a [&'a str], position: &'a Position) -> Self {
        let (position, after) = position.parts();
        Self { ids, position, after }
    }
}

macro_rules! service_accessors {
    ($($(#[$doc:meta])* $accessor:ident => $module:ident::$service:ident;)*) => {
        impl Client {
            $(
                $(#[$doc])*
                pub fn $accessor(&self) -> $module::$service<'_> {
                    $module::$service { client: self }
                }
            )*
        }
    };
}

service_accessors! {
    /// Application roles (Jira Software, Service Management, ...).
    application_roles => application_roles::ApplicationRolesService;
    /// Issue attachments.
    attachments => attachments::AttachmentsService;
    /// Audit log records.
    audit_records => audit_records::AuditRecordsService;
    /// System, project and issue type avatars.
    avatars => avatars::AvatarsService;
    /// Issue comments and their properties.
    comments => comments::CommentsService;
    /// Project components.
    components => components::ComponentsService;
    /// Dashboards and gadgets.
    dashboards => dashboards::DashboardsService;
    /// Fields, field contexts and options.
    fields => fields::FieldsService;
    /// Saved filters and share permissions.
    filters => filters::FiltersService;
    /// User groups.
    groups => groups::GroupsService;
    /// Issue link types.
    issue_link_types => issue_link_types::IssueLinkTypesService;
    /// Links between issues.
    issue_links => issue_links::IssueLinksService;
    /// Issue types and issue type schemes.
    issue_types => issue_types::IssueTypesService;
    /// Issues, transitions, changelogs and metadata.
    issues => issues::IssuesService;
    /// JQL parsing, autocomplete and sanitizing.
    jql => jql::JqlService;
    /// Labels.
    labels => labels::LabelsService;
    /// The current user.
    myself => myself::MyselfService;
    /// Permissions, permission schemes and issue security.
    permissions => permissions::PermissionsService;
    /// Priorities and priority schemes.
    priorities => priorities::PrioritiesService;
    /// Project roles and role actors.
    project_roles => project_roles::ProjectRolesService;
    /// Projects.
    projects => projects::ProjectsService;
    /// Resolutions.
    resolutions => resolutions::ResolutionsService;
    /// Screens, tabs and screen schemes.
    screens => screens::ScreensService;
    /// Issue search.
    search => search::SearchService;
    /// Server information.
    server_info => server_info::ServerInfoService;
    /// Statuses and status categories.
    statuses => statuses::StatusesService;
    /// Users.
    users => users::UsersService;
    /// Project versions.
    versions => versions::VersionsService;
    /// Issue votes.
    votes => votes::VotesService;
    /// Issue watchers.
    watchers => watchers::WatchersService;
    /// Workflow schemes and drafts.
    workflow_schemes => workflow_schemes::WorkflowSchemesService;
    /// Workflows and transition properties.
    workflows => workflows::WorkflowsService;
    /// Issue worklogs and their properties.
    worklogs => worklogs::WorklogsService;
}
