use serde::Serialize;

use iterion_lib::board::Board;
use iterion_lib::model::{Branding, ItemKind, Organization, Priority, Role, User};
use iterion_lib::{DashboardMetrics, DetailView, OrgScope, Workspace, WorkItem};

/// Org header shared by the per-org views.
#[derive(Debug, Clone, Serialize)]
pub struct OrgRef<'a> {
    pub id: &'a str,
    pub name: &'a str,
}

impl<'a> From<&'a Organization> for OrgRef<'a> {
    fn from(org: &'a Organization) -> Self {
        Self {
            id: &org.id,
            name: &org.name,
        }
    }
}

/// Dashboard view.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardOutput<'a> {
    pub org: OrgRef<'a>,
    #[serde(flatten)]
    pub metrics: &'a DashboardMetrics,
}

/// One row of the discovery list.
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryRow<'a> {
    pub id: &'a str,
    pub kind: ItemKind,
    pub name: &'a str,
    pub status: &'static str,
    pub priority: Priority,
    pub owner: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<&'a str>,
    pub detail_view: DetailView,
}

impl<'a> DiscoveryRow<'a> {
    #[must_use]
    pub fn new(item: &WorkItem<'a>, scope: &OrgScope<'a>) -> Self {
        Self {
            id: item.id(),
            kind: item.kind(),
            name: item.name(),
            status: item.status_label(),
            priority: item.priority(),
            owner: item.owner_of(),
            owner_name: scope.user_name(item.owner_of()),
            sprint_id: item.sprint_id(),
            detail_view: item.detail_view(),
        }
    }
}

/// Board view with the sprint that was actually applied.
#[derive(Debug, Clone, Serialize)]
pub struct BoardOutput<'a> {
    pub org: OrgRef<'a>,
    #[serde(flatten)]
    pub board: &'a Board<'a>,
    pub story_count: usize,
}

/// Team member with the acting user's permissions toward them.
#[derive(Debug, Clone, Serialize)]
pub struct TeamMember<'a> {
    #[serde(flatten)]
    pub user: &'a User,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_modify: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamOutput<'a> {
    pub org: OrgRef<'a>,
    pub members: Vec<TeamMember<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acting_as: Option<&'a str>,
    /// Roles the acting user may hand out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignable_roles: Option<&'static [Role]>,
}

/// Organization with headline counts.
#[derive(Debug, Clone, Serialize)]
pub struct OrgSummary<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub domain: &'a str,
    pub logo: &'a str,
    pub branding: Branding,
    pub users: usize,
    pub epics: usize,
    pub stories: usize,
}

impl<'a> OrgSummary<'a> {
    #[must_use]
    pub fn new(org: &'a Organization, workspace: &'a Workspace) -> Self {
        let scope = OrgScope::resolve(workspace, &org.id);
        Self {
            id: &org.id,
            name: &org.name,
            domain: &org.domain,
            logo: &org.logo,
            branding: org.effective_branding(),
            users: scope.users.len(),
            epics: scope.epics.len(),
            stories: scope.stories.len(),
        }
    }
}
