//! Patch and filter types for workspace operations.

use serde::{Deserialize, Serialize};

use crate::model::{
    Branding, EpicStatus, ItemKind, Priority, Role, StoryStatus, TaskKind, TaskStatus,
};

/// Fields to update on a story. `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct StoryUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub epic_id: Option<String>,
    pub assigned_to: Option<String>,
    pub status: Option<StoryStatus>,
    pub priority: Option<Priority>,
    pub points: Option<u32>,
    pub sprint_id: Option<Option<String>>,
}

impl StoryUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.epic_id.is_none()
            && self.assigned_to.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.points.is_none()
            && self.sprint_id.is_none()
    }

    /// Shorthand for a board drag-and-drop move.
    #[must_use]
    pub fn status(status: StoryStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Fields to update on an epic. Story counters are not patchable.
#[derive(Debug, Clone, Default)]
pub struct EpicUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<EpicStatus>,
    pub priority: Option<Priority>,
    pub owner_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub team: Option<Vec<String>>,
    pub sprint_id: Option<Option<String>>,
}

impl EpicUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.owner_id.is_none()
            && self.tags.is_none()
            && self.team.is_none()
            && self.sprint_id.is_none()
    }
}

/// Fields to update on a task.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,
    pub kind: Option<TaskKind>,
    pub sprint_id: Option<Option<String>>,
}

impl TaskUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.assigned_to.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.kind.is_none()
            && self.sprint_id.is_none()
    }
}

/// Fields to update on a user.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<Role>,
    /// Moving a user between tenants is a SuperAdmin-console operation.
    pub org_id: Option<String>,
}

impl UserUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.avatar.is_none()
            && self.role.is_none()
            && self.org_id.is_none()
    }

    /// True when only profile fields (name, email, avatar) change.
    #[must_use]
    pub const fn is_profile_only(&self) -> bool {
        self.role.is_none() && self.org_id.is_none()
    }
}

/// Fields to update on an organization.
#[derive(Debug, Clone, Default)]
pub struct OrgUpdate {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub logo: Option<String>,
    pub branding: Option<Option<Branding>>,
}

/// Sprint predicate for discovery and board queries.
///
/// `Backlog` matches items with no sprint, which is distinct from `Any`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SprintFilter {
    #[default]
    Any,
    Backlog,
    Sprint(String),
}

impl SprintFilter {
    #[must_use]
    pub fn matches(&self, sprint_id: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Backlog => sprint_id.is_none(),
            Self::Sprint(id) => sprint_id == Some(id.as_str()),
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Any)
    }
}

/// Predicate set for the unified discovery search.
///
/// Every `None` (and `SprintFilter::Any`) is an inactive filter and matches
/// everything; active filters are combined with AND.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryFilters {
    /// Case-insensitive substring match on the display name.
    pub text: Option<String>,
    pub kind: Option<ItemKind>,
    /// Status label, compared case-insensitively across item kinds.
    pub status: Option<String>,
    pub priority: Option<Priority>,
    /// Matches the epic owner or the story/task assignee.
    pub assignee: Option<String>,
    pub sprint: SprintFilter,
}

impl DiscoveryFilters {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().is_none_or(str::is_empty)
            && self.kind.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.assignee.is_none()
            && !self.sprint.is_active()
    }
}

/// Kanban board filters over the organization's stories.
#[derive(Debug, Clone, Default)]
pub struct BoardFilters {
    /// Free-text match on story title.
    pub search: Option<String>,
    pub assignee: Option<String>,
    pub priority: Option<Priority>,
    pub epic: Option<String>,
    pub status: Option<StoryStatus>,
    /// `None` defers to the workspace's active sprint.
    pub sprint: Option<SprintFilter>,
}
