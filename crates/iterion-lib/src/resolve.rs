//! Relationship resolution over the workspace.
//!
//! Every view here is a foreign-key scan: unknown ids produce empty views,
//! never errors.

use std::collections::HashSet;

use crate::model::{Epic, Story, Task, User};
use crate::store::Workspace;

/// The slice of a workspace visible to one organization.
#[derive(Debug, Clone)]
pub struct OrgScope<'a> {
    pub org_id: String,
    pub epics: Vec<&'a Epic>,
    pub users: Vec<&'a User>,
    /// Stories whose parent epic belongs to the org.
    pub stories: Vec<&'a Story>,
    /// Tasks whose parent story is in `stories`.
    pub tasks: Vec<&'a Task>,
}

impl<'a> OrgScope<'a> {
    /// Resolve all four views for `org_id` in one pass per collection.
    #[must_use]
    pub fn resolve(workspace: &'a Workspace, org_id: &str) -> Self {
        let epics: Vec<&Epic> = workspace
            .epics()
            .iter()
            .filter(|e| e.org_id == org_id)
            .collect();
        let users = workspace
            .users()
            .iter()
            .filter(|u| u.org_id == org_id)
            .collect();

        let epic_ids: HashSet<&str> = epics.iter().map(|e| e.id.as_str()).collect();
        let stories: Vec<&Story> = workspace
            .stories()
            .iter()
            .filter(|s| epic_ids.contains(s.epic_id.as_str()))
            .collect();

        let story_ids: HashSet<&str> = stories.iter().map(|s| s.id.as_str()).collect();
        let tasks = workspace
            .tasks()
            .iter()
            .filter(|t| story_ids.contains(t.story_id.as_str()))
            .collect();

        Self {
            org_id: org_id.to_string(),
            epics,
            users,
            stories,
            tasks,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.epics.is_empty() && self.users.is_empty()
    }

    #[must_use]
    pub fn user(&self, id: &str) -> Option<&'a User> {
        self.users.iter().copied().find(|u| u.id == id)
    }

    /// Display name for a user id, if the user is in this org.
    #[must_use]
    pub fn user_name(&self, id: &str) -> Option<&'a str> {
        self.user(id).map(|u| u.name.as_str())
    }
}

/// Stories under one epic, in store order.
pub fn stories_for_epic<'a>(
    stories: impl IntoIterator<Item = &'a Story>,
    epic_id: &'a str,
) -> impl Iterator<Item = &'a Story> {
    stories.into_iter().filter(move |s| s.epic_id == epic_id)
}

/// Tasks and bugs under one story, in store order.
pub fn tasks_for_story<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    story_id: &'a str,
) -> impl Iterator<Item = &'a Task> {
    tasks.into_iter().filter(move |t| t.story_id == story_id)
}

/// Stories scheduled into a specific sprint.
pub fn stories_in_sprint<'a>(
    stories: impl IntoIterator<Item = &'a Story>,
    sprint_id: &'a str,
) -> impl Iterator<Item = &'a Story> {
    stories
        .into_iter()
        .filter(move |s| s.sprint_id.as_deref() == Some(sprint_id))
}

/// Stories with no sprint.
pub fn backlog<'a>(stories: impl IntoIterator<Item = &'a Story>) -> impl Iterator<Item = &'a Story> {
    stories.into_iter().filter(|s| s.sprint_id.is_none())
}

/// Users on an epic's team, in team order. Unknown ids are skipped.
#[must_use]
pub fn epic_team<'a>(workspace: &'a Workspace, epic: &Epic) -> Vec<&'a User> {
    epic.team
        .iter()
        .filter_map(|id| workspace.get_user(id))
        .collect()
}

// ============================================================================
// Dangling References
// ============================================================================

/// A record whose foreign key points at nothing.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DanglingRef {
    pub record: String,
    pub field: &'static str,
    pub missing: String,
}

/// Scan every foreign key in the workspace.
///
/// Fixture files are loaded as-is, so this is how `doctor` finds stories
/// pointing at missing epics and the like.
#[must_use]
pub fn dangling_refs(workspace: &Workspace) -> Vec<DanglingRef> {
    let mut found = Vec::new();
    let mut check = |record: &str, field: &'static str, id: &str, exists: bool| {
        if !exists {
            found.push(DanglingRef {
                record: record.to_string(),
                field,
                missing: id.to_string(),
            });
        }
    };

    for user in workspace.users() {
        check(&user.id, "org_id", &user.org_id, workspace.get_org(&user.org_id).is_some());
    }
    for epic in workspace.epics() {
        check(&epic.id, "org_id", &epic.org_id, workspace.get_org(&epic.org_id).is_some());
        check(&epic.id, "owner_id", &epic.owner_id, workspace.get_user(&epic.owner_id).is_some());
    }
    for story in workspace.stories() {
        check(&story.id, "epic_id", &story.epic_id, workspace.get_epic(&story.epic_id).is_some());
        if !story.assigned_to.is_empty() {
            let exists = workspace.get_user(&story.assigned_to).is_some();
            check(&story.id, "assigned_to", &story.assigned_to, exists);
        }
        if let Some(ref sprint) = story.sprint_id {
            check(&story.id, "sprint_id", sprint, workspace.get_sprint(sprint).is_some());
        }
    }
    for task in workspace.tasks() {
        check(&task.id, "story_id", &task.story_id, workspace.get_story(&task.story_id).is_some());
        if let Some(ref sprint) = task.sprint_id {
            check(&task.id, "sprint_id", sprint, workspace.get_sprint(sprint).is_some());
        }
    }
    found
}

/// A story assigned to someone outside its epic's organization.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CrossOrgAssignment {
    pub story_id: String,
    pub assignee: String,
    pub assignee_org: String,
    pub epic_org: String,
}

/// Stories whose assignee and epic live in different organizations.
///
/// Missing epics or users are left to [`dangling_refs`].
#[must_use]
pub fn cross_org_assignments(workspace: &Workspace) -> Vec<CrossOrgAssignment> {
    workspace
        .stories()
        .iter()
        .filter_map(|story| {
            let epic = workspace.get_epic(&story.epic_id)?;
            let user = workspace.get_user(&story.assigned_to)?;
            (user.org_id != epic.org_id).then(|| CrossOrgAssignment {
                story_id: story.id.clone(),
                assignee: user.id.clone(),
                assignee_org: user.org_id.clone(),
                epic_org: epic.org_id.clone(),
            })
        })
        .collect()
}
