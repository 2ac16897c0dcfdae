//! In-memory workspace store.
//!
//! `Workspace` exclusively owns every organization, user, sprint, epic,
//! story and task for the session. Readers borrow slices; writers go
//! through the typed mutation methods below, which keep the denormalized
//! epic counters in step with story changes.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, warn};

use crate::access;
use crate::error::{IterionError, Result};
use crate::model::{
    Epic, Organization, Role, Sprint, SprintStatus, Story, StoryStatus, Task, User,
};
use crate::query::{EpicUpdate, OrgUpdate, StoryUpdate, TaskUpdate, UserUpdate};
use crate::seed::WorkspaceSnapshot;
use crate::util::{self, prefix};
use crate::validation::{
    EpicValidator, OrgValidator, StoryValidator, TaskValidator, UserValidator,
};

/// Change in an epic's closed-story counter for a status move.
const fn closed_delta(old: StoryStatus, new: StoryStatus) -> i32 {
    match (old.is_closed(), new.is_closed()) {
        (true, false) => -1,
        (false, true) => 1,
        _ => 0,
    }
}

const fn closed_weight(status: StoryStatus) -> i32 {
    if status.is_closed() { 1 } else { 0 }
}

/// Stored counters disagreeing with a full recount of an epic's stories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterDrift {
    pub epic_id: String,
    pub stored_total: u32,
    pub stored_completed: u32,
    pub actual_total: u32,
    pub actual_completed: u32,
}

/// The session's entity store.
///
/// Collections are kept in insertion order; dashboards and discovery
/// results rely on that order being stable.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    orgs: Vec<Organization>,
    users: Vec<User>,
    sprints: Vec<Sprint>,
    epics: Vec<Epic>,
    stories: Vec<Story>,
    tasks: Vec<Task>,
}

impl Workspace {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Create a new empty workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a workspace from loaded records, taken as-is.
    #[must_use]
    pub fn from_snapshot(snapshot: WorkspaceSnapshot) -> Self {
        Self {
            orgs: snapshot.organizations,
            users: snapshot.users,
            sprints: snapshot.sprints,
            epics: snapshot.epics,
            stories: snapshot.stories,
            tasks: snapshot.tasks,
        }
    }

    /// Copy out every record.
    #[must_use]
    pub fn snapshot(&self) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            organizations: self.orgs.clone(),
            users: self.users.clone(),
            sprints: self.sprints.clone(),
            epics: self.epics.clone(),
            stories: self.stories.clone(),
            tasks: self.tasks.clone(),
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    #[must_use]
    pub fn orgs(&self) -> &[Organization] {
        &self.orgs
    }

    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    #[must_use]
    pub fn sprints(&self) -> &[Sprint] {
        &self.sprints
    }

    #[must_use]
    pub fn epics(&self) -> &[Epic] {
        &self.epics
    }

    #[must_use]
    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn get_org(&self, id: &str) -> Option<&Organization> {
        self.orgs.iter().find(|o| o.id == id)
    }

    #[must_use]
    pub fn get_user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    #[must_use]
    pub fn get_sprint(&self, id: &str) -> Option<&Sprint> {
        self.sprints.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn get_epic(&self, id: &str) -> Option<&Epic> {
        self.epics.iter().find(|e| e.id == id)
    }

    #[must_use]
    pub fn get_story(&self, id: &str) -> Option<&Story> {
        self.stories.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn get_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// The first sprint currently in `Active`.
    #[must_use]
    pub fn active_sprint(&self) -> Option<&Sprint> {
        self.sprints
            .iter()
            .find(|s| s.status == SprintStatus::Active)
    }

    // ========================================================================
    // Stories
    // ========================================================================

    /// Create a story under an existing epic.
    ///
    /// An empty `id` gets a generated one; an empty `assigned_to` falls back
    /// to the first user of the epic's organization. The parent epic's
    /// `story_count` always goes up by one, and `completed_story_count` too
    /// when the story starts out `Closed`.
    ///
    /// # Errors
    ///
    /// Returns `Validation`, `EpicNotFound`, `SprintNotFound`,
    /// `UserNotFound`, `AssigneeOutsideOrg`, or `IdCollision`.
    pub fn create_story(&mut self, story: &Story) -> Result<Story> {
        StoryValidator::validate(story).map_err(IterionError::from_validation_errors)?;
        let epic = self
            .get_epic(&story.epic_id)
            .ok_or_else(|| IterionError::EpicNotFound {
                id: story.epic_id.clone(),
            })?;
        self.check_sprint(story.sprint_id.as_deref())?;

        let mut new_story = story.clone();
        if new_story.assigned_to.trim().is_empty() {
            new_story.assigned_to = self
                .users
                .iter()
                .find(|u| u.org_id == epic.org_id)
                .map(|u| u.id.clone())
                .unwrap_or_default();
        } else {
            self.check_assignee(&new_story.assigned_to, &epic.org_id)?;
        }
        new_story.id = self.claim_id(&story.id, prefix::STORY)?;

        self.apply_counter_delta(
            &new_story.epic_id,
            1,
            closed_weight(new_story.status),
        );
        debug!(story_id = %new_story.id, epic_id = %new_story.epic_id, "story created");
        self.stories.push(new_story.clone());
        Ok(new_story)
    }

    /// Update an existing story.
    ///
    /// Status may move freely between all pipeline states. Moving into or
    /// out of `Closed` adjusts the parent epic's completed counter by one;
    /// moving the story to another epic moves its counter contributions.
    /// A new epic or assignee must leave both in the same organization.
    ///
    /// # Errors
    ///
    /// Returns `StoryNotFound`, `EpicNotFound`, `SprintNotFound`,
    /// `UserNotFound`, `AssigneeOutsideOrg`, or `Validation`.
    pub fn update_story(&mut self, id: &str, update: &StoryUpdate) -> Result<Story> {
        let current = self
            .get_story(id)
            .cloned()
            .ok_or_else(|| IterionError::StoryNotFound { id: id.to_string() })?;

        let mut next = current.clone();
        if let Some(ref title) = update.title {
            next.title.clone_from(title);
        }
        if let Some(ref description) = update.description {
            next.description.clone_from(description);
        }
        if let Some(ref epic_id) = update.epic_id {
            if self.get_epic(epic_id).is_none() {
                return Err(IterionError::EpicNotFound {
                    id: epic_id.clone(),
                });
            }
            next.epic_id.clone_from(epic_id);
        }
        if let Some(ref assignee) = update.assigned_to {
            next.assigned_to.clone_from(assignee);
        }
        if let Some(status) = update.status {
            next.status = status;
        }
        if let Some(priority) = update.priority {
            next.priority = priority;
        }
        if let Some(points) = update.points {
            next.points = points;
        }
        if let Some(ref sprint) = update.sprint_id {
            self.check_sprint(sprint.as_deref())?;
            next.sprint_id.clone_from(sprint);
        }
        StoryValidator::validate(&next).map_err(IterionError::from_validation_errors)?;
        if update.epic_id.is_some() || update.assigned_to.is_some() {
            if let Some(epic) = self.get_epic(&next.epic_id) {
                self.check_assignee(&next.assigned_to, &epic.org_id)?;
            }
        }

        if next.epic_id == current.epic_id {
            let delta = closed_delta(current.status, next.status);
            if delta != 0 {
                self.apply_counter_delta(&next.epic_id, 0, delta);
            }
        } else {
            self.apply_counter_delta(&current.epic_id, -1, -closed_weight(current.status));
            self.apply_counter_delta(&next.epic_id, 1, closed_weight(next.status));
        }

        if current.status != next.status {
            debug!(
                story_id = %id,
                from = %current.status,
                to = %next.status,
                "story status changed"
            );
        }

        if let Some(slot) = self.stories.iter_mut().find(|s| s.id == id) {
            *slot = next.clone();
        }
        Ok(next)
    }

    /// Move a story to another board column.
    ///
    /// # Errors
    ///
    /// Returns `StoryNotFound` if the story doesn't exist.
    pub fn set_story_status(&mut self, id: &str, status: StoryStatus) -> Result<Story> {
        self.update_story(id, &StoryUpdate::status(status))
    }

    /// Delete a story and the tasks under it.
    ///
    /// The parent epic's counters are decremented so they keep describing
    /// the stories that currently exist.
    ///
    /// # Errors
    ///
    /// Returns `StoryNotFound` if the story doesn't exist.
    pub fn delete_story(&mut self, id: &str) -> Result<Story> {
        let pos = self
            .stories
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| IterionError::StoryNotFound { id: id.to_string() })?;
        let removed = self.stories.remove(pos);

        self.apply_counter_delta(&removed.epic_id, -1, -closed_weight(removed.status));

        let before = self.tasks.len();
        self.tasks.retain(|t| t.story_id != id);
        debug!(
            story_id = %id,
            tasks_removed = before - self.tasks.len(),
            "story deleted"
        );
        Ok(removed)
    }

    // ========================================================================
    // Epics
    // ========================================================================

    /// Create an epic in an existing organization.
    ///
    /// Counters start at zero regardless of the values passed in; they only
    /// move as stories are created, transitioned and deleted.
    ///
    /// # Errors
    ///
    /// Returns `Validation`, `OrgNotFound`, or `IdCollision`.
    pub fn create_epic(&mut self, epic: &Epic) -> Result<Epic> {
        EpicValidator::validate(epic).map_err(IterionError::from_validation_errors)?;
        if self.get_org(&epic.org_id).is_none() {
            return Err(IterionError::OrgNotFound {
                id: epic.org_id.clone(),
            });
        }
        self.check_sprint(epic.sprint_id.as_deref())?;

        let mut new_epic = epic.clone();
        new_epic.id = self.claim_id(&epic.id, prefix::EPIC)?;
        new_epic.story_count = 0;
        new_epic.completed_story_count = 0;
        if !new_epic.team.contains(&new_epic.owner_id) {
            new_epic.team.insert(0, new_epic.owner_id.clone());
        }

        debug!(epic_id = %new_epic.id, org_id = %new_epic.org_id, "epic created");
        self.epics.push(new_epic.clone());
        Ok(new_epic)
    }

    /// Update an epic's descriptive fields.
    ///
    /// # Errors
    ///
    /// Returns `EpicNotFound`, `SprintNotFound`, or `Validation`.
    pub fn update_epic(&mut self, id: &str, update: &EpicUpdate) -> Result<Epic> {
        if let Some(ref sprint) = update.sprint_id {
            self.check_sprint(sprint.as_deref())?;
        }
        let epic = self
            .epics
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| IterionError::EpicNotFound { id: id.to_string() })?;

        let mut next = epic.clone();
        if let Some(ref name) = update.name {
            next.name.clone_from(name);
        }
        if let Some(ref description) = update.description {
            next.description.clone_from(description);
        }
        if let Some(status) = update.status {
            next.status = status;
        }
        if let Some(priority) = update.priority {
            next.priority = priority;
        }
        if let Some(ref owner) = update.owner_id {
            next.owner_id.clone_from(owner);
        }
        if let Some(ref tags) = update.tags {
            next.tags.clone_from(tags);
        }
        if let Some(ref team) = update.team {
            next.team.clone_from(team);
        }
        if let Some(ref sprint) = update.sprint_id {
            next.sprint_id.clone_from(sprint);
        }
        EpicValidator::validate(&next).map_err(IterionError::from_validation_errors)?;

        *epic = next.clone();
        debug!(epic_id = %id, "epic updated");
        Ok(next)
    }

    // ========================================================================
    // Tasks
    // ========================================================================

    /// Create a task or bug under an existing story.
    ///
    /// A task without a sprint inherits its story's sprint.
    ///
    /// # Errors
    ///
    /// Returns `Validation`, `StoryNotFound`, or `IdCollision`.
    pub fn create_task(&mut self, task: &Task) -> Result<Task> {
        TaskValidator::validate(task).map_err(IterionError::from_validation_errors)?;
        let story = self
            .get_story(&task.story_id)
            .ok_or_else(|| IterionError::StoryNotFound {
                id: task.story_id.clone(),
            })?;
        self.check_sprint(task.sprint_id.as_deref())?;

        let mut new_task = task.clone();
        if new_task.sprint_id.is_none() {
            new_task.sprint_id.clone_from(&story.sprint_id);
        }
        if new_task.assigned_to.trim().is_empty() {
            new_task.assigned_to.clone_from(&story.assigned_to);
        }
        new_task.id = self.claim_id(&task.id, prefix::TASK)?;

        debug!(task_id = %new_task.id, story_id = %new_task.story_id, kind = %new_task.kind, "task created");
        self.tasks.push(new_task.clone());
        Ok(new_task)
    }

    /// Update an existing task.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound`, `SprintNotFound`, or `Validation`.
    pub fn update_task(&mut self, id: &str, update: &TaskUpdate) -> Result<Task> {
        if let Some(ref sprint) = update.sprint_id {
            self.check_sprint(sprint.as_deref())?;
        }
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| IterionError::TaskNotFound { id: id.to_string() })?;

        let mut next = task.clone();
        if let Some(ref title) = update.title {
            next.title.clone_from(title);
        }
        if let Some(ref description) = update.description {
            next.description.clone_from(description);
        }
        if let Some(ref assignee) = update.assigned_to {
            next.assigned_to.clone_from(assignee);
        }
        if let Some(status) = update.status {
            next.status = status;
        }
        if let Some(priority) = update.priority {
            next.priority = priority;
        }
        if let Some(kind) = update.kind {
            next.kind = kind;
        }
        if let Some(ref sprint) = update.sprint_id {
            next.sprint_id.clone_from(sprint);
        }
        TaskValidator::validate(&next).map_err(IterionError::from_validation_errors)?;

        *task = next.clone();
        debug!(task_id = %id, "task updated");
        Ok(next)
    }

    /// Delete a task.
    ///
    /// # Errors
    ///
    /// Returns `TaskNotFound` if the task doesn't exist.
    pub fn delete_task(&mut self, id: &str) -> Result<Task> {
        let pos = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| IterionError::TaskNotFound { id: id.to_string() })?;
        debug!(task_id = %id, "task deleted");
        Ok(self.tasks.remove(pos))
    }

    // ========================================================================
    // Organizations
    // ========================================================================

    /// Register a new tenant. SuperAdmin only.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `PermissionDenied`, `Validation`, or
    /// `IdCollision`.
    pub fn create_org(&mut self, actor_id: &str, org: &Organization) -> Result<Organization> {
        let actor = self.actor(actor_id)?;
        if !access::can_manage_orgs(actor.role) {
            return Err(IterionError::PermissionDenied {
                actor: actor.id.clone(),
                actor_role: actor.role,
                target: org.name.clone(),
            });
        }
        OrgValidator::validate(org).map_err(IterionError::from_validation_errors)?;

        let mut new_org = org.clone();
        new_org.id = self.claim_id(&org.id, prefix::ORG)?;
        debug!(org_id = %new_org.id, "organization created");
        self.orgs.push(new_org.clone());
        Ok(new_org)
    }

    /// Update organization settings and branding.
    ///
    /// # Errors
    ///
    /// Returns `OrgNotFound` or `Validation`.
    pub fn update_org(&mut self, id: &str, update: &OrgUpdate) -> Result<Organization> {
        let org = self
            .orgs
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| IterionError::OrgNotFound { id: id.to_string() })?;

        let mut next = org.clone();
        if let Some(ref name) = update.name {
            next.name.clone_from(name);
        }
        if let Some(ref domain) = update.domain {
            next.domain.clone_from(domain);
        }
        if let Some(ref logo) = update.logo {
            next.logo.clone_from(logo);
        }
        if let Some(ref branding) = update.branding {
            next.branding.clone_from(branding);
        }
        OrgValidator::validate(&next).map_err(IterionError::from_validation_errors)?;

        *org = next.clone();
        debug!(org_id = %id, "organization updated");
        Ok(next)
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Add a user on behalf of `actor_id`.
    ///
    /// The actor must be allowed to grant the new user's role. Only
    /// SuperAdmins may add users to an organization other than their own.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `RoleNotAssignable`, `PermissionDenied`,
    /// `OrgNotFound`, `Validation`, or `IdCollision`.
    pub fn invite_user(&mut self, actor_id: &str, user: &User) -> Result<User> {
        let actor = self.actor(actor_id)?;
        if !access::can_assign_role(actor.role, user.role) {
            return Err(IterionError::RoleNotAssignable {
                actor: actor.id.clone(),
                actor_role: actor.role,
                role: user.role,
            });
        }
        if user.org_id != actor.org_id && !access::can_manage_orgs(actor.role) {
            return Err(IterionError::PermissionDenied {
                actor: actor.id.clone(),
                actor_role: actor.role,
                target: user.email.clone(),
            });
        }
        if self.get_org(&user.org_id).is_none() {
            return Err(IterionError::OrgNotFound {
                id: user.org_id.clone(),
            });
        }
        UserValidator::validate(user).map_err(IterionError::from_validation_errors)?;

        let mut new_user = user.clone();
        new_user.id = self.claim_id(&user.id, prefix::USER)?;
        if new_user.avatar.is_empty() {
            new_user.avatar = util::default_avatar(&new_user.email);
        }
        debug!(user_id = %new_user.id, role = %new_user.role, actor = %actor_id, "user invited");
        self.users.push(new_user.clone());
        Ok(new_user)
    }

    /// Self-service signup: a new Member in the given organization.
    ///
    /// # Errors
    ///
    /// Returns `OrgNotFound`, `Validation`, or `IdCollision`.
    pub fn sign_up(&mut self, name: &str, email: &str, org_id: &str) -> Result<User> {
        if self.get_org(org_id).is_none() {
            return Err(IterionError::OrgNotFound {
                id: org_id.to_string(),
            });
        }
        let user = User {
            id: String::new(),
            name: name.to_string(),
            email: email.to_string(),
            role: Role::Member,
            avatar: util::default_avatar(email),
            org_id: org_id.to_string(),
        };
        UserValidator::validate(&user).map_err(IterionError::from_validation_errors)?;
        let mut new_user = user;
        new_user.id = self.claim_id("", prefix::USER)?;
        debug!(user_id = %new_user.id, "user signed up");
        self.users.push(new_user.clone());
        Ok(new_user)
    }

    /// Update a user on behalf of `actor_id`.
    ///
    /// Users may always edit their own profile fields. Everything else
    /// requires [`access::can_modify_user`], role changes additionally
    /// require the new role to be assignable by the actor, and moving a
    /// user between organizations is reserved to SuperAdmins.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound`, `PermissionDenied`, `RoleNotAssignable`,
    /// `OrgNotFound`, or `Validation`.
    pub fn update_user(
        &mut self,
        actor_id: &str,
        target_id: &str,
        update: &UserUpdate,
    ) -> Result<User> {
        let actor = self.actor(actor_id)?.clone();
        let target = self
            .get_user(target_id)
            .cloned()
            .ok_or_else(|| IterionError::UserNotFound {
                id: target_id.to_string(),
            })?;

        let self_service = actor.id == target.id && update.is_profile_only();
        if !self_service {
            if !access::can_modify_user(&actor, &target) {
                return Err(IterionError::PermissionDenied {
                    actor: actor.id,
                    actor_role: actor.role,
                    target: target.id,
                });
            }
            if let Some(role) = update.role.filter(|r| *r != target.role) {
                if !access::can_assign_role(actor.role, role) {
                    return Err(IterionError::RoleNotAssignable {
                        actor: actor.id,
                        actor_role: actor.role,
                        role,
                    });
                }
            }
            if let Some(org_id) = update.org_id.as_ref().filter(|o| **o != target.org_id) {
                if !access::can_manage_orgs(actor.role) {
                    return Err(IterionError::PermissionDenied {
                        actor: actor.id,
                        actor_role: actor.role,
                        target: target.id,
                    });
                }
                if self.get_org(org_id).is_none() {
                    return Err(IterionError::OrgNotFound {
                        id: org_id.clone(),
                    });
                }
            }
        }

        let mut next = target;
        if let Some(ref name) = update.name {
            next.name.clone_from(name);
        }
        if let Some(ref email) = update.email {
            next.email.clone_from(email);
        }
        if let Some(ref avatar) = update.avatar {
            next.avatar.clone_from(avatar);
        }
        if let Some(role) = update.role {
            next.role = role;
        }
        if let Some(ref org_id) = update.org_id {
            next.org_id.clone_from(org_id);
        }
        UserValidator::validate(&next).map_err(IterionError::from_validation_errors)?;

        if let Some(slot) = self.users.iter_mut().find(|u| u.id == target_id) {
            *slot = next.clone();
        }
        debug!(user_id = %target_id, actor = %actor_id, "user updated");
        Ok(next)
    }

    /// Remove a user on behalf of `actor_id`.
    ///
    /// # Errors
    ///
    /// Returns `UserNotFound` or `PermissionDenied`.
    pub fn delete_user(&mut self, actor_id: &str, target_id: &str) -> Result<User> {
        let actor = self.actor(actor_id)?;
        let pos = self
            .users
            .iter()
            .position(|u| u.id == target_id)
            .ok_or_else(|| IterionError::UserNotFound {
                id: target_id.to_string(),
            })?;
        if !access::can_modify_user(actor, &self.users[pos]) {
            return Err(IterionError::PermissionDenied {
                actor: actor.id.clone(),
                actor_role: actor.role,
                target: target_id.to_string(),
            });
        }
        debug!(user_id = %target_id, actor = %actor_id, "user removed");
        Ok(self.users.remove(pos))
    }

    // ========================================================================
    // Sprints
    // ========================================================================

    /// Move a sprint along Future -> Active -> Completed.
    ///
    /// Setting the current status again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `SprintNotFound`, or `SprintRegression` for a backwards move.
    pub fn set_sprint_status(&mut self, id: &str, status: SprintStatus) -> Result<Sprint> {
        let sprint = self
            .sprints
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| IterionError::SprintNotFound { id: id.to_string() })?;
        if status < sprint.status {
            return Err(IterionError::SprintRegression {
                id: id.to_string(),
                from: sprint.status,
                to: status,
            });
        }
        if status != sprint.status {
            debug!(sprint_id = %id, from = %sprint.status, to = %status, "sprint advanced");
            sprint.status = status;
        }
        Ok(sprint.clone())
    }

    // ========================================================================
    // Counter Reconciliation
    // ========================================================================

    /// Compare every epic's stored counters with a recount of its stories.
    #[must_use]
    pub fn counter_drift(&self) -> Vec<CounterDrift> {
        self.epics
            .iter()
            .filter_map(|epic| {
                let (total, completed) = self.count_stories(&epic.id);
                (total != epic.story_count || completed != epic.completed_story_count).then(|| {
                    CounterDrift {
                        epic_id: epic.id.clone(),
                        stored_total: epic.story_count,
                        stored_completed: epic.completed_story_count,
                        actual_total: total,
                        actual_completed: completed,
                    }
                })
            })
            .collect()
    }

    /// Overwrite drifted epic counters with recounted values.
    ///
    /// Returns the drift that was corrected.
    pub fn reconcile_counters(&mut self) -> Vec<CounterDrift> {
        let drift = self.counter_drift();
        for d in &drift {
            if let Some(epic) = self.epics.iter_mut().find(|e| e.id == d.epic_id) {
                epic.story_count = d.actual_total;
                epic.completed_story_count = d.actual_completed;
            }
        }
        if !drift.is_empty() {
            debug!(epics = drift.len(), "epic counters reconciled");
        }
        drift
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    fn count_stories(&self, epic_id: &str) -> (u32, u32) {
        let mut total = 0u32;
        let mut completed = 0u32;
        for story in self.stories.iter().filter(|s| s.epic_id == epic_id) {
            total += 1;
            if story.status.is_closed() {
                completed += 1;
            }
        }
        (total, completed)
    }

    /// Apply signed deltas to an epic's counters.
    ///
    /// Both counters saturate at zero and `completed_story_count` is capped
    /// at `story_count`.
    fn apply_counter_delta(&mut self, epic_id: &str, stories: i32, closed: i32) {
        let Some(epic) = self.epics.iter_mut().find(|e| e.id == epic_id) else {
            warn!(epic_id, "counter update for unknown epic");
            return;
        };
        if stories < 0 && epic.story_count < stories.unsigned_abs() {
            warn!(epic_id, "story_count would underflow; clamped at 0");
        }
        if closed < 0 && epic.completed_story_count < closed.unsigned_abs() {
            warn!(epic_id, "completed_story_count would underflow; clamped at 0");
        }
        epic.story_count = epic.story_count.saturating_add_signed(stories);
        let completed = epic.completed_story_count.saturating_add_signed(closed);
        if completed > epic.story_count {
            warn!(
                epic_id,
                completed,
                total = epic.story_count,
                "completed_story_count capped at story_count"
            );
        }
        epic.completed_story_count = completed.min(epic.story_count);
    }

    fn actor(&self, actor_id: &str) -> Result<&User> {
        self.get_user(actor_id)
            .ok_or_else(|| IterionError::UserNotFound {
                id: actor_id.to_string(),
            })
    }

    fn check_sprint(&self, sprint_id: Option<&str>) -> Result<()> {
        match sprint_id {
            Some(id) if self.get_sprint(id).is_none() => Err(IterionError::SprintNotFound {
                id: id.to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn id_exists(&self, id: &str) -> bool {
        self.orgs.iter().any(|o| o.id == id)
            || self.users.iter().any(|u| u.id == id)
            || self.epics.iter().any(|e| e.id == id)
            || self.stories.iter().any(|s| s.id == id)
            || self.tasks.iter().any(|t| t.id == id)
    }

    fn check_assignee(&self, assignee: &str, org_id: &str) -> Result<()> {
        let user = self
            .get_user(assignee)
            .ok_or_else(|| IterionError::UserNotFound {
                id: assignee.to_string(),
            })?;
        if user.org_id == org_id {
            Ok(())
        } else {
            Err(IterionError::AssigneeOutsideOrg {
                assignee: assignee.to_string(),
                org: org_id.to_string(),
            })
        }
    }

    /// Use `requested` if given and free, otherwise generate one.
    fn claim_id(&self, requested: &str, id_prefix: &str) -> Result<String> {
        if requested.is_empty() {
            Ok(util::generate_id(id_prefix, Utc::now(), |id| self.id_exists(id)))
        } else if self.id_exists(requested) {
            Err(IterionError::IdCollision {
                id: requested.to_string(),
            })
        } else {
            Ok(requested.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EpicStatus, Priority, TaskKind, TaskStatus};
    use crate::seed;

    fn make_story(id: &str, epic_id: &str, status: StoryStatus, points: u32) -> Story {
        Story {
            id: id.to_string(),
            epic_id: epic_id.to_string(),
            title: format!("Story {id}"),
            description: String::new(),
            assigned_to: "u4".to_string(),
            status,
            priority: Priority::Medium,
            points,
            sprint_id: None,
        }
    }

    fn make_epic(id: &str) -> Epic {
        Epic {
            id: id.to_string(),
            name: format!("Epic {id}"),
            description: String::new(),
            status: EpicStatus::Planning,
            priority: Priority::High,
            owner_id: "u1".to_string(),
            org_id: "p_1".to_string(),
            tags: vec![],
            story_count: 7,
            completed_story_count: 3,
            team: vec![],
            sprint_id: None,
        }
    }

    fn workspace_with_empty_epic() -> Workspace {
        let mut ws = seed::demo_workspace();
        ws.create_epic(&make_epic("e_new")).unwrap();
        ws
    }

    fn counters(ws: &Workspace, epic_id: &str) -> (u32, u32) {
        let epic = ws.get_epic(epic_id).unwrap();
        (epic.story_count, epic.completed_story_count)
    }

    #[test]
    fn test_create_epic_resets_counters() {
        let ws = workspace_with_empty_epic();
        assert_eq!(counters(&ws, "e_new"), (0, 0));
        assert_eq!(ws.get_epic("e_new").unwrap().team, vec!["u1".to_string()]);
    }

    #[test]
    fn test_create_epic_unknown_org() {
        let mut ws = seed::demo_workspace();
        let mut epic = make_epic("e_x");
        epic.org_id = "p_missing".into();
        let err = ws.create_epic(&epic).unwrap_err();
        assert!(matches!(err, IterionError::OrgNotFound { .. }));
    }

    #[test]
    fn test_story_counter_scenario() {
        let mut ws = workspace_with_empty_epic();
        ws.create_story(&make_story("s_a", "e_new", StoryStatus::Todo, 3))
            .unwrap();
        assert_eq!(counters(&ws, "e_new"), (1, 0));

        ws.set_story_status("s_a", StoryStatus::Closed).unwrap();
        assert_eq!(counters(&ws, "e_new"), (1, 1));

        ws.set_story_status("s_a", StoryStatus::InProgress).unwrap();
        assert_eq!(counters(&ws, "e_new"), (1, 0));
    }

    #[test]
    fn test_non_closed_moves_leave_counters() {
        let mut ws = workspace_with_empty_epic();
        ws.create_story(&make_story("s_a", "e_new", StoryStatus::Todo, 3))
            .unwrap();
        for status in [
            StoryStatus::InProgress,
            StoryStatus::ReadyForTesting,
            StoryStatus::UnderTesting,
            StoryStatus::Todo,
        ] {
            ws.set_story_status("s_a", status).unwrap();
            assert_eq!(counters(&ws, "e_new"), (1, 0));
        }
    }

    #[test]
    fn test_closed_to_closed_is_noop() {
        let mut ws = workspace_with_empty_epic();
        ws.create_story(&make_story("s_a", "e_new", StoryStatus::Todo, 3))
            .unwrap();
        ws.set_story_status("s_a", StoryStatus::Closed).unwrap();
        ws.set_story_status("s_a", StoryStatus::Closed).unwrap();
        assert_eq!(counters(&ws, "e_new"), (1, 1));
    }

    #[test]
    fn test_create_closed_story_counts_as_completed() {
        let mut ws = workspace_with_empty_epic();
        ws.create_story(&make_story("s_a", "e_new", StoryStatus::Closed, 5))
            .unwrap();
        assert_eq!(counters(&ws, "e_new"), (1, 1));
    }

    #[test]
    fn test_create_story_unknown_epic() {
        let mut ws = seed::demo_workspace();
        let err = ws
            .create_story(&make_story("s_a", "e_missing", StoryStatus::Todo, 3))
            .unwrap_err();
        assert!(matches!(err, IterionError::EpicNotFound { .. }));
    }

    #[test]
    fn test_create_story_rejects_zero_points() {
        let mut ws = workspace_with_empty_epic();
        let err = ws
            .create_story(&make_story("s_a", "e_new", StoryStatus::Todo, 0))
            .unwrap_err();
        assert!(matches!(err, IterionError::Validation { ref field, .. } if field == "points"));
        assert_eq!(counters(&ws, "e_new"), (0, 0));
    }

    #[test]
    fn test_create_story_generates_id_and_default_assignee() {
        let mut ws = workspace_with_empty_epic();
        let mut story = make_story("", "e_new", StoryStatus::Todo, 2);
        story.assigned_to = String::new();
        let created = ws.create_story(&story).unwrap();
        assert!(created.id.starts_with("s_"));
        assert_eq!(created.assigned_to, "u1");
    }

    #[test]
    fn test_create_story_id_collision() {
        let mut ws = workspace_with_empty_epic();
        let err = ws
            .create_story(&make_story("s1", "e_new", StoryStatus::Todo, 2))
            .unwrap_err();
        assert!(matches!(err, IterionError::IdCollision { .. }));
    }

    #[test]
    fn test_delete_story_decrements_counters_and_tasks() {
        let mut ws = workspace_with_empty_epic();
        ws.create_story(&make_story("s_a", "e_new", StoryStatus::Closed, 3))
            .unwrap();
        ws.create_story(&make_story("s_b", "e_new", StoryStatus::Todo, 3))
            .unwrap();
        ws.create_task(&Task {
            id: "t_a".into(),
            story_id: "s_a".into(),
            title: "Sub".into(),
            description: String::new(),
            assigned_to: "u4".into(),
            status: TaskStatus::Todo,
            priority: Priority::Low,
            kind: TaskKind::Task,
            sprint_id: None,
        })
        .unwrap();

        ws.delete_story("s_a").unwrap();
        assert_eq!(counters(&ws, "e_new"), (1, 0));
        assert!(ws.get_task("t_a").is_none());
        assert!(ws.delete_story("s_a").unwrap_err().is_not_found());
    }

    #[test]
    fn test_create_story_rejects_assignee_from_other_org() {
        let mut ws = workspace_with_empty_epic();
        let mut story = make_story("s_a", "e_new", StoryStatus::Todo, 3);
        story.assigned_to = "u3".into();
        let err = ws.create_story(&story).unwrap_err();
        assert!(matches!(
            err,
            IterionError::AssigneeOutsideOrg { ref assignee, ref org } if assignee == "u3" && org == "p_1"
        ));
        assert!(ws.get_story("s_a").is_none());
        assert_eq!(counters(&ws, "e_new"), (0, 0));

        story.assigned_to = "u_nobody".into();
        let err = ws.create_story(&story).unwrap_err();
        assert!(matches!(err, IterionError::UserNotFound { ref id } if id == "u_nobody"));
    }

    #[test]
    fn test_update_story_rejects_assignee_from_other_org() {
        let mut ws = seed::demo_workspace();
        for assignee in ["u3", "nobody"] {
            let update = StoryUpdate {
                assigned_to: Some(assignee.into()),
                ..Default::default()
            };
            assert!(ws.update_story("s1", &update).is_err());
            assert_eq!(ws.get_story("s1").unwrap().assigned_to, "u4");
        }

        let update = StoryUpdate {
            assigned_to: Some("u2".into()),
            ..Default::default()
        };
        assert_eq!(ws.update_story("s1", &update).unwrap().assigned_to, "u2");
    }

    #[test]
    fn test_move_story_to_epic_in_other_org() {
        let mut ws = workspace_with_empty_epic();
        let mut foreign = make_epic("e_p2");
        foreign.org_id = "p_2".into();
        foreign.owner_id = "u3".into();
        ws.create_epic(&foreign).unwrap();
        ws.create_story(&make_story("s_a", "e_new", StoryStatus::Closed, 3))
            .unwrap();

        let move_only = StoryUpdate {
            epic_id: Some("e_p2".into()),
            ..Default::default()
        };
        let err = ws.update_story("s_a", &move_only).unwrap_err();
        assert!(matches!(err, IterionError::AssigneeOutsideOrg { .. }));
        assert_eq!(counters(&ws, "e_new"), (1, 1));
        assert_eq!(counters(&ws, "e_p2"), (0, 0));

        let move_with_assignee = StoryUpdate {
            epic_id: Some("e_p2".into()),
            assigned_to: Some("u3".into()),
            ..Default::default()
        };
        ws.update_story("s_a", &move_with_assignee).unwrap();
        assert_eq!(counters(&ws, "e_new"), (0, 0));
        assert_eq!(counters(&ws, "e_p2"), (1, 1));
    }

    #[test]
    fn test_move_story_between_epics() {
        let mut ws = workspace_with_empty_epic();
        ws.create_epic(&make_epic("e_other")).unwrap();
        ws.create_story(&make_story("s_a", "e_new", StoryStatus::Closed, 3))
            .unwrap();
        ws.update_story(
            "s_a",
            &StoryUpdate {
                epic_id: Some("e_other".into()),
                status: Some(StoryStatus::InProgress),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(counters(&ws, "e_new"), (0, 0));
        assert_eq!(counters(&ws, "e_other"), (1, 0));
    }

    #[test]
    fn test_update_story_unknown_sprint_rejected() {
        let mut ws = seed::demo_workspace();
        let err = ws
            .update_story(
                "s1",
                &StoryUpdate {
                    sprint_id: Some(Some("sp_404".into())),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, IterionError::SprintNotFound { .. }));
    }

    #[test]
    fn test_counter_never_underflows() {
        let mut ws = workspace_with_empty_epic();
        ws.apply_counter_delta("e_new", -1, -1);
        assert_eq!(counters(&ws, "e_new"), (0, 0));
    }

    #[test]
    fn test_completed_capped_at_total() {
        let mut ws = workspace_with_empty_epic();
        ws.apply_counter_delta("e_new", 0, 1);
        assert_eq!(counters(&ws, "e_new"), (0, 0));
    }

    #[test]
    fn test_task_inherits_story_sprint() {
        let mut ws = seed::demo_workspace();
        let task = ws
            .create_task(&Task {
                id: String::new(),
                story_id: "s1".into(),
                title: "Write module tests".into(),
                description: String::new(),
                assigned_to: String::new(),
                status: TaskStatus::Todo,
                priority: Priority::Medium,
                kind: TaskKind::Bug,
                sprint_id: None,
            })
            .unwrap();
        assert_eq!(task.sprint_id.as_deref(), Some("sp_28"));
        assert_eq!(task.assigned_to, "u4");
        assert!(task.id.starts_with("t_"));

        let updated = ws
            .update_task(
                &task.id,
                &TaskUpdate {
                    status: Some(TaskStatus::Done),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.status, TaskStatus::Done);
        ws.delete_task(&task.id).unwrap();
        assert!(ws.get_task(&task.id).is_none());
    }

    #[test]
    fn test_update_epic_keeps_counters() {
        let mut ws = seed::demo_workspace();
        let before = counters(&ws, "e1");
        let epic = ws
            .update_epic(
                "e1",
                &EpicUpdate {
                    status: Some(EpicStatus::Review),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(epic.status, EpicStatus::Review);
        assert_eq!(counters(&ws, "e1"), before);
    }

    #[test]
    fn test_sprint_status_is_monotonic() {
        let mut ws = seed::demo_workspace();
        let sprint = ws.set_sprint_status("sp_29", SprintStatus::Active).unwrap();
        assert_eq!(sprint.status, SprintStatus::Active);
        ws.set_sprint_status("sp_29", SprintStatus::Active).unwrap();
        let err = ws
            .set_sprint_status("sp_24", SprintStatus::Future)
            .unwrap_err();
        assert!(matches!(err, IterionError::SprintRegression { .. }));
    }

    #[test]
    fn test_admin_cannot_promote_to_admin() {
        let mut ws = seed::demo_workspace();
        let err = ws
            .update_user(
                "u2",
                "u4",
                &UserUpdate {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, IterionError::RoleNotAssignable { .. }));

        let user = ws
            .update_user(
                "u2",
                "u4",
                &UserUpdate {
                    role: Some(Role::Manager),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(user.role, Role::Manager);
    }

    #[test]
    fn test_admin_cannot_edit_superadmin() {
        let mut ws = seed::demo_workspace();
        let err = ws
            .update_user(
                "u2",
                "u1",
                &UserUpdate {
                    name: Some("Renamed".into()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, IterionError::PermissionDenied { .. }));
    }

    #[test]
    fn test_member_can_edit_own_profile_only() {
        let mut ws = seed::demo_workspace();
        let user = ws
            .update_user(
                "u4",
                "u4",
                &UserUpdate {
                    name: Some("Dave Kim".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(user.name, "Dave Kim");

        let err = ws
            .update_user(
                "u4",
                "u4",
                &UserUpdate {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, IterionError::PermissionDenied { .. }));
    }

    #[test]
    fn test_invite_user_role_gating() {
        let mut ws = seed::demo_workspace();
        let new_user = User {
            id: String::new(),
            name: "Priya".into(),
            email: "priya@cloudscale.io".into(),
            role: Role::Admin,
            avatar: String::new(),
            org_id: "p_1".into(),
        };
        assert!(matches!(
            ws.invite_user("u2", &new_user).unwrap_err(),
            IterionError::RoleNotAssignable { .. }
        ));
        let created = ws
            .invite_user(
                "u2",
                &User {
                    role: Role::Member,
                    ..new_user.clone()
                },
            )
            .unwrap();
        assert!(created.id.starts_with("u_"));
        assert!(created.avatar.contains("priya@cloudscale.io"));

        let other_org = User {
            role: Role::Member,
            org_id: "p_2".into(),
            email: "x@dataops.tech".into(),
            ..new_user
        };
        assert!(matches!(
            ws.invite_user("u2", &other_org).unwrap_err(),
            IterionError::PermissionDenied { .. }
        ));
        assert!(ws.invite_user("u1", &other_org).is_ok());
    }

    #[test]
    fn test_delete_user_requires_permission() {
        let mut ws = seed::demo_workspace();
        assert!(ws.delete_user("u4", "u2").is_err());
        assert!(ws.delete_user("u2", "u4").is_ok());
        assert!(ws.get_user("u4").is_none());
    }

    #[test]
    fn test_sign_up_creates_member() {
        let mut ws = seed::demo_workspace();
        let user = ws.sign_up("Lin", "lin@cloudscale.io", "p_1").unwrap();
        assert_eq!(user.role, Role::Member);
        assert!(ws.sign_up("Lin", "lin@x.io", "p_404").is_err());
    }

    #[test]
    fn test_create_org_superadmin_only() {
        let mut ws = seed::demo_workspace();
        let org = Organization {
            id: String::new(),
            name: "Acme".into(),
            domain: "acme.io".into(),
            logo: "A".into(),
            branding: None,
        };
        assert!(matches!(
            ws.create_org("u2", &org).unwrap_err(),
            IterionError::PermissionDenied { .. }
        ));
        let created = ws.create_org("u1", &org).unwrap();
        assert!(created.id.starts_with("org_"));

        let updated = ws
            .update_org(
                &created.id,
                &OrgUpdate {
                    branding: Some(Some(crate::model::Branding {
                        primary_color: "#10b981".into(),
                        dark_mode: true,
                        font_family: "Roboto".into(),
                    })),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(updated.effective_branding().dark_mode);
    }

    #[test]
    fn test_reconcile_counters_fixes_seed_drift() {
        let mut ws = seed::demo_workspace();
        let drift = ws.counter_drift();
        assert_eq!(drift.len(), 1);
        assert_eq!(drift[0].epic_id, "e1");
        assert_eq!(drift[0].actual_total, 8);
        assert_eq!(drift[0].actual_completed, 7);

        let fixed = ws.reconcile_counters();
        assert_eq!(fixed, drift);
        assert!(ws.counter_drift().is_empty());
        assert_eq!(counters(&ws, "e1"), (8, 7));
    }
}
