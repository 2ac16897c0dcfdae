//! Demo workspace and JSON fixtures.
//!
//! The process always starts from one of these: the built-in demo data, or
//! a fixture file with the same shape. Nothing is written back.

use std::path::Path;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IterionError, Result};
use crate::model::{
    Epic, EpicStatus, Organization, Priority, Role, Sprint, SprintStatus, Story, StoryStatus,
    Task, User,
};
use crate::store::Workspace;
use crate::util::default_avatar;

/// Every record of a workspace, as stored in a fixture file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    #[serde(default, alias = "projects")]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub sprints: Vec<Sprint>,
    #[serde(default)]
    pub epics: Vec<Epic>,
    #[serde(default)]
    pub stories: Vec<Story>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// Load a workspace from a JSON fixture.
///
/// Records are taken as-is; stored epic counters are not recomputed.
///
/// # Errors
///
/// Returns `FileNotFound` if the path doesn't exist, `Io` if it can't be
/// read, or `Fixture` if the JSON doesn't match the expected shape.
pub fn load_fixture(path: &Path) -> Result<Workspace> {
    if !path.exists() {
        return Err(IterionError::FileNotFound(path.to_path_buf()));
    }
    let raw = std::fs::read_to_string(path)?;
    let snapshot: WorkspaceSnapshot =
        serde_json::from_str(&raw).map_err(|e| IterionError::Fixture {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    debug!(
        path = %path.display(),
        orgs = snapshot.organizations.len(),
        stories = snapshot.stories.len(),
        "fixture loaded"
    );
    Ok(Workspace::from_snapshot(snapshot))
}

/// The built-in demo workspace.
#[must_use]
pub fn demo_workspace() -> Workspace {
    Workspace::from_snapshot(demo_snapshot())
}

#[must_use]
pub fn demo_snapshot() -> WorkspaceSnapshot {
    WorkspaceSnapshot {
        organizations: vec![
            org("p_1", "CloudScale Solutions", "cloudscale.io", "☁️"),
            org("p_2", "DataOps Core", "dataops.tech", "📊"),
        ],
        users: vec![
            user("u1", "Shubham Pratap Singh", "spsingh@gmail.com", Role::SuperAdmin, "p_1"),
            user("u2", "Marcus Miller", "marcus@cloudscale.io", Role::Admin, "p_1"),
            user("u3", "Elena Rodriguez", "elena@dataops.tech", Role::Admin, "p_2"),
            user("u4", "David Kim", "david@cloudscale.io", Role::Member, "p_1"),
        ],
        sprints: demo_sprints(),
        epics: vec![Epic {
            id: "e1".into(),
            name: "Kubernetes Multi-Region Cluster".into(),
            description: "Scaling our core infrastructure to support global low-latency \
                          requests across 12 regions."
                .into(),
            status: EpicStatus::InProgress,
            priority: Priority::Urgent,
            owner_id: "u1".into(),
            org_id: "p_1".into(),
            tags: vec![],
            story_count: 5,
            completed_story_count: 4,
            team: vec!["u1".into(), "u2".into(), "u4".into()],
            sprint_id: None,
        }],
        stories: demo_stories(),
        tasks: vec![],
    }
}

fn demo_sprints() -> Vec<Sprint> {
    let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    let plan = [
        (24, SprintStatus::Completed, 25),
        (25, SprintStatus::Completed, 25),
        (26, SprintStatus::Completed, 30),
        (27, SprintStatus::Completed, 30),
        (28, SprintStatus::Active, 35),
        (29, SprintStatus::Future, 35),
    ];
    plan.iter()
        .zip(0i64..)
        .map(|(&(number, status, capacity), offset)| {
            let start = first + Duration::days(14 * offset);
            Sprint {
                id: format!("sp_{number}"),
                name: format!("Sprint {number}"),
                start_date: start,
                end_date: start + Duration::days(13),
                status,
                capacity,
            }
        })
        .collect()
}

fn demo_stories() -> Vec<Story> {
    let closed = [
        ("s_old_1", "Legacy Cluster Audit", "u1", Priority::Medium, 8, "sp_24"),
        ("s_old_2", "Auth Service Migration", "u2", Priority::High, 13, "sp_24"),
        ("s_old_3", "Region Latency Tests", "u4", Priority::Low, 5, "sp_25"),
        ("s_old_4", "VPC Peering Setup", "u4", Priority::High, 13, "sp_25"),
        ("s_old_5", "Node Pool Tuning", "u1", Priority::Medium, 21, "sp_26"),
        ("s_old_6", "DNS Optimization", "u2", Priority::Urgent, 8, "sp_27"),
        ("s_old_7", "Resource Quota Hardening", "u4", Priority::Medium, 13, "sp_27"),
    ];
    let mut stories: Vec<Story> = closed
        .into_iter()
        .map(|(id, title, assignee, priority, points, sprint)| Story {
            id: id.into(),
            epic_id: "e1".into(),
            title: title.into(),
            description: String::new(),
            assigned_to: assignee.into(),
            status: StoryStatus::Closed,
            priority,
            points,
            sprint_id: Some(sprint.into()),
        })
        .collect();
    stories.push(Story {
        id: "s1".into(),
        epic_id: "e1".into(),
        title: "Terraform Module Refactoring".into(),
        description: "As a DevOps engineer, I need modular Terraform templates to ensure \
                      consistent regional deployment."
            .into(),
        assigned_to: "u4".into(),
        status: StoryStatus::InProgress,
        priority: Priority::High,
        points: 5,
        sprint_id: Some("sp_28".into()),
    });
    stories
}

fn org(id: &str, name: &str, domain: &str, logo: &str) -> Organization {
    Organization {
        id: id.into(),
        name: name.into(),
        domain: domain.into(),
        logo: logo.into(),
        branding: None,
    }
}

fn user(id: &str, name: &str, email: &str, role: Role, org_id: &str) -> User {
    User {
        id: id.into(),
        name: name.into(),
        email: email.into(),
        role,
        avatar: default_avatar(name),
        org_id: org_id.into(),
    }
}
