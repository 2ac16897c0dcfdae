//! Core data types for iterion-lib.
//!
//! Enum values serialize to their display labels ("In Progress",
//! "Ready for Testing") and struct fields to camelCase, so fixture files
//! keep the same shape as the workspace data they were exported from.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::IterionError;

/// Lowercase and strip separators so "In Progress", "in_progress" and
/// "inprogress" all compare equal.
fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Access role of a user within an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    SuperAdmin,
    Admin,
    Manager,
    #[default]
    Member,
}

impl Role {
    pub const ALL: [Self; 4] = [Self::SuperAdmin, Self::Admin, Self::Manager, Self::Member];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "SuperAdmin",
            Self::Admin => "Admin",
            Self::Manager => "Manager",
            Self::Member => "Member",
        }
    }

    /// Privilege tier. Manager and Member share the lowest tier.
    #[must_use]
    pub const fn tier(&self) -> u8 {
        match self {
            Self::SuperAdmin => 2,
            Self::Admin => 1,
            Self::Manager | Self::Member => 0,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = IterionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "superadmin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "member" => Ok(Self::Member),
            _ => Err(IterionError::InvalidRole {
                role: s.to_string(),
            }),
        }
    }
}

/// Work priority, lowest to highest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Bucket order used by charts.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = IterionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "low" => Ok(Self::Low),
            "medium" | "med" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" | "critical" => Ok(Self::Urgent),
            _ => Err(IterionError::InvalidPriority {
                priority: s.to_string(),
            }),
        }
    }
}

/// Sprint lifecycle status. Ordered: a sprint only moves forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum SprintStatus {
    #[default]
    Future,
    Active,
    Completed,
}

impl SprintStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Future => "Future",
            Self::Active => "Active",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for SprintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SprintStatus {
    type Err = IterionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "future" => Ok(Self::Future),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            _ => Err(IterionError::InvalidStatus {
                status: s.to_string(),
            }),
        }
    }
}

/// Epic lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum EpicStatus {
    #[default]
    Planning,
    #[serde(rename = "In Progress")]
    InProgress,
    Review,
    Completed,
}

impl EpicStatus {
    pub const ALL: [Self; 4] = [Self::Planning, Self::InProgress, Self::Review, Self::Completed];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "Planning",
            Self::InProgress => "In Progress",
            Self::Review => "Review",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for EpicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EpicStatus {
    type Err = IterionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "planning" => Ok(Self::Planning),
            "inprogress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "completed" => Ok(Self::Completed),
            _ => Err(IterionError::InvalidStatus {
                status: s.to_string(),
            }),
        }
    }
}

/// Story pipeline status. `Closed` is terminal for counting purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StoryStatus {
    #[default]
    Todo,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Ready for Testing")]
    ReadyForTesting,
    #[serde(rename = "Under Testing")]
    UnderTesting,
    Closed,
}

impl StoryStatus {
    /// Board column order.
    pub const PIPELINE: [Self; 5] = [
        Self::Todo,
        Self::InProgress,
        Self::ReadyForTesting,
        Self::UnderTesting,
        Self::Closed,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "Todo",
            Self::InProgress => "In Progress",
            Self::ReadyForTesting => "Ready for Testing",
            Self::UnderTesting => "Under Testing",
            Self::Closed => "Closed",
        }
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoryStatus {
    type Err = IterionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "todo" => Ok(Self::Todo),
            "inprogress" => Ok(Self::InProgress),
            "readyfortesting" => Ok(Self::ReadyForTesting),
            "undertesting" => Ok(Self::UnderTesting),
            "closed" => Ok(Self::Closed),
            _ => Err(IterionError::InvalidStatus {
                status: s.to_string(),
            }),
        }
    }
}

/// Task status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    Todo,
    #[serde(rename = "In Progress")]
    InProgress,
    Done,
}

impl TaskStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "Todo",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = IterionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "todo" => Ok(Self::Todo),
            "inprogress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            _ => Err(IterionError::InvalidStatus {
                status: s.to_string(),
            }),
        }
    }
}

/// Task flavor: plain task or defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TaskKind {
    #[default]
    Task,
    Bug,
}

impl TaskKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "Task",
            Self::Bug => "Bug",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminant of a record in the unified discovery list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Epic,
    Story,
    Task,
    Bug,
}

impl ItemKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Epic => "Epic",
            Self::Story => "Story",
            Self::Task => "Task",
            Self::Bug => "Bug",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = IterionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize_label(s).as_str() {
            "epic" | "epics" => Ok(Self::Epic),
            "story" | "stories" => Ok(Self::Story),
            "task" | "tasks" => Ok(Self::Task),
            "bug" | "bugs" => Ok(Self::Bug),
            _ => Err(IterionError::InvalidType {
                item_type: s.to_string(),
            }),
        }
    }
}

impl From<TaskKind> for ItemKind {
    fn from(kind: TaskKind) -> Self {
        match kind {
            TaskKind::Task => Self::Task,
            TaskKind::Bug => Self::Bug,
        }
    }
}

/// Per-organization look and feel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    pub primary_color: String,
    pub dark_mode: bool,
    pub font_family: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            primary_color: "#6366f1".to_string(),
            dark_mode: false,
            font_family: "Inter".to_string(),
        }
    }
}

/// Tenant boundary. Users and epics (and transitively stories and tasks)
/// belong to exactly one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub domain: String,
    pub logo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branding: Option<Branding>,
}

impl Organization {
    /// Branding in effect, falling back to the platform default.
    #[must_use]
    pub fn effective_branding(&self) -> Branding {
        self.branding.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub avatar: String,
    /// Owning organization.
    #[serde(alias = "projectId")]
    pub org_id: String,
}

/// Time-boxed delivery window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SprintStatus,
    /// Planned story points.
    pub capacity: u32,
}

/// Top-level initiative within an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Epic {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub status: EpicStatus,
    pub priority: Priority,
    pub owner_id: String,
    #[serde(alias = "projectId")]
    pub org_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Denormalized: number of stories under this epic.
    #[serde(default)]
    pub story_count: u32,
    /// Denormalized: number of those stories in `Closed`.
    #[serde(default)]
    pub completed_story_count: u32,
    #[serde(default)]
    pub team: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<String>,
}

impl Epic {
    #[must_use]
    pub const fn remaining_stories(&self) -> u32 {
        self.story_count.saturating_sub(self.completed_story_count)
    }
}

/// Schedulable unit of work under an epic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: String,
    pub epic_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub assigned_to: String,
    pub status: StoryStatus,
    pub priority: Priority,
    /// Estimate on a Fibonacci-like scale.
    pub points: u32,
    /// `None` means the story sits in the backlog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<String>,
}

/// Smallest execution unit, nested under a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub story_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub assigned_to: String,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(rename = "type", default)]
    pub kind: TaskKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprint_id: Option<String>,
}
