//! Dashboard statistics.
//!
//! Everything here is a pure reduction over resolved org views; the
//! dashboard recomputes from scratch on every call.

use serde::Serialize;

use crate::model::{Epic, EpicStatus, Priority, Sprint, SprintStatus, Story};
use crate::resolve::OrgScope;
use crate::util::truncate_label;

/// Default number of epics shown in the delivery chart.
pub const DEFAULT_DELIVERY_LIMIT: usize = 6;

/// Epic names longer than this are cut in the delivery chart.
pub const EPIC_LABEL_CHARS: usize = 18;

/// Delivered vs planned points for one sprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VelocityPoint {
    pub sprint_id: String,
    pub sprint: String,
    pub delivered: u32,
    pub target: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PriorityBucket {
    pub priority: Priority,
    pub count: usize,
}

/// Story progress for one epic, taken from its stored counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpicDelivery {
    pub epic_id: String,
    pub name: String,
    pub completed: u32,
    pub total: u32,
    pub remaining: u32,
}

/// Everything the dashboard shows for one organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardMetrics {
    pub active_epics: usize,
    pub completion_rate: u32,
    pub delivered_points: u32,
    pub total_points: u32,
    pub critical_blockers: usize,
    pub velocity_trend: Vec<VelocityPoint>,
    pub priority_mix: Vec<PriorityBucket>,
    pub delivery_by_epic: Vec<EpicDelivery>,
}

impl DashboardMetrics {
    #[must_use]
    pub fn compute(scope: &OrgScope<'_>, sprints: &[Sprint], delivery_limit: usize) -> Self {
        Self {
            active_epics: scope.epics.len(),
            completion_rate: completion_rate(&scope.stories),
            delivered_points: delivered_points(&scope.stories),
            total_points: total_points(&scope.stories),
            critical_blockers: critical_blockers(&scope.epics),
            velocity_trend: velocity_trend(&scope.stories, sprints),
            priority_mix: priority_mix(&scope.epics),
            delivery_by_epic: delivery_by_epic(&scope.epics, delivery_limit),
        }
    }
}

#[must_use]
pub fn total_points(stories: &[&Story]) -> u32 {
    stories.iter().map(|s| s.points).sum()
}

/// Points of `Closed` stories.
#[must_use]
pub fn delivered_points(stories: &[&Story]) -> u32 {
    stories
        .iter()
        .filter(|s| s.status.is_closed())
        .map(|s| s.points)
        .sum()
}

/// Closed points as a whole percentage of all points, rounded half up.
/// Zero total points yields 0.
#[must_use]
pub fn completion_rate(stories: &[&Story]) -> u32 {
    let total = u64::from(total_points(stories));
    if total == 0 {
        return 0;
    }
    let closed = u64::from(delivered_points(stories));
    let rate = (200 * closed + total) / (2 * total);
    u32::try_from(rate).unwrap_or(100)
}

/// Urgent epics that are not yet completed.
#[must_use]
pub fn critical_blockers(epics: &[&Epic]) -> usize {
    epics
        .iter()
        .filter(|e| e.priority == Priority::Urgent && e.status != EpicStatus::Completed)
        .count()
}

/// Delivered vs capacity for every started sprint, in sprint list order.
#[must_use]
pub fn velocity_trend(stories: &[&Story], sprints: &[Sprint]) -> Vec<VelocityPoint> {
    sprints
        .iter()
        .filter(|sprint| sprint.status != SprintStatus::Future)
        .map(|sprint| VelocityPoint {
            sprint_id: sprint.id.clone(),
            sprint: sprint.name.clone(),
            delivered: stories
                .iter()
                .filter(|s| {
                    s.status.is_closed() && s.sprint_id.as_deref() == Some(sprint.id.as_str())
                })
                .map(|s| s.points)
                .sum(),
            target: sprint.capacity,
        })
        .collect()
}

/// Epic counts per priority, Low to Urgent, skipping empty buckets.
#[must_use]
pub fn priority_mix(epics: &[&Epic]) -> Vec<PriorityBucket> {
    Priority::ALL
        .into_iter()
        .map(|priority| PriorityBucket {
            priority,
            count: epics.iter().filter(|e| e.priority == priority).count(),
        })
        .filter(|bucket| bucket.count > 0)
        .collect()
}

/// Progress of the first `limit` epics in list order.
#[must_use]
pub fn delivery_by_epic(epics: &[&Epic], limit: usize) -> Vec<EpicDelivery> {
    epics
        .iter()
        .take(limit)
        .map(|epic| EpicDelivery {
            epic_id: epic.id.clone(),
            name: truncate_label(&epic.name, EPIC_LABEL_CHARS),
            completed: epic.completed_story_count,
            total: epic.story_count,
            remaining: epic.remaining_stories(),
        })
        .collect()
}
