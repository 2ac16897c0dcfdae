//! Unified discovery search over epics, stories and tasks.
//!
//! `WorkItem` wraps a borrowed record with an explicit discriminant so the
//! search engine never checks for optional fields. Filtering is a lazy
//! iterator adaptor: nothing is materialized until the caller collects.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{Epic, ItemKind, Priority, Story, Task};
use crate::query::DiscoveryFilters;
use crate::resolve::OrgScope;
use crate::util::contains_ignore_case;

/// Where selecting an item should navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailView {
    Epic,
    Story,
    /// Shared by tasks and bugs.
    Task,
}

/// A record in the unified discovery list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkItem<'a> {
    Epic(&'a Epic),
    Story(&'a Story),
    Task(&'a Task),
}

impl<'a> WorkItem<'a> {
    /// Task records report `Task` or `Bug` per their kind.
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Epic(_) => ItemKind::Epic,
            Self::Story(_) => ItemKind::Story,
            Self::Task(t) => t.kind.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &'a str {
        match self {
            Self::Epic(e) => &e.id,
            Self::Story(s) => &s.id,
            Self::Task(t) => &t.id,
        }
    }

    /// Epic name or story/task title.
    #[must_use]
    pub fn name(&self) -> &'a str {
        match self {
            Self::Epic(e) => &e.name,
            Self::Story(s) => &s.title,
            Self::Task(t) => &t.title,
        }
    }

    #[must_use]
    pub const fn status_label(&self) -> &'static str {
        match self {
            Self::Epic(e) => e.status.as_str(),
            Self::Story(s) => s.status.as_str(),
            Self::Task(t) => t.status.as_str(),
        }
    }

    #[must_use]
    pub const fn priority(&self) -> Priority {
        match self {
            Self::Epic(e) => e.priority,
            Self::Story(s) => s.priority,
            Self::Task(t) => t.priority,
        }
    }

    /// The responsible user: epic owner, otherwise the assignee.
    #[must_use]
    pub fn owner_of(&self) -> &'a str {
        match self {
            Self::Epic(e) => &e.owner_id,
            Self::Story(s) => &s.assigned_to,
            Self::Task(t) => &t.assigned_to,
        }
    }

    #[must_use]
    pub fn sprint_id(&self) -> Option<&'a str> {
        match self {
            Self::Epic(e) => e.sprint_id.as_deref(),
            Self::Story(s) => s.sprint_id.as_deref(),
            Self::Task(t) => t.sprint_id.as_deref(),
        }
    }

    #[must_use]
    pub const fn detail_view(&self) -> DetailView {
        match self {
            Self::Epic(_) => DetailView::Epic,
            Self::Story(_) => DetailView::Story,
            Self::Task(_) => DetailView::Task,
        }
    }
}

/// Epics, then stories, then tasks of an org, without copying anything.
pub fn unified_items<'a>(scope: &OrgScope<'a>) -> impl Iterator<Item = WorkItem<'a>> {
    scope
        .epics
        .iter()
        .copied()
        .map(WorkItem::Epic)
        .chain(scope.stories.iter().copied().map(WorkItem::Story))
        .chain(scope.tasks.iter().copied().map(WorkItem::Task))
}

/// True when `item` satisfies every active predicate in `filters`.
#[must_use]
pub fn matches(item: &WorkItem<'_>, filters: &DiscoveryFilters) -> bool {
    if let Some(ref text) = filters.text {
        if !contains_ignore_case(item.name(), text) {
            return false;
        }
    }
    if let Some(kind) = filters.kind {
        if item.kind() != kind {
            return false;
        }
    }
    if let Some(ref status) = filters.status {
        if !item.status_label().eq_ignore_ascii_case(status) {
            return false;
        }
    }
    if let Some(priority) = filters.priority {
        if item.priority() != priority {
            return false;
        }
    }
    if let Some(ref assignee) = filters.assignee {
        if item.owner_of() != assignee {
            return false;
        }
    }
    filters.sprint.matches(item.sprint_id())
}

/// Lazily keep the items matching `filters`, in input order.
pub fn filter_items<'a, 'f, I>(
    items: I,
    filters: &'f DiscoveryFilters,
) -> impl Iterator<Item = WorkItem<'a>>
where
    I: IntoIterator<Item = WorkItem<'a>>,
{
    items.into_iter().filter(move |item| matches(item, filters))
}

/// Sorted, de-duplicated status labels present in `items`.
pub fn distinct_statuses<'a>(items: impl IntoIterator<Item = WorkItem<'a>>) -> Vec<&'static str> {
    items
        .into_iter()
        .map(|item| item.status_label())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StoryStatus, TaskKind, TaskStatus};
    use crate::query::SprintFilter;
    use crate::seed;
    use crate::store::Workspace;

    fn with_tasks() -> Workspace {
        let mut ws = seed::demo_workspace();
        for (id, kind, title) in [
            ("t_1", TaskKind::Task, "Write provider tests"),
            ("t_2", TaskKind::Bug, "State lock leaks"),
        ] {
            ws.create_task(&Task {
                id: id.into(),
                story_id: "s1".into(),
                title: title.into(),
                description: String::new(),
                assigned_to: "u2".into(),
                status: TaskStatus::Todo,
                priority: Priority::High,
                kind,
                sprint_id: None,
            })
            .unwrap();
        }
        ws
    }

    fn run<'a>(scope: &OrgScope<'a>, filters: &DiscoveryFilters) -> Vec<&'a str> {
        filter_items(unified_items(scope), filters)
            .map(|item| item.id())
            .collect()
    }

    #[test]
    fn test_unified_order_and_kinds() {
        let ws = with_tasks();
        let scope = OrgScope::resolve(&ws, "p_1");
        let items: Vec<_> = unified_items(&scope).collect();
        assert_eq!(items.len(), 1 + 8 + 2);
        assert_eq!(items[0].kind(), ItemKind::Epic);
        assert_eq!(items[1].kind(), ItemKind::Story);
        assert_eq!(items[9].kind(), ItemKind::Task);
        assert_eq!(items[10].kind(), ItemKind::Bug);
    }

    #[test]
    fn test_task_and_bug_share_detail_view() {
        let ws = with_tasks();
        let task = WorkItem::Task(ws.get_task("t_1").unwrap());
        let bug = WorkItem::Task(ws.get_task("t_2").unwrap());
        assert_eq!(task.detail_view(), DetailView::Task);
        assert_eq!(bug.detail_view(), DetailView::Task);
        assert_ne!(task.kind(), bug.kind());
    }

    #[test]
    fn test_empty_filters_match_everything() {
        let ws = with_tasks();
        let scope = OrgScope::resolve(&ws, "p_1");
        assert_eq!(run(&scope, &DiscoveryFilters::default()).len(), 11);
    }

    #[test]
    fn test_text_is_case_insensitive_on_name() {
        let ws = with_tasks();
        let scope = OrgScope::resolve(&ws, "p_1");
        let filters = DiscoveryFilters {
            text: Some("TERRAFORM".into()),
            ..Default::default()
        };
        assert_eq!(run(&scope, &filters), vec!["s1"]);
    }

    #[test]
    fn test_kind_filter_separates_bugs() {
        let ws = with_tasks();
        let scope = OrgScope::resolve(&ws, "p_1");
        let filters = DiscoveryFilters {
            kind: Some(ItemKind::Bug),
            ..Default::default()
        };
        assert_eq!(run(&scope, &filters), vec!["t_2"]);
    }

    #[test]
    fn test_assignee_matches_owner_or_assignee() {
        let ws = with_tasks();
        let scope = OrgScope::resolve(&ws, "p_1");
        let filters = DiscoveryFilters {
            assignee: Some("u1".into()),
            ..Default::default()
        };
        assert_eq!(run(&scope, &filters), vec!["e1", "s_old_1", "s_old_5"]);
    }

    #[test]
    fn test_status_label_across_kinds() {
        let ws = with_tasks();
        let scope = OrgScope::resolve(&ws, "p_1");
        let filters = DiscoveryFilters {
            status: Some("in progress".into()),
            ..Default::default()
        };
        assert_eq!(run(&scope, &filters), vec!["e1", "s1"]);
    }

    #[test]
    fn test_backlog_distinct_from_any() {
        let ws = with_tasks();
        let scope = OrgScope::resolve(&ws, "p_1");
        let backlog = DiscoveryFilters {
            sprint: SprintFilter::Backlog,
            ..Default::default()
        };
        // The epic has no sprint; tasks inherit s1's sprint.
        assert_eq!(run(&scope, &backlog), vec!["e1"]);

        let sp28 = DiscoveryFilters {
            sprint: SprintFilter::Sprint("sp_28".into()),
            ..Default::default()
        };
        assert_eq!(run(&scope, &sp28), vec!["s1", "t_1", "t_2"]);
    }

    #[test]
    fn test_conjunction_of_filters() {
        let ws = with_tasks();
        let scope = OrgScope::resolve(&ws, "p_1");
        let filters = DiscoveryFilters {
            kind: Some(ItemKind::Story),
            priority: Some(Priority::High),
            status: Some(StoryStatus::Closed.as_str().into()),
            ..Default::default()
        };
        assert_eq!(run(&scope, &filters), vec!["s_old_2", "s_old_4"]);
    }

    #[test]
    fn test_distinct_statuses_sorted() {
        let ws = with_tasks();
        let scope = OrgScope::resolve(&ws, "p_1");
        assert_eq!(
            distinct_statuses(unified_items(&scope)),
            vec!["Closed", "In Progress", "Todo"]
        );
    }
}
