//! Kanban board view.

use serde::Serialize;

use crate::model::{Sprint, SprintStatus, Story, StoryStatus};
use crate::query::{BoardFilters, SprintFilter};
use crate::util::contains_ignore_case;

/// One status column of the board.
#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn<'a> {
    pub status: StoryStatus,
    pub stories: Vec<&'a Story>,
}

impl BoardColumn<'_> {
    #[must_use]
    pub fn points(&self) -> u32 {
        self.stories.iter().map(|s| s.points).sum()
    }
}

/// Stories grouped into the five pipeline columns.
#[derive(Debug, Clone, Serialize)]
pub struct Board<'a> {
    /// The sprint predicate actually applied.
    pub sprint: SprintFilter,
    pub columns: Vec<BoardColumn<'a>>,
}

impl<'a> Board<'a> {
    /// Build the board for an org's stories.
    ///
    /// With no explicit sprint filter the board shows the first active
    /// sprint, or every story when no sprint is active.
    #[must_use]
    pub fn build(stories: &[&'a Story], sprints: &[Sprint], filters: &BoardFilters) -> Self {
        let sprint = effective_sprint(sprints, filters);
        let columns = StoryStatus::PIPELINE
            .into_iter()
            .map(|status| BoardColumn {
                status,
                stories: stories
                    .iter()
                    .copied()
                    .filter(|s| s.status == status && matches(s, filters, &sprint))
                    .collect(),
            })
            .collect();
        Self { sprint, columns }
    }

    #[must_use]
    pub fn column(&self, status: StoryStatus) -> Option<&BoardColumn<'a>> {
        self.columns.iter().find(|c| c.status == status)
    }

    #[must_use]
    pub fn story_count(&self) -> usize {
        self.columns.iter().map(|c| c.stories.len()).sum()
    }
}

/// Just the columns of [`Board::build`].
#[must_use]
pub fn board_columns<'a>(
    stories: &[&'a Story],
    sprints: &[Sprint],
    filters: &BoardFilters,
) -> Vec<BoardColumn<'a>> {
    Board::build(stories, sprints, filters).columns
}

/// Sprint predicate used when `filters.sprint` is unset.
#[must_use]
pub fn effective_sprint(sprints: &[Sprint], filters: &BoardFilters) -> SprintFilter {
    filters.sprint.clone().unwrap_or_else(|| {
        sprints
            .iter()
            .find(|s| s.status == SprintStatus::Active)
            .map_or(SprintFilter::Any, |s| SprintFilter::Sprint(s.id.clone()))
    })
}

fn matches(story: &Story, filters: &BoardFilters, sprint: &SprintFilter) -> bool {
    if !sprint.matches(story.sprint_id.as_deref()) {
        return false;
    }
    if let Some(ref search) = filters.search {
        if !contains_ignore_case(&story.title, search) {
            return false;
        }
    }
    if let Some(ref assignee) = filters.assignee {
        if story.assigned_to != *assignee {
            return false;
        }
    }
    if let Some(priority) = filters.priority {
        if story.priority != priority {
            return false;
        }
    }
    if let Some(ref epic) = filters.epic {
        if story.epic_id != *epic {
            return false;
        }
    }
    filters.status.is_none_or(|status| story.status == status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;
    use crate::resolve::OrgScope;
    use crate::seed;

    #[test]
    fn test_defaults_to_active_sprint() {
        let ws = seed::demo_workspace();
        let scope = OrgScope::resolve(&ws, "p_1");
        let board = Board::build(&scope.stories, ws.sprints(), &BoardFilters::default());
        assert_eq!(board.sprint, SprintFilter::Sprint("sp_28".into()));
        assert_eq!(board.columns.len(), 5);
        assert_eq!(board.story_count(), 1);
        let in_progress = board.column(StoryStatus::InProgress).unwrap();
        assert_eq!(in_progress.stories[0].id, "s1");
        assert_eq!(in_progress.points(), 5);
    }

    #[test]
    fn test_any_sprint_shows_everything() {
        let ws = seed::demo_workspace();
        let scope = OrgScope::resolve(&ws, "p_1");
        let filters = BoardFilters {
            sprint: Some(SprintFilter::Any),
            ..Default::default()
        };
        let board = Board::build(&scope.stories, ws.sprints(), &filters);
        assert_eq!(board.story_count(), 8);
        assert_eq!(board.column(StoryStatus::Closed).unwrap().stories.len(), 7);
    }

    #[test]
    fn test_no_active_sprint_falls_back_to_any() {
        let sprints: Vec<Sprint> = seed::demo_workspace()
            .sprints()
            .iter()
            .filter(|s| s.status != SprintStatus::Active)
            .cloned()
            .collect();
        assert_eq!(
            effective_sprint(&sprints, &BoardFilters::default()),
            SprintFilter::Any
        );
    }

    #[test]
    fn test_board_filters_combine() {
        let ws = seed::demo_workspace();
        let scope = OrgScope::resolve(&ws, "p_1");
        let filters = BoardFilters {
            assignee: Some("u4".into()),
            priority: Some(Priority::High),
            sprint: Some(SprintFilter::Any),
            ..Default::default()
        };
        let board = Board::build(&scope.stories, ws.sprints(), &filters);
        let ids: Vec<&str> = board
            .columns
            .iter()
            .flat_map(|c| c.stories.iter().map(|s| s.id.as_str()))
            .collect();
        assert_eq!(ids, vec!["s1", "s_old_4"]);

        let search = BoardFilters {
            search: Some("dns".into()),
            sprint: Some(SprintFilter::Any),
            ..Default::default()
        };
        let board = Board::build(&scope.stories, ws.sprints(), &search);
        assert_eq!(board.story_count(), 1);
    }

    #[test]
    fn test_board_columns_in_pipeline_order() {
        let ws = seed::demo_workspace();
        let scope = OrgScope::resolve(&ws, "p_1");
        let columns = board_columns(&scope.stories, ws.sprints(), &BoardFilters::default());
        let order: Vec<StoryStatus> = columns.iter().map(|c| c.status).collect();
        assert_eq!(order, StoryStatus::PIPELINE.to_vec());
    }
}
