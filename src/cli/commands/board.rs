//! Board command implementation.

use std::fmt::Write as _;

use anyhow::Result;

use iterion_lib::model::Sprint;
use iterion_lib::{Board, BoardFilters, OrgScope, SprintFilter};

use super::{resolve_epic_ref, resolve_user_ref};
use crate::cli::{BoardArgs, Session};
use crate::format::{BoardOutput, format_story_card, story_status_icon};

/// Execute the board command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(args: &BoardArgs, session: &Session, json: bool) -> Result<()> {
    let scope = session.scope();
    let filters = build_filters(args, &scope);
    let sprints = session.workspace.sprints();
    let board = Board::build(&scope.stories, sprints, &filters);

    if json {
        let output = BoardOutput {
            org: (&session.org).into(),
            board: &board,
            story_count: board.story_count(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", render(&board, &scope, sprints));
    }
    Ok(())
}

fn build_filters(args: &BoardArgs, scope: &OrgScope<'_>) -> BoardFilters {
    BoardFilters {
        search: args.search.clone().filter(|s| !s.trim().is_empty()),
        assignee: args.assignee.as_deref().map(|a| resolve_user_ref(scope, a)),
        priority: args.priority,
        epic: args.epic.as_deref().map(|e| resolve_epic_ref(scope, e)),
        status: args.status,
        sprint: args.sprint.clone(),
    }
}

fn sprint_label(filter: &SprintFilter, sprints: &[Sprint]) -> String {
    match filter {
        SprintFilter::Any => "all sprints".to_string(),
        SprintFilter::Backlog => "backlog".to_string(),
        SprintFilter::Sprint(id) => sprints
            .iter()
            .find(|s| s.id == *id)
            .map_or_else(|| id.clone(), |s| format!("{} ({id}, {})", s.name, s.status)),
    }
}

fn render(board: &Board<'_>, scope: &OrgScope<'_>, sprints: &[Sprint]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Sprint: {}", sprint_label(&board.sprint, sprints));
    for column in &board.columns {
        let _ = writeln!(
            out,
            "\n{} {} ({}, {} pts)",
            story_status_icon(column.status),
            column.status,
            column.stories.len(),
            column.points()
        );
        for story in &column.stories {
            let _ = write!(out, "  {}", format_story_card(story));
            if let Some(name) = scope.user_name(&story.assigned_to) {
                let _ = write!(out, " @{name}");
            }
            out.push('\n');
        }
    }
    let _ = writeln!(out, "\n{} story(ies)", board.story_count());
    out
}
