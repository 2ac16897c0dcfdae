//! Summarize command implementation.

use anyhow::Result;
use serde::Serialize;

use iterion_lib::IterionError;
use iterion_lib::assistant::Assistant;
use iterion_lib::model::Task;
use iterion_lib::resolve::tasks_for_story;

use super::assistant_backend;
use crate::cli::{Session, SummarizeArgs};

#[derive(Serialize)]
struct SummaryOutput<'a> {
    story_id: &'a str,
    title: &'a str,
    model: &'a str,
    summary: String,
}

/// Execute the summarize command.
///
/// A failed or unconfigured assistant still succeeds, printing the
/// fallback text.
///
/// # Errors
///
/// Returns an error if the story does not exist in the selected
/// organization or JSON serialization fails.
pub fn execute(args: &SummarizeArgs, session: &Session, json: bool) -> Result<()> {
    let scope = session.scope();
    let story = scope
        .stories
        .iter()
        .copied()
        .find(|s| s.id == args.story_id)
        .ok_or_else(|| IterionError::StoryNotFound {
            id: args.story_id.clone(),
        })?;
    let tasks: Vec<&Task> = tasks_for_story(scope.tasks.iter().copied(), &story.id).collect();

    let assistant = Assistant::new(assistant_backend(&session.config.assistant));
    let summary = assistant.summarize(&story.title, &story.description, &tasks);

    if json {
        let output = SummaryOutput {
            story_id: &story.id,
            title: &story.title,
            model: &session.config.assistant.model,
            summary,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} {}\n", story.id, story.title);
        println!("{summary}");
    }
    Ok(())
}
