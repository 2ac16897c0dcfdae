//! Orgs command implementation.

use anyhow::Result;

use crate::cli::Session;
use crate::format::{OrgSummary, column_width, pad_right};

/// Execute the orgs command.
///
/// The selected organization is marked with `*`.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(session: &Session, json: bool) -> Result<()> {
    let summaries: Vec<OrgSummary<'_>> = session
        .workspace
        .orgs()
        .iter()
        .map(|org| OrgSummary::new(org, &session.workspace))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    let width = column_width(summaries.iter().map(|s| s.name));
    for summary in &summaries {
        let marker = if summary.id == session.org.id { '*' } else { ' ' };
        println!(
            "{marker} {} {} {}  {} user(s), {} epic(s), {} story(ies)  {}",
            summary.logo,
            summary.id,
            pad_right(summary.name, width),
            summary.users,
            summary.epics,
            summary.stories,
            summary.domain
        );
    }
    println!("\n{} organization(s)", summaries.len());
    Ok(())
}
