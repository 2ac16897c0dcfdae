//! Discover command implementation.
//!
//! Unified search across the org's epics, stories and tasks with
//! `DiscoveryRow` JSON output.

use anyhow::Result;

use iterion_lib::discovery::{distinct_statuses, filter_items, unified_items};
use iterion_lib::{DiscoveryFilters, OrgScope, WorkItem};

use super::resolve_user_ref;
use crate::cli::{DiscoverArgs, Session};
use crate::format::{DiscoveryRow, format_item_line};

/// Execute the discover command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(args: &DiscoverArgs, session: &Session, json: bool) -> Result<()> {
    let scope = session.scope();

    if args.statuses {
        let statuses = distinct_statuses(unified_items(&scope));
        if json {
            println!("{}", serde_json::to_string_pretty(&statuses)?);
        } else {
            for status in statuses {
                println!("{status}");
            }
        }
        return Ok(());
    }

    let filters = build_filters(args, &scope);
    let items: Vec<WorkItem<'_>> = filter_items(unified_items(&scope), &filters).collect();

    if json {
        let rows: Vec<DiscoveryRow<'_>> = items
            .iter()
            .map(|item| DiscoveryRow::new(item, &scope))
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if items.is_empty() {
        println!("No items found.");
    } else {
        for item in &items {
            println!("{}", format_item_line(item, scope.user_name(item.owner_of())));
        }
        println!("\n{} item(s)", items.len());
    }
    Ok(())
}

/// Convert CLI args to discovery filters.
fn build_filters(args: &DiscoverArgs, scope: &OrgScope<'_>) -> DiscoveryFilters {
    DiscoveryFilters {
        text: args.text.clone().filter(|t| !t.trim().is_empty()),
        kind: args.kind,
        status: args.status.clone(),
        priority: args.priority,
        assignee: args.assignee.as_deref().map(|a| resolve_user_ref(scope, a)),
        sprint: args.sprint.clone().unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iterion_lib::model::ItemKind;
    use iterion_lib::{SprintFilter, seed};

    #[test]
    fn test_build_filters_defaults_are_inactive() {
        let ws = seed::demo_workspace();
        let scope = OrgScope::resolve(&ws, "p_1");
        let filters = build_filters(&DiscoverArgs::default(), &scope);
        assert!(filters.is_empty());
        assert_eq!(filter_items(unified_items(&scope), &filters).count(), 9);
    }

    #[test]
    fn test_build_filters_resolves_assignee_name() {
        let ws = seed::demo_workspace();
        let scope = OrgScope::resolve(&ws, "p_1");
        let args = DiscoverArgs {
            kind: Some(ItemKind::Story),
            assignee: Some("David Kim".into()),
            sprint: Some(SprintFilter::Sprint("sp_25".into())),
            ..Default::default()
        };
        let filters = build_filters(&args, &scope);
        assert_eq!(filters.assignee.as_deref(), Some("u4"));
        let ids: Vec<&str> = filter_items(unified_items(&scope), &filters)
            .map(|item| item.id())
            .collect();
        assert_eq!(ids, vec!["s_old_3", "s_old_4"]);
    }

    #[test]
    fn test_blank_text_is_ignored() {
        let ws = seed::demo_workspace();
        let scope = OrgScope::resolve(&ws, "p_1");
        let args = DiscoverArgs {
            text: Some("   ".into()),
            ..Default::default()
        };
        assert!(build_filters(&args, &scope).text.is_none());
    }
}
