//! Output formatting for `iterion`.
//!
//! Supports both human-readable text output and machine-parseable JSON.
//! With `--json`, stdout carries only JSON and diagnostics go to stderr.
//!
//! # JSON Output Types
//!
//! - [`DashboardOutput`] - org header plus flattened dashboard metrics
//! - [`DiscoveryRow`] - one unified search hit
//! - [`BoardOutput`] - kanban columns and the applied sprint
//! - [`TeamOutput`] - org members with permission annotations
//! - [`OrgSummary`] - organization with headline counts

mod output;
mod text;

pub use output::{
    BoardOutput, DashboardOutput, DiscoveryRow, OrgRef, OrgSummary, TeamMember, TeamOutput,
};
pub use text::{
    column_width, epic_status_icon, format_item_line, format_kind_badge, format_priority,
    format_status_icon, format_story_card, icons, pad_right, progress_bar, story_status_icon,
    task_status_icon,
};
