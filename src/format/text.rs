//! Text formatting functions for `iterion`.
//!
//! Provides plain text (non-ANSI) formatting for terminal output:
//! - Status icons (○ ◐ ◑ ● ✓)
//! - Priority labels (P0-P3)
//! - Kind badges ([epic], [story], [task], [bug])
//! - Work item lines, progress bars and width-aware padding

use unicode_width::UnicodeWidthStr;

use iterion_lib::WorkItem;
use iterion_lib::model::{EpicStatus, ItemKind, Priority, Story, StoryStatus, TaskStatus};

/// Status icon characters.
pub mod icons {
    /// Not started (hollow circle).
    pub const TODO: &str = "○";
    /// Active work (half-filled).
    pub const IN_PROGRESS: &str = "◐";
    /// Waiting for QA.
    pub const READY_FOR_TESTING: &str = "◑";
    /// In QA (filled circle).
    pub const UNDER_TESTING: &str = "●";
    /// Done (checkmark).
    pub const CLOSED: &str = "✓";
    /// Epic still being scoped.
    pub const PLANNING: &str = "◇";
    /// Epic in review.
    pub const REVIEW: &str = "◆";
}

#[must_use]
pub const fn story_status_icon(status: StoryStatus) -> &'static str {
    match status {
        StoryStatus::Todo => icons::TODO,
        StoryStatus::InProgress => icons::IN_PROGRESS,
        StoryStatus::ReadyForTesting => icons::READY_FOR_TESTING,
        StoryStatus::UnderTesting => icons::UNDER_TESTING,
        StoryStatus::Closed => icons::CLOSED,
    }
}

#[must_use]
pub const fn epic_status_icon(status: EpicStatus) -> &'static str {
    match status {
        EpicStatus::Planning => icons::PLANNING,
        EpicStatus::InProgress => icons::IN_PROGRESS,
        EpicStatus::Review => icons::REVIEW,
        EpicStatus::Completed => icons::CLOSED,
    }
}

#[must_use]
pub const fn task_status_icon(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Todo => icons::TODO,
        TaskStatus::InProgress => icons::IN_PROGRESS,
        TaskStatus::Done => icons::CLOSED,
    }
}

/// Icon for whichever record `item` wraps.
#[must_use]
pub fn format_status_icon(item: &WorkItem<'_>) -> &'static str {
    match item {
        WorkItem::Epic(e) => epic_status_icon(e.status),
        WorkItem::Story(s) => story_status_icon(s.status),
        WorkItem::Task(t) => task_status_icon(t.status),
    }
}

/// Urgent is P0, Low is P3.
#[must_use]
pub const fn format_priority(priority: Priority) -> &'static str {
    match priority {
        Priority::Urgent => "P0",
        Priority::High => "P1",
        Priority::Medium => "P2",
        Priority::Low => "P3",
    }
}

#[must_use]
pub fn format_kind_badge(kind: ItemKind) -> String {
    format!("[{}]", kind.as_str().to_lowercase())
}

/// Format a single-line work item summary.
///
/// Format: `{icon} {id} [{priority}] [{kind}] {name}`, followed by
/// `@{owner}` when the owner's name is known.
#[must_use]
pub fn format_item_line(item: &WorkItem<'_>, owner_name: Option<&str>) -> String {
    let mut line = format!(
        "{} {} [{}] {} {}",
        format_status_icon(item),
        item.id(),
        format_priority(item.priority()),
        format_kind_badge(item.kind()),
        item.name(),
    );
    if let Some(owner) = owner_name {
        line.push_str(" @");
        line.push_str(owner);
    }
    line
}

/// Board card: `{id} [{priority}] {title} ({points} pts)`.
#[must_use]
pub fn format_story_card(story: &Story) -> String {
    format!(
        "{} [{}] {} ({} pts)",
        story.id,
        format_priority(story.priority),
        story.title,
        story.points
    )
}

/// Pad `text` with spaces to `width` terminal columns.
///
/// Text already at or past `width` is returned unchanged.
#[must_use]
pub fn pad_right(text: &str, width: usize) -> String {
    let used = UnicodeWidthStr::width(text);
    let mut out = String::with_capacity(text.len() + width.saturating_sub(used));
    out.push_str(text);
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(used)));
    out
}

/// Widest entry in terminal columns.
#[must_use]
pub fn column_width<'a>(values: impl IntoIterator<Item = &'a str>) -> usize {
    values
        .into_iter()
        .map(UnicodeWidthStr::width)
        .max()
        .unwrap_or(0)
}

/// Fixed-width bar, e.g. `[####------]`.
#[must_use]
pub fn progress_bar(done: u32, total: u32, width: usize) -> String {
    let filled = if total == 0 {
        0
    } else {
        let done = done.min(total) as usize;
        (done * width + total as usize / 2) / total as usize
    };
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}
