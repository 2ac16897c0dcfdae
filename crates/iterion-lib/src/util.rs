//! ID generation and text helpers.

use chrono::{DateTime, Utc};

// ============================================================================
// ID Generation
// ============================================================================

/// Record prefixes used for generated IDs.
pub mod prefix {
    pub const ORG: &str = "org";
    pub const USER: &str = "u";
    pub const EPIC: &str = "e";
    pub const STORY: &str = "s";
    pub const TASK: &str = "t";
}

/// Generate a timestamp-derived ID: `<prefix>_<unix millis>`.
///
/// Two records created within the same millisecond would collide, so the
/// `exists` closure is consulted and the numeric part is bumped until free.
pub fn generate_id<F>(prefix: &str, created_at: DateTime<Utc>, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    let mut millis = created_at.timestamp_millis();
    loop {
        let id = format!("{prefix}_{millis}");
        if !exists(&id) {
            return id;
        }
        millis += 1;
    }
}

// ============================================================================
// Text
// ============================================================================

/// Case-insensitive substring test. An empty needle matches everything.
#[must_use]
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Shorten `name` to `max_chars` characters, appending "..." when cut.
#[must_use]
pub fn truncate_label(name: &str, max_chars: usize) -> String {
    if name.chars().count() > max_chars {
        let head: String = name.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

/// Avatar placeholder for users created without one.
#[must_use]
pub fn default_avatar(email: &str) -> String {
    format!("https://picsum.photos/seed/{email}/100/100")
}
