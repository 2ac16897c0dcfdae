//! Error types for `iterion-lib`.
//!
//! Lookups never fail: a missing record is `None`. Mutations return
//! `IterionError` so the caller decides what to show.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::{Role, SprintStatus};

/// Primary error type for iterion-lib operations.
#[derive(Error, Debug)]
pub enum IterionError {
    // === Lookup Errors ===
    /// Organization with the specified ID was not found.
    #[error("Organization not found: {id}")]
    OrgNotFound { id: String },

    /// User with the specified ID was not found.
    #[error("User not found: {id}")]
    UserNotFound { id: String },

    /// Sprint with the specified ID was not found.
    #[error("Sprint not found: {id}")]
    SprintNotFound { id: String },

    /// Epic with the specified ID was not found.
    #[error("Epic not found: {id}")]
    EpicNotFound { id: String },

    /// Story with the specified ID was not found.
    #[error("Story not found: {id}")]
    StoryNotFound { id: String },

    /// Task with the specified ID was not found.
    #[error("Task not found: {id}")]
    TaskNotFound { id: String },

    /// Attempted to insert a record with an ID that already exists.
    #[error("ID collision: {id}")]
    IdCollision { id: String },

    // === Validation Errors ===
    /// Field validation failed.
    #[error("Validation failed: {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Multiple validation errors occurred.
    #[error("Validation errors: {errors:?}")]
    ValidationErrors { errors: Vec<ValidationError> },

    /// Invalid status label.
    #[error("Invalid status: {status}")]
    InvalidStatus { status: String },

    /// Invalid priority label.
    #[error("Invalid priority: {priority}")]
    InvalidPriority { priority: String },

    /// Invalid role label.
    #[error("Invalid role: {role}")]
    InvalidRole { role: String },

    /// Invalid work item type label.
    #[error("Invalid item type: {item_type}")]
    InvalidType { item_type: String },

    // === Access Errors ===
    /// The acting user may not modify the target user.
    #[error("{actor} ({actor_role}) may not modify {target}")]
    PermissionDenied {
        actor: String,
        actor_role: Role,
        target: String,
    },

    /// The acting user may not grant the requested role.
    #[error("{actor} ({actor_role}) may not assign role {role}")]
    RoleNotAssignable {
        actor: String,
        actor_role: Role,
        role: Role,
    },

    /// A story's assignee must belong to the organization of its epic.
    #[error("Assignee {assignee} is not a member of organization {org}")]
    AssigneeOutsideOrg { assignee: String, org: String },

    // === Sprint Errors ===
    /// Sprint status may only move forward (Future -> Active -> Completed).
    #[error("Sprint {id} cannot move from {from} back to {to}")]
    SprintRegression {
        id: String,
        from: SprintStatus,
        to: SprintStatus,
    },

    // === Fixture Errors ===
    /// Fixture file not found at the specified path.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Fixture content was invalid.
    #[error("Fixture error in {path}: {reason}")]
    Fixture { path: PathBuf, reason: String },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single field validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl IterionError {
    #[must_use]
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn from_validation_errors(errors: Vec<ValidationError>) -> Self {
        if errors.len() == 1 {
            let err = &errors[0];
            Self::Validation {
                field: err.field.clone(),
                reason: err.message.clone(),
            }
        } else {
            Self::ValidationErrors { errors }
        }
    }

    /// True for the lookup-miss variants.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::OrgNotFound { .. }
                | Self::UserNotFound { .. }
                | Self::SprintNotFound { .. }
                | Self::EpicNotFound { .. }
                | Self::StoryNotFound { .. }
                | Self::TaskNotFound { .. }
        )
    }
}

/// Result type using `IterionError`.
pub type Result<T> = std::result::Result<T, IterionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_validation_error_collapses() {
        let err = IterionError::from_validation_errors(vec![ValidationError::new(
            "title",
            "cannot be empty",
        )]);
        assert_eq!(err.to_string(), "Validation failed: title: cannot be empty");
    }

    #[test]
    fn test_multiple_validation_errors_kept() {
        let err = IterionError::from_validation_errors(vec![
            ValidationError::new("title", "cannot be empty"),
            ValidationError::new("points", "must be positive"),
        ]);
        assert!(matches!(err, IterionError::ValidationErrors { ref errors } if errors.len() == 2));
    }

    #[test]
    fn test_not_found_classification() {
        assert!(IterionError::StoryNotFound { id: "s1".into() }.is_not_found());
        assert!(!IterionError::validation("x", "y").is_not_found());
    }
}
