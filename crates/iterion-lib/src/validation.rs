//! Validation helpers for new and edited records.
//!
//! These routines check field-level constraints and return structured
//! validation errors without touching the workspace. Cross-record checks
//! (does the parent epic exist?) live in the store.

use crate::error::ValidationError;
use crate::model::{Epic, Organization, Story, Task, User};

const MAX_TITLE_LEN: usize = 500;
const MAX_DESCRIPTION_LEN: usize = 102_400;

fn check_title(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(ValidationError::new(field, "cannot be empty"));
    }
    if value.len() > MAX_TITLE_LEN {
        errors.push(ValidationError::new(field, "exceeds 500 characters"));
    }
}

fn check_description(errors: &mut Vec<ValidationError>, value: &str) {
    if value.len() > MAX_DESCRIPTION_LEN {
        errors.push(ValidationError::new("description", "exceeds 100KB"));
    }
}

fn finish(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validates story fields.
pub struct StoryValidator;

impl StoryValidator {
    /// # Errors
    ///
    /// Returns every violated rule.
    pub fn validate(story: &Story) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        check_title(&mut errors, "title", &story.title);
        check_description(&mut errors, &story.description);
        if story.points == 0 {
            errors.push(ValidationError::new("points", "must be a positive integer"));
        }
        if story.epic_id.trim().is_empty() {
            errors.push(ValidationError::new("epic_id", "cannot be empty"));
        }
        finish(errors)
    }
}

/// Validates epic fields.
pub struct EpicValidator;

impl EpicValidator {
    /// # Errors
    ///
    /// Returns every violated rule.
    pub fn validate(epic: &Epic) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        check_title(&mut errors, "name", &epic.name);
        check_description(&mut errors, &epic.description);
        if epic.owner_id.trim().is_empty() {
            errors.push(ValidationError::new("owner_id", "cannot be empty"));
        }
        if epic.org_id.trim().is_empty() {
            errors.push(ValidationError::new("org_id", "cannot be empty"));
        }
        finish(errors)
    }
}

/// Validates task fields.
pub struct TaskValidator;

impl TaskValidator {
    /// # Errors
    ///
    /// Returns every violated rule.
    pub fn validate(task: &Task) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        check_title(&mut errors, "title", &task.title);
        check_description(&mut errors, &task.description);
        if task.story_id.trim().is_empty() {
            errors.push(ValidationError::new("story_id", "cannot be empty"));
        }
        finish(errors)
    }
}

/// Validates user fields.
pub struct UserValidator;

impl UserValidator {
    /// # Errors
    ///
    /// Returns every violated rule.
    pub fn validate(user: &User) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if user.name.trim().is_empty() {
            errors.push(ValidationError::new("name", "cannot be empty"));
        }
        if !is_plausible_email(&user.email) {
            errors.push(ValidationError::new("email", "invalid address"));
        }
        finish(errors)
    }
}

/// Validates organization fields.
pub struct OrgValidator;

impl OrgValidator {
    /// # Errors
    ///
    /// Returns every violated rule.
    pub fn validate(org: &Organization) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if org.name.trim().is_empty() {
            errors.push(ValidationError::new("name", "cannot be empty"));
        }
        if org.domain.trim().is_empty() {
            errors.push(ValidationError::new("domain", "cannot be empty"));
        } else if org.domain.chars().any(char::is_whitespace) {
            errors.push(ValidationError::new("domain", "cannot contain whitespace"));
        }
        finish(errors)
    }
}

fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, Role, StoryStatus};

    fn story(title: &str, points: u32) -> Story {
        Story {
            id: "s1".into(),
            epic_id: "e1".into(),
            title: title.into(),
            description: String::new(),
            assigned_to: "u1".into(),
            status: StoryStatus::Todo,
            priority: Priority::Medium,
            points,
            sprint_id: None,
        }
    }

    #[test]
    fn test_story_valid() {
        assert!(StoryValidator::validate(&story("Refactor", 3)).is_ok());
    }

    #[test]
    fn test_story_collects_all_errors() {
        let errors = StoryValidator::validate(&story("  ", 0)).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["title", "points"]);
    }

    #[test]
    fn test_user_email_rules() {
        let mut user = User {
            id: "u9".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            role: Role::Member,
            avatar: String::new(),
            org_id: "p_1".into(),
        };
        assert!(UserValidator::validate(&user).is_ok());
        user.email = "ada.example.com".into();
        assert!(UserValidator::validate(&user).is_err());
        user.email = "ada@localhost".into();
        assert!(UserValidator::validate(&user).is_err());
    }

    #[test]
    fn test_org_domain_whitespace() {
        let org = Organization {
            id: "org_1".into(),
            name: "Acme".into(),
            domain: "acme .io".into(),
            logo: "A".into(),
            branding: None,
        };
        let errors = OrgValidator::validate(&org).unwrap_err();
        assert_eq!(errors[0].field, "domain");
    }
}
