//! Doctor command implementation.

use anyhow::Result;
use serde::Serialize;

use iterion_lib::Workspace;
use iterion_lib::model::SprintStatus;
use iterion_lib::resolve::{cross_org_assignments, dangling_refs};
use iterion_lib::validation::StoryValidator;

use crate::cli::{load_workspace, select_org};
use crate::config::{Config, WORKSPACE_CONFIG, user_config_path};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Ok,
    Warn,
    Error,
}

#[derive(Debug, Clone, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
struct DoctorReport {
    ok: bool,
    checks: Vec<CheckResult>,
}

fn push_check(
    checks: &mut Vec<CheckResult>,
    name: &str,
    status: CheckStatus,
    message: Option<String>,
    details: Option<serde_json::Value>,
) {
    checks.push(CheckResult {
        name: name.to_string(),
        status,
        message,
        details,
    });
}

fn has_error(checks: &[CheckResult]) -> bool {
    checks
        .iter()
        .any(|check| matches!(check.status, CheckStatus::Error))
}

fn print_report(report: &DoctorReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("itr doctor");
    for check in &report.checks {
        let label = match check.status {
            CheckStatus::Ok => "OK",
            CheckStatus::Warn => "WARN",
            CheckStatus::Error => "ERROR",
        };
        if let Some(message) = &check.message {
            println!("{label} {}: {}", check.name, message);
        } else {
            println!("{label} {}", check.name);
        }
    }
    Ok(())
}

fn check_config(config: &Config, checks: &mut Vec<CheckResult>) {
    let user = user_config_path().map(|p| p.display().to_string());
    push_check(
        checks,
        "config",
        CheckStatus::Ok,
        Some(format!(
            "model {}, delivery limit {}",
            config.assistant.model, config.dashboard.delivery_limit
        )),
        Some(serde_json::json!({
            "user_config": user,
            "workspace_config": WORKSPACE_CONFIG,
            "seed": config.seed.as_ref().map(|p| p.display().to_string()),
            "resolved": config,
        })),
    );
}

fn check_org(workspace: &Workspace, config: &Config, checks: &mut Vec<CheckResult>) {
    match select_org(workspace, config.default_org.as_deref()) {
        Ok(org) => push_check(
            checks,
            "org.select",
            CheckStatus::Ok,
            Some(format!("{} ({})", org.name, org.id)),
            None,
        ),
        Err(err) => push_check(
            checks,
            "org.select",
            CheckStatus::Error,
            Some(format!("{err:#}")),
            None,
        ),
    }
}

fn check_counters(workspace: &Workspace, checks: &mut Vec<CheckResult>) {
    let drift = workspace.counter_drift();
    if drift.is_empty() {
        push_check(checks, "epics.counters", CheckStatus::Ok, None, None);
    } else {
        push_check(
            checks,
            "epics.counters",
            CheckStatus::Warn,
            Some(format!(
                "{} epic(s) have story counters that disagree with their stories",
                drift.len()
            )),
            Some(serde_json::json!({ "drift": drift })),
        );
    }
}

fn check_references(workspace: &Workspace, checks: &mut Vec<CheckResult>) {
    let dangling = dangling_refs(workspace);
    if dangling.is_empty() {
        push_check(checks, "references", CheckStatus::Ok, None, None);
    } else {
        push_check(
            checks,
            "references",
            CheckStatus::Error,
            Some(format!("{} reference(s) point at missing records", dangling.len())),
            Some(serde_json::json!({ "dangling": dangling })),
        );
    }
}

fn check_assignments(workspace: &Workspace, checks: &mut Vec<CheckResult>) {
    let crossed = cross_org_assignments(workspace);
    if crossed.is_empty() {
        push_check(checks, "stories.assignees", CheckStatus::Ok, None, None);
    } else {
        push_check(
            checks,
            "stories.assignees",
            CheckStatus::Error,
            Some(format!(
                "{} story(ies) assigned outside their epic's organization",
                crossed.len()
            )),
            Some(serde_json::json!({ "stories": crossed })),
        );
    }
}

fn check_stories(workspace: &Workspace, checks: &mut Vec<CheckResult>) {
    let invalid: Vec<serde_json::Value> = workspace
        .stories()
        .iter()
        .filter_map(|story| {
            StoryValidator::validate(story).err().map(|errors| {
                serde_json::json!({
                    "id": story.id,
                    "errors": errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
                })
            })
        })
        .collect();
    if invalid.is_empty() {
        push_check(checks, "stories.valid", CheckStatus::Ok, None, None);
    } else {
        push_check(
            checks,
            "stories.valid",
            CheckStatus::Warn,
            Some(format!("{} story(ies) fail validation", invalid.len())),
            Some(serde_json::json!({ "stories": invalid })),
        );
    }
}

fn check_sprints(workspace: &Workspace, checks: &mut Vec<CheckResult>) {
    let active: Vec<&str> = workspace
        .sprints()
        .iter()
        .filter(|s| s.status == SprintStatus::Active)
        .map(|s| s.id.as_str())
        .collect();
    match active.as_slice() {
        [only] => push_check(
            checks,
            "sprints.active",
            CheckStatus::Ok,
            Some((*only).to_string()),
            None,
        ),
        [] => push_check(
            checks,
            "sprints.active",
            CheckStatus::Warn,
            Some("No active sprint; the board shows every story".to_string()),
            None,
        ),
        [first, ..] => push_check(
            checks,
            "sprints.active",
            CheckStatus::Warn,
            Some(format!(
                "{} active sprints; the board uses {first}",
                active.len()
            )),
            Some(serde_json::json!({ "active": active })),
        ),
    }
}

fn check_api_key<F>(config: &Config, env: F, checks: &mut Vec<CheckResult>)
where
    F: Fn(&str) -> Option<String>,
{
    let var = &config.assistant.api_key_env;
    if env(var).is_some_and(|v| !v.trim().is_empty()) {
        push_check(
            checks,
            "assistant.api_key",
            CheckStatus::Ok,
            Some(format!("${var} is set")),
            None,
        );
    } else {
        push_check(
            checks,
            "assistant.api_key",
            CheckStatus::Warn,
            Some(format!("${var} is not set; the assistant will reply with fallbacks")),
            None,
        );
    }
}

fn diagnose<F>(config: &Config, env: F) -> DoctorReport
where
    F: Fn(&str) -> Option<String>,
{
    let mut checks = Vec::new();
    check_config(config, &mut checks);

    match load_workspace(config) {
        Ok(workspace) => {
            push_check(
                &mut checks,
                "workspace.load",
                CheckStatus::Ok,
                Some(format!(
                    "{} org(s), {} user(s), {} epic(s), {} story(ies), {} task(s)",
                    workspace.orgs().len(),
                    workspace.users().len(),
                    workspace.epics().len(),
                    workspace.stories().len(),
                    workspace.tasks().len()
                )),
                None,
            );
            check_org(&workspace, config, &mut checks);
            check_counters(&workspace, &mut checks);
            check_references(&workspace, &mut checks);
            check_assignments(&workspace, &mut checks);
            check_stories(&workspace, &mut checks);
            check_sprints(&workspace, &mut checks);
        }
        Err(err) => push_check(
            &mut checks,
            "workspace.load",
            CheckStatus::Error,
            Some(format!("{err:#}")),
            None,
        ),
    }

    check_api_key(config, env, &mut checks);

    DoctorReport {
        ok: !has_error(&checks),
        checks,
    }
}

/// Execute the doctor command.
///
/// Exits with status 1 when any check reports an error.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(config: &Config, json: bool) -> Result<()> {
    let report = diagnose(config, |var| std::env::var(var).ok());
    print_report(&report, json)?;

    if !report.ok {
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn find_check<'a>(checks: &'a [CheckResult], name: &str) -> Option<&'a CheckResult> {
        checks.iter().find(|check| check.name == name)
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_demo_workspace_warns_but_passes() {
        crate::logging::init_test_logging();
        let report = diagnose(&Config::default(), no_env);
        assert!(report.ok);

        let counters = find_check(&report.checks, "epics.counters").expect("counters check");
        assert!(matches!(counters.status, CheckStatus::Warn));
        let details = counters.details.as_ref().unwrap();
        assert_eq!(details["drift"][0]["epic_id"], "e1");
        assert_eq!(details["drift"][0]["actual_total"], 8);

        let refs = find_check(&report.checks, "references").expect("references check");
        assert!(matches!(refs.status, CheckStatus::Ok));

        let sprints = find_check(&report.checks, "sprints.active").expect("sprints check");
        assert_eq!(sprints.message.as_deref(), Some("sp_28"));

        let key = find_check(&report.checks, "assistant.api_key").expect("api key check");
        assert!(matches!(key.status, CheckStatus::Warn));
    }

    #[test]
    fn test_api_key_detected() {
        let report = diagnose(&Config::default(), |var| {
            (var == "GEMINI_API_KEY").then(|| "secret".to_string())
        });
        let key = find_check(&report.checks, "assistant.api_key").unwrap();
        assert!(matches!(key.status, CheckStatus::Ok));
    }

    #[test]
    fn test_dangling_story_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"organizations":[{{"id":"o1","name":"Acme","domain":"acme.io","logo":"A"}}],
               "stories":[{{"id":"s1","epicId":"missing","title":"Orphan","assignedTo":"u1",
                           "status":"Todo","priority":"Low","points":0}}]}}"#
        )
        .unwrap();
        let config = Config {
            seed: Some(file.path().to_path_buf()),
            ..Config::default()
        };

        let report = diagnose(&config, no_env);
        assert!(!report.ok);
        let refs = find_check(&report.checks, "references").unwrap();
        assert!(matches!(refs.status, CheckStatus::Error));
        let stories = find_check(&report.checks, "stories.valid").unwrap();
        assert!(matches!(stories.status, CheckStatus::Warn));
        let sprints = find_check(&report.checks, "sprints.active").unwrap();
        assert!(matches!(sprints.status, CheckStatus::Warn));
    }

    #[test]
    fn test_missing_fixture_is_an_error() {
        let config = Config {
            seed: Some("/definitely/not/here.json".into()),
            ..Config::default()
        };
        let report = diagnose(&config, no_env);
        assert!(!report.ok);
        let load = find_check(&report.checks, "workspace.load").unwrap();
        assert!(matches!(load.status, CheckStatus::Error));
        assert!(find_check(&report.checks, "references").is_none());
    }

    #[test]
    fn test_cross_org_assignee_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"organizations":[{{"id":"o1","name":"Acme","domain":"acme.io","logo":"A"}},
                                 {{"id":"o2","name":"Globex","domain":"globex.io","logo":"G"}}],
               "users":[{{"id":"u1","name":"Ada","email":"ada@acme.io","role":"Admin","orgId":"o1"}},
                        {{"id":"u2","name":"Hank","email":"hank@globex.io","role":"Member","orgId":"o2"}}],
               "epics":[{{"id":"e1","name":"Site","description":"","status":"Planning","priority":"Low",
                         "ownerId":"u1","orgId":"o1","storyCount":1,"completedStoryCount":0}}],
               "stories":[{{"id":"s1","epicId":"e1","title":"Hero","assignedTo":"u2",
                           "status":"Todo","priority":"Low","points":3}}]}}"#
        )
        .unwrap();
        let config = Config {
            seed: Some(file.path().to_path_buf()),
            ..Config::default()
        };

        let report = diagnose(&config, no_env);
        assert!(!report.ok);
        let refs = find_check(&report.checks, "references").unwrap();
        assert!(matches!(refs.status, CheckStatus::Ok));
        let assignees = find_check(&report.checks, "stories.assignees").unwrap();
        assert!(matches!(assignees.status, CheckStatus::Error));
        let details = assignees.details.as_ref().unwrap();
        assert_eq!(details["stories"][0]["assignee_org"], "o2");
    }

    #[test]
    fn test_several_active_sprints_warn() {
        let mut snapshot = iterion_lib::seed::demo_snapshot();
        snapshot.sprints[3].status = SprintStatus::Active;
        let workspace = Workspace::from_snapshot(snapshot);
        let mut checks = Vec::new();
        check_sprints(&workspace, &mut checks);
        assert!(matches!(checks[0].status, CheckStatus::Warn));
        assert_eq!(
            checks[0].message.as_deref(),
            Some("2 active sprints; the board uses sp_27")
        );
    }
}
