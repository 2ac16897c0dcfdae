//! Team command implementation.

use std::fmt::Write as _;

use anyhow::Result;

use iterion_lib::IterionError;
use iterion_lib::access::{assignable_roles, can_modify_user};
use iterion_lib::model::{Role, User};

use super::resolve_user_ref;
use crate::cli::{Session, TeamArgs};
use crate::format::{TeamMember, TeamOutput, column_width, pad_right};

/// Execute the team command.
///
/// # Errors
///
/// Returns an error if `--as` names an unknown user or JSON serialization
/// fails.
pub fn execute(args: &TeamArgs, session: &Session, json: bool) -> Result<()> {
    let scope = session.scope();

    // The acting user may live in another org (a SuperAdmin looking in).
    let actor = match args.as_user {
        Some(ref value) => {
            let id = resolve_user_ref(&scope, value);
            let user = session
                .workspace
                .get_user(&id)
                .ok_or(IterionError::UserNotFound { id })?;
            Some(user)
        }
        None => None,
    };

    let members: Vec<TeamMember<'_>> = scope
        .users
        .iter()
        .map(|user| TeamMember {
            user,
            can_modify: actor.map(|a| can_modify_user(a, user)),
        })
        .collect();

    if json {
        let output = TeamOutput {
            org: (&session.org).into(),
            members,
            acting_as: actor.map(|a| a.id.as_str()),
            assignable_roles: actor.map(|a| assignable_roles(a.role)),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if members.is_empty() {
        println!("No members in {}.", session.org.name);
    } else {
        print!("{}", render(&members, actor));
    }
    Ok(())
}

fn render(members: &[TeamMember<'_>], actor: Option<&User>) -> String {
    let name_width = column_width(members.iter().map(|m| m.user.name.as_str()));
    let mut out = String::new();
    for member in members {
        let marker = match member.can_modify {
            Some(true) => "✎ ",
            Some(false) => "  ",
            None => "",
        };
        let _ = writeln!(
            out,
            "{marker}{} {}  {}  {}",
            member.user.id,
            pad_right(&member.user.name, name_width),
            pad_right(member.user.role.as_str(), 10),
            member.user.email
        );
    }
    let _ = writeln!(out, "\n{} member(s)", members.len());

    if let Some(actor) = actor {
        let roles = assignable_roles(actor.role);
        let _ = writeln!(
            out,
            "{} ({}) can assign: {}",
            actor.name,
            actor.role,
            if roles.is_empty() {
                "no roles".to_string()
            } else {
                roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", ")
            }
        );
    }
    out
}
