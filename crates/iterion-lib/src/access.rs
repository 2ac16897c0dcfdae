//! Role-based gating for user administration.
//!
//! These checks are advisory: they decide what a client offers to the
//! acting user. Anything exposed beyond a single trusted process must
//! re-validate authorization on the server side.

use crate::model::{Role, User};

/// Whether `actor` may edit or remove `target`.
///
/// SuperAdmins may modify anyone; Admins may modify Managers and Members;
/// everyone else may modify nobody.
#[must_use]
pub const fn can_modify_user(actor: &User, target: &User) -> bool {
    can_modify_role(actor.role, target.role)
}

/// Role-level form of [`can_modify_user`].
///
/// SuperAdmins may also modify each other; below that an actor needs a
/// strictly higher tier than the target.
#[must_use]
pub const fn can_modify_role(actor: Role, target: Role) -> bool {
    matches!(actor, Role::SuperAdmin) || actor.tier() > target.tier()
}

/// Roles `actor` may grant when inviting or editing users.
#[must_use]
pub const fn assignable_roles(actor: Role) -> &'static [Role] {
    match actor {
        Role::SuperAdmin => &Role::ALL,
        Role::Admin => &[Role::Manager, Role::Member],
        Role::Manager | Role::Member => &[],
    }
}

/// Whether `actor` may grant `role`.
#[must_use]
pub fn can_assign_role(actor: Role, role: Role) -> bool {
    assignable_roles(actor).contains(&role)
}

/// Only SuperAdmins manage tenants.
#[must_use]
pub const fn can_manage_orgs(actor: Role) -> bool {
    matches!(actor, Role::SuperAdmin)
}
