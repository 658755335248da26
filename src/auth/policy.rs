//! Static role matrix and the permit/deny decision.
//!
//! Nothing here knows about HTTP. Handlers call [`authorize`] as their first
//! step and turn a [`Denied`] into a 403.

use serde::Serialize;

use super::roles::Role;
use super::verifier::Principal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Persons,
    Groups,
    Loans,
    Dashboard,
    AuditLog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

const EVERYONE: &[Role] = &[Role::Admin, Role::Manager, Role::DataEntry, Role::Auditor];
const EDITORS: &[Role] = &[Role::Admin, Role::Manager, Role::DataEntry];
const MANAGERS: &[Role] = &[Role::Admin, Role::Manager];
const ADMIN_ONLY: &[Role] = &[Role::Admin];
const AUDIT_READERS: &[Role] = &[Role::Admin, Role::Auditor];
const NOBODY: &[Role] = &[];

/// Roles permitted to perform `action` on `resource`.
pub fn allowed_roles(resource: Resource, action: Action) -> &'static [Role] {
    use Action::*;
    use Resource::*;

    match (resource, action) {
        (Persons | Groups, Read) => EVERYONE,
        (Persons | Groups, Create | Update) => EDITORS,
        (Persons | Groups, Delete) => MANAGERS,

        (Loans, Read) => EVERYONE,
        (Loans, Create | Update) => MANAGERS,
        (Loans, Delete) => ADMIN_ONLY,

        (Dashboard, Read) => EVERYONE,
        (AuditLog, Read) => AUDIT_READERS,

        // The dashboard is derived data and the audit log is append-only.
        (Dashboard | AuditLog, Create | Update | Delete) => NOBODY,
    }
}

/// A denial, carrying what the caller needs to see in the 403 body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Denied {
    pub required_roles: Vec<Role>,
    pub user_role: String,
}

pub fn authorize(principal: &Principal, allowed: &[Role]) -> Result<(), Denied> {
    match principal.known_role() {
        Some(role) if allowed.contains(&role) => Ok(()),
        _ => Err(Denied {
            required_roles: allowed.to_vec(),
            user_role: principal.role.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn principal(role: &str) -> Principal {
        Principal {
            subject: "tester".to_string(),
            role: role.to_string(),
            issued_at: Utc::now(),
            expires_at: Utc::now(),
        }
    }

    fn permits(role: Role, resource: Resource, action: Action) -> bool {
        authorize(&principal(role.as_str()), allowed_roles(resource, action)).is_ok()
    }

    #[test]
    fn person_and_group_matrix() {
        for resource in [Resource::Persons, Resource::Groups] {
            for role in Role::ALL {
                assert!(permits(role, resource, Action::Read));
            }
            assert!(permits(Role::DataEntry, resource, Action::Create));
            assert!(permits(Role::DataEntry, resource, Action::Update));
            assert!(!permits(Role::Auditor, resource, Action::Create));
            assert!(!permits(Role::Auditor, resource, Action::Update));

            assert!(permits(Role::Admin, resource, Action::Delete));
            assert!(permits(Role::Manager, resource, Action::Delete));
            assert!(!permits(Role::DataEntry, resource, Action::Delete));
            assert!(!permits(Role::Auditor, resource, Action::Delete));
        }
    }

    #[test]
    fn loan_matrix() {
        for role in Role::ALL {
            assert!(permits(role, Resource::Loans, Action::Read));
        }
        assert!(permits(Role::Manager, Resource::Loans, Action::Create));
        assert!(!permits(Role::DataEntry, Resource::Loans, Action::Create));
        assert!(!permits(Role::DataEntry, Resource::Loans, Action::Update));
        assert_eq!(allowed_roles(Resource::Loans, Action::Delete), &[Role::Admin]);
        assert!(!permits(Role::Manager, Resource::Loans, Action::Delete));
    }

    #[test]
    fn audit_log_is_read_only() {
        assert!(permits(Role::Auditor, Resource::AuditLog, Action::Read));
        assert!(!permits(Role::DataEntry, Resource::AuditLog, Action::Read));
        for action in [Action::Create, Action::Update, Action::Delete] {
            assert!(allowed_roles(Resource::AuditLog, action).is_empty());
            assert!(!permits(Role::Admin, Resource::AuditLog, action));
        }
    }

    #[test]
    fn denial_reports_allow_list_and_actual_role() {
        let denied = authorize(&principal("data-entry"), allowed_roles(Resource::Loans, Action::Delete))
            .unwrap_err();
        assert_eq!(denied.required_roles, vec![Role::Admin]);
        assert_eq!(denied.user_role, "data-entry");
    }

    #[test]
    fn unrecognized_role_is_an_ordinary_denial() {
        for raw in ["Admin", "root", ""] {
            let denied = authorize(&principal(raw), EVERYONE).unwrap_err();
            assert_eq!(denied.user_role, raw);
            assert_eq!(denied.required_roles.len(), 4);
        }
    }
}
