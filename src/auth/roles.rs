use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of staff roles. Wire names are matched exactly (case-sensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Full access, including loan deletion.
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "manager")]
    Manager,
    #[serde(rename = "data-entry")]
    DataEntry,
    /// Read-only access plus the audit trail.
    #[serde(rename = "auditor")]
    Auditor,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::DataEntry, Role::Auditor];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::DataEntry => "data-entry",
            Role::Auditor => "auditor",
        }
    }

    /// Exact lookup. Anything else, including different casing, is `None`.
    pub fn from_wire(value: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.as_str() == value)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
