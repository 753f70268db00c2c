//! Role entity: a named bundle of permissions.

use serde::{Deserialize, Serialize};

use vigil_core::{PermissionId, RoleId};

use crate::permission::Permission;

/// Role names that belong to the system. Protection is derived from this set,
/// never stored, so it cannot be bypassed by editing a record.
pub const PROTECTED_ROLE_NAMES: [&str; 6] = [
    "System Administrator",
    "Director",
    "Manager",
    "Area Lead",
    "Supervisor",
    "Staff",
];

/// A named bundle of permissions; the unit of authorization assignment.
///
/// # Invariants
/// - The permission set contains only permissions that exist in the
///   permission store (administration enforces this on every mutation).
/// - The set is always fully materialized: any store that returns a `Role`
///   returns it with its permissions loaded. Nothing in the core relies on
///   fetch-on-access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub permissions: Vec<Permission>,
}

impl Role {
    /// Build an empty role with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
            permissions: Vec::new(),
        }
    }

    /// Whether this role is part of the fixed system set.
    pub fn is_protected(&self) -> bool {
        PROTECTED_ROLE_NAMES.contains(&self.name.as_str())
    }

    /// Canonical permission names, sorted for deterministic output.
    pub fn permission_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.permissions.iter().map(|p| p.name.clone()).collect();
        names.sort();
        names
    }

    /// Case-sensitive exact membership test on canonical permission names.
    pub fn has_permission(&self, name: &str) -> bool {
        self.permissions.iter().any(|p| p.name == name)
    }

    pub fn holds_permission_id(&self, id: PermissionId) -> bool {
        self.permissions.iter().any(|p| p.id == id)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protection_is_derived_from_the_name() {
        assert!(Role::new("Staff").is_protected());
        assert!(Role::new("Director").is_protected());
        assert!(!Role::new("Auditor").is_protected());
    }

    #[test]
    fn permission_names_are_sorted() {
        let mut role = Role::new("Auditor");
        role.permissions.push(Permission::new("edit"));
        role.permissions.push(Permission::new("approve"));
        role.permissions.push(Permission::new("read"));
        assert_eq!(role.permission_names(), vec!["APPROVE", "EDIT", "READ"]);
    }

    #[test]
    fn membership_test_is_case_sensitive() {
        let mut role = Role::new("Auditor");
        role.permissions.push(Permission::new("read"));
        assert!(role.has_permission("READ"));
        assert!(!role.has_permission("read"));
    }
}
