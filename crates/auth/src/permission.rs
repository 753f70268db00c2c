//! Permission entity: an atomic named capability.

use serde::{Deserialize, Serialize};

use vigil_core::PermissionId;

/// Permission names that belong to the system and can never be deleted.
pub const PROTECTED_PERMISSION_NAMES: [&str; 6] = [
    "READ",
    "EDIT",
    "APPROVE",
    "DECIDE",
    "CONTROL",
    "FULL_MANAGEMENT",
];

/// Canonical form of a permission name: upper-cased, spaces collapsed to
/// underscores. All lookups and uniqueness checks operate on this form.
pub fn canonical_permission_name(raw: &str) -> String {
    raw.trim().to_uppercase().replace(' ', "_")
}

/// An atomic named capability.
///
/// Created, renamed and deleted only through administration; deletion cascades
/// by removing the permission from every role that holds it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub name: String,
}

impl Permission {
    /// Build a permission with a canonicalized name and a fresh id.
    pub fn new(name: &str) -> Self {
        Self {
            id: PermissionId::new(),
            name: canonical_permission_name(name),
        }
    }

    pub fn is_protected(&self) -> bool {
        PROTECTED_PERMISSION_NAMES.contains(&self.name.as_str())
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_canonicalized_on_construction() {
        let perm = Permission::new("  export reports ");
        assert_eq!(perm.name, "EXPORT_REPORTS");
    }

    #[test]
    fn system_permissions_are_protected() {
        assert!(Permission::new("read").is_protected());
        assert!(Permission::new("full management").is_protected());
        assert!(!Permission::new("EXPORT").is_protected());
    }
}
