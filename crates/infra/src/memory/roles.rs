use std::collections::HashMap;
use std::sync::RwLock;

use vigil_core::{RoleId, StoreError};

use vigil_auth::Role;
use vigil_auth::store::{RoleStore, StoreResult};

use super::poisoned;

/// In-memory role store. Roles are stored whole, permission set included, so
/// every read returns a fully materialized role (no fetch-on-access).
#[derive(Debug, Default)]
pub struct MemoryRoleStore {
    inner: RwLock<HashMap<RoleId, Role>>,
}

impl MemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoleStore for MemoryRoleStore {
    fn create(&self, role: Role) -> StoreResult<Role> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.values().any(|r| r.name == role.name) {
            return Err(StoreError::UniqueViolation(format!(
                "role name '{}'",
                role.name
            )));
        }
        map.insert(role.id, role.clone());
        Ok(role)
    }

    fn find_by_id(&self, id: RoleId) -> StoreResult<Role> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        map.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    fn find_by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().find(|r| r.name == name).cloned())
    }

    fn find_all(&self) -> StoreResult<Vec<Role>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut all: Vec<Role> = map.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    fn update(&self, role: Role) -> StoreResult<Role> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if !map.contains_key(&role.id) {
            return Err(StoreError::NotFound);
        }
        if map.values().any(|r| r.id != role.id && r.name == role.name) {
            return Err(StoreError::UniqueViolation(format!(
                "role name '{}'",
                role.name
            )));
        }
        map.insert(role.id, role.clone());
        Ok(role)
    }

    fn delete(&self, id: RoleId) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }

    fn exists_by_name(&self, name: &str) -> StoreResult<bool> {
        Ok(self.find_by_name(name)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_auth::Permission;

    #[test]
    fn roles_round_trip_with_their_permission_set() {
        let store = MemoryRoleStore::new();
        let mut role = Role::new("Auditor");
        role.permissions.push(Permission::new("read"));
        store.create(role.clone()).unwrap();

        let loaded = store.find_by_id(role.id).unwrap();
        assert_eq!(loaded.permissions.len(), 1);
        assert_eq!(loaded.permissions[0].name, "READ");
    }

    #[test]
    fn duplicate_role_names_are_rejected() {
        let store = MemoryRoleStore::new();
        store.create(Role::new("Auditor")).unwrap();
        assert!(matches!(
            store.create(Role::new("Auditor")).unwrap_err(),
            StoreError::UniqueViolation(_)
        ));
    }
}
