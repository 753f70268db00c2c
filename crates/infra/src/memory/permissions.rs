use std::collections::HashMap;
use std::sync::RwLock;

use vigil_core::{PermissionId, StoreError};

use vigil_auth::Permission;
use vigil_auth::store::{PermissionStore, StoreResult};

use super::poisoned;

/// In-memory permission store. Name uniqueness is checked and the record
/// inserted under one write lock, which is the atomic check-then-write the
/// administration contract requires.
#[derive(Debug, Default)]
pub struct MemoryPermissionStore {
    inner: RwLock<HashMap<PermissionId, Permission>>,
}

impl MemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PermissionStore for MemoryPermissionStore {
    fn create(&self, permission: Permission) -> StoreResult<Permission> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.values().any(|p| p.name == permission.name) {
            return Err(StoreError::UniqueViolation(format!(
                "permission name '{}'",
                permission.name
            )));
        }
        map.insert(permission.id, permission.clone());
        Ok(permission)
    }

    fn find_by_id(&self, id: PermissionId) -> StoreResult<Permission> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        map.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    fn find_by_name(&self, name: &str) -> StoreResult<Option<Permission>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().find(|p| p.name == name).cloned())
    }

    fn find_all(&self) -> StoreResult<Vec<Permission>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut all: Vec<Permission> = map.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    fn update(&self, permission: Permission) -> StoreResult<Permission> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if !map.contains_key(&permission.id) {
            return Err(StoreError::NotFound);
        }
        if map
            .values()
            .any(|p| p.id != permission.id && p.name == permission.name)
        {
            return Err(StoreError::UniqueViolation(format!(
                "permission name '{}'",
                permission.name
            )));
        }
        map.insert(permission.id, permission.clone());
        Ok(permission)
    }

    fn delete(&self, id: PermissionId) -> StoreResult<()> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.remove(&id).map(|_| ()).ok_or(StoreError::NotFound)
    }

    fn exists_by_name(&self, name: &str) -> StoreResult<bool> {
        Ok(self.find_by_name(name)?.is_some())
    }
}
