use std::collections::HashMap;
use std::sync::RwLock;

use vigil_core::{RoleId, StoreError, UserId};

use vigil_auth::Identity;
use vigil_auth::store::{IdentityStore, StoreResult};

use super::poisoned;

/// In-memory identity store.
///
/// `create` checks login-name uniqueness and inserts under one write lock:
/// the atomic create-if-absent primitive the provisioning race relies on.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    inner: RwLock<HashMap<UserId, Identity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for MemoryIdentityStore {
    fn create(&self, identity: Identity) -> StoreResult<Identity> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.values().any(|i| i.login_name == identity.login_name) {
            return Err(StoreError::UniqueViolation(format!(
                "login name '{}'",
                identity.login_name
            )));
        }
        map.insert(identity.id, identity.clone());
        Ok(identity)
    }

    fn find_by_id(&self, id: UserId) -> StoreResult<Identity> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        map.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    fn find_by_login(&self, login_name: &str) -> StoreResult<Option<Identity>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().find(|i| i.login_name == login_name).cloned())
    }

    fn find_all(&self) -> StoreResult<Vec<Identity>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut all: Vec<Identity> = map.values().cloned().collect();
        all.sort_by(|a, b| a.login_name.cmp(&b.login_name));
        Ok(all)
    }

    fn update(&self, identity: Identity) -> StoreResult<Identity> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if !map.contains_key(&identity.id) {
            return Err(StoreError::NotFound);
        }
        if map
            .values()
            .any(|i| i.id != identity.id && i.login_name == identity.login_name)
        {
            return Err(StoreError::UniqueViolation(format!(
                "login name '{}'",
                identity.login_name
            )));
        }
        map.insert(identity.id, identity.clone());
        Ok(identity)
    }

    fn find_all_by_role(&self, role_id: RoleId) -> StoreResult<Vec<Identity>> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map
            .values()
            .filter(|i| i.role_id == role_id)
            .cloned()
            .collect())
    }

    fn count_by_role(&self, role_id: RoleId) -> StoreResult<usize> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().filter(|i| i.role_id == role_id).count())
    }

    fn exists_by_login(&self, login_name: &str) -> StoreResult<bool> {
        Ok(self.find_by_login(login_name)?.is_some())
    }
}
