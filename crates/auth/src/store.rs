//! Persistence ports for permissions, roles and identities.
//!
//! Plain CRUD collaborators: no business rules live here, all policy sits in
//! the engine and in administration. Implementations must guarantee that
//! read-then-write sequences issued by a single call are atomic with respect
//! to concurrent callers (uniqueness checks must not interleave with inserts
//! for the same name), and that every returned `Role` carries its full
//! permission set. Atomicity is per call: a sequence of calls spanning
//! several stores is not a transaction, and the services that issue such
//! sequences order them so a mid-sequence failure never leaves a dangling
//! reference observable.

use std::sync::Arc;

use vigil_core::{PermissionId, RoleId, StoreError, UserId};

use crate::{Identity, Permission, Role};

pub type StoreResult<T> = Result<T, StoreError>;

/// CRUD over atomic capability names.
pub trait PermissionStore: Send + Sync {
    /// Persist a new permission. Duplicate canonical names must be rejected
    /// with [`StoreError::UniqueViolation`].
    fn create(&self, permission: Permission) -> StoreResult<Permission>;
    fn find_by_id(&self, id: PermissionId) -> StoreResult<Permission>;
    fn find_by_name(&self, name: &str) -> StoreResult<Option<Permission>>;
    fn find_all(&self) -> StoreResult<Vec<Permission>>;
    fn update(&self, permission: Permission) -> StoreResult<Permission>;
    fn delete(&self, id: PermissionId) -> StoreResult<()>;
    fn exists_by_name(&self, name: &str) -> StoreResult<bool>;
}

/// CRUD over named roles. Every returned role has its permissions loaded.
pub trait RoleStore: Send + Sync {
    fn create(&self, role: Role) -> StoreResult<Role>;
    fn find_by_id(&self, id: RoleId) -> StoreResult<Role>;
    fn find_by_name(&self, name: &str) -> StoreResult<Option<Role>>;
    fn find_all(&self) -> StoreResult<Vec<Role>>;
    fn update(&self, role: Role) -> StoreResult<Role>;
    fn delete(&self, id: RoleId) -> StoreResult<()>;
    fn exists_by_name(&self, name: &str) -> StoreResult<bool>;
}

/// CRUD over local identities.
///
/// There is deliberately no delete: identities are never hard-deleted in this
/// subsystem.
pub trait IdentityStore: Send + Sync {
    /// Atomic create-if-absent keyed on `login_name`.
    ///
    /// Two concurrent creates for the same login must resolve to exactly one
    /// stored identity; the loser observes [`StoreError::UniqueViolation`].
    fn create(&self, identity: Identity) -> StoreResult<Identity>;
    fn find_by_id(&self, id: UserId) -> StoreResult<Identity>;
    fn find_by_login(&self, login_name: &str) -> StoreResult<Option<Identity>>;
    fn find_all(&self) -> StoreResult<Vec<Identity>>;
    fn update(&self, identity: Identity) -> StoreResult<Identity>;
    fn find_all_by_role(&self, role_id: RoleId) -> StoreResult<Vec<Identity>>;
    fn count_by_role(&self, role_id: RoleId) -> StoreResult<usize>;
    fn exists_by_login(&self, login_name: &str) -> StoreResult<bool>;
}

impl<S: PermissionStore + ?Sized> PermissionStore for Arc<S> {
    fn create(&self, permission: Permission) -> StoreResult<Permission> {
        (**self).create(permission)
    }
    fn find_by_id(&self, id: PermissionId) -> StoreResult<Permission> {
        (**self).find_by_id(id)
    }
    fn find_by_name(&self, name: &str) -> StoreResult<Option<Permission>> {
        (**self).find_by_name(name)
    }
    fn find_all(&self) -> StoreResult<Vec<Permission>> {
        (**self).find_all()
    }
    fn update(&self, permission: Permission) -> StoreResult<Permission> {
        (**self).update(permission)
    }
    fn delete(&self, id: PermissionId) -> StoreResult<()> {
        (**self).delete(id)
    }
    fn exists_by_name(&self, name: &str) -> StoreResult<bool> {
        (**self).exists_by_name(name)
    }
}

impl<S: RoleStore + ?Sized> RoleStore for Arc<S> {
    fn create(&self, role: Role) -> StoreResult<Role> {
        (**self).create(role)
    }
    fn find_by_id(&self, id: RoleId) -> StoreResult<Role> {
        (**self).find_by_id(id)
    }
    fn find_by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        (**self).find_by_name(name)
    }
    fn find_all(&self) -> StoreResult<Vec<Role>> {
        (**self).find_all()
    }
    fn update(&self, role: Role) -> StoreResult<Role> {
        (**self).update(role)
    }
    fn delete(&self, id: RoleId) -> StoreResult<()> {
        (**self).delete(id)
    }
    fn exists_by_name(&self, name: &str) -> StoreResult<bool> {
        (**self).exists_by_name(name)
    }
}

impl<S: IdentityStore + ?Sized> IdentityStore for Arc<S> {
    fn create(&self, identity: Identity) -> StoreResult<Identity> {
        (**self).create(identity)
    }
    fn find_by_id(&self, id: UserId) -> StoreResult<Identity> {
        (**self).find_by_id(id)
    }
    fn find_by_login(&self, login_name: &str) -> StoreResult<Option<Identity>> {
        (**self).find_by_login(login_name)
    }
    fn find_all(&self) -> StoreResult<Vec<Identity>> {
        (**self).find_all()
    }
    fn update(&self, identity: Identity) -> StoreResult<Identity> {
        (**self).update(identity)
    }
    fn find_all_by_role(&self, role_id: RoleId) -> StoreResult<Vec<Identity>> {
        (**self).find_all_by_role(role_id)
    }
    fn count_by_role(&self, role_id: RoleId) -> StoreResult<usize> {
        (**self).count_by_role(role_id)
    }
    fn exists_by_login(&self, login_name: &str) -> StoreResult<bool> {
        (**self).exists_by_login(login_name)
    }
}
