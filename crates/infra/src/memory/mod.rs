//! In-memory store implementations (tests/dev). Not optimized for
//! performance.

mod audit;
mod identities;
mod permissions;
mod roles;

pub use audit::MemoryAuditStore;
pub use identities::MemoryIdentityStore;
pub use permissions::MemoryPermissionStore;
pub use roles::MemoryRoleStore;

use vigil_core::StoreError;

pub(crate) fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}
