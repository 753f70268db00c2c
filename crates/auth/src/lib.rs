//! `vigil-auth` — identities, roles, permissions and the decision logic over
//! them.
//!
//! This crate is intentionally decoupled from HTTP and storage engines: it
//! defines the persistence ports it needs and consumes already-normalized
//! request data. Credential verification lives outside (the core only sees
//! its boolean outcome), and so does everything that renders a response.

pub mod authorize;
pub mod identity;
pub mod permission;
pub mod provision;
pub mod role;
pub mod store;

pub use authorize::{AuthorizationEngine, AuthorizationResult, RoleTier};
pub use identity::Identity;
pub use permission::{PROTECTED_PERMISSION_NAMES, Permission, canonical_permission_name};
pub use provision::{
    DEFAULT_FEDERATED_ROLE, FederatedClaims, Provisioner, RoleChange, derive_login_name,
};
pub use role::{PROTECTED_ROLE_NAMES, Role};
pub use store::{IdentityStore, PermissionStore, RoleStore};
