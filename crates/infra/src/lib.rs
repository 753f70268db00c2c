//! `vigil-infra` — concrete persistence collaborators.
//!
//! In-memory implementations of the store ports, intended for tests and
//! development. They make the contracts concrete: uniqueness is enforced
//! atomically under a write lock (the create-if-absent primitive), roles are
//! always returned with their full permission set, and audit reads come back
//! timestamp-descending.

pub mod memory;

#[cfg(test)]
mod integration_tests;

pub use memory::{MemoryAuditStore, MemoryIdentityStore, MemoryPermissionStore, MemoryRoleStore};
