//! `vigil-admin` — dynamic role/permission administration.
//!
//! CRUD orchestration over the role and permission stores with invariant
//! enforcement (protected-entity guard, uniqueness, referential checks) and
//! audit emission for every outcome.

pub mod service;

pub use service::Administration;
