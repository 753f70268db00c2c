//! `vigil-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, the error taxonomy, paging types, and the
//! normalized request context consumed from the HTTP layer.

pub mod context;
pub mod error;
pub mod id;
pub mod page;

pub use context::{ConnectionInfo, RequestContext};
pub use error::{Error, Result, StoreError};
pub use id::{AuditEventId, PermissionId, RoleId, UserId};
pub use page::{Page, PageRequest};
