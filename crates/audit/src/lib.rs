//! `vigil-audit` — durable recording of security-relevant events.
//!
//! The recorder is the only component in the subsystem with an explicit
//! asynchronous boundary: callers enqueue and return immediately, a worker
//! thread persists. Audit failures never degrade primary functionality
//! (fail-open on audit, fail-closed on authorization).

pub mod event;
pub mod recorder;
pub mod store;
pub mod trail;

pub use event::{AuditAction, AuditEvent, Outcome};
pub use recorder::{AuditRecorder, RecorderHandle};
pub use store::AuditEventStore;
pub use trail::{ActionCount, AuditTrail};
