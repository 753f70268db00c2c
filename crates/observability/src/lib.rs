//! Tracing/logging setup shared by every embedding process.
//!
//! The subsystem's components emit structured `tracing` events for their
//! operational error channel (dropped audit events, worker lifecycle,
//! integrity observations); this crate wires the process-wide subscriber.

pub mod tracing;

/// Initialize process-wide observability (tracing/logging).
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}
