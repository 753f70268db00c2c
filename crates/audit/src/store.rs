//! Persistence port for the audit trail.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use vigil_core::{Page, PageRequest, StoreError, UserId};

use crate::event::{AuditEvent, Outcome};

pub type StoreResult<T> = Result<T, StoreError>;

/// Append-only store of audit events plus the query surface over them.
///
/// Ordering is a contract: every multi-row read returns events ordered by
/// timestamp descending (most recent first). Consumers display "recent
/// activity" and must never have to re-sort. Timestamp, not persistence
/// order, is authoritative, because events cross an async boundary and may
/// be persisted out of wall-clock order.
pub trait AuditEventStore: Send + Sync {
    fn append(&self, event: AuditEvent) -> StoreResult<()>;

    fn page_all(&self, request: PageRequest) -> StoreResult<Page<AuditEvent>>;
    fn page_by_user(&self, user_id: UserId, request: PageRequest) -> StoreResult<Page<AuditEvent>>;
    fn page_by_action(&self, action: &str, request: PageRequest) -> StoreResult<Page<AuditEvent>>;
    fn page_by_outcome(
        &self,
        outcome: Outcome,
        request: PageRequest,
    ) -> StoreResult<Page<AuditEvent>>;

    /// Events with `start <= timestamp < end`, timestamp descending.
    fn find_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<AuditEvent>>;

    /// `(action, count)` pairs over the whole trail, unordered; the query
    /// layer owns the presentation ordering.
    fn count_by_action(&self) -> StoreResult<Vec<(String, u64)>>;

    /// Blocked events from `ip` with `timestamp > since`, timestamp
    /// descending.
    fn blocked_since(&self, ip: &str, since: DateTime<Utc>) -> StoreResult<Vec<AuditEvent>>;
}

impl<S: AuditEventStore + ?Sized> AuditEventStore for Arc<S> {
    fn append(&self, event: AuditEvent) -> StoreResult<()> {
        (**self).append(event)
    }
    fn page_all(&self, request: PageRequest) -> StoreResult<Page<AuditEvent>> {
        (**self).page_all(request)
    }
    fn page_by_user(&self, user_id: UserId, request: PageRequest) -> StoreResult<Page<AuditEvent>> {
        (**self).page_by_user(user_id, request)
    }
    fn page_by_action(&self, action: &str, request: PageRequest) -> StoreResult<Page<AuditEvent>> {
        (**self).page_by_action(action, request)
    }
    fn page_by_outcome(
        &self,
        outcome: Outcome,
        request: PageRequest,
    ) -> StoreResult<Page<AuditEvent>> {
        (**self).page_by_outcome(outcome, request)
    }
    fn find_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<AuditEvent>> {
        (**self).find_between(start, end)
    }
    fn count_by_action(&self) -> StoreResult<Vec<(String, u64)>> {
        (**self).count_by_action()
    }
    fn blocked_since(&self, ip: &str, since: DateTime<Utc>) -> StoreResult<Vec<AuditEvent>> {
        (**self).blocked_since(ip, since)
    }
}
