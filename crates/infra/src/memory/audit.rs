use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

use vigil_core::{Page, PageRequest, StoreError, UserId};

use vigil_audit::store::{AuditEventStore, StoreResult};
use vigil_audit::{AuditEvent, Outcome};

use super::poisoned;

/// In-memory append-only audit store.
///
/// Every multi-row read is ordered timestamp-descending, ties broken by
/// descending event id (UUIDv7, time-ordered) so pagination is deterministic.
///
/// `set_failing(true)` makes appends fail with a backend error, simulating an
/// unreachable store for recorder fail-open tests.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    inner: RwLock<Vec<AuditEvent>>,
    fail_appends: AtomicBool,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated append failures.
    pub fn set_failing(&self, failing: bool) {
        self.fail_appends.store(failing, Ordering::SeqCst);
    }

    fn sorted_filtered<F>(&self, keep: F) -> StoreResult<Vec<AuditEvent>>
    where
        F: Fn(&AuditEvent) -> bool,
    {
        let events = self.inner.read().map_err(|_| poisoned())?;
        let mut matched: Vec<AuditEvent> = events.iter().filter(|e| keep(e)).cloned().collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| b.id.cmp(&a.id)));
        Ok(matched)
    }
}

impl AuditEventStore for MemoryAuditStore {
    fn append(&self, event: AuditEvent) -> StoreResult<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("audit store unreachable".to_string()));
        }
        let mut events = self.inner.write().map_err(|_| poisoned())?;
        events.push(event);
        Ok(())
    }

    fn page_all(&self, request: PageRequest) -> StoreResult<Page<AuditEvent>> {
        Ok(Page::from_ordered(self.sorted_filtered(|_| true)?, request))
    }

    fn page_by_user(&self, user_id: UserId, request: PageRequest) -> StoreResult<Page<AuditEvent>> {
        Ok(Page::from_ordered(
            self.sorted_filtered(|e| e.user_id == user_id)?,
            request,
        ))
    }

    fn page_by_action(&self, action: &str, request: PageRequest) -> StoreResult<Page<AuditEvent>> {
        Ok(Page::from_ordered(
            self.sorted_filtered(|e| e.action == action)?,
            request,
        ))
    }

    fn page_by_outcome(
        &self,
        outcome: Outcome,
        request: PageRequest,
    ) -> StoreResult<Page<AuditEvent>> {
        Ok(Page::from_ordered(
            self.sorted_filtered(|e| e.outcome == outcome)?,
            request,
        ))
    }

    fn find_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<AuditEvent>> {
        self.sorted_filtered(|e| e.timestamp >= start && e.timestamp < end)
    }

    fn count_by_action(&self) -> StoreResult<Vec<(String, u64)>> {
        let events = self.inner.read().map_err(|_| poisoned())?;
        let mut counts: HashMap<String, u64> = HashMap::new();
        for event in events.iter() {
            *counts.entry(event.action.clone()).or_default() += 1;
        }
        Ok(counts.into_iter().collect())
    }

    fn blocked_since(&self, ip: &str, since: DateTime<Utc>) -> StoreResult<Vec<AuditEvent>> {
        self.sorted_filtered(|e| {
            e.outcome == Outcome::Blocked && e.source_ip == ip && e.timestamp > since
        })
    }
}
