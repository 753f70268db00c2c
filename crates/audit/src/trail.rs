//! Read-side queries over the audit trail.
//!
//! All paged results are ordered by timestamp descending; consumers display
//! recent activity first and must be able to rely on that without re-sorting.

use chrono::{DateTime, Duration, Local, NaiveTime, Utc};
use serde::Serialize;

use vigil_core::{Page, PageRequest, Result};

use vigil_auth::store::IdentityStore;

use crate::event::{AuditEvent, Outcome};
use crate::store::AuditEventStore;

/// Count of events for one action name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionCount {
    pub action: String,
    pub count: u64,
}

/// Filtered/paged query surface over the recorded trail.
#[derive(Debug, Clone)]
pub struct AuditTrail<I, E> {
    identities: I,
    events: E,
}

impl<I: IdentityStore, E: AuditEventStore> AuditTrail<I, E> {
    pub fn new(identities: I, events: E) -> Self {
        Self { identities, events }
    }

    /// All events, most recent first.
    pub fn find_all(&self, page: usize, size: usize) -> Result<Page<AuditEvent>> {
        Ok(self.events.page_all(PageRequest::new(page, size))?)
    }

    /// Events recorded for one actor. An unknown login yields an empty page,
    /// not an error: the trail answers "what did this name do", and the
    /// answer for a name that never existed is "nothing".
    pub fn find_by_actor(
        &self,
        login_name: &str,
        page: usize,
        size: usize,
    ) -> Result<Page<AuditEvent>> {
        let request = PageRequest::new(page, size);
        match self.identities.find_by_login(login_name)? {
            Some(identity) => Ok(self.events.page_by_user(identity.id, request)?),
            None => Ok(Page::empty(request)),
        }
    }

    pub fn find_by_action(&self, action: &str, page: usize, size: usize) -> Result<Page<AuditEvent>> {
        Ok(self.events.page_by_action(action, PageRequest::new(page, size))?)
    }

    pub fn find_by_outcome(
        &self,
        outcome: Outcome,
        page: usize,
        size: usize,
    ) -> Result<Page<AuditEvent>> {
        Ok(self.events.page_by_outcome(outcome, PageRequest::new(page, size))?)
    }

    /// Events whose timestamp falls on the current calendar day in the
    /// server's reference (local) time zone.
    pub fn find_today(&self) -> Result<Vec<AuditEvent>> {
        let now = Local::now();
        // Zones that skip midnight on a DST transition have no instant for
        // the wall-clock date start; fall back to a trailing 24h window.
        let start: DateTime<Utc> = now
            .with_time(NaiveTime::MIN)
            .earliest()
            .map(|s| s.with_timezone(&Utc))
            .unwrap_or_else(|| now.with_timezone(&Utc) - Duration::hours(24));
        let end = start + Duration::days(1);
        Ok(self.events.find_between(start, end)?)
    }

    /// Event counts grouped by action, descending by count; ties broken by
    /// action name ascending so the output is deterministic.
    pub fn aggregate_by_action(&self) -> Result<Vec<ActionCount>> {
        let mut counts: Vec<ActionCount> = self
            .events
            .count_by_action()?
            .into_iter()
            .map(|(action, count)| ActionCount { action, count })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.action.cmp(&b.action)));
        Ok(counts)
    }

    /// Blocked attempts from one source IP inside a trailing window,
    /// the lightweight brute-force lookup.
    pub fn find_blocked_attempts(
        &self,
        source_ip: &str,
        since_minutes: i64,
    ) -> Result<Vec<AuditEvent>> {
        let since = Utc::now() - Duration::minutes(since_minutes);
        Ok(self.events.blocked_since(source_ip, since)?)
    }
}
