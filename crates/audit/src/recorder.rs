//! Asynchronous, non-blocking audit recording.
//!
//! `record` hands the event to a worker thread over an mpsc channel and
//! returns immediately. The worker resolves the acting identity at write
//! time, not at enqueue time, so identities created moments earlier (a
//! freshly provisioned federated login, say) still resolve. Persistence
//! failures are absorbed and logged; they never reach the caller's control
//! flow, because a failed audit write must not fail a login.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use vigil_core::{RequestContext, StoreError};

use vigil_auth::store::IdentityStore;

use crate::event::{AuditAction, AuditEvent, Outcome, actions};
use crate::store::AuditEventStore;

/// Cloneable enqueue handle. Every call returns immediately and never errors.
#[derive(Debug, Clone)]
pub struct AuditRecorder {
    tx: mpsc::Sender<AuditAction>,
}

/// Handle to control and join the recorder worker.
#[derive(Debug)]
pub struct RecorderHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl RecorderHandle {
    /// Request graceful shutdown and wait for the worker to stop.
    ///
    /// Already-enqueued events are drained and persisted before this returns,
    /// so tests (and orderly process exits) observe a complete trail.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

impl AuditRecorder {
    /// Spawn the recorder worker over the given collaborators.
    pub fn spawn<I, E>(identities: I, events: E) -> (Self, RecorderHandle)
    where
        I: IdentityStore + 'static,
        E: AuditEventStore + 'static,
    {
        let (tx, rx) = mpsc::channel::<AuditAction>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = thread::Builder::new()
            .name("audit-recorder".to_string())
            .spawn(move || worker_loop(rx, shutdown_rx, &identities, &events))
            .expect("failed to spawn audit recorder thread");

        (
            Self { tx },
            RecorderHandle {
                shutdown: shutdown_tx,
                join: Some(join),
            },
        )
    }

    /// Enqueue a security event for asynchronous persistence.
    ///
    /// Never blocks and never surfaces an error; a dead worker is an
    /// operational condition, logged and swallowed.
    pub fn record(
        &self,
        actor_login: &str,
        action: &str,
        resource: &str,
        context: &RequestContext,
        outcome: Outcome,
        details: Option<String>,
    ) {
        let pending = AuditAction {
            actor_login: actor_login.to_string(),
            action: action.to_string(),
            resource: resource.to_string(),
            context: context.clone(),
            outcome,
            details,
            timestamp: Utc::now(),
        };

        if self.tx.send(pending).is_err() {
            warn!(
                actor = actor_login,
                action, "audit recorder worker is gone; event discarded"
            );
        }
    }

    /// [`Self::record`] with the outcome defaulted to success.
    pub fn record_success(
        &self,
        actor_login: &str,
        action: &str,
        resource: &str,
        context: &RequestContext,
        details: Option<String>,
    ) {
        self.record(actor_login, action, resource, context, Outcome::Success, details);
    }

    pub fn login_success(&self, actor_login: &str, context: &RequestContext) {
        self.record_success(
            actor_login,
            actions::LOGIN_SUCCESS,
            "/login",
            context,
            Some("Credentials verified".to_string()),
        );
    }

    pub fn federated_login_success(
        &self,
        actor_login: &str,
        provider: &str,
        context: &RequestContext,
    ) {
        self.record_success(
            actor_login,
            actions::FEDERATED_LOGIN,
            &format!("/oauth2/{provider}"),
            context,
            Some(format!("Federated authentication via {provider}")),
        );
    }

    pub fn login_failure(&self, actor_login: &str, reason: &str, context: &RequestContext) {
        self.record(
            actor_login,
            actions::LOGIN_FAILED,
            "/login",
            context,
            Outcome::Failure,
            Some(format!("Reason: {reason}")),
        );
    }

    pub fn logout(&self, actor_login: &str, context: &RequestContext) {
        self.record_success(
            actor_login,
            actions::LOGOUT,
            "/logout",
            context,
            Some("Session closed".to_string()),
        );
    }

    pub fn access_denied(&self, actor_login: &str, resource: &str, context: &RequestContext) {
        self.record(
            actor_login,
            actions::ACCESS_DENIED,
            resource,
            context,
            Outcome::Blocked,
            Some("Insufficient permissions".to_string()),
        );
    }

    pub fn role_changed(
        &self,
        admin_login: &str,
        subject_login: &str,
        previous_role: &str,
        new_role: &str,
        context: &RequestContext,
    ) {
        self.record_success(
            admin_login,
            actions::ROLE_CHANGED,
            "/admin/roles",
            context,
            Some(format!(
                "User '{subject_login}' changed from '{previous_role}' to '{new_role}'"
            )),
        );
    }
}

fn worker_loop<I, E>(
    rx: mpsc::Receiver<AuditAction>,
    shutdown_rx: mpsc::Receiver<()>,
    identities: &I,
    events: &E,
) where
    I: IdentityStore,
    E: AuditEventStore,
{
    let tick = Duration::from_millis(100);

    loop {
        if shutdown_rx.try_recv().is_ok() {
            // Drain whatever is already enqueued, then stop.
            while let Ok(action) = rx.try_recv() {
                persist(action, identities, events);
            }
            debug!("audit recorder stopped");
            break;
        }

        match rx.recv_timeout(tick) {
            Ok(action) => persist(action, identities, events),
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Resolve the actor and append; every failure path ends in a log line, never
/// a propagated error.
fn persist<I, E>(action: AuditAction, identities: &I, events: &E)
where
    I: IdentityStore,
    E: AuditEventStore,
{
    let identity = match identities.find_by_login(&action.actor_login) {
        Ok(Some(identity)) => identity,
        Ok(None) => {
            warn!(
                actor = %action.actor_login,
                action = %action.action,
                "audit event dropped: acting identity not found"
            );
            return;
        }
        Err(e) => {
            warn!(
                actor = %action.actor_login,
                error = %e,
                "audit event dropped: identity lookup failed"
            );
            return;
        }
    };

    let event = AuditEvent::from_action(action, identity.id);
    match events.append(event) {
        Ok(()) => {}
        Err(StoreError::Backend(msg)) => {
            warn!(error = %msg, "audit event lost: store append failed");
        }
        Err(e) => {
            warn!(error = %e, "audit event lost: store rejected append");
        }
    }
}
