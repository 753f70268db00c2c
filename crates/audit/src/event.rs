//! Audit event model and the fixed action vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vigil_core::{AuditEventId, RequestContext, UserId};

/// Outcome of a recorded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Success,
    Failure,
    Blocked,
}

impl core::fmt::Display for Outcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Outcome::Success => write!(f, "SUCCESS"),
            Outcome::Failure => write!(f, "FAILURE"),
            Outcome::Blocked => write!(f, "BLOCKED"),
        }
    }
}

/// The fixed vocabulary of security action names.
///
/// Kept as constants (not an enum) because administration composes additional
/// action names from the same namespace; these are the ones the recorder's
/// convenience helpers pin down.
pub mod actions {
    pub const LOGIN_SUCCESS: &str = "LOGIN_SUCCESS";
    pub const FEDERATED_LOGIN: &str = "FEDERATED_LOGIN";
    pub const LOGIN_FAILED: &str = "LOGIN_FAILED";
    pub const LOGOUT: &str = "LOGOUT";
    pub const ACCESS_DENIED: &str = "ACCESS_DENIED";
    pub const ROLE_CHANGED: &str = "ROLE_CHANGED";
}

/// A security action awaiting recording, before the acting identity has been
/// resolved. This is what travels across the async boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditAction {
    pub actor_login: String,
    pub action: String,
    pub resource: String,
    pub context: RequestContext,
    pub outcome: Outcome,
    pub details: Option<String>,
    /// Set at enqueue time; persistence order is not authoritative, this is.
    pub timestamp: DateTime<Utc>,
}

/// An immutable, append-only record of a security-relevant action.
///
/// Always references a resolvable identity: actions whose actor cannot be
/// resolved are dropped before reaching the store, never written as orphans.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: AuditEventId,
    pub user_id: UserId,
    /// Actor login at recording time, denormalized for display.
    pub login_name: String,
    pub action: String,
    pub resource: String,
    pub timestamp: DateTime<Utc>,
    pub source_ip: String,
    pub user_agent: Option<String>,
    pub outcome: Outcome,
    pub details: Option<String>,
}

impl AuditEvent {
    /// Materialize a pending action into a persistable event for the
    /// resolved actor.
    pub fn from_action(action: AuditAction, user_id: UserId) -> Self {
        Self {
            id: AuditEventId::new(),
            user_id,
            login_name: action.actor_login,
            action: action.action,
            resource: action.resource,
            timestamp: action.timestamp,
            source_ip: action.context.source_ip,
            user_agent: action.context.user_agent,
            outcome: action.outcome,
            details: action.details,
        }
    }
}

impl core::fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[{}] {} {} {} ({})",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.login_name,
            self.action,
            self.outcome,
            self.resource
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_carry_the_enqueue_timestamp() {
        let action = AuditAction {
            actor_login: "ana".to_string(),
            action: actions::LOGOUT.to_string(),
            resource: "/logout".to_string(),
            context: RequestContext::new("10.0.0.1", None),
            outcome: Outcome::Success,
            details: None,
            timestamp: Utc::now(),
        };
        let enqueue_ts = action.timestamp;

        let event = AuditEvent::from_action(action, UserId::new());
        assert_eq!(event.timestamp, enqueue_ts);
        assert_eq!(event.login_name, "ana");
        assert_eq!(event.source_ip, "10.0.0.1");
    }

    #[test]
    fn outcome_serializes_screaming() {
        let json = serde_json::to_string(&Outcome::Blocked).unwrap();
        assert_eq!(json, "\"BLOCKED\"");
    }
}
