//! Identity entity: a local user account bound to exactly one role.

use serde::{Deserialize, Serialize};

use vigil_core::{RoleId, UserId};

/// A local user account.
///
/// Authenticated either by local credential or by federated login. The
/// `credential_handle` is opaque to this subsystem: it is produced by the
/// excluded credential layer, and for federated identities it holds a
/// sentinel value that can never verify.
///
/// Identities are never hard-deleted; the role-deletion guard (not a cascade)
/// keeps `role_id` pointing at a live role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub login_name: String,
    pub credential_handle: String,
    pub role_id: RoleId,
}

impl Identity {
    pub fn new(
        login_name: impl Into<String>,
        credential_handle: impl Into<String>,
        role_id: RoleId,
    ) -> Self {
        Self {
            id: UserId::new(),
            login_name: login_name.into(),
            credential_handle: credential_handle.into(),
            role_id,
        }
    }

    /// Sentinel handle for federated identities. Never used for verification.
    pub fn federated_credential_handle(provider: &str) -> String {
        format!("federated:{provider}")
    }

    pub fn is_federated(&self) -> bool {
        self.credential_handle.starts_with("federated:")
    }
}
