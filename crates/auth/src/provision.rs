//! Identity provisioning: local registration and the federated
//! find-or-create path.
//!
//! Provisioning is deliberately side-effect-minimal: it creates or resolves
//! identities and nothing else. Audit emission for login outcomes is the
//! authentication flow's job, which keeps this module independently testable.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use vigil_core::{Error, Result, RoleId, StoreError, UserId};

use crate::store::{IdentityStore, RoleStore};
use crate::{Identity, Role};

/// Role assigned to first-seen federated identities. A deployment
/// precondition: if it is missing, provisioning fails with a configuration
/// error rather than inventing a role.
pub const DEFAULT_FEDERATED_ROLE: &str = "Staff";

/// Providers whose email claim is stable and verified; their identities are
/// keyed by the bare email. Everything else gets a provider-prefixed handle
/// so it cannot collide with the email-keyed namespace.
const VERIFIED_EMAIL_PROVIDERS: [&str; 1] = ["google"];

/// Claims bundle received from an external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederatedClaims {
    pub provider: String,
    pub attributes: HashMap<String, String>,
}

impl FederatedClaims {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Derive the canonical local login name for a federated claims bundle.
///
/// Pure and deterministic: identical claims always yield the identical login
/// name, across processes and time, so a repeat login resolves to the same
/// identity.
///
/// Providers in the verified-email set use the bare email; all others use
/// `"<provider>_<handle>"` with the `login` claim, falling back to `email`.
pub fn derive_login_name(claims: &FederatedClaims) -> Result<String> {
    let email = claims.attribute("email");
    let handle = claims.attribute("login");

    if VERIFIED_EMAIL_PROVIDERS.contains(&claims.provider.as_str()) {
        if let Some(email) = email {
            return Ok(email.to_string());
        }
    }

    let handle = handle.or(email).ok_or_else(|| {
        Error::validation(format!(
            "claims from provider '{}' carry neither an email nor a login handle",
            claims.provider
        ))
    })?;

    Ok(format!("{}_{}", claims.provider, handle))
}

/// Result of an administrative role re-assignment, carried back so the caller
/// can audit the change with both role names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleChange {
    pub login_name: String,
    pub previous_role: String,
    pub new_role: String,
}

/// Registration and federated find-or-create over the identity store.
#[derive(Debug, Clone)]
pub struct Provisioner<I, R> {
    identities: I,
    roles: R,
}

impl<I: IdentityStore, R: RoleStore> Provisioner<I, R> {
    pub fn new(identities: I, roles: R) -> Self {
        Self { identities, roles }
    }

    /// Register a local identity. Duplicate login names are a conflict.
    pub fn register(
        &self,
        login_name: &str,
        credential_handle: &str,
        role_id: RoleId,
    ) -> Result<Identity> {
        if login_name.trim().is_empty() {
            return Err(Error::validation("login name cannot be empty"));
        }
        // The role must exist before an identity can point at it.
        self.roles.find_by_id(role_id)?;

        let identity = Identity::new(login_name, credential_handle, role_id);
        match self.identities.create(identity) {
            Ok(created) => Ok(created),
            Err(StoreError::UniqueViolation(_)) => Err(Error::conflict(format!(
                "login name '{login_name}' is already taken"
            ))),
            Err(e) => Err(e.into()),
        }
    }

    /// Find-or-create the local identity for a federated login.
    ///
    /// A repeat login returns the existing identity unchanged; there is no
    /// silent role promotion or demotion here. Two near-simultaneous first
    /// logins resolve through the store's uniqueness constraint: the losing
    /// create re-reads exactly once before giving up with a conflict.
    pub fn provision(&self, claims: &FederatedClaims) -> Result<Identity> {
        let login_name = derive_login_name(claims)?;

        if let Some(existing) = self.identities.find_by_login(&login_name)? {
            return Ok(existing);
        }

        let default_role = self.default_role()?;
        let identity = Identity::new(
            &login_name,
            Identity::federated_credential_handle(&claims.provider),
            default_role.id,
        );

        match self.identities.create(identity) {
            Ok(created) => Ok(created),
            Err(StoreError::UniqueViolation(_)) => {
                // Someone else provisioned this identity between our read and
                // our write; the re-read must find it.
                self.identities
                    .find_by_login(&login_name)?
                    .ok_or_else(|| {
                        Error::conflict(format!(
                            "identity '{login_name}' vanished after a concurrent create"
                        ))
                    })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Re-bind an identity to a different role (admin-only operation at the
    /// caller). Returns the previous and new role names for auditing.
    pub fn reassign_role(&self, user_id: UserId, new_role_id: RoleId) -> Result<RoleChange> {
        let mut identity = self.identities.find_by_id(user_id)?;
        let previous_role = self.roles.find_by_id(identity.role_id)?;
        let new_role = self.roles.find_by_id(new_role_id)?;

        identity.role_id = new_role.id;
        let updated = self.identities.update(identity)?;

        Ok(RoleChange {
            login_name: updated.login_name,
            previous_role: previous_role.name,
            new_role: new_role.name,
        })
    }

    fn default_role(&self) -> Result<Role> {
        self.roles
            .find_by_name(DEFAULT_FEDERATED_ROLE)?
            .ok_or_else(|| {
                Error::configuration(format!(
                    "default role '{DEFAULT_FEDERATED_ROLE}' is not provisioned"
                ))
            })
    }
}
