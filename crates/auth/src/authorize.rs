//! Authorization decisions over an authenticated identity.
//!
//! The engine maps an identity to its effective capability set and renders a
//! human-readable summary. Enforcement is always the permission-set
//! membership test; the narrative tier is advisory display text and never a
//! denial mechanism.

use serde::Serialize;
use tracing::error;

use vigil_core::{Error, Result};

use crate::store::RoleStore;
use crate::{Identity, Role};

/// The six known system role tiers.
///
/// A closed enumeration, not open-ended string dispatch: anything outside
/// this set falls through to an explicit read-only default that still grants
/// whatever the role's actual permission set says.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleTier {
    SystemAdministrator,
    Director,
    Manager,
    AreaLead,
    Supervisor,
    Staff,
}

impl RoleTier {
    /// Classify a role name into a known tier.
    ///
    /// `None` means "unrecognized" and callers must render the read-only
    /// fallback, never a denial.
    pub fn classify(role_name: &str) -> Option<Self> {
        match role_name {
            "System Administrator" => Some(Self::SystemAdministrator),
            "Director" => Some(Self::Director),
            "Manager" => Some(Self::Manager),
            "Area Lead" => Some(Self::AreaLead),
            "Supervisor" => Some(Self::Supervisor),
            "Staff" => Some(Self::Staff),
            _ => None,
        }
    }

    /// Advisory access summary line for this tier.
    pub fn summary(self) -> &'static str {
        match self {
            Self::SystemAdministrator => "Full system access (FULL MANAGEMENT)",
            Self::Director => "Access to read, edit, approval and decision-making",
            Self::Manager => "Access to reports and approvals",
            Self::AreaLead => "Access to read and edit",
            Self::Supervisor => "Access to read and control",
            Self::Staff => "Basic access (read-only)",
        }
    }
}

/// Summary line used for role names outside the known tier set.
const UNRECOGNIZED_TIER_SUMMARY: &str = "Read-only access";

/// Outcome of an authorization computation. Plain data, no side effects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationResult {
    pub role_name: String,
    /// Canonical permission names, sorted.
    pub permission_names: Vec<String>,
    /// Human-readable authorization summary (advisory only).
    pub narrative: String,
}

/// Maps an authenticated identity to its capability set.
///
/// Depends only on the role store; computations are in-memory once the role
/// is fetched.
#[derive(Debug, Clone)]
pub struct AuthorizationEngine<R> {
    roles: R,
}

impl<R: RoleStore> AuthorizationEngine<R> {
    pub fn new(roles: R) -> Self {
        Self { roles }
    }

    /// Derive the identity's effective capability set and narrative summary.
    ///
    /// The caller must have rejected unauthenticated requests already; the
    /// identity here is always a resolved one. The only failure mode is a
    /// broken role reference, which the deletion guard makes unreachable;
    /// if observed anyway it is logged as severe and surfaced as
    /// [`Error::DataIntegrity`] so the caller denies.
    pub fn authorize(&self, identity: &Identity) -> Result<AuthorizationResult> {
        let role = self.resolve_role(identity)?;
        let permission_names = role.permission_names();
        let narrative = render_narrative(identity, &role, &permission_names);

        Ok(AuthorizationResult {
            role_name: role.name,
            permission_names,
            narrative,
        })
    }

    /// Case-sensitive membership test used to gate individual actions.
    pub fn has_permission(&self, identity: &Identity, permission_name: &str) -> Result<bool> {
        let role = self.resolve_role(identity)?;
        Ok(role.has_permission(permission_name))
    }

    fn resolve_role(&self, identity: &Identity) -> Result<Role> {
        match self.roles.find_by_id(identity.role_id) {
            Ok(role) => Ok(role),
            Err(vigil_core::StoreError::NotFound) => {
                error!(
                    login = %identity.login_name,
                    role_id = %identity.role_id,
                    "identity references a role that does not exist"
                );
                Err(Error::integrity(format!(
                    "identity '{}' references missing role {}",
                    identity.login_name, identity.role_id
                )))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn render_narrative(identity: &Identity, role: &Role, permission_names: &[String]) -> String {
    let tier_line = RoleTier::classify(&role.name)
        .map(RoleTier::summary)
        .unwrap_or(UNRECOGNIZED_TIER_SUMMARY);

    format!(
        "User authenticated: {}\nRole: {}\nPermissions: [{}]\n\n-> {}",
        identity.login_name,
        role.name,
        permission_names.join(", "),
        tier_line
    )
}
