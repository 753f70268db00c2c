//! Role/permission administration with invariant enforcement and audit
//! emission.
//!
//! Single-store mutations either fully succeed or have no effect. The two
//! multi-store sequences (permission rename and delete, which also rewrite
//! the roles embedding the permission) are ordered so that no reader can
//! observe a dangling permission id; a store failure mid-sequence can leave
//! some roles not yet rewritten, and a retry of the same call completes the
//! remainder. Every outcome, success or failure, is reported through the
//! audit recorder with the actor's identity and a human-readable detail
//! string before the typed result returns to the caller.

use vigil_core::{Error, PermissionId, RequestContext, Result, RoleId};

use vigil_audit::{AuditRecorder, Outcome};
use vigil_auth::store::{IdentityStore, PermissionStore, RoleStore};
use vigil_auth::{Identity, Permission, Role, canonical_permission_name};

mod actions {
    pub const ROLE_CREATED: &str = "ROLE_CREATED";
    pub const ROLE_RENAMED: &str = "ROLE_RENAMED";
    pub const ROLE_DELETED: &str = "ROLE_DELETED";
    pub const PERMISSION_CREATED: &str = "PERMISSION_CREATED";
    pub const PERMISSION_RENAMED: &str = "PERMISSION_RENAMED";
    pub const PERMISSION_DELETED: &str = "PERMISSION_DELETED";
    pub const PERMISSIONS_ASSIGNED: &str = "PERMISSIONS_ASSIGNED";
}

const ROLES_RESOURCE: &str = "/admin/roles";
const PERMISSIONS_RESOURCE: &str = "/admin/permissions";

/// Orchestrates role/permission mutations.
///
/// All policy lives here: the stores underneath are plain CRUD collaborators.
#[derive(Debug, Clone)]
pub struct Administration<P, R, I> {
    permissions: P,
    roles: R,
    identities: I,
    recorder: AuditRecorder,
}

impl<P, R, I> Administration<P, R, I>
where
    P: PermissionStore,
    R: RoleStore,
    I: IdentityStore,
{
    pub fn new(permissions: P, roles: R, identities: I, recorder: AuditRecorder) -> Self {
        Self {
            permissions,
            roles,
            identities,
            recorder,
        }
    }

    // ── Roles ────────────────────────────────────────────────────────────

    pub fn create_role(&self, actor: &str, ctx: &RequestContext, name: &str) -> Result<Role> {
        let result = self.do_create_role(name);
        self.report(
            actor,
            ctx,
            actions::ROLE_CREATED,
            ROLES_RESOURCE,
            result.as_ref().map(|r| format!("Role created: {}", r.name)),
        );
        result
    }

    pub fn rename_role(
        &self,
        actor: &str,
        ctx: &RequestContext,
        id: RoleId,
        new_name: &str,
    ) -> Result<Role> {
        let result = self.do_rename_role(id, new_name);
        self.report(
            actor,
            ctx,
            actions::ROLE_RENAMED,
            ROLES_RESOURCE,
            result.as_ref().map(|r| format!("Role renamed to: {}", r.name)),
        );
        result
    }

    pub fn delete_role(&self, actor: &str, ctx: &RequestContext, id: RoleId) -> Result<()> {
        let result = self.do_delete_role(id);
        self.report(
            actor,
            ctx,
            actions::ROLE_DELETED,
            ROLES_RESOURCE,
            result
                .as_ref()
                .map(|name| format!("Role deleted: {name}")),
        );
        result.map(|_| ())
    }

    /// Replace a role's entire permission set with the resolved ids.
    ///
    /// Not an incremental add: the new set is exactly the given ids. Any
    /// unresolvable id fails the whole operation and leaves the previous set
    /// untouched.
    pub fn assign_permissions(
        &self,
        actor: &str,
        ctx: &RequestContext,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> Result<Role> {
        let result = self.do_assign_permissions(role_id, permission_ids);
        self.report(
            actor,
            ctx,
            actions::PERMISSIONS_ASSIGNED,
            ROLES_RESOURCE,
            result.as_ref().map(|r| {
                format!(
                    "Role '{}' now holds: [{}]",
                    r.name,
                    r.permission_names().join(", ")
                )
            }),
        );
        result
    }

    // ── Permissions ──────────────────────────────────────────────────────

    pub fn create_permission(
        &self,
        actor: &str,
        ctx: &RequestContext,
        name: &str,
    ) -> Result<Permission> {
        let result = self.do_create_permission(name);
        self.report(
            actor,
            ctx,
            actions::PERMISSION_CREATED,
            PERMISSIONS_RESOURCE,
            result
                .as_ref()
                .map(|p| format!("Permission created: {}", p.name)),
        );
        result
    }

    pub fn rename_permission(
        &self,
        actor: &str,
        ctx: &RequestContext,
        id: PermissionId,
        new_name: &str,
    ) -> Result<Permission> {
        let result = self.do_rename_permission(id, new_name);
        self.report(
            actor,
            ctx,
            actions::PERMISSION_RENAMED,
            PERMISSIONS_RESOURCE,
            result
                .as_ref()
                .map(|p| format!("Permission renamed to: {}", p.name)),
        );
        result
    }

    pub fn delete_permission(&self, actor: &str, ctx: &RequestContext, id: PermissionId) -> Result<()> {
        let result = self.do_delete_permission(id);
        self.report(
            actor,
            ctx,
            actions::PERMISSION_DELETED,
            PERMISSIONS_RESOURCE,
            result
                .as_ref()
                .map(|name| format!("Permission deleted: {name}")),
        );
        result.map(|_| ())
    }

    // ── Read helpers ─────────────────────────────────────────────────────

    pub fn roles(&self) -> Result<Vec<Role>> {
        Ok(self.roles.find_all()?)
    }

    pub fn role(&self, id: RoleId) -> Result<Role> {
        Ok(self.roles.find_by_id(id)?)
    }

    pub fn permissions(&self) -> Result<Vec<Permission>> {
        Ok(self.permissions.find_all()?)
    }

    pub fn permission(&self, id: PermissionId) -> Result<Permission> {
        Ok(self.permissions.find_by_id(id)?)
    }

    pub fn role_permissions(&self, role_id: RoleId) -> Result<Vec<Permission>> {
        Ok(self.roles.find_by_id(role_id)?.permissions)
    }

    pub fn role_has_permission(&self, role_id: RoleId, permission_id: PermissionId) -> Result<bool> {
        Ok(self.roles.find_by_id(role_id)?.holds_permission_id(permission_id))
    }

    /// Identities currently bound to a role; the referential guard's input.
    pub fn identities_bound(&self, role_id: RoleId) -> Result<Vec<Identity>> {
        self.roles.find_by_id(role_id)?;
        Ok(self.identities.find_all_by_role(role_id)?)
    }

    // ── Mutation bodies ──────────────────────────────────────────────────

    fn do_create_role(&self, name: &str) -> Result<Role> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("role name cannot be empty"));
        }
        if self.roles.exists_by_name(name)? {
            return Err(Error::conflict(format!("a role named '{name}' already exists")));
        }
        Ok(self.roles.create(Role::new(name))?)
    }

    fn do_rename_role(&self, id: RoleId, new_name: &str) -> Result<Role> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(Error::validation("role name cannot be empty"));
        }

        let mut role = self.roles.find_by_id(id)?;
        if role.is_protected() && role.name != new_name {
            return Err(Error::policy(format!(
                "system role '{}' cannot be renamed",
                role.name
            )));
        }
        if let Some(existing) = self.roles.find_by_name(new_name)? {
            if existing.id != id {
                return Err(Error::conflict(format!(
                    "a role named '{new_name}' already exists"
                )));
            }
        }

        role.name = new_name.to_string();
        Ok(self.roles.update(role)?)
    }

    /// Returns the deleted role's name for the audit detail.
    fn do_delete_role(&self, id: RoleId) -> Result<String> {
        let role = self.roles.find_by_id(id)?;

        if role.is_protected() {
            return Err(Error::policy(format!(
                "system role '{}' cannot be deleted",
                role.name
            )));
        }

        let bound = self.identities.count_by_role(id)?;
        if bound > 0 {
            return Err(Error::conflict(format!(
                "role '{}' cannot be deleted: {bound} identity(ies) still assigned",
                role.name
            )));
        }

        self.roles.delete(id)?;
        Ok(role.name)
    }

    fn do_assign_permissions(
        &self,
        role_id: RoleId,
        permission_ids: &[PermissionId],
    ) -> Result<Role> {
        let mut role = self.roles.find_by_id(role_id)?;

        // Resolve everything before touching the role, so a single bad id
        // leaves the previous set intact.
        let mut resolved = Vec::with_capacity(permission_ids.len());
        for &pid in permission_ids {
            match self.permissions.find_by_id(pid) {
                Ok(permission) => resolved.push(permission),
                Err(vigil_core::StoreError::NotFound) => return Err(Error::NotFound),
                Err(e) => return Err(e.into()),
            }
        }

        role.permissions = resolved;
        Ok(self.roles.update(role)?)
    }

    fn do_create_permission(&self, name: &str) -> Result<Permission> {
        let canonical = canonical_permission_name(name);
        if canonical.is_empty() {
            return Err(Error::validation("permission name cannot be empty"));
        }
        if self.permissions.exists_by_name(&canonical)? {
            return Err(Error::conflict(format!(
                "a permission named '{canonical}' already exists"
            )));
        }
        Ok(self.permissions.create(Permission::new(&canonical))?)
    }

    fn do_rename_permission(&self, id: PermissionId, new_name: &str) -> Result<Permission> {
        let canonical = canonical_permission_name(new_name);
        if canonical.is_empty() {
            return Err(Error::validation("permission name cannot be empty"));
        }

        let mut permission = self.permissions.find_by_id(id)?;
        if permission.is_protected() && permission.name != canonical {
            return Err(Error::policy(format!(
                "system permission '{}' cannot be renamed",
                permission.name
            )));
        }
        if let Some(existing) = self.permissions.find_by_name(&canonical)? {
            if existing.id != id {
                return Err(Error::conflict(format!(
                    "a permission named '{canonical}' already exists"
                )));
            }
        }

        permission.name = canonical;
        let updated = self.permissions.update(permission)?;

        // Roles embed permission entities; keep their copies in sync.
        for mut role in self.roles.find_all()? {
            if role.holds_permission_id(id) {
                for p in &mut role.permissions {
                    if p.id == id {
                        p.name = updated.name.clone();
                    }
                }
                self.roles.update(role)?;
            }
        }

        Ok(updated)
    }

    /// Returns the deleted permission's name for the audit detail.
    fn do_delete_permission(&self, id: PermissionId) -> Result<String> {
        let permission = self.permissions.find_by_id(id)?;

        if permission.is_protected() {
            return Err(Error::policy(format!(
                "system permission '{}' cannot be deleted",
                permission.name
            )));
        }

        // Cascade first: no role may reference the permission once the
        // record is gone, and no reader may observe a dangling id.
        for mut role in self.roles.find_all()? {
            if role.holds_permission_id(id) {
                role.permissions.retain(|p| p.id != id);
                self.roles.update(role)?;
            }
        }

        self.permissions.delete(id)?;
        Ok(permission.name)
    }

    // ── Audit plumbing ───────────────────────────────────────────────────

    fn report(
        &self,
        actor: &str,
        ctx: &RequestContext,
        action: &str,
        resource: &str,
        detail: core::result::Result<String, &Error>,
    ) {
        match detail {
            Ok(detail) => self
                .recorder
                .record(actor, action, resource, ctx, Outcome::Success, Some(detail)),
            Err(e) => self.recorder.record(
                actor,
                action,
                resource,
                ctx,
                outcome_for(e),
                Some(format!("Error: {e}")),
            ),
        }
    }
}

/// Policy denials feed the anomaly query as blocked attempts; everything else
/// a failed mutation produces is a plain failure.
fn outcome_for(error: &Error) -> Outcome {
    match error {
        Error::PolicyViolation(_) => Outcome::Blocked,
        _ => Outcome::Failure,
    }
}
