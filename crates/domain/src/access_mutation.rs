//! Changes to a user's access inputs and the audit values they produce.

use systicket_core::{AppError, AppResult};

use crate::{
    AccessState, AuditValue, CustomRoleRef, CustomRoleSlot, FixedRole, Permission,
    PermissionAuditAction, UserStatus,
};

/// A single change to a user's access inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessMutation {
    /// Sets the fixed role and clears any custom role.
    SetRole(FixedRole),
    /// Attaches a custom role.
    AssignCustomRole(CustomRoleRef),
    /// Detaches the custom role, falling back to fixed defaults.
    RemoveCustomRole,
    /// Replaces the per-user override list.
    ReplacePermissions(Vec<Permission>),
    /// Adds overrides.
    GrantPermissions(Vec<Permission>),
    /// Removes overrides.
    RevokePermissions(Vec<Permission>),
    /// Changes the lifecycle state.
    SetStatus(UserStatus),
}

/// Outcome of applying a mutation: new state plus the audit payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTransition {
    /// State before the change.
    pub before: AccessState,
    /// State after the change.
    pub after: AccessState,
    /// Audit action recorded for the change.
    pub action: PermissionAuditAction,
    /// Audited old value.
    pub old_value: AuditValue,
    /// Audited new value.
    pub new_value: AuditValue,
}

impl AccessMutation {
    /// Returns the audit action this mutation records.
    #[must_use]
    pub fn action(&self) -> PermissionAuditAction {
        match self {
            Self::SetRole(_) => PermissionAuditAction::RoleChanged,
            Self::AssignCustomRole(_) => PermissionAuditAction::CustomRoleAssigned,
            Self::RemoveCustomRole => PermissionAuditAction::CustomRoleRemoved,
            Self::ReplacePermissions(_) => PermissionAuditAction::PermissionsUpdated,
            Self::GrantPermissions(_) => PermissionAuditAction::PermissionsAdded,
            Self::RevokePermissions(_) => PermissionAuditAction::PermissionsRemoved,
            Self::SetStatus(_) => PermissionAuditAction::UserStatusChanged,
        }
    }

    /// Validates the mutation and computes the resulting transition.
    ///
    /// Unchanged results are still returned so every accepted request is audited.
    pub fn apply(&self, current: &AccessState) -> AppResult<AccessTransition> {
        let before = current.clone();
        let mut after = current.clone();

        let (old_value, new_value) = match self {
            Self::SetRole(role) => {
                after.role = *role;
                after.custom_role = None;
                (
                    AuditValue::role_assignment(before.role, custom_role_slot(&before)),
                    AuditValue::role_assignment(after.role, CustomRoleSlot::Unassigned),
                )
            }
            Self::AssignCustomRole(reference) => {
                after.custom_role = Some(reference.clone());
                (
                    AuditValue::custom_role(custom_role_slot(&before)),
                    AuditValue::custom_role(CustomRoleSlot::Assigned(reference.clone())),
                )
            }
            Self::RemoveCustomRole => {
                after.custom_role = None;
                (
                    AuditValue::custom_role(custom_role_slot(&before)),
                    AuditValue::custom_role(CustomRoleSlot::Unassigned),
                )
            }
            Self::ReplacePermissions(permissions) => {
                after.permissions = dedupe(permissions.iter().copied());
                (
                    AuditValue::permissions(before.permissions.clone()),
                    AuditValue::permissions(after.permissions.clone()),
                )
            }
            Self::GrantPermissions(permissions) => {
                require_non_empty(permissions, "grant")?;
                after.permissions = dedupe(
                    before
                        .permissions
                        .iter()
                        .chain(permissions.iter())
                        .copied(),
                );
                (
                    AuditValue::permissions(before.permissions.clone()),
                    AuditValue::permissions(after.permissions.clone()),
                )
            }
            Self::RevokePermissions(permissions) => {
                require_non_empty(permissions, "revoke")?;
                after
                    .permissions
                    .retain(|permission| !permissions.contains(permission));
                (
                    AuditValue::permissions(before.permissions.clone()),
                    AuditValue::permissions(after.permissions.clone()),
                )
            }
            Self::SetStatus(status) => {
                after.status = *status;
                (
                    AuditValue::status(before.status),
                    AuditValue::status(after.status),
                )
            }
        };

        Ok(AccessTransition {
            before,
            after,
            action: self.action(),
            old_value,
            new_value,
        })
    }
}

fn custom_role_slot(state: &AccessState) -> CustomRoleSlot {
    match &state.custom_role {
        Some(reference) => CustomRoleSlot::Assigned(reference.clone()),
        None => CustomRoleSlot::Unassigned,
    }
}

fn require_non_empty(permissions: &[Permission], operation: &str) -> AppResult<()> {
    if permissions.is_empty() {
        return Err(AppError::Validation(format!(
            "{operation} requires at least one permission"
        )));
    }

    Ok(())
}

fn dedupe(permissions: impl Iterator<Item = Permission>) -> Vec<Permission> {
    let mut unique = Vec::new();
    for permission in permissions {
        if !unique.contains(&permission) {
            unique.push(permission);
        }
    }
    unique
}
