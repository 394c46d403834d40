//! Permission audit log model and point-in-time reconstruction.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};
use systicket_core::{AppError, AppResult};
use uuid::Uuid;

use crate::{AccessState, CustomRoleId, CustomRoleRef, FixedRole, Permission, UserId, UserStatus};

/// Kinds of audited user-access changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionAuditAction {
    /// Fixed role changed.
    RoleChanged,
    /// Custom role attached.
    CustomRoleAssigned,
    /// Custom role detached.
    CustomRoleRemoved,
    /// Overrides added.
    PermissionsAdded,
    /// Overrides removed.
    PermissionsRemoved,
    /// Override list replaced.
    PermissionsUpdated,
    /// User record created.
    UserCreated,
    /// Lifecycle state changed.
    UserStatusChanged,
}

impl PermissionAuditAction {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoleChanged => "role_changed",
            Self::CustomRoleAssigned => "custom_role_assigned",
            Self::CustomRoleRemoved => "custom_role_removed",
            Self::PermissionsAdded => "permissions_added",
            Self::PermissionsRemoved => "permissions_removed",
            Self::PermissionsUpdated => "permissions_updated",
            Self::UserCreated => "user_created",
            Self::UserStatusChanged => "user_status_changed",
        }
    }
}

impl FromStr for PermissionAuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "role_changed" => Ok(Self::RoleChanged),
            "custom_role_assigned" => Ok(Self::CustomRoleAssigned),
            "custom_role_removed" => Ok(Self::CustomRoleRemoved),
            "permissions_added" => Ok(Self::PermissionsAdded),
            "permissions_removed" => Ok(Self::PermissionsRemoved),
            "permissions_updated" => Ok(Self::PermissionsUpdated),
            "user_created" => Ok(Self::UserCreated),
            "user_status_changed" => Ok(Self::UserStatusChanged),
            _ => Err(AppError::Validation(format!(
                "unknown audit action '{value}'"
            ))),
        }
    }
}

/// Custom role field captured in an audit value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomRoleSlot {
    /// No custom role; stored as `"custom_role_id": null`.
    Unassigned,
    /// Assigned role, stored with its id and name.
    Assigned(CustomRoleRef),
}

/// Partial snapshot of access inputs stored as `old_value` / `new_value`.
///
/// Only the fields touched by a mutation are present.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuditValue {
    /// Fixed role.
    pub role: Option<FixedRole>,
    /// Custom role.
    pub custom_role: Option<CustomRoleSlot>,
    /// Override list.
    pub permissions: Option<Vec<Permission>>,
    /// Lifecycle state.
    pub status: Option<UserStatus>,
}

impl AuditValue {
    /// Value for fixed role changes, which also reset the custom role.
    #[must_use]
    pub fn role_assignment(role: FixedRole, custom_role: CustomRoleSlot) -> Self {
        Self {
            role: Some(role),
            custom_role: Some(custom_role),
            ..Self::default()
        }
    }

    /// Value for custom role changes.
    #[must_use]
    pub fn custom_role(custom_role: CustomRoleSlot) -> Self {
        Self {
            custom_role: Some(custom_role),
            ..Self::default()
        }
    }

    /// Value for override list changes.
    #[must_use]
    pub fn permissions(permissions: Vec<Permission>) -> Self {
        Self {
            permissions: Some(permissions),
            ..Self::default()
        }
    }

    /// Value for status changes.
    #[must_use]
    pub fn status(status: UserStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Full snapshot of a state, used when a user is created.
    #[must_use]
    pub fn snapshot(state: &AccessState) -> Self {
        Self {
            role: Some(state.role),
            custom_role: Some(match &state.custom_role {
                Some(reference) => CustomRoleSlot::Assigned(reference.clone()),
                None => CustomRoleSlot::Unassigned,
            }),
            permissions: Some(state.permissions.clone()),
            status: Some(state.status),
        }
    }

    /// Overwrites the fields present in this value onto `state`.
    pub fn apply_to(&self, state: &mut AccessState) {
        if let Some(role) = self.role {
            state.role = role;
        }
        if let Some(slot) = &self.custom_role {
            state.custom_role = match slot {
                CustomRoleSlot::Assigned(reference) => Some(reference.clone()),
                CustomRoleSlot::Unassigned => None,
            };
        }
        if let Some(permissions) = &self.permissions {
            state.permissions = permissions.clone();
        }
        if let Some(status) = self.status {
            state.status = status;
        }
    }

    /// Serializes to the stored JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        if let Some(role) = self.role {
            object.insert("role".to_owned(), json!(role.as_str()));
        }
        match &self.custom_role {
            Some(CustomRoleSlot::Assigned(reference)) => {
                object.insert(
                    "custom_role_id".to_owned(),
                    json!(reference.id.as_uuid().to_string()),
                );
                object.insert("custom_role_name".to_owned(), json!(reference.name));
            }
            Some(CustomRoleSlot::Unassigned) => {
                object.insert("custom_role_id".to_owned(), Value::Null);
            }
            None => {}
        }
        if let Some(permissions) = &self.permissions {
            object.insert(
                "permissions".to_owned(),
                Value::Array(
                    permissions
                        .iter()
                        .map(|permission| json!(permission.as_str()))
                        .collect(),
                ),
            );
        }
        if let Some(status) = self.status {
            object.insert("status".to_owned(), json!(status.as_str()));
        }

        Value::Object(object)
    }

    /// Parses a stored JSON object.
    pub fn from_json(value: &Value) -> AppResult<Self> {
        let Some(object) = value.as_object() else {
            return Err(AppError::Validation(
                "audit value must be a JSON object".to_owned(),
            ));
        };

        let role = object
            .get("role")
            .map(|role| string_field(role, "role").and_then(FixedRole::from_str))
            .transpose()?;

        let custom_role = match object.get("custom_role_id") {
            None => None,
            Some(Value::Null) => Some(CustomRoleSlot::Unassigned),
            Some(id) => {
                let id = string_field(id, "custom_role_id")?;
                let id = Uuid::parse_str(id).map_err(|error| {
                    AppError::Validation(format!("invalid custom_role_id '{id}': {error}"))
                })?;
                let name = object
                    .get("custom_role_name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned();
                Some(CustomRoleSlot::Assigned(CustomRoleRef {
                    id: CustomRoleId::from_uuid(id),
                    name,
                }))
            }
        };

        let permissions = match object.get("permissions") {
            None | Some(Value::Null) => None,
            Some(Value::Array(values)) => {
                let values = values
                    .iter()
                    .map(|value| string_field(value, "permissions"))
                    .collect::<AppResult<Vec<_>>>()?;
                Some(crate::parse_permissions(values)?)
            }
            Some(_) => {
                return Err(AppError::Validation(
                    "audit permissions must be an array".to_owned(),
                ));
            }
        };

        let status = object
            .get("status")
            .map(|status| string_field(status, "status").and_then(UserStatus::from_str))
            .transpose()?;

        Ok(Self {
            role,
            custom_role,
            permissions,
            status,
        })
    }
}

fn string_field<'a>(value: &'a Value, field: &str) -> AppResult<&'a str> {
    value
        .as_str()
        .ok_or_else(|| AppError::Validation(format!("audit field '{field}' must be a string")))
}

/// Immutable audit row for one user-access change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionAuditRecord {
    /// Row identifier.
    pub id: Uuid,
    /// User whose access changed.
    pub target_user_id: UserId,
    /// User who made the change.
    pub changed_by_id: UserId,
    /// Change kind.
    pub action: PermissionAuditAction,
    /// Value before the change.
    pub old_value: Option<AuditValue>,
    /// Value after the change.
    pub new_value: Option<AuditValue>,
    /// Client address of the request.
    pub ip_address: Option<String>,
    /// Client user agent of the request.
    pub user_agent: Option<String>,
    /// Append time.
    pub created_at: DateTime<Utc>,
}

/// Rewinds `current` to its value at `at` by undoing newer audit rows.
///
/// Returns `None` when the user did not exist yet at `at`.
#[must_use]
pub fn rewind_access_state(
    current: &AccessState,
    history: &[PermissionAuditRecord],
    at: DateTime<Utc>,
) -> Option<AccessState> {
    let mut newer: Vec<&PermissionAuditRecord> = history
        .iter()
        .filter(|record| record.created_at > at)
        .collect();
    newer.sort_by(|left, right| right.created_at.cmp(&left.created_at));

    let mut state = current.clone();
    for record in newer {
        if record.action == PermissionAuditAction::UserCreated {
            return None;
        }
        if let Some(old_value) = &record.old_value {
            old_value.apply_to(&mut state);
        }
    }

    Some(state)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use serde_json::json;
    use uuid::Uuid;

    use super::{
        AuditValue, CustomRoleSlot, PermissionAuditAction, PermissionAuditRecord,
        rewind_access_state,
    };
    use crate::{
        AccessMutation, AccessState, CustomRoleId, CustomRoleRef, FixedRole, Permission, UserId,
    };

    #[test]
    fn unassigned_custom_role_serializes_as_null() {
        let value = AuditValue::custom_role(CustomRoleSlot::Unassigned);
        assert_eq!(value.to_json(), json!({"custom_role_id": null}));

        let parsed = AuditValue::from_json(&json!({"custom_role_id": null}));
        assert!(matches!(parsed, Ok(parsed) if parsed == value));
    }

    #[test]
    fn stored_values_parse_back() {
        let id = Uuid::new_v4();
        let stored = json!({
            "role": "manager",
            "custom_role_id": id.to_string(),
            "custom_role_name": "Gerente",
            "permissions": ["tickets:read", "audit:view"],
            "status": "suspended",
        });

        let Ok(parsed) = AuditValue::from_json(&stored) else {
            panic!("stored value should parse");
        };
        assert_eq!(parsed.role, Some(FixedRole::Manager));
        assert_eq!(
            parsed.custom_role,
            Some(CustomRoleSlot::Assigned(CustomRoleRef {
                id: CustomRoleId::from_uuid(id),
                name: "Gerente".to_owned(),
            }))
        );
        assert_eq!(
            parsed.permissions,
            Some(vec![Permission::TicketsRead, Permission::AuditView])
        );
        assert_eq!(parsed.to_json(), stored);
    }

    #[test]
    fn action_storage_values_parse_back() {
        for action in [
            PermissionAuditAction::RoleChanged,
            PermissionAuditAction::CustomRoleAssigned,
            PermissionAuditAction::CustomRoleRemoved,
            PermissionAuditAction::PermissionsAdded,
            PermissionAuditAction::PermissionsRemoved,
            PermissionAuditAction::PermissionsUpdated,
            PermissionAuditAction::UserCreated,
            PermissionAuditAction::UserStatusChanged,
        ] {
            assert!(matches!(action.as_str().parse::<PermissionAuditAction>(), Ok(parsed) if parsed == action));
        }
    }

    fn record(
        user_id: UserId,
        mutation: &AccessMutation,
        state: &AccessState,
        offset_minutes: i64,
    ) -> (PermissionAuditRecord, AccessState) {
        let Ok(transition) = mutation.apply(state) else {
            panic!("fixture mutation should apply");
        };
        let record = PermissionAuditRecord {
            id: Uuid::new_v4(),
            target_user_id: user_id,
            changed_by_id: UserId::new(),
            action: transition.action,
            old_value: Some(transition.old_value),
            new_value: Some(transition.new_value),
            ip_address: None,
            user_agent: None,
            created_at: Utc::now() - Duration::minutes(60) + Duration::minutes(offset_minutes),
        };
        (record, transition.after)
    }

    #[test]
    fn rewind_reproduces_intermediate_states() {
        let user_id = UserId::new();
        let created = AccessState::for_role(FixedRole::Agent);
        let created_at = Utc::now() - Duration::minutes(60);
        let creation = PermissionAuditRecord {
            id: Uuid::new_v4(),
            target_user_id: user_id,
            changed_by_id: UserId::new(),
            action: PermissionAuditAction::UserCreated,
            old_value: None,
            new_value: Some(AuditValue::snapshot(&created)),
            ip_address: None,
            user_agent: None,
            created_at,
        };

        let (granted, after_grant) = record(
            user_id,
            &AccessMutation::GrantPermissions(vec![Permission::AuditView]),
            &created,
            10,
        );
        let (promoted, current) = record(
            user_id,
            &AccessMutation::SetRole(FixedRole::Manager),
            &after_grant,
            20,
        );
        let history = vec![creation, granted, promoted];

        let before_creation = rewind_access_state(&current, &history, created_at - Duration::minutes(1));
        assert_eq!(before_creation, None);

        let at_creation = rewind_access_state(&current, &history, created_at + Duration::minutes(5));
        assert_eq!(at_creation, Some(created));

        let between = rewind_access_state(&current, &history, created_at + Duration::minutes(15));
        assert_eq!(between, Some(after_grant));

        let now = rewind_access_state(&current, &history, Utc::now());
        assert_eq!(now, Some(current));
    }
}
