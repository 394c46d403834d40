use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use systicket_application::{PermissionAuditPage, UserPermissions};
use systicket_domain::{CustomRole, FixedRole, Permission, PermissionAuditRecord};
use ts_rs::TS;
use uuid::Uuid;

use super::users::AccessStateResponse;

/// Permission catalog: descriptions, flat list, and grouping by module.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-catalog-response.ts"
)]
pub struct PermissionCatalogResponse {
    pub permissions: BTreeMap<String, String>,
    pub list: Vec<String>,
    pub by_module: BTreeMap<String, Vec<String>>,
}

impl PermissionCatalogResponse {
    /// Builds the response from the compiled-in catalog.
    #[must_use]
    pub fn from_catalog() -> Self {
        let mut permissions = BTreeMap::new();
        let mut list = Vec::with_capacity(Permission::all().len());
        let mut by_module: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for permission in Permission::all() {
            let value = permission.as_str().to_owned();
            permissions.insert(value.clone(), permission.description().to_owned());
            by_module
                .entry(permission.module().as_str().to_owned())
                .or_default()
                .push(value.clone());
            list.push(value);
        }

        Self {
            permissions,
            list,
            by_module,
        }
    }
}

/// Expanded default permissions of every fixed role.
pub fn role_defaults() -> BTreeMap<String, Vec<String>> {
    FixedRole::all()
        .into_iter()
        .map(|role| {
            (
                role.as_str().to_owned(),
                permission_strings(role.default_permissions()),
            )
        })
        .collect()
}

pub(crate) fn permission_strings(permissions: &[Permission]) -> Vec<String> {
    permissions
        .iter()
        .map(|permission| permission.as_str().to_owned())
        .collect()
}

/// API representation of a custom role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/custom-role-response.ts"
)]
pub struct CustomRoleResponse {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    pub color: String,
    pub is_active: bool,
    pub created_by_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<CustomRole> for CustomRoleResponse {
    fn from(role: CustomRole) -> Self {
        Self {
            id: role.id().to_string(),
            name: role.name().to_string(),
            description: role.description().map(ToOwned::to_owned),
            permissions: permission_strings(role.permissions()),
            color: role.color().as_str().to_owned(),
            is_active: role.is_active(),
            created_by_id: role.created_by().map(|user_id| user_id.to_string()),
            created_at: role.created_at().to_rfc3339(),
            updated_at: role.updated_at().to_rfc3339(),
        }
    }
}

/// Incoming payload for custom role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-custom-role-request.ts"
)]
pub struct CreateCustomRoleRequest {
    pub name: String,
    pub description: Option<String>,
    pub permissions: Vec<String>,
    pub color: Option<String>,
}

/// Incoming payload for a partial custom role update.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-custom-role-request.ts"
)]
pub struct UpdateCustomRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub color: Option<String>,
    pub is_active: Option<bool>,
}

/// Query of the custom role listing.
#[derive(Debug, Default, Deserialize)]
pub struct CustomRoleListQuery {
    #[serde(default, alias = "includeInactive")]
    pub include_inactive: bool,
}

/// Resolved permissions of one user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-permissions-response.ts"
)]
pub struct UserPermissionsResponse {
    pub user_id: String,
    pub access: AccessStateResponse,
    pub custom_role: Option<CustomRoleResponse>,
    pub permissions: Vec<String>,
    pub as_of: Option<String>,
}

impl From<UserPermissions> for UserPermissionsResponse {
    fn from(value: UserPermissions) -> Self {
        Self {
            user_id: value.user_id.to_string(),
            access: AccessStateResponse::from(&value.access),
            custom_role: value.custom_role.map(CustomRoleResponse::from),
            permissions: value
                .effective
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
            as_of: value.as_of.map(|at| at.to_rfc3339()),
        }
    }
}

/// Query of the user permission lookup.
#[derive(Debug, Default, Deserialize)]
pub struct UserPermissionsQuery {
    pub at: Option<DateTime<Utc>>,
}

/// Incoming payload for a fixed role change.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/set-user-role-request.ts"
)]
pub struct SetUserRoleRequest {
    pub role: String,
}

/// Incoming payload carrying a permission list.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-permissions-request.ts"
)]
pub struct UserPermissionsRequest {
    pub permissions: Vec<String>,
}

/// Incoming payload for a custom role assignment.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assign-custom-role-request.ts"
)]
pub struct AssignCustomRoleRequest {
    #[ts(type = "string")]
    pub custom_role_id: Uuid,
}

/// Filters of the audit listing.
#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQuery {
    #[serde(alias = "targetUserId")]
    pub target_user_id: Option<Uuid>,
    #[serde(alias = "changedById")]
    pub changed_by_id: Option<Uuid>,
    pub action: Option<String>,
    #[serde(alias = "startDate")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(alias = "endDate")]
    pub end_date: Option<DateTime<Utc>>,
    pub page: Option<usize>,
    #[serde(alias = "perPage")]
    pub per_page: Option<usize>,
}

/// API representation of one audit row.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-audit-entry-response.ts"
)]
pub struct PermissionAuditEntryResponse {
    pub id: String,
    pub target_user_id: String,
    pub changed_by_id: String,
    pub action: String,
    #[ts(type = "Record<string, unknown> | null")]
    pub old_value: Option<Value>,
    #[ts(type = "Record<string, unknown> | null")]
    pub new_value: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
}

impl From<PermissionAuditRecord> for PermissionAuditEntryResponse {
    fn from(record: PermissionAuditRecord) -> Self {
        Self {
            id: record.id.to_string(),
            target_user_id: record.target_user_id.to_string(),
            changed_by_id: record.changed_by_id.to_string(),
            action: record.action.as_str().to_owned(),
            old_value: record.old_value.as_ref().map(|value| value.to_json()),
            new_value: record.new_value.as_ref().map(|value| value.to_json()),
            ip_address: record.ip_address,
            user_agent: record.user_agent,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// One page of audit rows.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-audit-page-response.ts"
)]
pub struct PermissionAuditPageResponse {
    pub data: Vec<PermissionAuditEntryResponse>,
    #[ts(type = "number")]
    pub total: u64,
}

impl From<PermissionAuditPage> for PermissionAuditPageResponse {
    fn from(page: PermissionAuditPage) -> Self {
        Self {
            data: page
                .entries
                .into_iter()
                .map(PermissionAuditEntryResponse::from)
                .collect(),
            total: page.total,
        }
    }
}
