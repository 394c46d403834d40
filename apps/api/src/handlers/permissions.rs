use std::collections::BTreeMap;
use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::HeaderMap;
use uuid::Uuid;

use systicket_application::{AuditLogFilter, CustomRoleRequest, CustomRoleUpdate};
use systicket_core::UserIdentity;
use systicket_domain::{
    CustomRoleId, FixedRole, PermissionAuditAction, UserId, parse_permissions,
};

use crate::auth::request_origin;
use crate::dto::{
    AssignCustomRoleRequest, AuditLogQuery, CreateCustomRoleRequest, CustomRoleListQuery,
    CustomRoleResponse, PermissionAuditPageResponse, PermissionCatalogResponse,
    SetUserRoleRequest, UpdateCustomRoleRequest, UserPermissionsQuery, UserPermissionsRequest,
    UserPermissionsResponse, UserResponse, role_defaults,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod audit;
mod catalog;
mod custom_roles;
mod user_access;


pub use audit::list_audit_handler;
pub use catalog::{all_permissions_handler, my_permissions_handler, role_defaults_handler};
pub use custom_roles::{
    create_custom_role_handler, deactivate_custom_role_handler, get_custom_role_handler,
    list_custom_roles_handler, update_custom_role_handler,
};
pub use user_access::{
    assign_custom_role_handler, grant_permissions_handler, remove_custom_role_handler,
    replace_permissions_handler, revoke_permissions_handler, set_user_role_handler,
    user_permissions_handler,
};
