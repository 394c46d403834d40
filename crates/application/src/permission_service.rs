use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use systicket_core::{AppError, AppResult, NonEmptyString, UserIdentity};
use systicket_domain::{
    AccessMutation, AccessState, CustomRole, CustomRoleId, CustomRoleRef, EmailAddress, FixedRole,
    Permission, PermissionAuditAction, ResolutionPolicy, RoleColor, UserId, UserStatus,
};

use crate::access_ports::{
    CreateCustomRoleInput, CreateUserInput, CustomRoleRepository, PermissionAuditPage,
    PermissionAuditQuery, PermissionAuditRepository, RequestOrigin, UserAccessRepository,
    UserAccount, UserListQuery,
};

mod audit;
mod custom_roles;
mod resolution;
mod user_access;


/// Default audit page size.
pub const AUDIT_DEFAULT_PER_PAGE: usize = 20;

/// Largest accepted audit page size.
pub const AUDIT_MAX_PER_PAGE: usize = 100;

/// Resolved permissions of one user, optionally as of a past instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPermissions {
    /// User identifier.
    pub user_id: UserId,
    /// Access inputs the set was resolved from.
    pub access: AccessState,
    /// Current definition of the assigned custom role.
    pub custom_role: Option<CustomRole>,
    /// Effective permission set.
    pub effective: BTreeSet<Permission>,
    /// Instant the access inputs were rewound to.
    pub as_of: Option<DateTime<Utc>>,
}

/// Unvalidated user creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserRequest {
    /// Display name.
    pub display_name: String,
    /// Email address.
    pub email: String,
    /// Initial fixed role.
    pub role: FixedRole,
    /// Initial overrides.
    pub permissions: Vec<Permission>,
}

/// Unvalidated custom role creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomRoleRequest {
    /// Role name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Ordered permissions.
    pub permissions: Vec<Permission>,
    /// Optional `#RRGGBB` color.
    pub color: Option<String>,
}

/// Partial custom role update; absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CustomRoleUpdate {
    /// New name.
    pub name: Option<String>,
    /// New description; an empty string clears it.
    pub description: Option<String>,
    /// New permission list.
    pub permissions: Option<Vec<Permission>>,
    /// New color.
    pub color: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// Audit listing filters with page-based pagination.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuditLogFilter {
    /// Restrict to one target user.
    pub target_user_id: Option<UserId>,
    /// Restrict to one actor.
    pub changed_by_id: Option<UserId>,
    /// Restrict to one action.
    pub action: Option<PermissionAuditAction>,
    /// Inclusive lower bound.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub end_date: Option<DateTime<Utc>>,
    /// One-based page number.
    pub page: Option<usize>,
    /// Rows per page.
    pub per_page: Option<usize>,
}

/// Application service for permission resolution, user access changes,
/// custom roles, and the permission audit log.
#[derive(Clone)]
pub struct PermissionService {
    users: Arc<dyn UserAccessRepository>,
    custom_roles: Arc<dyn CustomRoleRepository>,
    audit: Arc<dyn PermissionAuditRepository>,
    policy: ResolutionPolicy,
}

impl PermissionService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        users: Arc<dyn UserAccessRepository>,
        custom_roles: Arc<dyn CustomRoleRepository>,
        audit: Arc<dyn PermissionAuditRepository>,
        policy: ResolutionPolicy,
    ) -> Self {
        Self {
            users,
            custom_roles,
            audit,
            policy,
        }
    }

    /// Returns the configured resolution policy.
    #[must_use]
    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }
}
