use async_trait::async_trait;
use chrono::{DateTime, Utc};

use systicket_core::AppResult;
use systicket_domain::{
    AccessMutation, CustomRole, CustomRoleId, EmailAddress, PermissionAuditRecord, UserId,
};

use super::audit::{PermissionAuditPage, PermissionAuditQuery};
use super::custom_roles::CreateCustomRoleInput;
use super::users::{
    AccessMutationOutcome, CreateUserInput, RequestOrigin, UserAccount, UserListQuery,
};

/// Repository port for users and their access inputs.
///
/// Writes must persist the change and its audit row atomically.
#[async_trait]
pub trait UserAccessRepository: Send + Sync {
    /// Finds a user by id.
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserAccount>>;

    /// Finds a user by email.
    async fn find_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<UserAccount>>;

    /// Lists users ordered by display name.
    async fn list_users(&self, query: UserListQuery) -> AppResult<Vec<UserAccount>>;

    /// Creates a user and appends its `user_created` audit row.
    async fn create_user(
        &self,
        input: CreateUserInput,
        actor: UserId,
        origin: &RequestOrigin,
    ) -> AppResult<AccessMutationOutcome>;

    /// Locks the user row, applies `mutation`, and appends one audit row.
    async fn apply_access_mutation(
        &self,
        user_id: UserId,
        mutation: &AccessMutation,
        actor: UserId,
        origin: &RequestOrigin,
    ) -> AppResult<AccessMutationOutcome>;
}

/// Repository port for custom roles.
#[async_trait]
pub trait CustomRoleRepository: Send + Sync {
    /// Lists roles ordered by name.
    async fn list_custom_roles(&self, include_inactive: bool) -> AppResult<Vec<CustomRole>>;

    /// Finds a role by id.
    async fn find_custom_role(&self, role_id: CustomRoleId) -> AppResult<Option<CustomRole>>;

    /// Finds a role by exact name.
    async fn find_custom_role_by_name(&self, name: &str) -> AppResult<Option<CustomRole>>;

    /// Creates a role.
    async fn create_custom_role(
        &self,
        input: CreateCustomRoleInput,
        created_by: UserId,
    ) -> AppResult<CustomRole>;

    /// Persists the mutable fields of an existing role and refreshes `updated_at`.
    async fn update_custom_role(&self, role: &CustomRole) -> AppResult<CustomRole>;
}

/// Repository port for reading the permission audit log.
#[async_trait]
pub trait PermissionAuditRepository: Send + Sync {
    /// Lists audit rows matching `query`, newest first.
    async fn list_audit_entries(
        &self,
        query: PermissionAuditQuery,
    ) -> AppResult<PermissionAuditPage>;

    /// Lists every audit row of `user_id` newer than `since`.
    async fn list_user_audit_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<PermissionAuditRecord>>;
}
