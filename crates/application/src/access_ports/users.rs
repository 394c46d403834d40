use chrono::{DateTime, Utc};

use systicket_core::NonEmptyString;
use systicket_domain::{
    AccessState, EmailAddress, FixedRole, Permission, PermissionAuditRecord, UserId, UserStatus,
};

/// Origin of the request that triggered a mutation, stored on audit rows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestOrigin {
    /// Client address, first hop of `x-forwarded-for` when present.
    pub ip_address: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
}

/// User record projection relevant to access control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// User identifier.
    pub user_id: UserId,
    /// Display name.
    pub display_name: String,
    /// Unique email.
    pub email: String,
    /// Access inputs.
    pub access: AccessState,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserInput {
    /// Display name.
    pub display_name: NonEmptyString,
    /// Unique email.
    pub email: EmailAddress,
    /// Initial fixed role.
    pub role: FixedRole,
    /// Initial overrides.
    pub permissions: Vec<Permission>,
}

/// Optional filters for user listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UserListQuery {
    /// Restrict to one fixed role.
    pub role: Option<FixedRole>,
    /// Restrict to one lifecycle state.
    pub status: Option<UserStatus>,
}

/// Result of a committed access mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessMutationOutcome {
    /// User after the mutation.
    pub account: UserAccount,
    /// Audit row written in the same transaction.
    pub audit: PermissionAuditRecord,
}
