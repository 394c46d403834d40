use systicket_core::NonEmptyString;
use systicket_domain::{Permission, RoleColor};

/// Validated input for creating a custom role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCustomRoleInput {
    /// Unique role name.
    pub name: NonEmptyString,
    /// Optional description.
    pub description: Option<String>,
    /// Ordered permissions.
    pub permissions: Vec<Permission>,
    /// Display color.
    pub color: RoleColor,
}
