//! Fixed roles, their default permission tables, and custom roles.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use systicket_core::{AppError, AppResult, NonEmptyString};
use uuid::Uuid;

use crate::{Permission, UserId};

/// Maximum custom role name length.
pub const CUSTOM_ROLE_NAME_MAX_LENGTH: usize = 100;

/// Color assigned to custom roles created without one.
pub const DEFAULT_ROLE_COLOR: &str = "#6B7280";

/// Built-in role every user carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedRole {
    /// Full access.
    Admin,
    /// Managerial and operational access.
    Manager,
    /// Operational access.
    Agent,
    /// Limited access to own tickets.
    Client,
}

const MANAGER_DEFAULTS: &[Permission] = &[
    Permission::TicketsCreate,
    Permission::TicketsRead,
    Permission::TicketsReadAll,
    Permission::TicketsUpdate,
    Permission::TicketsDelete,
    Permission::TicketsAssign,
    Permission::TicketsTransfer,
    Permission::TicketsClose,
    Permission::TicketsReopen,
    Permission::UsersRead,
    Permission::UsersUpdate,
    Permission::RolesRead,
    Permission::QueuesRead,
    Permission::QueuesCreate,
    Permission::QueuesUpdate,
    Permission::QueuesManageMembers,
    Permission::ClientsCreate,
    Permission::ClientsRead,
    Permission::ClientsUpdate,
    Permission::ResourcesCreate,
    Permission::ResourcesRead,
    Permission::ResourcesUpdate,
    Permission::LicensesCreate,
    Permission::LicensesRead,
    Permission::LicensesUpdate,
    Permission::SettingsRead,
    Permission::ReportsView,
    Permission::ReportsExport,
    Permission::ServiceDesksRead,
    Permission::SlaRead,
    Permission::SlaUpdate,
    Permission::TimesheetsCreate,
    Permission::TimesheetsRead,
    Permission::TimesheetsReadAll,
    Permission::TimesheetsUpdate,
    Permission::TimesheetsApprove,
    Permission::NotificationsRead,
    Permission::NotificationsManage,
    Permission::ServiceCatalogRead,
    Permission::ServiceCatalogCreate,
    Permission::ServiceCatalogUpdate,
    Permission::DownloadsRead,
];

const AGENT_DEFAULTS: &[Permission] = &[
    Permission::TicketsCreate,
    Permission::TicketsRead,
    Permission::TicketsReadAssigned,
    Permission::TicketsUpdate,
    Permission::TicketsClose,
    Permission::UsersRead,
    Permission::QueuesRead,
    Permission::ClientsRead,
    Permission::ResourcesRead,
    Permission::LicensesRead,
    Permission::ServiceDesksRead,
    Permission::TimesheetsCreate,
    Permission::TimesheetsRead,
    Permission::TimesheetsUpdate,
    Permission::NotificationsRead,
    Permission::ServiceCatalogRead,
    Permission::DownloadsRead,
];

const CLIENT_DEFAULTS: &[Permission] = &[
    Permission::TicketsCreate,
    Permission::TicketsReadOwn,
    Permission::TicketsUpdate,
    Permission::ResourcesRead,
    Permission::NotificationsRead,
];

impl FixedRole {
    /// Returns every fixed role.
    #[must_use]
    pub fn all() -> [Self; 4] {
        [Self::Admin, Self::Manager, Self::Agent, Self::Client]
    }

    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Agent => "agent",
            Self::Client => "client",
        }
    }

    /// Returns the default permissions granted by this role.
    #[must_use]
    pub fn default_permissions(&self) -> &'static [Permission] {
        match self {
            Self::Admin => Permission::all(),
            Self::Manager => MANAGER_DEFAULTS,
            Self::Agent => AGENT_DEFAULTS,
            Self::Client => CLIENT_DEFAULTS,
        }
    }
}

impl FromStr for FixedRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "agent" => Ok(Self::Agent),
            "client" => Ok(Self::Client),
            _ => Err(AppError::Validation(format!("unknown role '{value}'"))),
        }
    }
}

impl std::fmt::Display for FixedRole {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Unique identifier for a custom role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomRoleId(Uuid);

impl CustomRoleId {
    /// Creates a new random custom role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for CustomRoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CustomRoleId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Display color in `#RRGGBB` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleColor(String);

impl RoleColor {
    /// Creates a validated hex color.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        let valid = trimmed.len() == 7
            && trimmed.starts_with('#')
            && trimmed[1..].chars().all(|character| character.is_ascii_hexdigit());

        if !valid {
            return Err(AppError::Validation(format!(
                "color must be a hex value like #RRGGBB, got '{trimmed}'"
            )));
        }

        Ok(Self(trimmed.to_uppercase()))
    }

    /// Returns the color string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for RoleColor {
    fn default() -> Self {
        Self(DEFAULT_ROLE_COLOR.to_owned())
    }
}

/// Named permission bundle that can be attached to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomRole {
    id: CustomRoleId,
    name: NonEmptyString,
    description: Option<String>,
    permissions: Vec<Permission>,
    color: RoleColor,
    is_active: bool,
    created_by: Option<UserId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomRole {
    /// Creates a validated custom role.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: CustomRoleId,
        name: impl Into<String>,
        description: Option<String>,
        permissions: Vec<Permission>,
        color: RoleColor,
        is_active: bool,
        created_by: Option<UserId>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        let name = NonEmptyString::bounded(name, "role name", CUSTOM_ROLE_NAME_MAX_LENGTH)?;
        let description = description
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        let mut unique = Vec::with_capacity(permissions.len());
        for permission in permissions {
            if !unique.contains(&permission) {
                unique.push(permission);
            }
        }

        Ok(Self {
            id,
            name,
            description,
            permissions: unique,
            color,
            is_active,
            created_by,
            created_at,
            updated_at,
        })
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> CustomRoleId {
        self.id
    }

    /// Returns the role name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the ordered permission list.
    #[must_use]
    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    /// Returns the display color.
    #[must_use]
    pub fn color(&self) -> &RoleColor {
        &self.color
    }

    /// Returns whether the role is active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns the creator, absent for seeded roles.
    #[must_use]
    pub fn created_by(&self) -> Option<UserId> {
        self.created_by
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
