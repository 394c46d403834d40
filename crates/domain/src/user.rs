//! User identity and the access-relevant slice of a user record.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use systicket_core::{AppError, AppResult};
use uuid::Uuid;

use crate::{CustomRoleId, FixedRole, Permission};

/// Maximum stored email length.
const EMAIL_MAX_LENGTH: usize = 255;

/// Unique identifier for a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID value.
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

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Lowercased email address with a basic `local@domain.tld` shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into().trim().to_lowercase();

        let Some((local, domain)) = value.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain '@'".to_owned(),
            ));
        };

        if local.is_empty() || domain.contains('@') {
            return Err(AppError::Validation(format!(
                "email address '{value}' is malformed"
            )));
        }

        if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
            return Err(AppError::Validation(format!(
                "email domain '{domain}' must contain a dot-separated host"
            )));
        }

        if value.len() > EMAIL_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "email address must not exceed {EMAIL_MAX_LENGTH} characters"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Account lifecycle state. Users are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// May sign in and act.
    Active,
    /// Disabled by an administrator.
    Inactive,
    /// Temporarily blocked.
    Suspended,
}

impl UserStatus {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Suspended => "suspended",
        }
    }
}

impl FromStr for UserStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "suspended" => Ok(Self::Suspended),
            _ => Err(AppError::Validation(format!(
                "unknown user status '{value}'"
            ))),
        }
    }
}

/// Reference to the custom role assigned to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRoleRef {
    /// Role identifier.
    pub id: CustomRoleId,
    /// Role name at assignment time.
    pub name: String,
}

/// Inputs of permission resolution stored on the user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessState {
    /// Fixed role.
    pub role: FixedRole,
    /// Optional custom role.
    pub custom_role: Option<CustomRoleRef>,
    /// Per-user permission overrides.
    pub permissions: Vec<Permission>,
    /// Lifecycle state.
    pub status: UserStatus,
}

impl AccessState {
    /// Creates an active state with no custom role and no overrides.
    #[must_use]
    pub fn for_role(role: FixedRole) -> Self {
        Self {
            role,
            custom_role: None,
            permissions: Vec::new(),
            status: UserStatus::Active,
        }
    }

    /// Returns whether the user may act.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{EmailAddress, UserStatus};

    #[test]
    fn email_is_lowercased_and_trimmed() {
        let email = EmailAddress::new("  Agent@SysTicket.Example ");
        assert_eq!(
            email.map(String::from).unwrap_or_default(),
            "agent@systicket.example"
        );
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for value in ["", "agent", "@example.com", "a@b@c.com", "a@example", "a@.com"] {
            assert!(EmailAddress::new(value).is_err(), "{value}");
        }
    }

    #[test]
    fn status_round_trips_storage_values() {
        for status in [UserStatus::Active, UserStatus::Inactive, UserStatus::Suspended] {
            assert!(matches!(UserStatus::from_str(status.as_str()), Ok(parsed) if parsed == status));
        }
        assert!(UserStatus::from_str("deleted").is_err());
    }
}
