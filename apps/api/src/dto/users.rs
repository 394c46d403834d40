use serde::{Deserialize, Serialize};
use systicket_application::UserAccount;
use systicket_domain::AccessState;
use ts_rs::TS;

use super::permissions::permission_strings;

/// Access inputs of a user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-state-response.ts"
)]
pub struct AccessStateResponse {
    pub role: String,
    pub custom_role_id: Option<String>,
    pub custom_role_name: Option<String>,
    pub permissions: Vec<String>,
    pub status: String,
}

impl From<&AccessState> for AccessStateResponse {
    fn from(access: &AccessState) -> Self {
        Self {
            role: access.role.as_str().to_owned(),
            custom_role_id: access
                .custom_role
                .as_ref()
                .map(|reference| reference.id.to_string()),
            custom_role_name: access
                .custom_role
                .as_ref()
                .map(|reference| reference.name.clone()),
            permissions: permission_strings(&access.permissions),
            status: access.status.as_str().to_owned(),
        }
    }
}

/// API representation of a user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-response.ts"
)]
pub struct UserResponse {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub access: AccessStateResponse,
    pub created_at: String,
    pub updated_at: String,
}

impl From<UserAccount> for UserResponse {
    fn from(account: UserAccount) -> Self {
        Self {
            id: account.user_id.to_string(),
            access: AccessStateResponse::from(&account.access),
            display_name: account.display_name,
            email: account.email,
            created_at: account.created_at.to_rfc3339(),
            updated_at: account.updated_at.to_rfc3339(),
        }
    }
}

/// Incoming payload for user creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-user-request.ts"
)]
pub struct CreateUserRequest {
    pub display_name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Incoming payload for a lifecycle transition.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/set-user-status-request.ts"
)]
pub struct SetUserStatusRequest {
    pub status: String,
}

/// Filters of the user listing.
#[derive(Debug, Default, Deserialize)]
pub struct UserListFilter {
    pub role: Option<String>,
    pub status: Option<String>,
}
