mod audit;
mod custom_roles;
mod repositories;
mod users;

pub use audit::{PermissionAuditPage, PermissionAuditQuery};
pub use custom_roles::CreateCustomRoleInput;
pub use repositories::{CustomRoleRepository, PermissionAuditRepository, UserAccessRepository};
pub use users::{AccessMutationOutcome, CreateUserInput, RequestOrigin, UserAccount, UserListQuery};
