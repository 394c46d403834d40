mod common;
mod permissions;
mod ticket_events;
mod users;

pub use common::{BootstrapRequest, HealthResponse, UserIdentityResponse};
pub use permissions::{
    AssignCustomRoleRequest, AuditLogQuery, CreateCustomRoleRequest, CustomRoleListQuery,
    CustomRoleResponse, PermissionAuditEntryResponse, PermissionAuditPageResponse,
    PermissionCatalogResponse, SetUserRoleRequest, UpdateCustomRoleRequest,
    UserPermissionsQuery, UserPermissionsRequest, UserPermissionsResponse, role_defaults,
};
pub use ticket_events::{RelayReceiptResponse, TicketEventRequest};
pub use users::{
    AccessStateResponse, CreateUserRequest, SetUserStatusRequest, UserListFilter, UserResponse,
};
