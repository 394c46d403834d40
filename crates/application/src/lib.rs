//! Application services and ports.

#![forbid(unsafe_code)]

mod access_ports;
mod permission_service;
mod ticket_event_relay;

pub use access_ports::{
    AccessMutationOutcome, CreateCustomRoleInput, CreateUserInput, CustomRoleRepository,
    PermissionAuditPage, PermissionAuditQuery, PermissionAuditRepository, RequestOrigin,
    UserAccessRepository, UserAccount, UserListQuery,
};
pub use permission_service::{
    AUDIT_DEFAULT_PER_PAGE, AUDIT_MAX_PER_PAGE, AuditLogFilter, CreateUserRequest,
    CustomRoleRequest, CustomRoleUpdate, PermissionService, UserPermissions,
};
pub use ticket_event_relay::{RelayReceipt, TicketEventPublisher, TicketEventRelayService};
