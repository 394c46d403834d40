//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access_mutation;
mod access_resolution;
mod audit;
mod permission;
mod role;
mod ticket_event;
mod user;

pub use access_mutation::{AccessMutation, AccessTransition};
pub use access_resolution::{
    CustomRoleMode, InactiveCustomRolePolicy, ResolutionPolicy, has_all_permissions,
    has_any_permission, resolve_effective_permissions,
};
pub use audit::{
    AuditValue, CustomRoleSlot, PermissionAuditAction, PermissionAuditRecord,
    rewind_access_state,
};
pub use permission::{Permission, PermissionModule, parse_permissions};
pub use role::{
    CUSTOM_ROLE_NAME_MAX_LENGTH, CustomRole, CustomRoleId, DEFAULT_ROLE_COLOR, FixedRole,
    RoleColor,
};
pub use ticket_event::{TICKET_FIELD_WHITELIST, TicketEvent, TicketSnapshot};
pub use user::{AccessState, CustomRoleRef, EmailAddress, UserId, UserStatus};
