//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod postgres_custom_role_repository;
mod postgres_permission_audit_repository;
mod postgres_user_access_repository;
mod schema_migrations;

pub use postgres_custom_role_repository::PostgresCustomRoleRepository;
pub use postgres_permission_audit_repository::PostgresPermissionAuditRepository;
pub use postgres_user_access_repository::PostgresUserAccessRepository;
pub use schema_migrations::{
    AddCompanyInfoToServiceDesks, AddQueueIdToTickets, BusinessHoursSchedules, MigrationStep,
    SchemaMigration, SchemaMigrationRunner, SeedDefaultCustomRoles, default_migrations,
};
