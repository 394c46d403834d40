use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use systicket_application::{CreateCustomRoleInput, CustomRoleRepository};
use systicket_core::{AppError, AppResult};
use systicket_domain::{CustomRole, CustomRoleId, RoleColor, UserId, parse_permissions};


/// PostgreSQL-backed repository for custom roles.
#[derive(Clone)]
pub struct PostgresCustomRoleRepository {
    pool: PgPool,
}

impl PostgresCustomRoleRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CustomRoleRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    permissions: Vec<String>,
    color: String,
    is_active: bool,
    created_by_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CustomRoleRow {
    fn into_role(self) -> AppResult<CustomRole> {
        let corrupt = |error: AppError| {
            AppError::Internal(format!("custom role '{}' is corrupt: {error}", self.id))
        };

        CustomRole::new(
            CustomRoleId::from_uuid(self.id),
            self.name,
            self.description,
            parse_permissions(&self.permissions).map_err(corrupt)?,
            RoleColor::new(self.color).map_err(corrupt)?,
            self.is_active,
            self.created_by_id.map(UserId::from_uuid),
            self.created_at,
            self.updated_at,
        )
        .map_err(corrupt)
    }
}

fn permission_values(role_permissions: &[systicket_domain::Permission]) -> Vec<String> {
    role_permissions
        .iter()
        .map(|permission| permission.as_str().to_owned())
        .collect()
}

fn map_role_write_error(error: sqlx::Error, role_name: &str, context: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("custom role '{role_name}' already exists"));
    }

    AppError::Internal(format!("{context}: {error}"))
}

#[async_trait]
impl CustomRoleRepository for PostgresCustomRoleRepository {
    async fn list_custom_roles(&self, include_inactive: bool) -> AppResult<Vec<CustomRole>> {
        let rows = sqlx::query_as::<_, CustomRoleRow>(
            r#"
            SELECT
                id,
                name,
                description,
                permissions,
                color,
                is_active,
                created_by_id,
                created_at,
                updated_at
            FROM custom_roles
            WHERE $1 OR is_active
            ORDER BY name
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list custom roles: {error}")))?;

        rows.into_iter().map(CustomRoleRow::into_role).collect()
    }

    async fn find_custom_role(&self, role_id: CustomRoleId) -> AppResult<Option<CustomRole>> {
        let row = sqlx::query_as::<_, CustomRoleRow>(
            r#"
            SELECT
                id,
                name,
                description,
                permissions,
                color,
                is_active,
                created_by_id,
                created_at,
                updated_at
            FROM custom_roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find custom role '{role_id}': {error}"))
        })?;

        row.map(CustomRoleRow::into_role).transpose()
    }

    async fn find_custom_role_by_name(&self, name: &str) -> AppResult<Option<CustomRole>> {
        let row = sqlx::query_as::<_, CustomRoleRow>(
            r#"
            SELECT
                id,
                name,
                description,
                permissions,
                color,
                is_active,
                created_by_id,
                created_at,
                updated_at
            FROM custom_roles
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find custom role '{name}': {error}"))
        })?;

        row.map(CustomRoleRow::into_role).transpose()
    }

    async fn create_custom_role(
        &self,
        input: CreateCustomRoleInput,
        created_by: UserId,
    ) -> AppResult<CustomRole> {
        let row = sqlx::query_as::<_, CustomRoleRow>(
            r#"
            INSERT INTO custom_roles (
                id,
                name,
                description,
                permissions,
                color,
                is_active,
                created_by_id
            )
            VALUES ($1, $2, $3, $4, $5, true, $6)
            RETURNING
                id,
                name,
                description,
                permissions,
                color,
                is_active,
                created_by_id,
                created_at,
                updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.name.as_str())
        .bind(input.description.as_deref())
        .bind(permission_values(&input.permissions))
        .bind(input.color.as_str())
        .bind(created_by.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            map_role_write_error(error, input.name.as_str(), "failed to create custom role")
        })?;

        row.into_role()
    }

    async fn update_custom_role(&self, role: &CustomRole) -> AppResult<CustomRole> {
        let row = sqlx::query_as::<_, CustomRoleRow>(
            r#"
            UPDATE custom_roles
            SET name = $2,
                description = $3,
                permissions = $4,
                color = $5,
                is_active = $6,
                updated_at = now()
            WHERE id = $1
            RETURNING
                id,
                name,
                description,
                permissions,
                color,
                is_active,
                created_by_id,
                created_at,
                updated_at
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(role.name().as_str())
        .bind(role.description())
        .bind(permission_values(role.permissions()))
        .bind(role.color().as_str())
        .bind(role.is_active())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            map_role_write_error(error, role.name().as_str(), "failed to update custom role")
        })?
        .ok_or_else(|| AppError::NotFound(format!("custom role '{}' does not exist", role.id())))?;

        row.into_role()
    }
}
