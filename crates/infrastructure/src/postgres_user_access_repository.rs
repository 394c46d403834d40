use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use systicket_application::{
    AccessMutationOutcome, CreateUserInput, RequestOrigin, UserAccessRepository, UserAccount,
    UserListQuery,
};
use systicket_core::{AppError, AppResult};
use systicket_domain::{
    AccessMutation, AccessState, AuditValue, CustomRoleId, CustomRoleRef, EmailAddress, FixedRole,
    PermissionAuditAction, UserId, UserStatus, parse_permissions,
};

use crate::postgres_permission_audit_repository::{PermissionAuditInsert, insert_permission_audit};


/// PostgreSQL-backed repository for users and their access inputs.
#[derive(Clone)]
pub struct PostgresUserAccessRepository {
    pool: PgPool,
}

impl PostgresUserAccessRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_ACCESS_COLUMNS: &str = r#"
    users.id,
    users.name,
    users.email,
    users.role,
    users.status,
    users.custom_role_id,
    custom_roles.name AS custom_role_name,
    users.permissions,
    users.created_at,
    users.updated_at
"#;

#[derive(Debug, FromRow)]
struct UserAccessRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    status: String,
    custom_role_id: Option<Uuid>,
    custom_role_name: Option<String>,
    permissions: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserAccessRow {
    fn into_account(self) -> AppResult<UserAccount> {
        let corrupt =
            |error: AppError| AppError::Internal(format!("user '{}' is corrupt: {error}", self.id));

        let role = FixedRole::from_str(self.role.as_str()).map_err(corrupt)?;
        let status = UserStatus::from_str(self.status.as_str()).map_err(corrupt)?;
        let permissions = parse_permissions(&self.permissions).map_err(corrupt)?;
        let custom_role = self.custom_role_id.map(|id| CustomRoleRef {
            id: CustomRoleId::from_uuid(id),
            name: self.custom_role_name.clone().unwrap_or_default(),
        });

        Ok(UserAccount {
            user_id: UserId::from_uuid(self.id),
            display_name: self.name,
            email: self.email,
            access: AccessState {
                role,
                custom_role,
                permissions,
                status,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn permission_values(state: &AccessState) -> Vec<String> {
    state
        .permissions
        .iter()
        .map(|permission| permission.as_str().to_owned())
        .collect()
}

fn map_user_write_error(error: sqlx::Error, context: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error {
        match database_error.code().as_deref() {
            Some("23505") => {
                return AppError::Conflict(format!("{context}: email already in use"));
            }
            Some("23503") => {
                return AppError::NotFound(format!("{context}: referenced custom role is gone"));
            }
            _ => {}
        }
    }

    AppError::Internal(format!("{context}: {error}"))
}

#[async_trait]
impl UserAccessRepository for PostgresUserAccessRepository {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserAccessRow>(&format!(
            r#"
            SELECT {USER_ACCESS_COLUMNS}
            FROM users
            LEFT JOIN custom_roles ON custom_roles.id = users.custom_role_id
            WHERE users.id = $1
            "#
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user '{user_id}': {error}")))?;

        row.map(UserAccessRow::into_account).transpose()
    }

    async fn find_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<UserAccount>> {
        let row = sqlx::query_as::<_, UserAccessRow>(&format!(
            r#"
            SELECT {USER_ACCESS_COLUMNS}
            FROM users
            LEFT JOIN custom_roles ON custom_roles.id = users.custom_role_id
            WHERE lower(users.email) = $1
            "#
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find user by email: {error}")))?;

        row.map(UserAccessRow::into_account).transpose()
    }

    async fn list_users(&self, query: UserListQuery) -> AppResult<Vec<UserAccount>> {
        let rows = sqlx::query_as::<_, UserAccessRow>(&format!(
            r#"
            SELECT {USER_ACCESS_COLUMNS}
            FROM users
            LEFT JOIN custom_roles ON custom_roles.id = users.custom_role_id
            WHERE ($1::TEXT IS NULL OR users.role = $1)
                AND ($2::TEXT IS NULL OR users.status = $2)
            ORDER BY users.name, users.id
            "#
        ))
        .bind(query.role.map(|role| role.as_str()))
        .bind(query.status.map(|status| status.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list users: {error}")))?;

        rows.into_iter().map(UserAccessRow::into_account).collect()
    }

    async fn create_user(
        &self,
        input: CreateUserInput,
        actor: UserId,
        origin: &RequestOrigin,
    ) -> AppResult<AccessMutationOutcome> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let user_id = UserId::new();
        let mut access = AccessState::for_role(input.role);
        access.permissions = input.permissions;

        let (created_at, updated_at) = sqlx::query_as::<_, (DateTime<Utc>, DateTime<Utc>)>(
            r#"
            INSERT INTO users (id, name, email, role, status, permissions)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING created_at, updated_at
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(input.display_name.as_str())
        .bind(input.email.as_str())
        .bind(access.role.as_str())
        .bind(access.status.as_str())
        .bind(permission_values(&access))
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_user_write_error(error, "failed to create user"))?;

        let snapshot = AuditValue::snapshot(&access);
        let audit = insert_permission_audit(
            &mut *transaction,
            PermissionAuditInsert {
                target_user_id: user_id,
                changed_by_id: actor,
                action: PermissionAuditAction::UserCreated,
                old_value: None,
                new_value: Some(&snapshot),
                origin,
            },
        )
        .await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(AccessMutationOutcome {
            account: UserAccount {
                user_id,
                display_name: input.display_name.into(),
                email: input.email.into(),
                access,
                created_at,
                updated_at,
            },
            audit,
        })
    }

    async fn apply_access_mutation(
        &self,
        user_id: UserId,
        mutation: &AccessMutation,
        actor: UserId,
        origin: &RequestOrigin,
    ) -> AppResult<AccessMutationOutcome> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        let current = sqlx::query_as::<_, UserAccessRow>(&format!(
            r#"
            SELECT {USER_ACCESS_COLUMNS}
            FROM users
            LEFT JOIN custom_roles ON custom_roles.id = users.custom_role_id
            WHERE users.id = $1
            FOR UPDATE OF users
            "#
        ))
        .bind(user_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock user '{user_id}': {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))?
        .into_account()?;

        let transition = mutation.apply(&current.access)?;
        let after = &transition.after;

        let updated_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            UPDATE users
            SET role = $2,
                status = $3,
                custom_role_id = $4,
                permissions = $5,
                updated_at = now()
            WHERE id = $1
            RETURNING updated_at
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(after.role.as_str())
        .bind(after.status.as_str())
        .bind(after.custom_role.as_ref().map(|role| role.id.as_uuid()))
        .bind(permission_values(after))
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_user_write_error(error, "failed to update user access"))?;

        let audit = insert_permission_audit(
            &mut *transaction,
            PermissionAuditInsert {
                target_user_id: user_id,
                changed_by_id: actor,
                action: transition.action,
                old_value: Some(&transition.old_value),
                new_value: Some(&transition.new_value),
                origin,
            },
        )
        .await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(AccessMutationOutcome {
            account: UserAccount {
                access: transition.after,
                updated_at,
                ..current
            },
            audit,
        })
    }
}
