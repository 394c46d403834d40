use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use systicket_application::{
    PermissionAuditPage, PermissionAuditQuery, PermissionAuditRepository, RequestOrigin,
};
use systicket_core::{AppError, AppResult};
use systicket_domain::{AuditValue, PermissionAuditAction, PermissionAuditRecord, UserId};


/// PostgreSQL-backed repository for permission audit rows.
#[derive(Clone)]
pub struct PostgresPermissionAuditRepository {
    pool: PgPool,
}

impl PostgresPermissionAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionAuditRow {
    id: Uuid,
    target_user_id: Uuid,
    changed_by_id: Uuid,
    action: String,
    old_value: Option<serde_json::Value>,
    new_value: Option<serde_json::Value>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    created_at: DateTime<Utc>,
}

impl PermissionAuditRow {
    fn into_record(self) -> AppResult<PermissionAuditRecord> {
        let action = PermissionAuditAction::from_str(self.action.as_str()).map_err(|error| {
            AppError::Internal(format!("audit row '{}' is corrupt: {error}", self.id))
        })?;
        let parse_value = |value: Option<serde_json::Value>| {
            value
                .as_ref()
                .map(AuditValue::from_json)
                .transpose()
                .map_err(|error| {
                    AppError::Internal(format!("audit row '{}' is corrupt: {error}", self.id))
                })
        };

        Ok(PermissionAuditRecord {
            id: self.id,
            target_user_id: UserId::from_uuid(self.target_user_id),
            changed_by_id: UserId::from_uuid(self.changed_by_id),
            action,
            old_value: parse_value(self.old_value)?,
            new_value: parse_value(self.new_value)?,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            created_at: self.created_at,
        })
    }
}

/// Audit row to append inside a caller-owned transaction.
pub(crate) struct PermissionAuditInsert<'a> {
    pub target_user_id: UserId,
    pub changed_by_id: UserId,
    pub action: PermissionAuditAction,
    pub old_value: Option<&'a AuditValue>,
    pub new_value: Option<&'a AuditValue>,
    pub origin: &'a RequestOrigin,
}

/// Appends one audit row on `connection` and returns it as stored.
pub(crate) async fn insert_permission_audit(
    connection: &mut PgConnection,
    insert: PermissionAuditInsert<'_>,
) -> AppResult<PermissionAuditRecord> {
    let row = sqlx::query_as::<_, PermissionAuditRow>(
        r#"
        INSERT INTO permission_audit_logs (
            id,
            target_user_id,
            changed_by_id,
            action,
            old_value,
            new_value,
            ip_address,
            user_agent
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING
            id,
            target_user_id,
            changed_by_id,
            action,
            old_value,
            new_value,
            ip_address,
            user_agent,
            created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(insert.target_user_id.as_uuid())
    .bind(insert.changed_by_id.as_uuid())
    .bind(insert.action.as_str())
    .bind(insert.old_value.map(AuditValue::to_json))
    .bind(insert.new_value.map(AuditValue::to_json))
    .bind(insert.origin.ip_address.as_deref().map(truncate_ip_address))
    .bind(insert.origin.user_agent.as_deref())
    .fetch_one(connection)
    .await
    .map_err(|error| AppError::Internal(format!("failed to append permission audit: {error}")))?;

    row.into_record()
}

fn truncate_ip_address(value: &str) -> String {
    value.chars().take(45).collect()
}

#[async_trait]
impl PermissionAuditRepository for PostgresPermissionAuditRepository {
    async fn list_audit_entries(
        &self,
        query: PermissionAuditQuery,
    ) -> AppResult<PermissionAuditPage> {
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);
        let target_user_id = query.target_user_id.map(|user_id| user_id.as_uuid());
        let changed_by_id = query.changed_by_id.map(|user_id| user_id.as_uuid());
        let action = query.action.map(|action| action.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM permission_audit_logs
            WHERE ($1::UUID IS NULL OR target_user_id = $1)
                AND ($2::UUID IS NULL OR changed_by_id = $2)
                AND ($3::TEXT IS NULL OR action = $3)
                AND ($4::TIMESTAMPTZ IS NULL OR created_at >= $4)
                AND ($5::TIMESTAMPTZ IS NULL OR created_at <= $5)
            "#,
        )
        .bind(target_user_id)
        .bind(changed_by_id)
        .bind(action)
        .bind(query.start_date)
        .bind(query.end_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to count permission audit: {error}")))?;

        let rows = sqlx::query_as::<_, PermissionAuditRow>(
            r#"
            SELECT
                id,
                target_user_id,
                changed_by_id,
                action,
                old_value,
                new_value,
                ip_address,
                user_agent,
                created_at
            FROM permission_audit_logs
            WHERE ($1::UUID IS NULL OR target_user_id = $1)
                AND ($2::UUID IS NULL OR changed_by_id = $2)
                AND ($3::TEXT IS NULL OR action = $3)
                AND ($4::TIMESTAMPTZ IS NULL OR created_at >= $4)
                AND ($5::TIMESTAMPTZ IS NULL OR created_at <= $5)
            ORDER BY created_at DESC, id DESC
            LIMIT $6
            OFFSET $7
            "#,
        )
        .bind(target_user_id)
        .bind(changed_by_id)
        .bind(action)
        .bind(query.start_date)
        .bind(query.end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list permission audit: {error}")))?;

        let entries = rows
            .into_iter()
            .map(PermissionAuditRow::into_record)
            .collect::<AppResult<Vec<_>>>()?;

        Ok(PermissionAuditPage {
            entries,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn list_user_audit_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<PermissionAuditRecord>> {
        let rows = sqlx::query_as::<_, PermissionAuditRow>(
            r#"
            SELECT
                id,
                target_user_id,
                changed_by_id,
                action,
                old_value,
                new_value,
                ip_address,
                user_agent,
                created_at
            FROM permission_audit_logs
            WHERE target_user_id = $1
                AND created_at > $2
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to list permission audit for user '{user_id}': {error}"
            ))
        })?;

        rows.into_iter()
            .map(PermissionAuditRow::into_record)
            .collect()
    }
}
