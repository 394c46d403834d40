//! Reversible schema and data migrations applied on top of the SQL baseline.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::info;

use systicket_core::{AppError, AppResult};

mod add_company_info_to_service_desks;
mod add_queue_id_to_tickets;
mod business_hours_schedules;
mod seed_default_custom_roles;


pub use add_company_info_to_service_desks::AddCompanyInfoToServiceDesks;
pub use add_queue_id_to_tickets::AddQueueIdToTickets;
pub use business_hours_schedules::BusinessHoursSchedules;
pub use seed_default_custom_roles::SeedDefaultCustomRoles;

/// Serializes concurrent runners across processes.
const MIGRATION_LOCK_KEY: i64 = 0x5359_5354_4943_4b54;

/// One forward step with its exact inverse.
///
/// Both directions must succeed against a database that is already in the
/// target state.
#[async_trait]
pub trait SchemaMigration: Send + Sync {
    /// Millisecond timestamp that orders the migration.
    fn version(&self) -> i64;

    /// Human readable name recorded with the version.
    fn name(&self) -> &'static str;

    /// Applies the migration.
    async fn up(&self, connection: &mut PgConnection) -> AppResult<()>;

    /// Reverts the migration.
    async fn down(&self, connection: &mut PgConnection) -> AppResult<()>;
}

/// Version and name of a migration the runner applied or reverted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStep {
    /// Migration version.
    pub version: i64,
    /// Migration name.
    pub name: &'static str,
}

/// Returns the built-in migrations in version order.
#[must_use]
pub fn default_migrations() -> Vec<Box<dyn SchemaMigration>> {
    vec![
        Box::new(AddQueueIdToTickets),
        Box::new(AddCompanyInfoToServiceDesks),
        Box::new(BusinessHoursSchedules),
        Box::new(SeedDefaultCustomRoles),
    ]
}

/// Applies and reverts [`SchemaMigration`]s, tracking them in
/// `systicket_schema_migrations`.
pub struct SchemaMigrationRunner {
    pool: PgPool,
    migrations: Vec<Box<dyn SchemaMigration>>,
}

impl SchemaMigrationRunner {
    /// Creates a runner over the built-in migrations.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self::with_migrations(pool, default_migrations())
    }

    /// Creates a runner over `migrations`, ordered by version.
    #[must_use]
    pub fn with_migrations(pool: PgPool, mut migrations: Vec<Box<dyn SchemaMigration>>) -> Self {
        migrations.sort_by_key(|migration| migration.version());
        Self { pool, migrations }
    }

    /// Applies every migration not yet recorded, each in its own transaction.
    pub async fn run_pending(&self) -> AppResult<Vec<MigrationStep>> {
        self.ensure_tracking_table().await?;

        let mut applied = Vec::new();
        for migration in &self.migrations {
            let mut transaction = self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin migration transaction: {error}"))
            })?;
            lock(&mut *transaction).await?;

            let already_applied = sqlx::query_scalar::<_, bool>(
                r#"
                SELECT EXISTS (
                    SELECT 1 FROM systicket_schema_migrations WHERE version = $1
                )
                "#,
            )
            .bind(migration.version())
            .fetch_one(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to read migration '{}' state: {error}",
                    migration.version()
                ))
            })?;

            if already_applied {
                transaction.commit().await.map_err(|error| {
                    AppError::Internal(format!("failed to commit migration check: {error}"))
                })?;
                continue;
            }

            migration.up(&mut *transaction).await?;

            sqlx::query(
                r#"
                INSERT INTO systicket_schema_migrations (version, name)
                VALUES ($1, $2)
                "#,
            )
            .bind(migration.version())
            .bind(migration.name())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to record migration '{}': {error}",
                    migration.version()
                ))
            })?;

            transaction.commit().await.map_err(|error| {
                AppError::Internal(format!(
                    "failed to commit migration '{}': {error}",
                    migration.version()
                ))
            })?;

            info!(
                version = migration.version(),
                name = migration.name(),
                "applied schema migration"
            );
            applied.push(MigrationStep {
                version: migration.version(),
                name: migration.name(),
            });
        }

        Ok(applied)
    }

    /// Reverts the most recently applied migration, if any.
    pub async fn revert_latest(&self) -> AppResult<Option<MigrationStep>> {
        self.ensure_tracking_table().await?;

        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin migration transaction: {error}"))
        })?;
        lock(&mut *transaction).await?;

        let latest = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT version
            FROM systicket_schema_migrations
            ORDER BY version DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to read latest migration: {error}"))
        })?;

        let Some(version) = latest else {
            return Ok(None);
        };

        let migration = self
            .migrations
            .iter()
            .find(|migration| migration.version() == version)
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "applied migration '{version}' is not known to this binary"
                ))
            })?;

        migration.down(&mut *transaction).await?;

        sqlx::query("DELETE FROM systicket_schema_migrations WHERE version = $1")
            .bind(version)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to unrecord migration '{version}': {error}"
                ))
            })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit revert of '{version}': {error}"))
        })?;

        info!(version, name = migration.name(), "reverted schema migration");
        Ok(Some(MigrationStep {
            version,
            name: migration.name(),
        }))
    }

    /// Lists recorded versions in ascending order.
    pub async fn applied_versions(&self) -> AppResult<Vec<i64>> {
        self.ensure_tracking_table().await?;

        sqlx::query_scalar::<_, i64>(
            "SELECT version FROM systicket_schema_migrations ORDER BY version",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list migrations: {error}")))
    }

    async fn ensure_tracking_table(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS systicket_schema_migrations (
                version BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(|error| {
            AppError::Internal(format!("failed to create migration tracking table: {error}"))
        })
    }
}

async fn lock(connection: &mut PgConnection) -> AppResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(connection)
        .await
        .map(|_| ())
        .map_err(|error| AppError::Internal(format!("failed to acquire migration lock: {error}")))
}

/// Runs each statement in order on `connection`.
async fn execute_all(
    connection: &mut PgConnection,
    statements: &[&str],
    context: &str,
) -> AppResult<()> {
    for statement in statements.iter().copied() {
        sqlx::query(statement)
            .execute(&mut *connection)
            .await
            .map_err(|error| AppError::Internal(format!("{context}: {error}")))?;
    }

    Ok(())
}
