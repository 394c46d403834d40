use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use systicket_core::{AppError, AppResult};
use systicket_domain::FixedRole;
use tracing::warn;

use super::SchemaMigration;

/// Seeds one custom role per non-admin fixed role.
pub struct SeedDefaultCustomRoles;

/// A custom role inserted by the seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DefaultRoleSeed {
    pub name: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    /// Fixed role whose defaults become the seeded permissions.
    pub mirrors: FixedRole,
}

impl DefaultRoleSeed {
    pub(crate) fn permission_values(&self) -> Vec<String> {
        self.mirrors
            .default_permissions()
            .iter()
            .map(|permission| permission.as_str().to_owned())
            .collect()
    }
}

pub(crate) const DEFAULT_ROLE_SEEDS: [DefaultRoleSeed; 3] = [
    DefaultRoleSeed {
        name: "Gerente",
        description: "Perfil de gerente com acesso gerencial e operacional",
        color: "#10B981",
        mirrors: FixedRole::Manager,
    },
    DefaultRoleSeed {
        name: "Agente",
        description: "Perfil de agente/tecnico operacional",
        color: "#3B82F6",
        mirrors: FixedRole::Agent,
    },
    DefaultRoleSeed {
        name: "Cliente",
        description: "Perfil de cliente com acesso limitado aos proprios recursos",
        color: "#8B5CF6",
        mirrors: FixedRole::Client,
    },
];

/// Returns the seeds whose names are not in `existing_names`.
pub(crate) fn plan_seed(existing_names: &[String]) -> Vec<DefaultRoleSeed> {
    DEFAULT_ROLE_SEEDS
        .into_iter()
        .filter(|seed| !existing_names.iter().any(|name| name == seed.name))
        .collect()
}

fn seed_names() -> Vec<&'static str> {
    DEFAULT_ROLE_SEEDS.iter().map(|seed| seed.name).collect()
}

#[async_trait]
impl SchemaMigration for SeedDefaultCustomRoles {
    fn version(&self) -> i64 {
        1_738_500_000_000
    }

    fn name(&self) -> &'static str {
        "seed_default_custom_roles"
    }

    async fn up(&self, connection: &mut PgConnection) -> AppResult<()> {
        let existing = sqlx::query_scalar::<_, String>(
            "SELECT name FROM custom_roles WHERE name = ANY($1)",
        )
        .bind(seed_names())
        .fetch_all(&mut *connection)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read seeded roles: {error}")))?;

        for seed in plan_seed(&existing) {
            sqlx::query(
                r#"
                INSERT INTO custom_roles (id, name, description, permissions, color, is_active)
                VALUES ($1, $2, $3, $4, $5, true)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(seed.name)
            .bind(seed.description)
            .bind(seed.permission_values())
            .bind(seed.color)
            .execute(&mut *connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to seed custom role '{}': {error}", seed.name))
            })?;
        }

        Ok(())
    }

    async fn down(&self, connection: &mut PgConnection) -> AppResult<()> {
        let still_assigned = sqlx::query_scalar::<_, String>(
            r#"
            SELECT name
            FROM custom_roles
            WHERE name = ANY($1)
                AND created_by_id IS NULL
                AND EXISTS (SELECT 1 FROM users WHERE users.custom_role_id = custom_roles.id)
            ORDER BY name
            "#,
        )
        .bind(seed_names())
        .fetch_all(&mut *connection)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read assigned roles: {error}")))?;

        if !still_assigned.is_empty() {
            warn!(
                roles = ?still_assigned,
                "keeping seeded custom roles that are still assigned to users"
            );
        }

        // Deleting an assigned role would clear users.custom_role_id without an audit row.
        sqlx::query(
            r#"
            DELETE FROM custom_roles
            WHERE name = ANY($1)
                AND created_by_id IS NULL
                AND NOT EXISTS (SELECT 1 FROM users WHERE users.custom_role_id = custom_roles.id)
            "#,
        )
        .bind(seed_names())
        .execute(&mut *connection)
        .await
        .map(|_| ())
        .map_err(|error| AppError::Internal(format!("failed to remove seeded roles: {error}")))
    }
}
