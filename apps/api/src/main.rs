//! Sys-Ticket API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;
mod ticket_relay;

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use systicket_application::{PermissionService, TicketEventRelayService};
use systicket_core::AppError;
use systicket_infrastructure::{
    PostgresCustomRoleRepository, PostgresPermissionAuditRepository,
    PostgresUserAccessRepository, SchemaMigrationRunner,
};
use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use tracing::info;

use crate::api_config::{ApiCommand, ApiConfig, init_tracing};
use crate::state::AppState;
use crate::ticket_relay::TicketRelay;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    match config.command {
        ApiCommand::Migrate => {
            let applied = SchemaMigrationRunner::new(pool).run_pending().await?;
            info!(count = applied.len(), "database migrations applied successfully");
            return Ok(());
        }
        ApiCommand::MigrateRevert => {
            match SchemaMigrationRunner::new(pool).revert_latest().await? {
                Some(step) => info!(version = step.version, name = step.name, "migration reverted"),
                None => info!("no applied migration to revert"),
            }
            return Ok(());
        }
        ApiCommand::Serve => {}
    }

    serve(config, pool).await
}

async fn serve(config: ApiConfig, pool: PgPool) -> Result<(), AppError> {
    let session_store = PostgresStore::new(pool.clone())
        .with_table_name("tower_sessions")
        .map_err(|error| {
            AppError::Validation(format!("invalid session table name configuration: {error}"))
        })?;
    session_store.migrate().await.map_err(|error| {
        AppError::Internal(format!("failed to initialize session store: {error}"))
    })?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(config.cookie_secure)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(30)));

    let permission_service = PermissionService::new(
        Arc::new(PostgresUserAccessRepository::new(pool.clone())),
        Arc::new(PostgresCustomRoleRepository::new(pool.clone())),
        Arc::new(PostgresPermissionAuditRepository::new(pool)),
        config.resolution_policy,
    );

    let ticket_relay = TicketRelay::new();
    let ticket_event_relay_service =
        TicketEventRelayService::new(Arc::new(ticket_relay.clone()));

    let app_state = AppState {
        permission_service,
        ticket_event_relay_service,
        ticket_relay,
        bootstrap_token: config.bootstrap_token.clone(),
        internal_events_token: config.internal_events_token.clone(),
    };

    let app = api_router::build_router(app_state, &config.frontend_url, session_layer)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind API listener: {error}")))?;

    info!(
        %address,
        policy = ?config.resolution_policy,
        "systicket-api listening"
    );

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
