use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use systicket_core::AppError;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;
use tower_sessions_sqlx_store::PostgresStore;

use crate::state::AppState;
use crate::{auth, handlers, middleware, ticket_relay};

mod cors;

pub fn build_router(
    app_state: AppState,
    frontend_url: &str,
    session_layer: SessionManagerLayer<PostgresStore>,
) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/v1/permissions/all",
            get(handlers::permissions::all_permissions_handler),
        )
        .route(
            "/v1/permissions/roles/defaults",
            get(handlers::permissions::role_defaults_handler),
        )
        .route(
            "/v1/permissions/roles",
            get(handlers::permissions::list_custom_roles_handler)
                .post(handlers::permissions::create_custom_role_handler),
        )
        .route(
            "/v1/permissions/roles/{role_id}",
            get(handlers::permissions::get_custom_role_handler)
                .patch(handlers::permissions::update_custom_role_handler)
                .delete(handlers::permissions::deactivate_custom_role_handler),
        )
        .route(
            "/v1/permissions/me",
            get(handlers::permissions::my_permissions_handler),
        )
        .route(
            "/v1/permissions/user/{user_id}",
            get(handlers::permissions::user_permissions_handler),
        )
        .route(
            "/v1/permissions/user/{user_id}/role",
            put(handlers::permissions::set_user_role_handler),
        )
        .route(
            "/v1/permissions/user/{user_id}/permissions",
            put(handlers::permissions::replace_permissions_handler),
        )
        .route(
            "/v1/permissions/user/{user_id}/permissions/grant",
            post(handlers::permissions::grant_permissions_handler),
        )
        .route(
            "/v1/permissions/user/{user_id}/permissions/revoke",
            post(handlers::permissions::revoke_permissions_handler),
        )
        .route(
            "/v1/permissions/user/{user_id}/custom-role",
            put(handlers::permissions::assign_custom_role_handler)
                .delete(handlers::permissions::remove_custom_role_handler),
        )
        .route(
            "/v1/permissions/audit",
            get(handlers::permissions::list_audit_handler),
        )
        .route(
            "/v1/users",
            get(handlers::users::list_users_handler).post(handlers::users::create_user_handler),
        )
        .route("/v1/users/{user_id}", get(handlers::users::get_user_handler))
        .route(
            "/v1/users/{user_id}/status",
            put(handlers::users::set_user_status_handler),
        )
        .route("/tickets", get(ticket_relay::tickets_socket_handler))
        .route_layer(from_fn(middleware::require_auth));

    let internal_routes = Router::new()
        .route(
            "/v1/internal/ticket-events",
            post(handlers::ticket_events::ticket_event_intake_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_internal_token,
        ));

    let cors_layer = cors::build_cors_layer(frontend_url)?;

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/auth/bootstrap", post(auth::bootstrap_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .merge(internal_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(session_layer)
        .with_state(app_state))
}
