use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use systicket_application::RequestOrigin;
use systicket_core::{AppError, UserIdentity};
use systicket_domain::UserId;
use tower_sessions::Session;
use tracing::info;

use crate::dto::{BootstrapRequest, UserIdentityResponse};
use crate::error::ApiResult;
use crate::middleware::secret_matches;
use crate::state::AppState;

pub const SESSION_USER_KEY: &str = "user_identity";

/// Opens a session for an existing active user when the bootstrap token matches.
pub async fn bootstrap_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<BootstrapRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    if !secret_matches(&payload.token, &state.bootstrap_token) {
        return Err(AppError::Unauthorized("invalid bootstrap token".to_owned()).into());
    }

    let identity = state
        .permission_service
        .authenticate(UserId::from_uuid(payload.user_id))
        .await?;

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    info!(user_id = %identity.user_id(), "session bootstrapped");
    Ok(Json(UserIdentityResponse::from(identity)))
}

pub async fn me_handler(session: Session) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = session
        .get::<UserIdentity>(SESSION_USER_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session identity: {error}")))?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    Ok(Json(UserIdentityResponse::from(identity)))
}

pub async fn logout_handler(session: Session) -> ApiResult<StatusCode> {
    session
        .flush()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Reads the client address and user agent recorded on audit rows.
pub fn request_origin(headers: &HeaderMap) -> RequestOrigin {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    let user_agent = headers
        .get("user-agent")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    RequestOrigin {
        ip_address,
        user_agent,
    }
}
