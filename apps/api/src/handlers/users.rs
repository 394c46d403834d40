use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use uuid::Uuid;

use systicket_application::{CreateUserRequest as CreateUserCommand, UserListQuery};
use systicket_core::UserIdentity;
use systicket_domain::{FixedRole, UserId, UserStatus, parse_permissions};

use crate::auth::request_origin;
use crate::dto::{CreateUserRequest, SetUserStatusRequest, UserListFilter, UserResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_users_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(filter): Query<UserListFilter>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let query = UserListQuery {
        role: filter.role.as_deref().map(FixedRole::from_str).transpose()?,
        status: filter
            .status
            .as_deref()
            .map(UserStatus::from_str)
            .transpose()?,
    };

    let users = state
        .permission_service
        .list_users(&user, query)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(users))
}

pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Json(payload): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let role = FixedRole::from_str(payload.role.as_str())?;
    let permissions = parse_permissions(&payload.permissions)?;

    let account = state
        .permission_service
        .create_user(
            &user,
            CreateUserCommand {
                display_name: payload.display_name,
                email: payload.email,
                role,
                permissions,
            },
            &request_origin(&headers),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(account))))
}

pub async fn get_user_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let account = state
        .permission_service
        .get_user(&user, UserId::from_uuid(user_id))
        .await?;

    Ok(Json(UserResponse::from(account)))
}

pub async fn set_user_status_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SetUserStatusRequest>,
) -> ApiResult<Json<UserResponse>> {
    let status = UserStatus::from_str(payload.status.as_str())?;

    let account = state
        .permission_service
        .set_user_status(
            &user,
            UserId::from_uuid(user_id),
            status,
            &request_origin(&headers),
        )
        .await?;

    Ok(Json(UserResponse::from(account)))
}
