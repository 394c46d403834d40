use axum::http::StatusCode;

use super::*;

pub async fn list_custom_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<CustomRoleListQuery>,
) -> ApiResult<Json<Vec<CustomRoleResponse>>> {
    let roles = state
        .permission_service
        .list_custom_roles(&user, query.include_inactive)
        .await?
        .into_iter()
        .map(CustomRoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn get_custom_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<Json<CustomRoleResponse>> {
    let role = state
        .permission_service
        .get_custom_role(&user, CustomRoleId::from_uuid(role_id))
        .await?;

    Ok(Json(CustomRoleResponse::from(role)))
}

pub async fn create_custom_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateCustomRoleRequest>,
) -> ApiResult<(StatusCode, Json<CustomRoleResponse>)> {
    let permissions = parse_permissions(&payload.permissions)?;

    let role = state
        .permission_service
        .create_custom_role(
            &user,
            CustomRoleRequest {
                name: payload.name,
                description: payload.description,
                permissions,
                color: payload.color,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CustomRoleResponse::from(role))))
}

pub async fn update_custom_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
    Json(payload): Json<UpdateCustomRoleRequest>,
) -> ApiResult<Json<CustomRoleResponse>> {
    let permissions = payload
        .permissions
        .map(|values| parse_permissions(&values))
        .transpose()?;

    let role = state
        .permission_service
        .update_custom_role(
            &user,
            CustomRoleId::from_uuid(role_id),
            CustomRoleUpdate {
                name: payload.name,
                description: payload.description,
                permissions,
                color: payload.color,
                is_active: payload.is_active,
            },
        )
        .await?;

    Ok(Json(CustomRoleResponse::from(role)))
}

pub async fn deactivate_custom_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<Uuid>,
) -> ApiResult<Json<CustomRoleResponse>> {
    let role = state
        .permission_service
        .deactivate_custom_role(&user, CustomRoleId::from_uuid(role_id))
        .await?;

    Ok(Json(CustomRoleResponse::from(role)))
}
