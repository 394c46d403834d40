use super::*;

pub async fn user_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<UserPermissionsQuery>,
) -> ApiResult<Json<UserPermissionsResponse>> {
    let permissions = state
        .permission_service
        .user_permissions(&user, UserId::from_uuid(user_id), query.at)
        .await?;

    Ok(Json(UserPermissionsResponse::from(permissions)))
}

pub async fn set_user_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<SetUserRoleRequest>,
) -> ApiResult<Json<UserResponse>> {
    let role = FixedRole::from_str(payload.role.as_str())?;

    let account = state
        .permission_service
        .set_role(
            &user,
            UserId::from_uuid(user_id),
            role,
            &request_origin(&headers),
        )
        .await?;

    Ok(Json(UserResponse::from(account)))
}

pub async fn replace_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UserPermissionsRequest>,
) -> ApiResult<Json<UserResponse>> {
    let permissions = parse_permissions(&payload.permissions)?;

    let account = state
        .permission_service
        .update_permissions(
            &user,
            UserId::from_uuid(user_id),
            permissions,
            &request_origin(&headers),
        )
        .await?;

    Ok(Json(UserResponse::from(account)))
}

pub async fn grant_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UserPermissionsRequest>,
) -> ApiResult<Json<UserResponse>> {
    let permissions = parse_permissions(&payload.permissions)?;

    let account = state
        .permission_service
        .grant_permissions(
            &user,
            UserId::from_uuid(user_id),
            permissions,
            &request_origin(&headers),
        )
        .await?;

    Ok(Json(UserResponse::from(account)))
}

pub async fn revoke_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UserPermissionsRequest>,
) -> ApiResult<Json<UserResponse>> {
    let permissions = parse_permissions(&payload.permissions)?;

    let account = state
        .permission_service
        .revoke_permissions(
            &user,
            UserId::from_uuid(user_id),
            permissions,
            &request_origin(&headers),
        )
        .await?;

    Ok(Json(UserResponse::from(account)))
}

pub async fn assign_custom_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AssignCustomRoleRequest>,
) -> ApiResult<Json<UserResponse>> {
    let account = state
        .permission_service
        .assign_custom_role(
            &user,
            UserId::from_uuid(user_id),
            CustomRoleId::from_uuid(payload.custom_role_id),
            &request_origin(&headers),
        )
        .await?;

    Ok(Json(UserResponse::from(account)))
}

pub async fn remove_custom_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    let account = state
        .permission_service
        .remove_custom_role(
            &user,
            UserId::from_uuid(user_id),
            &request_origin(&headers),
        )
        .await?;

    Ok(Json(UserResponse::from(account)))
}
