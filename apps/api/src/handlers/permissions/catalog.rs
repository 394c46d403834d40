use super::*;

pub async fn all_permissions_handler() -> Json<PermissionCatalogResponse> {
    Json(PermissionCatalogResponse::from_catalog())
}

pub async fn role_defaults_handler() -> Json<BTreeMap<String, Vec<String>>> {
    Json(role_defaults())
}

pub async fn my_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<UserPermissionsResponse>> {
    let permissions = state.permission_service.my_permissions(&user).await?;

    Ok(Json(UserPermissionsResponse::from(permissions)))
}
