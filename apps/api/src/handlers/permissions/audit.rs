use super::*;

pub async fn list_audit_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<PermissionAuditPageResponse>> {
    let action = query
        .action
        .as_deref()
        .map(PermissionAuditAction::from_str)
        .transpose()?;

    let page = state
        .permission_service
        .list_audit_entries(
            &user,
            AuditLogFilter {
                target_user_id: query.target_user_id.map(UserId::from_uuid),
                changed_by_id: query.changed_by_id.map(UserId::from_uuid),
                action,
                start_date: query.start_date,
                end_date: query.end_date,
                page: query.page,
                per_page: query.per_page,
            },
        )
        .await?;

    Ok(Json(PermissionAuditPageResponse::from(page)))
}
