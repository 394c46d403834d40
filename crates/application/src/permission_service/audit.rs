use super::*;

impl PermissionService {
    /// Lists permission audit rows, newest first.
    pub async fn list_audit_entries(
        &self,
        actor: &UserIdentity,
        filter: AuditLogFilter,
    ) -> AppResult<PermissionAuditPage> {
        self.require_permissions(actor, &[Permission::AuditView])
            .await?;

        let page = filter.page.unwrap_or(1);
        if page == 0 {
            return Err(AppError::Validation("page must be at least 1".to_owned()));
        }

        let per_page = filter.per_page.unwrap_or(AUDIT_DEFAULT_PER_PAGE);
        if per_page == 0 {
            return Err(AppError::Validation(
                "per_page must be at least 1".to_owned(),
            ));
        }
        let per_page = per_page.min(AUDIT_MAX_PER_PAGE);

        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date)
            && start > end
        {
            return Err(AppError::Validation(
                "start_date must not be after end_date".to_owned(),
            ));
        }

        self.audit
            .list_audit_entries(PermissionAuditQuery {
                target_user_id: filter.target_user_id,
                changed_by_id: filter.changed_by_id,
                action: filter.action,
                start_date: filter.start_date,
                end_date: filter.end_date,
                limit: per_page,
                offset: (page - 1).saturating_mul(per_page),
            })
            .await
    }
}
