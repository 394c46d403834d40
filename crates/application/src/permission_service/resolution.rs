use super::*;

use systicket_domain::{
    has_all_permissions, has_any_permission, resolve_effective_permissions, rewind_access_state,
};

impl PermissionService {
    /// Resolves the session identity of an active user.
    pub async fn authenticate(&self, user_id: UserId) -> AppResult<UserIdentity> {
        let probe = UserIdentity::new(user_id.as_uuid(), String::new(), None);
        let account = self.require_active_actor(&probe).await?;

        Ok(UserIdentity::new(
            account.user_id.as_uuid(),
            account.display_name,
            Some(account.email),
        ))
    }

    /// Returns the effective permissions of an existing user.
    pub async fn effective_permissions(&self, user_id: UserId) -> AppResult<BTreeSet<Permission>> {
        let account = self.require_user(user_id).await?;
        let (_, effective) = self.resolve_access(&account.access).await?;
        Ok(effective)
    }

    /// Ensures the actor holds every permission in `required`.
    pub async fn require_permissions(
        &self,
        actor: &UserIdentity,
        required: &[Permission],
    ) -> AppResult<()> {
        let effective = self.actor_permissions(actor).await?;
        if has_all_permissions(&effective, required) {
            return Ok(());
        }

        let missing = required
            .iter()
            .filter(|permission| !effective.contains(*permission))
            .map(Permission::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Err(AppError::Forbidden(format!(
            "user '{}' is missing permissions: {missing}",
            actor.user_id()
        )))
    }

    /// Ensures the actor holds at least one permission in `candidates`.
    pub async fn require_any_permission(
        &self,
        actor: &UserIdentity,
        candidates: &[Permission],
    ) -> AppResult<()> {
        let effective = self.actor_permissions(actor).await?;
        if has_any_permission(&effective, candidates) {
            return Ok(());
        }

        let candidates = candidates
            .iter()
            .map(Permission::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        Err(AppError::Forbidden(format!(
            "user '{}' needs one of: {candidates}",
            actor.user_id()
        )))
    }

    /// Returns whether the actor currently holds `permission`.
    pub async fn has_permission(
        &self,
        actor: &UserIdentity,
        permission: Permission,
    ) -> AppResult<bool> {
        let effective = self.actor_permissions(actor).await?;
        Ok(effective.contains(&permission))
    }

    /// Returns the resolved permissions of the calling user.
    pub async fn my_permissions(&self, actor: &UserIdentity) -> AppResult<UserPermissions> {
        let account = self.require_active_actor(actor).await?;
        let (custom_role, effective) = self.resolve_access(&account.access).await?;

        Ok(UserPermissions {
            user_id: account.user_id,
            access: account.access,
            custom_role,
            effective,
            as_of: None,
        })
    }

    /// Returns the resolved permissions of a user, optionally rewound to `at`.
    ///
    /// A rewound result uses the custom role's current definition.
    pub async fn user_permissions(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        at: Option<DateTime<Utc>>,
    ) -> AppResult<UserPermissions> {
        self.require_permissions(actor, &[Permission::UsersRead])
            .await?;

        let account = self.require_user(user_id).await?;
        let access = match at {
            None => account.access,
            Some(at) => {
                let history = self.audit.list_user_audit_since(user_id, at).await?;
                rewind_access_state(&account.access, &history, at).ok_or_else(|| {
                    AppError::NotFound(format!(
                        "user '{user_id}' did not exist at {}",
                        at.to_rfc3339()
                    ))
                })?
            }
        };

        let (custom_role, effective) = self.resolve_access(&access).await?;
        Ok(UserPermissions {
            user_id,
            access,
            custom_role,
            effective,
            as_of: at,
        })
    }

    pub(super) async fn resolve_access(
        &self,
        access: &AccessState,
    ) -> AppResult<(Option<CustomRole>, BTreeSet<Permission>)> {
        let custom_role = match &access.custom_role {
            Some(reference) => self.custom_roles.find_custom_role(reference.id).await?,
            None => None,
        };

        let effective = resolve_effective_permissions(access, custom_role.as_ref(), self.policy);
        Ok((custom_role, effective))
    }

    pub(super) async fn require_user(&self, user_id: UserId) -> AppResult<UserAccount> {
        self.users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))
    }

    pub(super) async fn require_active_actor(
        &self,
        actor: &UserIdentity,
    ) -> AppResult<UserAccount> {
        let actor_id = UserId::from_uuid(actor.user_id());
        let account = self.users.find_user(actor_id).await?.ok_or_else(|| {
            AppError::Unauthorized(format!("user '{actor_id}' is not registered"))
        })?;

        if !account.access.is_active() {
            return Err(AppError::Forbidden(format!(
                "user '{actor_id}' is {}",
                account.access.status.as_str()
            )));
        }

        Ok(account)
    }

    async fn actor_permissions(&self, actor: &UserIdentity) -> AppResult<BTreeSet<Permission>> {
        let account = self.require_active_actor(actor).await?;
        let (_, effective) = self.resolve_access(&account.access).await?;
        Ok(effective)
    }
}
