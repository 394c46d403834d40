use super::*;

impl PermissionService {
    /// Lists users.
    pub async fn list_users(
        &self,
        actor: &UserIdentity,
        query: UserListQuery,
    ) -> AppResult<Vec<UserAccount>> {
        self.require_permissions(actor, &[Permission::UsersRead])
            .await?;
        self.users.list_users(query).await
    }

    /// Returns one user.
    pub async fn get_user(&self, actor: &UserIdentity, user_id: UserId) -> AppResult<UserAccount> {
        self.require_permissions(actor, &[Permission::UsersRead])
            .await?;
        self.require_user(user_id).await
    }

    /// Creates a user and records its initial access state.
    pub async fn create_user(
        &self,
        actor: &UserIdentity,
        request: CreateUserRequest,
        origin: &RequestOrigin,
    ) -> AppResult<UserAccount> {
        self.require_permissions(actor, &[Permission::UsersCreate])
            .await?;

        let display_name = NonEmptyString::bounded(request.display_name, "name", 255)?;
        let email = EmailAddress::new(request.email)?;
        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "a user with email '{}' already exists",
                email.as_str()
            )));
        }

        let outcome = self
            .users
            .create_user(
                CreateUserInput {
                    display_name,
                    email,
                    role: request.role,
                    permissions: request.permissions,
                },
                UserId::from_uuid(actor.user_id()),
                origin,
            )
            .await?;

        Ok(outcome.account)
    }

    /// Sets the fixed role of a user; also clears any custom role.
    pub async fn set_role(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        role: FixedRole,
        origin: &RequestOrigin,
    ) -> AppResult<UserAccount> {
        self.mutate_access(actor, user_id, AccessMutation::SetRole(role), origin)
            .await
    }

    /// Assigns an existing custom role to a user.
    ///
    /// Inactive roles are accepted; the resolution policy decides what they grant.
    pub async fn assign_custom_role(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        role_id: CustomRoleId,
        origin: &RequestOrigin,
    ) -> AppResult<UserAccount> {
        self.require_permissions(actor, &[Permission::UsersManagePermissions])
            .await?;

        let role = self
            .custom_roles
            .find_custom_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("custom role '{role_id}' does not exist")))?;

        let reference = CustomRoleRef {
            id: role.id(),
            name: role.name().to_string(),
        };
        self.apply_authorized_mutation(
            actor,
            user_id,
            AccessMutation::AssignCustomRole(reference),
            origin,
        )
        .await
    }

    /// Detaches the custom role of a user.
    pub async fn remove_custom_role(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        origin: &RequestOrigin,
    ) -> AppResult<UserAccount> {
        self.mutate_access(actor, user_id, AccessMutation::RemoveCustomRole, origin)
            .await
    }

    /// Replaces the per-user overrides.
    pub async fn update_permissions(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        permissions: Vec<Permission>,
        origin: &RequestOrigin,
    ) -> AppResult<UserAccount> {
        self.mutate_access(
            actor,
            user_id,
            AccessMutation::ReplacePermissions(permissions),
            origin,
        )
        .await
    }

    /// Adds per-user overrides.
    pub async fn grant_permissions(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        permissions: Vec<Permission>,
        origin: &RequestOrigin,
    ) -> AppResult<UserAccount> {
        self.mutate_access(
            actor,
            user_id,
            AccessMutation::GrantPermissions(permissions),
            origin,
        )
        .await
    }

    /// Removes per-user overrides.
    pub async fn revoke_permissions(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        permissions: Vec<Permission>,
        origin: &RequestOrigin,
    ) -> AppResult<UserAccount> {
        self.mutate_access(
            actor,
            user_id,
            AccessMutation::RevokePermissions(permissions),
            origin,
        )
        .await
    }

    /// Transitions the lifecycle state of a user.
    pub async fn set_user_status(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        status: UserStatus,
        origin: &RequestOrigin,
    ) -> AppResult<UserAccount> {
        if UserId::from_uuid(actor.user_id()) == user_id && status != UserStatus::Active {
            return Err(AppError::Validation(
                "users cannot deactivate themselves".to_owned(),
            ));
        }

        self.mutate_access(actor, user_id, AccessMutation::SetStatus(status), origin)
            .await
    }

    async fn mutate_access(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        mutation: AccessMutation,
        origin: &RequestOrigin,
    ) -> AppResult<UserAccount> {
        let required = match mutation {
            AccessMutation::SetStatus(_) => Permission::UsersUpdate,
            _ => Permission::UsersManagePermissions,
        };
        self.require_permissions(actor, &[required]).await?;
        self.apply_authorized_mutation(actor, user_id, mutation, origin)
            .await
    }

    /// Writes a mutation whose permission the caller has already checked.
    async fn apply_authorized_mutation(
        &self,
        actor: &UserIdentity,
        user_id: UserId,
        mutation: AccessMutation,
        origin: &RequestOrigin,
    ) -> AppResult<UserAccount> {
        let outcome = self
            .users
            .apply_access_mutation(
                user_id,
                &mutation,
                UserId::from_uuid(actor.user_id()),
                origin,
            )
            .await?;

        Ok(outcome.account)
    }
}
