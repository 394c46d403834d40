use super::*;

use systicket_domain::CUSTOM_ROLE_NAME_MAX_LENGTH;

impl PermissionService {
    /// Lists custom roles ordered by name.
    pub async fn list_custom_roles(
        &self,
        actor: &UserIdentity,
        include_inactive: bool,
    ) -> AppResult<Vec<CustomRole>> {
        self.require_permissions(actor, &[Permission::RolesRead])
            .await?;
        self.custom_roles.list_custom_roles(include_inactive).await
    }

    /// Returns one custom role.
    pub async fn get_custom_role(
        &self,
        actor: &UserIdentity,
        role_id: CustomRoleId,
    ) -> AppResult<CustomRole> {
        self.require_permissions(actor, &[Permission::RolesRead])
            .await?;
        self.require_custom_role(role_id).await
    }

    /// Creates a custom role with a unique name.
    pub async fn create_custom_role(
        &self,
        actor: &UserIdentity,
        request: CustomRoleRequest,
    ) -> AppResult<CustomRole> {
        self.require_permissions(actor, &[Permission::RolesCreate])
            .await?;

        let name =
            NonEmptyString::bounded(request.name, "role name", CUSTOM_ROLE_NAME_MAX_LENGTH)?;
        let color = match request.color {
            Some(color) => RoleColor::new(color)?,
            None => RoleColor::default(),
        };
        self.ensure_role_name_available(name.as_str(), None).await?;

        self.custom_roles
            .create_custom_role(
                CreateCustomRoleInput {
                    name,
                    description: request.description,
                    permissions: request.permissions,
                    color,
                },
                UserId::from_uuid(actor.user_id()),
            )
            .await
    }

    /// Applies a partial update to a custom role.
    pub async fn update_custom_role(
        &self,
        actor: &UserIdentity,
        role_id: CustomRoleId,
        update: CustomRoleUpdate,
    ) -> AppResult<CustomRole> {
        self.require_permissions(actor, &[Permission::RolesUpdate])
            .await?;

        let current = self.require_custom_role(role_id).await?;
        let name = match update.name {
            Some(name) => {
                let name = NonEmptyString::bounded(name, "role name", CUSTOM_ROLE_NAME_MAX_LENGTH)?;
                if name.as_str() != current.name().as_str() {
                    self.ensure_role_name_available(name.as_str(), Some(role_id))
                        .await?;
                }
                String::from(name)
            }
            None => current.name().to_string(),
        };
        let color = match update.color {
            Some(color) => RoleColor::new(color)?,
            None => current.color().clone(),
        };
        let description = match update.description {
            Some(description) => Some(description),
            None => current.description().map(str::to_owned),
        };

        let updated = CustomRole::new(
            current.id(),
            name,
            description,
            update
                .permissions
                .unwrap_or_else(|| current.permissions().to_vec()),
            color,
            update.is_active.unwrap_or(current.is_active()),
            current.created_by(),
            current.created_at(),
            current.updated_at(),
        )?;

        self.custom_roles.update_custom_role(&updated).await
    }

    /// Deactivates a custom role. Roles are never physically deleted.
    pub async fn deactivate_custom_role(
        &self,
        actor: &UserIdentity,
        role_id: CustomRoleId,
    ) -> AppResult<CustomRole> {
        self.require_permissions(actor, &[Permission::RolesDelete])
            .await?;

        let current = self.require_custom_role(role_id).await?;
        if !current.is_active() {
            return Ok(current);
        }

        let deactivated = CustomRole::new(
            current.id(),
            current.name().to_string(),
            current.description().map(str::to_owned),
            current.permissions().to_vec(),
            current.color().clone(),
            false,
            current.created_by(),
            current.created_at(),
            current.updated_at(),
        )?;

        self.custom_roles.update_custom_role(&deactivated).await
    }

    async fn require_custom_role(&self, role_id: CustomRoleId) -> AppResult<CustomRole> {
        self.custom_roles
            .find_custom_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("custom role '{role_id}' does not exist")))
    }

    async fn ensure_role_name_available(
        &self,
        name: &str,
        except: Option<CustomRoleId>,
    ) -> AppResult<()> {
        match self.custom_roles.find_custom_role_by_name(name).await? {
            Some(existing) if Some(existing.id()) != except => Err(AppError::Conflict(format!(
                "custom role '{name}' already exists"
            ))),
            _ => Ok(()),
        }
    }
}
