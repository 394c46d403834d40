use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use systicket_application::{
    AccessMutationOutcome, CreateCustomRoleInput, CreateUserInput, CustomRoleRepository,
    PermissionAuditPage, PermissionAuditQuery, PermissionAuditRepository, PermissionService,
    RequestOrigin, TicketEventRelayService, UserAccessRepository, UserAccount, UserListQuery,
};
use systicket_core::{AppError, AppResult, UserIdentity};
use systicket_domain::{
    AccessMutation, AccessState, AuditValue, CustomRole, CustomRoleId, EmailAddress, FixedRole,
    PermissionAuditAction, PermissionAuditRecord, ResolutionPolicy, UserId,
};

use crate::state::AppState;
use crate::ticket_relay::TicketRelay;

pub(crate) const INTERNAL_TOKEN: &str = "internal-token-for-handler-tests-0001";

/// In-memory stores backing handler tests.
#[derive(Default)]
pub(crate) struct InMemoryStores {
    users: Mutex<HashMap<UserId, UserAccount>>,
    roles: Mutex<Vec<CustomRole>>,
    pub(crate) audit: Mutex<Vec<PermissionAuditRecord>>,
}

impl InMemoryStores {
    pub(crate) async fn insert_user(&self, display_name: &str, role: FixedRole) -> UserIdentity {
        let user_id = UserId::new();
        let email = format!("{}@example.com", display_name.to_lowercase());
        self.users.lock().await.insert(
            user_id,
            UserAccount {
                user_id,
                display_name: display_name.to_owned(),
                email: email.clone(),
                access: AccessState::for_role(role),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
        );

        UserIdentity::new(user_id.as_uuid(), display_name, Some(email))
    }

    fn record(
        target: UserId,
        actor: UserId,
        action: PermissionAuditAction,
        old_value: Option<AuditValue>,
        new_value: Option<AuditValue>,
        origin: &RequestOrigin,
    ) -> PermissionAuditRecord {
        PermissionAuditRecord {
            id: Uuid::new_v4(),
            target_user_id: target,
            changed_by_id: actor,
            action,
            old_value,
            new_value,
            ip_address: origin.ip_address.clone(),
            user_agent: origin.user_agent.clone(),
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl UserAccessRepository for InMemoryStores {
    async fn find_user(&self, user_id: UserId) -> AppResult<Option<UserAccount>> {
        Ok(self.users.lock().await.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &EmailAddress) -> AppResult<Option<UserAccount>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|account| account.email == email.as_str())
            .cloned())
    }

    async fn list_users(&self, query: UserListQuery) -> AppResult<Vec<UserAccount>> {
        let mut users: Vec<UserAccount> = self
            .users
            .lock()
            .await
            .values()
            .filter(|account| query.role.is_none_or(|role| account.access.role == role))
            .cloned()
            .collect();
        users.sort_by(|left, right| left.display_name.cmp(&right.display_name));
        Ok(users)
    }

    async fn create_user(
        &self,
        input: CreateUserInput,
        actor: UserId,
        origin: &RequestOrigin,
    ) -> AppResult<AccessMutationOutcome> {
        let mut access = AccessState::for_role(input.role);
        access.permissions = input.permissions;
        let account = UserAccount {
            user_id: UserId::new(),
            display_name: input.display_name.to_string(),
            email: input.email.as_str().to_owned(),
            access,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let audit = Self::record(
            account.user_id,
            actor,
            PermissionAuditAction::UserCreated,
            None,
            Some(AuditValue::snapshot(&account.access)),
            origin,
        );
        self.audit.lock().await.push(audit.clone());
        self.users
            .lock()
            .await
            .insert(account.user_id, account.clone());

        Ok(AccessMutationOutcome { account, audit })
    }

    async fn apply_access_mutation(
        &self,
        user_id: UserId,
        mutation: &AccessMutation,
        actor: UserId,
        origin: &RequestOrigin,
    ) -> AppResult<AccessMutationOutcome> {
        let mut users = self.users.lock().await;
        let Some(mut account) = users.get(&user_id).cloned() else {
            return Err(AppError::NotFound(format!("user '{user_id}' does not exist")));
        };

        let transition = mutation.apply(&account.access)?;
        let audit = Self::record(
            user_id,
            actor,
            transition.action,
            Some(transition.old_value),
            Some(transition.new_value),
            origin,
        );
        self.audit.lock().await.push(audit.clone());

        account.access = transition.after;
        users.insert(user_id, account.clone());
        Ok(AccessMutationOutcome { account, audit })
    }
}

#[async_trait]
impl CustomRoleRepository for InMemoryStores {
    async fn list_custom_roles(&self, include_inactive: bool) -> AppResult<Vec<CustomRole>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .filter(|role| include_inactive || role.is_active())
            .cloned()
            .collect())
    }

    async fn find_custom_role(&self, role_id: CustomRoleId) -> AppResult<Option<CustomRole>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.id() == role_id)
            .cloned())
    }

    async fn find_custom_role_by_name(&self, name: &str) -> AppResult<Option<CustomRole>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.name().as_str() == name)
            .cloned())
    }

    async fn create_custom_role(
        &self,
        input: CreateCustomRoleInput,
        created_by: UserId,
    ) -> AppResult<CustomRole> {
        let role = CustomRole::new(
            CustomRoleId::new(),
            input.name,
            input.description,
            input.permissions,
            input.color,
            true,
            Some(created_by),
            Utc::now(),
            Utc::now(),
        )?;
        self.roles.lock().await.push(role.clone());
        Ok(role)
    }

    async fn update_custom_role(&self, role: &CustomRole) -> AppResult<CustomRole> {
        let mut roles = self.roles.lock().await;
        let Some(stored) = roles.iter_mut().find(|stored| stored.id() == role.id()) else {
            return Err(AppError::NotFound(format!(
                "custom role '{}' does not exist",
                role.id()
            )));
        };
        *stored = role.clone();
        Ok(role.clone())
    }
}

#[async_trait]
impl PermissionAuditRepository for InMemoryStores {
    async fn list_audit_entries(
        &self,
        query: PermissionAuditQuery,
    ) -> AppResult<PermissionAuditPage> {
        let mut entries: Vec<PermissionAuditRecord> = self
            .audit
            .lock()
            .await
            .iter()
            .filter(|record| query.action.is_none_or(|action| record.action == action))
            .cloned()
            .collect();
        entries.reverse();
        let total = u64::try_from(entries.len()).unwrap_or_default();
        let entries = entries
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect();

        Ok(PermissionAuditPage { entries, total })
    }

    async fn list_user_audit_since(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> AppResult<Vec<PermissionAuditRecord>> {
        let mut entries: Vec<PermissionAuditRecord> = self
            .audit
            .lock()
            .await
            .iter()
            .filter(|record| record.target_user_id == user_id && record.created_at > since)
            .cloned()
            .collect();
        entries.reverse();
        Ok(entries)
    }
}

/// Builds application state over fresh in-memory stores.
pub(crate) fn test_state() -> (AppState, Arc<InMemoryStores>) {
    let stores = Arc::new(InMemoryStores::default());
    let ticket_relay = TicketRelay::new();

    let state = AppState {
        permission_service: PermissionService::new(
            stores.clone(),
            stores.clone(),
            stores.clone(),
            ResolutionPolicy::default(),
        ),
        ticket_event_relay_service: TicketEventRelayService::new(Arc::new(ticket_relay.clone())),
        ticket_relay,
        bootstrap_token: "bootstrap".to_owned(),
        internal_events_token: INTERNAL_TOKEN.to_owned(),
    };

    (state, stores)
}
