//! Pure effective-permission resolution.

use std::collections::BTreeSet;

use crate::{AccessState, CustomRole, Permission};

/// What a deactivated custom role still contributes while assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InactiveCustomRolePolicy {
    /// An inactive role contributes nothing.
    #[default]
    FallBack,
    /// An inactive role keeps contributing its permissions.
    Retain,
}

/// How custom role permissions combine with the fixed role defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CustomRoleMode {
    /// Union of fixed defaults, custom role permissions, and overrides.
    #[default]
    Extend,
    /// Custom role permissions stand in for the fixed defaults.
    Replace,
}

/// Resolution knobs configured once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolutionPolicy {
    /// Handling of assigned but deactivated custom roles.
    pub inactive_custom_role: InactiveCustomRolePolicy,
    /// Combination rule for custom roles.
    pub custom_role_mode: CustomRoleMode,
}

/// Computes the effective permission set of a user.
///
/// `custom_role` is only considered when its id matches the role assigned in
/// `state`; a stale or mismatched role is ignored.
#[must_use]
pub fn resolve_effective_permissions(
    state: &AccessState,
    custom_role: Option<&CustomRole>,
    policy: ResolutionPolicy,
) -> BTreeSet<Permission> {
    let applicable_role = match (&state.custom_role, custom_role) {
        (Some(reference), Some(role)) if reference.id == role.id() => {
            let counts = role.is_active()
                || policy.inactive_custom_role == InactiveCustomRolePolicy::Retain;
            counts.then_some(role)
        }
        _ => None,
    };

    let mut effective = BTreeSet::new();
    match (applicable_role, policy.custom_role_mode) {
        (Some(role), CustomRoleMode::Replace) => {
            effective.extend(role.permissions().iter().copied());
        }
        (Some(role), CustomRoleMode::Extend) => {
            effective.extend(state.role.default_permissions().iter().copied());
            effective.extend(role.permissions().iter().copied());
        }
        (None, _) => {
            effective.extend(state.role.default_permissions().iter().copied());
        }
    }
    effective.extend(state.permissions.iter().copied());

    effective
}

/// Returns whether `effective` contains every permission in `required`.
#[must_use]
pub fn has_all_permissions(effective: &BTreeSet<Permission>, required: &[Permission]) -> bool {
    required
        .iter()
        .all(|permission| effective.contains(permission))
}

/// Returns whether `effective` contains at least one permission in `candidates`.
#[must_use]
pub fn has_any_permission(effective: &BTreeSet<Permission>, candidates: &[Permission]) -> bool {
    candidates
        .iter()
        .any(|permission| effective.contains(permission))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use proptest::prelude::*;

    use super::{
        CustomRoleMode, InactiveCustomRolePolicy, ResolutionPolicy, has_all_permissions,
        has_any_permission, resolve_effective_permissions,
    };
    use crate::{
        AccessState, CustomRole, CustomRoleId, CustomRoleRef, FixedRole, Permission, RoleColor,
    };

    fn custom_role(permissions: Vec<Permission>, is_active: bool) -> CustomRole {
        let now = Utc::now();
        match CustomRole::new(
            CustomRoleId::new(),
            "Supervisor",
            None,
            permissions,
            RoleColor::default(),
            is_active,
            None,
            now,
            now,
        ) {
            Ok(role) => role,
            Err(error) => panic!("fixture role should be valid: {error}"),
        }
    }

    fn assigned(state: &mut AccessState, role: &CustomRole) {
        state.custom_role = Some(CustomRoleRef {
            id: role.id(),
            name: role.name().to_string(),
        });
    }

    #[test]
    fn agent_defaults_scenario() {
        let state = AccessState::for_role(FixedRole::Agent);
        let effective = resolve_effective_permissions(&state, None, ResolutionPolicy::default());

        assert!(effective.contains(&Permission::TicketsReadAssigned));
        assert!(!effective.contains(&Permission::UsersUpdate));
    }

    #[test]
    fn custom_role_and_overrides_extend_defaults() {
        let role = custom_role(vec![Permission::ReportsView], true);
        let mut state = AccessState::for_role(FixedRole::Client);
        assigned(&mut state, &role);
        state.permissions = vec![Permission::AuditView];

        let effective =
            resolve_effective_permissions(&state, Some(&role), ResolutionPolicy::default());

        assert!(effective.contains(&Permission::TicketsReadOwn));
        assert!(effective.contains(&Permission::ReportsView));
        assert!(effective.contains(&Permission::AuditView));
    }

    #[test]
    fn removing_custom_role_restores_defaults() {
        let role = custom_role(vec![Permission::ReportsView], true);
        let mut state = AccessState::for_role(FixedRole::Agent);
        let before = resolve_effective_permissions(&state, None, ResolutionPolicy::default());

        assigned(&mut state, &role);
        let with_role =
            resolve_effective_permissions(&state, Some(&role), ResolutionPolicy::default());
        assert!(with_role.contains(&Permission::ReportsView));

        state.custom_role = None;
        let after = resolve_effective_permissions(&state, Some(&role), ResolutionPolicy::default());
        assert_eq!(before, after);
    }

    #[test]
    fn inactive_role_follows_policy() {
        let role = custom_role(vec![Permission::ReportsView], false);
        let mut state = AccessState::for_role(FixedRole::Agent);
        assigned(&mut state, &role);

        let fall_back =
            resolve_effective_permissions(&state, Some(&role), ResolutionPolicy::default());
        assert!(!fall_back.contains(&Permission::ReportsView));

        let retain = resolve_effective_permissions(
            &state,
            Some(&role),
            ResolutionPolicy {
                inactive_custom_role: InactiveCustomRolePolicy::Retain,
                ..ResolutionPolicy::default()
            },
        );
        assert!(retain.contains(&Permission::ReportsView));
    }

    #[test]
    fn replace_mode_drops_fixed_defaults_but_keeps_overrides() {
        let role = custom_role(vec![Permission::ReportsView], true);
        let mut state = AccessState::for_role(FixedRole::Manager);
        assigned(&mut state, &role);
        state.permissions = vec![Permission::AuditView];

        let effective = resolve_effective_permissions(
            &state,
            Some(&role),
            ResolutionPolicy {
                custom_role_mode: CustomRoleMode::Replace,
                ..ResolutionPolicy::default()
            },
        );

        assert_eq!(effective.len(), 2);
        assert!(effective.contains(&Permission::ReportsView));
        assert!(effective.contains(&Permission::AuditView));
    }

    #[test]
    fn mismatched_role_is_ignored() {
        let assigned_role = custom_role(vec![Permission::ReportsView], true);
        let other_role = custom_role(vec![Permission::AuditView], true);
        let mut state = AccessState::for_role(FixedRole::Client);
        assigned(&mut state, &assigned_role);

        let effective =
            resolve_effective_permissions(&state, Some(&other_role), ResolutionPolicy::default());
        assert!(!effective.contains(&Permission::AuditView));
    }

    #[test]
    fn guard_helpers_check_all_and_any() {
        let state = AccessState::for_role(FixedRole::Client);
        let effective = resolve_effective_permissions(&state, None, ResolutionPolicy::default());

        assert!(has_all_permissions(
            &effective,
            &[Permission::TicketsCreate, Permission::TicketsReadOwn]
        ));
        assert!(!has_all_permissions(
            &effective,
            &[Permission::TicketsCreate, Permission::TicketsDelete]
        ));
        assert!(has_any_permission(
            &effective,
            &[Permission::TicketsDelete, Permission::TicketsCreate]
        ));
        assert!(!has_any_permission(&effective, &[]));
    }

    fn permission_strategy() -> impl Strategy<Value = Permission> {
        (0..Permission::all().len()).prop_map(|index| Permission::all()[index])
    }

    fn role_strategy() -> impl Strategy<Value = FixedRole> {
        prop_oneof![
            Just(FixedRole::Admin),
            Just(FixedRole::Manager),
            Just(FixedRole::Agent),
            Just(FixedRole::Client),
        ]
    }

    proptest! {
        #[test]
        fn resolution_is_deterministic_and_order_insensitive(
            role in role_strategy(),
            overrides in prop::collection::vec(permission_strategy(), 0..12),
            role_permissions in prop::collection::vec(permission_strategy(), 0..12),
            active in any::<bool>(),
        ) {
            let custom = custom_role(role_permissions, active);
            let mut state = AccessState::for_role(role);
            assigned(&mut state, &custom);
            state.permissions = overrides.clone();

            let first = resolve_effective_permissions(&state, Some(&custom), ResolutionPolicy::default());
            let second = resolve_effective_permissions(&state, Some(&custom), ResolutionPolicy::default());
            prop_assert_eq!(&first, &second);

            let mut reversed = state.clone();
            reversed.permissions = overrides.into_iter().rev().collect();
            let third = resolve_effective_permissions(&reversed, Some(&custom), ResolutionPolicy::default());
            prop_assert_eq!(&first, &third);

            for permission in role.default_permissions() {
                prop_assert!(first.contains(permission));
            }
            for permission in &state.permissions {
                prop_assert!(first.contains(permission));
            }
        }
    }
}
