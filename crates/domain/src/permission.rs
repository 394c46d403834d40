use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use systicket_core::{AppError, AppResult};

/// Declares the permission catalog from one table of
/// `Variant => (storage value, module, description)` rows.
macro_rules! permission_catalog {
    ($($variant:ident => ($value:literal, $module:ident, $description:literal)),+ $(,)?) => {
        /// Permissions enforced by application policy checks.
        ///
        /// Storage and transport use the `resource:action` string form.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Permission {
            $(
                #[doc = $description]
                $variant,
            )+
        }

        impl Permission {
            const ALL: &'static [Permission] = &[$(Permission::$variant),+];

            /// Returns a stable storage value for this permission.
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            /// Returns the human-readable description shown in admin views.
            #[must_use]
            pub fn description(&self) -> &'static str {
                match self {
                    $(Self::$variant => $description,)+
                }
            }

            /// Returns the module this permission is grouped under.
            #[must_use]
            pub fn module(&self) -> PermissionModule {
                match self {
                    $(Self::$variant => PermissionModule::$module,)+
                }
            }
        }

        impl FromStr for Permission {
            type Err = AppError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($value => Ok(Self::$variant),)+
                    _ => Err(AppError::Validation(format!(
                        "unknown permission value '{value}'"
                    ))),
                }
            }
        }
    };
}

permission_catalog! {
    TicketsCreate => ("tickets:create", Tickets, "Create tickets"),
    TicketsRead => ("tickets:read", Tickets, "View tickets"),
    TicketsReadAll => ("tickets:read:all", Tickets, "View all tickets"),
    TicketsReadOwn => ("tickets:read:own", Tickets, "View only own tickets"),
    TicketsReadAssigned => ("tickets:read:assigned", Tickets, "View assigned tickets"),
    TicketsUpdate => ("tickets:update", Tickets, "Update tickets"),
    TicketsDelete => ("tickets:delete", Tickets, "Delete tickets"),
    TicketsAssign => ("tickets:assign", Tickets, "Assign tickets to users"),
    TicketsTransfer => ("tickets:transfer", Tickets, "Transfer tickets between queues"),
    TicketsClose => ("tickets:close", Tickets, "Close tickets"),
    TicketsReopen => ("tickets:reopen", Tickets, "Reopen closed tickets"),

    UsersCreate => ("users:create", Users, "Create users"),
    UsersRead => ("users:read", Users, "View users"),
    UsersUpdate => ("users:update", Users, "Update users"),
    UsersDelete => ("users:delete", Users, "Delete users"),
    UsersManagePermissions => ("users:manage-permissions", Users, "Manage user permissions"),

    RolesCreate => ("roles:create", Roles, "Create custom roles"),
    RolesRead => ("roles:read", Roles, "View roles"),
    RolesUpdate => ("roles:update", Roles, "Update roles"),
    RolesDelete => ("roles:delete", Roles, "Delete roles"),

    QueuesRead => ("queues:read", Queues, "View queues"),
    QueuesCreate => ("queues:create", Queues, "Create queues"),
    QueuesUpdate => ("queues:update", Queues, "Update queues"),
    QueuesDelete => ("queues:delete", Queues, "Delete queues"),
    QueuesManageMembers => ("queues:manage-members", Queues, "Manage queue members"),

    ClientsCreate => ("clients:create", Clients, "Create clients"),
    ClientsRead => ("clients:read", Clients, "View clients"),
    ClientsUpdate => ("clients:update", Clients, "Update clients"),
    ClientsDelete => ("clients:delete", Clients, "Delete clients"),

    ResourcesCreate => ("resources:create", Resources, "Create resources"),
    ResourcesRead => ("resources:read", Resources, "View resources"),
    ResourcesUpdate => ("resources:update", Resources, "Update resources"),
    ResourcesDelete => ("resources:delete", Resources, "Delete resources"),

    LicensesCreate => ("licenses:create", Licenses, "Create licenses"),
    LicensesRead => ("licenses:read", Licenses, "View licenses"),
    LicensesUpdate => ("licenses:update", Licenses, "Update licenses"),
    LicensesDelete => ("licenses:delete", Licenses, "Delete licenses"),

    SettingsRead => ("settings:read", Settings, "View settings"),
    SettingsUpdate => ("settings:update", Settings, "Update settings"),
    SettingsBranding => ("settings:branding", Settings, "Manage visual branding"),

    ReportsView => ("reports:view", Reports, "View reports"),
    ReportsExport => ("reports:export", Reports, "Export reports"),

    ServiceDesksRead => ("service-desks:read", ServiceDesks, "View service desks"),
    ServiceDesksCreate => ("service-desks:create", ServiceDesks, "Create service desks"),
    ServiceDesksUpdate => ("service-desks:update", ServiceDesks, "Update service desks"),
    ServiceDesksDelete => ("service-desks:delete", ServiceDesks, "Delete service desks"),

    SlaRead => ("sla:read", Sla, "View SLA settings"),
    SlaUpdate => ("sla:update", Sla, "Update SLA settings"),

    TimesheetsCreate => ("timesheets:create", Timesheets, "Create timesheet entries"),
    TimesheetsRead => ("timesheets:read", Timesheets, "View timesheet entries"),
    TimesheetsReadAll => ("timesheets:read:all", Timesheets, "View all timesheet entries"),
    TimesheetsUpdate => ("timesheets:update", Timesheets, "Update timesheet entries"),
    TimesheetsDelete => ("timesheets:delete", Timesheets, "Delete timesheet entries"),
    TimesheetsApprove => ("timesheets:approve", Timesheets, "Approve timesheet entries"),

    NotificationsRead => ("notifications:read", Notifications, "View notifications"),
    NotificationsManage => ("notifications:manage", Notifications, "Manage notification settings"),

    AuditView => ("audit:view", Audit, "View audit logs"),

    ServiceCatalogRead => ("service-catalog:read", ServiceCatalog, "View the service catalog"),
    ServiceCatalogCreate => ("service-catalog:create", ServiceCatalog, "Create service catalog items"),
    ServiceCatalogUpdate => ("service-catalog:update", ServiceCatalog, "Update service catalog items"),
    ServiceCatalogDelete => ("service-catalog:delete", ServiceCatalog, "Delete service catalog items"),

    DownloadsRead => ("downloads:read", Downloads, "Access the downloads page"),
    DownloadsManage => ("downloads:manage", Downloads, "Manage desktop agent releases"),
}

impl Permission {
    /// Returns all known permissions in catalog order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        Self::ALL
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::from_str(value.as_str()).map_err(serde::de::Error::custom)
    }
}

/// Functional area a permission belongs to, used to group the catalog in UIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PermissionModule {
    /// Ticket lifecycle.
    Tickets,
    /// User directory.
    Users,
    /// Custom roles.
    Roles,
    /// Ticket queues.
    Queues,
    /// Client organizations.
    Clients,
    /// Managed assets.
    Resources,
    /// Software licenses.
    Licenses,
    /// Global settings.
    Settings,
    /// Reporting.
    Reports,
    /// Service desks.
    ServiceDesks,
    /// Service level agreements.
    Sla,
    /// Timesheets.
    Timesheets,
    /// Notifications.
    Notifications,
    /// Audit trail.
    Audit,
    /// Service catalog.
    ServiceCatalog,
    /// Desktop agent downloads.
    Downloads,
}

impl PermissionModule {
    /// Returns the stable module key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tickets => "tickets",
            Self::Users => "users",
            Self::Roles => "roles",
            Self::Queues => "queues",
            Self::Clients => "clients",
            Self::Resources => "resources",
            Self::Licenses => "licenses",
            Self::Settings => "settings",
            Self::Reports => "reports",
            Self::ServiceDesks => "service-desks",
            Self::Sla => "sla",
            Self::Timesheets => "timesheets",
            Self::Notifications => "notifications",
            Self::Audit => "audit",
            Self::ServiceCatalog => "service-catalog",
            Self::Downloads => "downloads",
        }
    }

    /// Returns the permissions of this module in catalog order.
    #[must_use]
    pub fn permissions(&self) -> Vec<Permission> {
        Permission::all()
            .iter()
            .copied()
            .filter(|permission| permission.module() == *self)
            .collect()
    }
}

/// Parses transport permission values, rejecting every unknown value at once.
///
/// Duplicates are dropped; the first occurrence keeps its position.
pub fn parse_permissions<I, S>(values: I) -> AppResult<Vec<Permission>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut permissions = Vec::new();
    let mut unknown = Vec::new();

    for value in values {
        let value = value.as_ref();
        match Permission::from_str(value) {
            Ok(permission) => {
                if !permissions.contains(&permission) {
                    permissions.push(permission);
                }
            }
            Err(_) => unknown.push(value.to_owned()),
        }
    }

    if !unknown.is_empty() {
        return Err(AppError::Validation(format!(
            "invalid permissions: {}",
            unknown.join(", ")
        )));
    }

    Ok(permissions)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::str::FromStr;

    use super::{Permission, PermissionModule, parse_permissions};

    #[test]
    fn storage_values_are_unique_and_parse_back() {
        let mut seen = HashSet::new();
        for permission in Permission::all() {
            assert!(seen.insert(permission.as_str()));
            assert!(matches!(
                Permission::from_str(permission.as_str()),
                Ok(parsed) if parsed == *permission
            ));
        }
    }

    #[test]
    fn storage_value_prefix_matches_module() {
        for permission in Permission::all() {
            let prefix = permission.as_str().split(':').next().unwrap_or_default();
            assert_eq!(prefix, permission.module().as_str());
        }
    }

    #[test]
    fn unknown_permission_is_rejected() {
        assert!(Permission::from_str("tickets:explode").is_err());
        assert!(Permission::from_str("*").is_err());
    }

    #[test]
    fn parse_permissions_reports_every_unknown_value() {
        let result = parse_permissions(["tickets:read", "nope:one", "nope:two"]);
        let message = match result {
            Err(error) => error.to_string(),
            Ok(_) => String::new(),
        };
        assert!(message.contains("nope:one"));
        assert!(message.contains("nope:two"));
    }

    #[test]
    fn parse_permissions_drops_duplicates() {
        let parsed =
            parse_permissions(["tickets:read", "users:read", "tickets:read"]).unwrap_or_default();
        assert_eq!(parsed, vec![Permission::TicketsRead, Permission::UsersRead]);
    }

    #[test]
    fn module_grouping_covers_catalog() {
        let grouped: usize = [
            PermissionModule::Tickets,
            PermissionModule::Users,
            PermissionModule::Roles,
            PermissionModule::Queues,
            PermissionModule::Clients,
            PermissionModule::Resources,
            PermissionModule::Licenses,
            PermissionModule::Settings,
            PermissionModule::Reports,
            PermissionModule::ServiceDesks,
            PermissionModule::Sla,
            PermissionModule::Timesheets,
            PermissionModule::Notifications,
            PermissionModule::Audit,
            PermissionModule::ServiceCatalog,
            PermissionModule::Downloads,
        ]
        .iter()
        .map(|module| module.permissions().len())
        .sum();

        assert_eq!(grouped, Permission::all().len());
        assert_eq!(PermissionModule::Tickets.permissions().len(), 11);
    }
}
