use chrono::{DateTime, Utc};

use systicket_domain::{PermissionAuditAction, PermissionAuditRecord, UserId};

/// Filters and offset pagination for audit listings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionAuditQuery {
    /// Restrict to one target user.
    pub target_user_id: Option<UserId>,
    /// Restrict to one actor.
    pub changed_by_id: Option<UserId>,
    /// Restrict to one action.
    pub action: Option<PermissionAuditAction>,
    /// Inclusive lower bound on `created_at`.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub end_date: Option<DateTime<Utc>>,
    /// Maximum rows returned.
    pub limit: usize,
    /// Rows skipped.
    pub offset: usize,
}

/// One page of audit rows, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionAuditPage {
    /// Rows of this page.
    pub entries: Vec<PermissionAuditRecord>,
    /// Rows matching the filters across all pages.
    pub total: u64,
}
