//! Tenant-scoped query filters
//!
//! Every read and write against a tenant-owned table goes through one of
//! these filters. The only way to build one is a constructor that takes a
//! [`TenantId`], so a query without a tenant cannot be expressed. The same
//! filter drives the SQL `WHERE` clause (Postgres backend) and `matches`
//! (memory backend).

use uuid::Uuid;

use crate::tenancy::TenantId;
use crate::types::{Activity, ImportBatch, Lead, LeadStatus, Reminder, ReminderStatus};

// =============================================================================
// Leads
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadFilter {
    tenant_id: TenantId,
    id: Option<Uuid>,
    import_id: Option<Uuid>,
    only_imported: bool,
    status: Option<String>,
}

impl LeadFilter {
    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            id: None,
            import_id: None,
            only_imported: false,
            status: None,
        }
    }

    pub fn by_id_for_tenant(tenant_id: TenantId, id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::for_tenant(tenant_id)
        }
    }

    /// Leads created or last touched by one import batch
    pub fn by_import_for_tenant(tenant_id: TenantId, import_id: Uuid) -> Self {
        Self {
            import_id: Some(import_id),
            ..Self::for_tenant(tenant_id)
        }
    }

    /// Leads that came from any import batch
    pub fn imported_for_tenant(tenant_id: TenantId) -> Self {
        Self {
            only_imported: true,
            ..Self::for_tenant(tenant_id)
        }
    }

    pub fn with_status_for_tenant(tenant_id: TenantId, status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Self::for_tenant(tenant_id)
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn import_id(&self) -> Option<Uuid> {
        self.import_id
    }

    pub fn only_imported(&self) -> bool {
        self.only_imported
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        lead.tenant_id == self.tenant_id
            && self.id.map_or(true, |id| lead.id == id)
            && self.import_id.map_or(true, |id| lead.import_id == Some(id))
            && (!self.only_imported || lead.import_id.is_some())
            && self.status.as_deref().map_or(true, |s| lead.status == s)
    }
}

// =============================================================================
// Import batches
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportBatchFilter {
    tenant_id: TenantId,
    id: Option<Uuid>,
}

impl ImportBatchFilter {
    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self { tenant_id, id: None }
    }

    pub fn by_id_for_tenant(tenant_id: TenantId, id: Uuid) -> Self {
        Self { tenant_id, id: Some(id) }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn matches(&self, batch: &ImportBatch) -> bool {
        batch.tenant_id == self.tenant_id && self.id.map_or(true, |id| batch.id == id)
    }
}

// =============================================================================
// Activities
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityFilter {
    tenant_id: TenantId,
    lead_id: Option<Uuid>,
    include_legacy: bool,
}

impl ActivityFilter {
    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            lead_id: None,
            include_legacy: false,
        }
    }

    /// Activities of one lead. Also yields rows written before tenancy
    /// (no tenant id), so the caller must have verified the lead belongs
    /// to `tenant_id` first.
    pub fn for_lead_in_tenant(tenant_id: TenantId, lead_id: Uuid) -> Self {
        Self {
            tenant_id,
            lead_id: Some(lead_id),
            include_legacy: true,
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn lead_id(&self) -> Option<Uuid> {
        self.lead_id
    }

    pub fn include_legacy(&self) -> bool {
        self.include_legacy
    }

    pub fn matches(&self, activity: &Activity) -> bool {
        let tenant_ok = match activity.tenant_id {
            Some(t) => t == self.tenant_id,
            None => self.include_legacy,
        };
        tenant_ok && self.lead_id.map_or(true, |id| activity.lead_id == Some(id))
    }
}

// =============================================================================
// Statuses
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusFilter {
    tenant_id: TenantId,
    id: Option<Uuid>,
    name: Option<String>,
}

impl StatusFilter {
    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            id: None,
            name: None,
        }
    }

    pub fn by_id_for_tenant(tenant_id: TenantId, id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::for_tenant(tenant_id)
        }
    }

    /// Case-insensitive name match
    pub fn by_name_for_tenant(tenant_id: TenantId, name: &str) -> Self {
        Self {
            name: Some(name.trim().to_lowercase()),
            ..Self::for_tenant(tenant_id)
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    /// Lowercased name, if filtering by name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn matches(&self, status: &LeadStatus) -> bool {
        status.tenant_id == self.tenant_id
            && self.id.map_or(true, |id| status.id == id)
            && self
                .name
                .as_deref()
                .map_or(true, |n| status.name.to_lowercase() == n)
    }
}

// =============================================================================
// Reminders
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderFilter {
    tenant_id: TenantId,
    id: Option<Uuid>,
    lead_id: Option<Uuid>,
    status: Option<ReminderStatus>,
}

impl ReminderFilter {
    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            id: None,
            lead_id: None,
            status: None,
        }
    }

    pub fn by_id_for_tenant(tenant_id: TenantId, id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::for_tenant(tenant_id)
        }
    }

    /// Narrow to one lead. Narrowing never widens the tenant scope.
    pub fn for_lead(mut self, lead_id: Option<Uuid>) -> Self {
        self.lead_id = lead_id;
        self
    }

    pub fn with_status(mut self, status: Option<ReminderStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn lead_id(&self) -> Option<Uuid> {
        self.lead_id
    }

    pub fn status(&self) -> Option<ReminderStatus> {
        self.status
    }

    pub fn matches(&self, reminder: &Reminder) -> bool {
        reminder.tenant_id == self.tenant_id
            && self.id.map_or(true, |id| reminder.id == id)
            && self.lead_id.map_or(true, |id| reminder.lead_id == Some(id))
            && self.status.map_or(true, |s| reminder.status == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::types::{ActivityType, NewActivity, NEW_STATUS};

    fn lead(tenant: TenantId, import_id: Option<Uuid>) -> Lead {
        let now = Utc::now();
        Lead {
            id: Uuid::new_v4(),
            tenant_id: tenant,
            created_by: tenant.as_uuid(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: String::new(),
            country: String::new(),
            source: None,
            status: NEW_STATUS.into(),
            comments: None,
            assigned_to: None,
            import_id,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_lead_filter_never_crosses_tenants() {
        let a = TenantId(Uuid::new_v4());
        let b = TenantId(Uuid::new_v4());
        let lead_b = lead(b, None);

        assert!(!LeadFilter::for_tenant(a).matches(&lead_b));
        assert!(!LeadFilter::by_id_for_tenant(a, lead_b.id).matches(&lead_b));
        assert!(LeadFilter::by_id_for_tenant(b, lead_b.id).matches(&lead_b));
    }

    #[test]
    fn test_lead_filter_import_scopes() {
        let t = TenantId(Uuid::new_v4());
        let batch = Uuid::new_v4();
        let imported = lead(t, Some(batch));
        let manual = lead(t, None);

        assert!(LeadFilter::by_import_for_tenant(t, batch).matches(&imported));
        assert!(!LeadFilter::by_import_for_tenant(t, batch).matches(&manual));
        assert!(LeadFilter::imported_for_tenant(t).matches(&imported));
        assert!(!LeadFilter::imported_for_tenant(t).matches(&manual));
        assert!(LeadFilter::with_status_for_tenant(t, NEW_STATUS).matches(&manual));
    }

    #[test]
    fn test_activity_filter_legacy_rows_only_per_lead() {
        let t = TenantId(Uuid::new_v4());
        let lead_id = Uuid::new_v4();
        let mut legacy = NewActivity::new(ActivityType::StatusChanged, t, Uuid::new_v4(), "x")
            .for_lead(lead_id)
            .into_activity();
        legacy.tenant_id = None;

        assert!(ActivityFilter::for_lead_in_tenant(t, lead_id).matches(&legacy));
        assert!(!ActivityFilter::for_tenant(t).matches(&legacy));

        let other = NewActivity::new(ActivityType::StatusChanged, TenantId(Uuid::new_v4()), Uuid::new_v4(), "x")
            .for_lead(lead_id)
            .into_activity();
        assert!(!ActivityFilter::for_lead_in_tenant(t, lead_id).matches(&other));
    }

    #[test]
    fn test_status_filter_name_is_case_insensitive() {
        let t = TenantId(Uuid::new_v4());
        let now = Utc::now();
        let status = LeadStatus {
            id: Uuid::new_v4(),
            tenant_id: t,
            name: "Contacted".into(),
            created_at: now,
            updated_at: now,
        };
        assert!(StatusFilter::by_name_for_tenant(t, " contacted ").matches(&status));
        assert!(!StatusFilter::by_name_for_tenant(TenantId(Uuid::new_v4()), "contacted").matches(&status));
    }
}
