//! Store traits
//!
//! Services talk to persistence only through these traits. `PgStore` is the
//! production backend; `MemoryStore` backs tests and `STORE_BACKEND=memory`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::tenancy::TenantId;
use crate::types::{
    Activity, ImportBatch, Lead, LeadInput, LeadStatus, Page, Reminder, TenantOverview,
    UpsertOutcome,
};

use super::filters::{ActivityFilter, ImportBatchFilter, LeadFilter, ReminderFilter, StatusFilter};

#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Insert or update the lead keyed by `(tenant_id, lowercase email)`.
    /// `created_by` is only written on insert.
    async fn upsert_lead(
        &self,
        tenant_id: TenantId,
        created_by: Uuid,
        lead: &LeadInput,
    ) -> StoreResult<(Lead, UpsertOutcome)>;

    async fn find_lead(&self, filter: &LeadFilter) -> StoreResult<Option<Lead>>;

    /// Newest first, with the total count of matching leads
    async fn list_leads(&self, filter: &LeadFilter, page: Page) -> StoreResult<(Vec<Lead>, i64)>;

    async fn set_lead_status(&self, filter: &LeadFilter, status: &str) -> StoreResult<u64>;

    async fn set_lead_assignee(&self, filter: &LeadFilter, assigned_to: Option<Uuid>) -> StoreResult<u64>;

    async fn delete_leads(&self, filter: &LeadFilter) -> StoreResult<u64>;
}

#[async_trait]
pub trait ImportBatchStore: Send + Sync {
    async fn insert_import_batch(&self, batch: &ImportBatch) -> StoreResult<ImportBatch>;

    async fn find_import_batch(&self, filter: &ImportBatchFilter) -> StoreResult<Option<ImportBatch>>;

    /// Newest first, with the total count
    async fn list_import_batches(
        &self,
        filter: &ImportBatchFilter,
        page: Page,
    ) -> StoreResult<(Vec<ImportBatch>, i64)>;

    /// Mark completed with final counts
    async fn complete_import_batch(
        &self,
        filter: &ImportBatchFilter,
        success_count: i32,
        failure_count: i32,
    ) -> StoreResult<Option<ImportBatch>>;

    async fn delete_import_batches(&self, filter: &ImportBatchFilter) -> StoreResult<u64>;
}

#[async_trait]
pub trait ActivityStore: Send + Sync {
    async fn append_activity(&self, activity: &Activity) -> StoreResult<()>;

    /// Newest first, with the total count
    async fn list_activities(&self, filter: &ActivityFilter, page: Page) -> StoreResult<(Vec<Activity>, i64)>;
}

#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Fails with `StoreError::Conflict` when the name is taken in the tenant
    async fn insert_status(&self, status: &LeadStatus) -> StoreResult<LeadStatus>;

    async fn find_status(&self, filter: &StatusFilter) -> StoreResult<Option<LeadStatus>>;

    /// Ordered by name
    async fn list_statuses(&self, filter: &StatusFilter) -> StoreResult<Vec<LeadStatus>>;

    async fn rename_status(&self, filter: &StatusFilter, name: &str) -> StoreResult<Option<LeadStatus>>;

    async fn delete_status(&self, filter: &StatusFilter) -> StoreResult<u64>;
}

#[async_trait]
pub trait ReminderStore: Send + Sync {
    async fn insert_reminder(&self, reminder: &Reminder) -> StoreResult<Reminder>;

    async fn find_reminder(&self, filter: &ReminderFilter) -> StoreResult<Option<Reminder>>;

    /// Ordered by due date
    async fn list_reminders(&self, filter: &ReminderFilter, page: Page) -> StoreResult<(Vec<Reminder>, i64)>;

    /// Persist every mutable field of a reminder matched by `filter`
    async fn update_reminder(&self, filter: &ReminderFilter, reminder: &Reminder) -> StoreResult<bool>;
}

/// Cross-tenant aggregation. Callers must have checked for the super admin role.
#[async_trait]
pub trait OverviewStore: Send + Sync {
    async fn tenant_overview(&self) -> StoreResult<Vec<TenantOverview>>;
}

/// Everything the worker needs from persistence
pub trait Store: LeadStore + ImportBatchStore + ActivityStore + StatusStore + ReminderStore + OverviewStore {}

impl<T> Store for T where
    T: LeadStore + ImportBatchStore + ActivityStore + StatusStore + ReminderStore + OverviewStore
{
}
