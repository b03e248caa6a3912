//! PostgreSQL store backend

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::tenancy::TenantId;
use crate::types::{
    Activity, ImportBatch, Lead, LeadInput, LeadStatus, Page, Reminder, TenantOverview,
    UpsertOutcome,
};

use super::filters::{ActivityFilter, ImportBatchFilter, LeadFilter, ReminderFilter, StatusFilter};
use super::queries;
use super::store::{ActivityStore, ImportBatchStore, LeadStore, OverviewStore, ReminderStore, StatusStore};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeadStore for PgStore {
    async fn upsert_lead(
        &self,
        tenant_id: TenantId,
        created_by: Uuid,
        lead: &LeadInput,
    ) -> StoreResult<(Lead, UpsertOutcome)> {
        queries::lead::upsert_lead(&self.pool, tenant_id, created_by, lead).await
    }

    async fn find_lead(&self, filter: &LeadFilter) -> StoreResult<Option<Lead>> {
        queries::lead::find_lead(&self.pool, filter).await
    }

    async fn list_leads(&self, filter: &LeadFilter, page: Page) -> StoreResult<(Vec<Lead>, i64)> {
        queries::lead::list_leads(&self.pool, filter, page).await
    }

    async fn set_lead_status(&self, filter: &LeadFilter, status: &str) -> StoreResult<u64> {
        queries::lead::set_lead_status(&self.pool, filter, status).await
    }

    async fn set_lead_assignee(&self, filter: &LeadFilter, assigned_to: Option<Uuid>) -> StoreResult<u64> {
        queries::lead::set_lead_assignee(&self.pool, filter, assigned_to).await
    }

    async fn delete_leads(&self, filter: &LeadFilter) -> StoreResult<u64> {
        queries::lead::delete_leads(&self.pool, filter).await
    }
}

#[async_trait]
impl ImportBatchStore for PgStore {
    async fn insert_import_batch(&self, batch: &ImportBatch) -> StoreResult<ImportBatch> {
        queries::import::insert_import_batch(&self.pool, batch).await
    }

    async fn find_import_batch(&self, filter: &ImportBatchFilter) -> StoreResult<Option<ImportBatch>> {
        queries::import::find_import_batch(&self.pool, filter).await
    }

    async fn list_import_batches(
        &self,
        filter: &ImportBatchFilter,
        page: Page,
    ) -> StoreResult<(Vec<ImportBatch>, i64)> {
        queries::import::list_import_batches(&self.pool, filter, page).await
    }

    async fn complete_import_batch(
        &self,
        filter: &ImportBatchFilter,
        success_count: i32,
        failure_count: i32,
    ) -> StoreResult<Option<ImportBatch>> {
        queries::import::complete_import_batch(&self.pool, filter, success_count, failure_count).await
    }

    async fn delete_import_batches(&self, filter: &ImportBatchFilter) -> StoreResult<u64> {
        queries::import::delete_import_batches(&self.pool, filter).await
    }
}

#[async_trait]
impl ActivityStore for PgStore {
    async fn append_activity(&self, activity: &Activity) -> StoreResult<()> {
        queries::activity::append_activity(&self.pool, activity).await
    }

    async fn list_activities(&self, filter: &ActivityFilter, page: Page) -> StoreResult<(Vec<Activity>, i64)> {
        queries::activity::list_activities(&self.pool, filter, page).await
    }
}

#[async_trait]
impl StatusStore for PgStore {
    async fn insert_status(&self, status: &LeadStatus) -> StoreResult<LeadStatus> {
        queries::status::insert_status(&self.pool, status).await
    }

    async fn find_status(&self, filter: &StatusFilter) -> StoreResult<Option<LeadStatus>> {
        queries::status::find_status(&self.pool, filter).await
    }

    async fn list_statuses(&self, filter: &StatusFilter) -> StoreResult<Vec<LeadStatus>> {
        queries::status::list_statuses(&self.pool, filter).await
    }

    async fn rename_status(&self, filter: &StatusFilter, name: &str) -> StoreResult<Option<LeadStatus>> {
        queries::status::rename_status(&self.pool, filter, name).await
    }

    async fn delete_status(&self, filter: &StatusFilter) -> StoreResult<u64> {
        queries::status::delete_status(&self.pool, filter).await
    }
}

#[async_trait]
impl ReminderStore for PgStore {
    async fn insert_reminder(&self, reminder: &Reminder) -> StoreResult<Reminder> {
        queries::reminder::insert_reminder(&self.pool, reminder).await
    }

    async fn find_reminder(&self, filter: &ReminderFilter) -> StoreResult<Option<Reminder>> {
        queries::reminder::find_reminder(&self.pool, filter).await
    }

    async fn list_reminders(&self, filter: &ReminderFilter, page: Page) -> StoreResult<(Vec<Reminder>, i64)> {
        queries::reminder::list_reminders(&self.pool, filter, page).await
    }

    async fn update_reminder(&self, filter: &ReminderFilter, reminder: &Reminder) -> StoreResult<bool> {
        queries::reminder::update_reminder(&self.pool, filter, reminder).await
    }
}

#[async_trait]
impl OverviewStore for PgStore {
    async fn tenant_overview(&self) -> StoreResult<Vec<TenantOverview>> {
        queries::overview::tenant_overview(&self.pool).await
    }
}
