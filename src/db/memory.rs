//! In-memory store
//!
//! Mirrors the Postgres schema closely enough for the service tests: the
//! `(tenant_id, email)` lead key, case-insensitive status names per tenant,
//! `ON DELETE SET NULL` from leads to batches and `ON DELETE CASCADE` from
//! reminders to leads.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::tenancy::TenantId;
use crate::types::{
    Activity, ImportBatch, ImportBatchStatus, Lead, LeadInput, LeadStatus, Page, Reminder,
    TenantOverview, UpsertOutcome,
};

use super::filters::{ActivityFilter, ImportBatchFilter, LeadFilter, ReminderFilter, StatusFilter};
use super::store::{ActivityStore, ImportBatchStore, LeadStore, OverviewStore, ReminderStore, StatusStore};

#[derive(Default)]
struct Tables {
    leads: Vec<Lead>,
    batches: Vec<ImportBatch>,
    activities: Vec<Activity>,
    statuses: Vec<LeadStatus>,
    reminders: Vec<Reminder>,
}

/// Injected failures for exercising error paths
#[cfg(test)]
#[derive(Debug, Default)]
pub struct Faults {
    pub activity_append: bool,
    pub batch_update: bool,
    pub upsert_emails: Vec<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    #[cfg(test)]
    pub faults: parking_lot::Mutex<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw activity, bypassing tenant stamping (legacy rows in tests)
    #[cfg(test)]
    pub fn push_raw_activity(&self, activity: Activity) {
        self.tables.write().activities.push(activity);
    }
}

fn paginate<T: Clone>(items: Vec<&T>, page: Page) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit as usize)
        .cloned()
        .collect();
    (items, total)
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn upsert_lead(
        &self,
        tenant_id: TenantId,
        created_by: Uuid,
        input: &LeadInput,
    ) -> StoreResult<(Lead, UpsertOutcome)> {
        let email = input.normalized_email();

        #[cfg(test)]
        if self.faults.lock().upsert_emails.contains(&email) {
            return Err(StoreError::Query(format!("injected failure for {}", email)));
        }

        let now = Utc::now();
        let mut tables = self.tables.write();

        if let Some(lead) = tables
            .leads
            .iter_mut()
            .find(|l| l.tenant_id == tenant_id && l.email == email)
        {
            lead.first_name = input.first_name.clone();
            lead.last_name = input.last_name.clone();
            lead.phone = input.phone.clone();
            lead.country = input.country.clone();
            lead.source = input.source.clone();
            lead.status = input.status_or_default().to_string();
            lead.comments = input.comments.clone();
            if input.import_id.is_some() {
                lead.import_id = input.import_id;
            }
            lead.updated_at = now;
            return Ok((lead.clone(), UpsertOutcome::Updated));
        }

        let lead = Lead {
            id: Uuid::new_v4(),
            tenant_id,
            created_by,
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
            email,
            phone: input.phone.clone(),
            country: input.country.clone(),
            source: input.source.clone(),
            status: input.status_or_default().to_string(),
            comments: input.comments.clone(),
            assigned_to: None,
            import_id: input.import_id,
            created_at: now,
            updated_at: now,
        };
        tables.leads.push(lead.clone());
        Ok((lead, UpsertOutcome::Inserted))
    }

    async fn find_lead(&self, filter: &LeadFilter) -> StoreResult<Option<Lead>> {
        Ok(self.tables.read().leads.iter().find(|l| filter.matches(l)).cloned())
    }

    async fn list_leads(&self, filter: &LeadFilter, page: Page) -> StoreResult<(Vec<Lead>, i64)> {
        let tables = self.tables.read();
        let mut leads: Vec<&Lead> = tables.leads.iter().filter(|l| filter.matches(l)).collect();
        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(leads, page))
    }

    async fn set_lead_status(&self, filter: &LeadFilter, status: &str) -> StoreResult<u64> {
        let now = Utc::now();
        let mut count = 0;
        for lead in self.tables.write().leads.iter_mut().filter(|l| filter.matches(l)) {
            lead.status = status.to_string();
            lead.updated_at = now;
            count += 1;
        }
        Ok(count)
    }

    async fn set_lead_assignee(&self, filter: &LeadFilter, assigned_to: Option<Uuid>) -> StoreResult<u64> {
        let now = Utc::now();
        let mut count = 0;
        for lead in self.tables.write().leads.iter_mut().filter(|l| filter.matches(l)) {
            lead.assigned_to = assigned_to;
            lead.updated_at = now;
            count += 1;
        }
        Ok(count)
    }

    async fn delete_leads(&self, filter: &LeadFilter) -> StoreResult<u64> {
        let mut tables = self.tables.write();
        let removed: Vec<Uuid> = tables
            .leads
            .iter()
            .filter(|l| filter.matches(l))
            .map(|l| l.id)
            .collect();
        tables.leads.retain(|l| !filter.matches(l));
        tables
            .reminders
            .retain(|r| r.lead_id.map_or(true, |id| !removed.contains(&id)));
        Ok(removed.len() as u64)
    }
}

#[async_trait]
impl ImportBatchStore for MemoryStore {
    async fn insert_import_batch(&self, batch: &ImportBatch) -> StoreResult<ImportBatch> {
        self.tables.write().batches.push(batch.clone());
        Ok(batch.clone())
    }

    async fn find_import_batch(&self, filter: &ImportBatchFilter) -> StoreResult<Option<ImportBatch>> {
        Ok(self.tables.read().batches.iter().find(|b| filter.matches(b)).cloned())
    }

    async fn list_import_batches(
        &self,
        filter: &ImportBatchFilter,
        page: Page,
    ) -> StoreResult<(Vec<ImportBatch>, i64)> {
        let tables = self.tables.read();
        let mut batches: Vec<&ImportBatch> = tables.batches.iter().filter(|b| filter.matches(b)).collect();
        batches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(batches, page))
    }

    async fn complete_import_batch(
        &self,
        filter: &ImportBatchFilter,
        success_count: i32,
        failure_count: i32,
    ) -> StoreResult<Option<ImportBatch>> {
        #[cfg(test)]
        if self.faults.lock().batch_update {
            return Err(StoreError::Unavailable("injected batch update failure".into()));
        }

        let mut tables = self.tables.write();
        Ok(tables.batches.iter_mut().find(|b| filter.matches(b)).map(|batch| {
            batch.status = ImportBatchStatus::Completed;
            batch.success_count = success_count;
            batch.failure_count = failure_count;
            batch.updated_at = Utc::now();
            batch.clone()
        }))
    }

    async fn delete_import_batches(&self, filter: &ImportBatchFilter) -> StoreResult<u64> {
        let mut tables = self.tables.write();
        let removed: Vec<Uuid> = tables
            .batches
            .iter()
            .filter(|b| filter.matches(b))
            .map(|b| b.id)
            .collect();
        tables.batches.retain(|b| !filter.matches(b));
        for lead in tables.leads.iter_mut() {
            if lead.import_id.is_some_and(|id| removed.contains(&id)) {
                lead.import_id = None;
            }
        }
        Ok(removed.len() as u64)
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn append_activity(&self, activity: &Activity) -> StoreResult<()> {
        #[cfg(test)]
        if self.faults.lock().activity_append {
            return Err(StoreError::Unavailable("injected activity failure".into()));
        }

        self.tables.write().activities.push(activity.clone());
        Ok(())
    }

    async fn list_activities(&self, filter: &ActivityFilter, page: Page) -> StoreResult<(Vec<Activity>, i64)> {
        let tables = self.tables.read();
        let mut activities: Vec<&Activity> = tables.activities.iter().filter(|a| filter.matches(a)).collect();
        // stable sort keeps append order for equal timestamps; reverse it too
        activities.reverse();
        activities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(activities, page))
    }
}

#[async_trait]
impl StatusStore for MemoryStore {
    async fn insert_status(&self, status: &LeadStatus) -> StoreResult<LeadStatus> {
        let mut tables = self.tables.write();
        let name = status.name.to_lowercase();
        if tables
            .statuses
            .iter()
            .any(|s| s.tenant_id == status.tenant_id && s.name.to_lowercase() == name)
        {
            return Err(StoreError::Conflict(format!("status '{}' already exists", status.name)));
        }
        tables.statuses.push(status.clone());
        Ok(status.clone())
    }

    async fn find_status(&self, filter: &StatusFilter) -> StoreResult<Option<LeadStatus>> {
        Ok(self.tables.read().statuses.iter().find(|s| filter.matches(s)).cloned())
    }

    async fn list_statuses(&self, filter: &StatusFilter) -> StoreResult<Vec<LeadStatus>> {
        let tables = self.tables.read();
        let mut statuses: Vec<LeadStatus> = tables.statuses.iter().filter(|s| filter.matches(s)).cloned().collect();
        statuses.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(statuses)
    }

    async fn rename_status(&self, filter: &StatusFilter, name: &str) -> StoreResult<Option<LeadStatus>> {
        let mut tables = self.tables.write();
        let Some(idx) = tables.statuses.iter().position(|s| filter.matches(s)) else {
            return Ok(None);
        };

        let tenant_id = tables.statuses[idx].tenant_id;
        let id = tables.statuses[idx].id;
        let lowered = name.to_lowercase();
        if tables
            .statuses
            .iter()
            .any(|s| s.tenant_id == tenant_id && s.id != id && s.name.to_lowercase() == lowered)
        {
            return Err(StoreError::Conflict(format!("status '{}' already exists", name)));
        }

        let status = &mut tables.statuses[idx];
        status.name = name.to_string();
        status.updated_at = Utc::now();
        Ok(Some(status.clone()))
    }

    async fn delete_status(&self, filter: &StatusFilter) -> StoreResult<u64> {
        let mut tables = self.tables.write();
        let before = tables.statuses.len();
        tables.statuses.retain(|s| !filter.matches(s));
        Ok((before - tables.statuses.len()) as u64)
    }
}

#[async_trait]
impl ReminderStore for MemoryStore {
    async fn insert_reminder(&self, reminder: &Reminder) -> StoreResult<Reminder> {
        self.tables.write().reminders.push(reminder.clone());
        Ok(reminder.clone())
    }

    async fn find_reminder(&self, filter: &ReminderFilter) -> StoreResult<Option<Reminder>> {
        Ok(self.tables.read().reminders.iter().find(|r| filter.matches(r)).cloned())
    }

    async fn list_reminders(&self, filter: &ReminderFilter, page: Page) -> StoreResult<(Vec<Reminder>, i64)> {
        let tables = self.tables.read();
        let mut reminders: Vec<&Reminder> = tables.reminders.iter().filter(|r| filter.matches(r)).collect();
        reminders.sort_by_key(|r| (r.reminder_date, r.reminder_time));
        Ok(paginate(reminders, page))
    }

    async fn update_reminder(&self, filter: &ReminderFilter, reminder: &Reminder) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        match tables.reminders.iter_mut().find(|r| filter.matches(r)) {
            Some(existing) => {
                let (id, tenant_id, created_at) = (existing.id, existing.tenant_id, existing.created_at);
                *existing = Reminder {
                    id,
                    tenant_id,
                    created_at,
                    ..reminder.clone()
                };
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl OverviewStore for MemoryStore {
    async fn tenant_overview(&self) -> StoreResult<Vec<TenantOverview>> {
        fn entry(map: &mut HashMap<TenantId, TenantOverview>, tenant_id: TenantId) -> &mut TenantOverview {
            map.entry(tenant_id).or_insert(TenantOverview {
                tenant_id,
                lead_count: 0,
                import_count: 0,
                activity_count: 0,
            })
        }

        let tables = self.tables.read();
        let mut by_tenant: HashMap<TenantId, TenantOverview> = HashMap::new();

        for lead in &tables.leads {
            entry(&mut by_tenant, lead.tenant_id).lead_count += 1;
        }
        for batch in &tables.batches {
            entry(&mut by_tenant, batch.tenant_id).import_count += 1;
        }
        for activity in &tables.activities {
            if let Some(tenant_id) = activity.tenant_id {
                entry(&mut by_tenant, tenant_id).activity_count += 1;
            }
        }

        let mut overview: Vec<TenantOverview> = by_tenant.into_values().collect();
        overview.sort_by(|a, b| b.lead_count.cmp(&a.lead_count).then(a.tenant_id.cmp(&b.tenant_id)));
        Ok(overview)
    }
}
