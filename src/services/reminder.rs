//! Follow-up reminders
//!
//! Transitions are decided by [`Reminder`] itself; this layer loads the
//! reminder through a tenant filter, applies the transition, persists it and
//! appends an activity.

use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::db::{LeadFilter, LeadStore, ReminderFilter, ReminderStore, Store};
use crate::error::CrmError;
use crate::services::activity::record_activity;
use crate::tenancy::TenantContext;
use crate::types::{
    ActivityType, CreateReminderRequest, ListRemindersRequest, ListResponse, NewActivity, Reminder,
    ReminderEdit, ReminderStatus,
};

async fn load(store: &dyn Store, ctx: &TenantContext, id: Uuid) -> Result<(ReminderFilter, Reminder), CrmError> {
    let filter = ReminderFilter::by_id_for_tenant(ctx.tenant_id, id);
    let reminder = store
        .find_reminder(&filter)
        .await?
        .ok_or(CrmError::NotFound("Reminder"))?;
    Ok((filter, reminder))
}

async fn save(
    store: &dyn Store,
    ctx: &TenantContext,
    filter: &ReminderFilter,
    reminder: &Reminder,
    activity_type: ActivityType,
    details: String,
) -> Result<(), CrmError> {
    if !store.update_reminder(filter, reminder).await? {
        return Err(CrmError::NotFound("Reminder"));
    }

    let mut activity = NewActivity::new(activity_type, ctx.tenant_id, ctx.user_id, details).with_metadata(json!({
        "reminderId": reminder.id,
        "status": reminder.status,
    }));
    if let Some(lead_id) = reminder.lead_id {
        activity = activity.for_lead(lead_id);
    }
    record_activity(store, activity).await;
    Ok(())
}

pub async fn create_reminder(
    store: &dyn Store,
    ctx: &TenantContext,
    request: &CreateReminderRequest,
) -> Result<Reminder, CrmError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(CrmError::Validation("Reminder title is required".to_string()));
    }

    if let Some(lead_id) = request.lead_id {
        store
            .find_lead(&LeadFilter::by_id_for_tenant(ctx.tenant_id, lead_id))
            .await?
            .ok_or(CrmError::NotFound("Lead"))?;
    }

    let now = Utc::now();
    let reminder = Reminder {
        id: Uuid::new_v4(),
        tenant_id: ctx.tenant_id,
        lead_id: request.lead_id,
        user_id: ctx.user_id,
        title: title.to_string(),
        notes: request.notes.clone(),
        reminder_date: request.reminder_date,
        reminder_time: request.reminder_time,
        status: ReminderStatus::Pending,
        completed_at: None,
        snoozed_until: None,
        notification_sent: false,
        created_at: now,
        updated_at: now,
    };
    let reminder = store.insert_reminder(&reminder).await?;

    let mut activity = NewActivity::new(
        ActivityType::ReminderCreated,
        ctx.tenant_id,
        ctx.user_id,
        format!("Reminder '{}' set for {}", reminder.title, reminder.reminder_date),
    )
    .with_metadata(json!({ "reminderId": reminder.id }));
    if let Some(lead_id) = reminder.lead_id {
        activity = activity.for_lead(lead_id);
    }
    record_activity(store, activity).await;

    info!("Created reminder {} for user {}", reminder.id, ctx.user_id);
    Ok(reminder)
}

/// Reminders of the tenant ordered by due date, optionally narrowed
pub async fn list_reminders(
    store: &dyn Store,
    ctx: &TenantContext,
    request: &ListRemindersRequest,
) -> Result<ListResponse<Reminder>, CrmError> {
    let page = request.list.normalized();
    let filter = ReminderFilter::for_tenant(ctx.tenant_id)
        .for_lead(request.lead_id)
        .with_status(request.status);
    let (items, total) = store.list_reminders(&filter, page).await?;
    Ok(ListResponse::new(items, total, page))
}

pub async fn update_reminder(
    store: &dyn Store,
    ctx: &TenantContext,
    id: Uuid,
    edit: &ReminderEdit,
) -> Result<Reminder, CrmError> {
    if edit.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(CrmError::Validation("Reminder title is required".to_string()));
    }

    let (filter, mut reminder) = load(store, ctx, id).await?;
    let reopened = reminder.apply_edit(edit, Utc::now());
    let details = if reopened {
        format!("Reminder '{}' rescheduled to {}", reminder.title, reminder.reminder_date)
    } else {
        format!("Reminder '{}' updated", reminder.title)
    };
    save(store, ctx, &filter, &reminder, ActivityType::ReminderUpdated, details).await?;
    Ok(reminder)
}

pub async fn complete_reminder(store: &dyn Store, ctx: &TenantContext, id: Uuid) -> Result<Reminder, CrmError> {
    let (filter, mut reminder) = load(store, ctx, id).await?;
    reminder.complete(Utc::now())?;
    let details = format!("Reminder '{}' completed", reminder.title);
    save(store, ctx, &filter, &reminder, ActivityType::ReminderCompleted, details).await?;
    Ok(reminder)
}

pub async fn snooze_reminder(
    store: &dyn Store,
    ctx: &TenantContext,
    id: Uuid,
    until: chrono::DateTime<Utc>,
) -> Result<Reminder, CrmError> {
    let now = Utc::now();
    if until <= now {
        return Err(CrmError::Validation("Snooze time must be in the future".to_string()));
    }

    let (filter, mut reminder) = load(store, ctx, id).await?;
    reminder.snooze(until, now)?;
    let details = format!("Reminder '{}' snoozed until {}", reminder.title, until.format("%Y-%m-%d %H:%M"));
    save(store, ctx, &filter, &reminder, ActivityType::ReminderSnoozed, details).await?;
    Ok(reminder)
}

pub async fn dismiss_reminder(store: &dyn Store, ctx: &TenantContext, id: Uuid) -> Result<Reminder, CrmError> {
    let (filter, mut reminder) = load(store, ctx, id).await?;
    reminder.dismiss(Utc::now())?;
    let details = format!("Reminder '{}' dismissed", reminder.title);
    save(store, ctx, &filter, &reminder, ActivityType::ReminderDismissed, details).await?;
    Ok(reminder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ActivityFilter, ActivityStore, MemoryStore};
    use crate::tenancy::{Role, TenantId};
    use crate::types::{LeadInput, ListRequest, Page};
    use chrono::{Duration, NaiveDate, NaiveTime};

    fn ctx(tenant: TenantId) -> TenantContext {
        TenantContext {
            tenant_id: tenant,
            user_id: Uuid::new_v4(),
            role: Role::Agent,
        }
    }

    fn request(lead_id: Option<Uuid>) -> CreateReminderRequest {
        CreateReminderRequest {
            lead_id,
            title: "Call back".to_string(),
            notes: None,
            reminder_date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            reminder_time: NaiveTime::from_hms_opt(10, 0, 0),
        }
    }

    async fn lead_in(store: &MemoryStore, tenant: TenantId) -> Uuid {
        let input = LeadInput {
            first_name: "Ada".into(),
            email: "ada@x.io".into(),
            ..Default::default()
        };
        store.upsert_lead(tenant, tenant.as_uuid(), &input).await.unwrap().0.id
    }

    #[tokio::test]
    async fn test_create_requires_lead_in_tenant() {
        let store = MemoryStore::new();
        let a = ctx(TenantId(Uuid::new_v4()));
        let b = TenantId(Uuid::new_v4());
        let foreign = lead_in(&store, b).await;

        let result = create_reminder(&store, &a, &request(Some(foreign))).await;
        assert!(matches!(result, Err(CrmError::NotFound("Lead"))));

        let own = lead_in(&store, a.tenant_id).await;
        let reminder = create_reminder(&store, &a, &request(Some(own))).await.unwrap();
        assert_eq!(reminder.status, ReminderStatus::Pending);
        assert_eq!(reminder.user_id, a.user_id);

        let (activities, _) = store
            .list_activities(&ActivityFilter::for_lead_in_tenant(a.tenant_id, own), Page::default())
            .await
            .unwrap();
        assert_eq!(activities[0].activity_type, ActivityType::ReminderCreated);
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title() {
        let store = MemoryStore::new();
        let c = ctx(TenantId(Uuid::new_v4()));
        let blank = CreateReminderRequest {
            title: "  ".to_string(),
            ..request(None)
        };
        assert!(matches!(create_reminder(&store, &c, &blank).await, Err(CrmError::Validation(_))));
    }

    #[tokio::test]
    async fn test_complete_then_complete_again_fails() {
        let store = MemoryStore::new();
        let c = ctx(TenantId(Uuid::new_v4()));
        let reminder = create_reminder(&store, &c, &request(None)).await.unwrap();

        let done = complete_reminder(&store, &c, reminder.id).await.unwrap();
        assert_eq!(done.status, ReminderStatus::Completed);

        let err = complete_reminder(&store, &c, reminder.id).await.unwrap_err();
        assert!(matches!(err, CrmError::Reminder(_)));
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(dismiss_reminder(&store, &c, reminder.id).await.is_err());
    }

    #[tokio::test]
    async fn test_snooze_must_be_in_future() {
        let store = MemoryStore::new();
        let c = ctx(TenantId(Uuid::new_v4()));
        let reminder = create_reminder(&store, &c, &request(None)).await.unwrap();

        let past = Utc::now() - Duration::minutes(5);
        assert!(matches!(
            snooze_reminder(&store, &c, reminder.id, past).await,
            Err(CrmError::Validation(_))
        ));

        let until = Utc::now() + Duration::hours(1);
        let snoozed = snooze_reminder(&store, &c, reminder.id, until).await.unwrap();
        assert_eq!(snoozed.status, ReminderStatus::Snoozed);
        assert_eq!(snoozed.snoozed_until, Some(until));
    }

    #[tokio::test]
    async fn test_rescheduling_reopens_dismissed() {
        let store = MemoryStore::new();
        let c = ctx(TenantId(Uuid::new_v4()));
        let reminder = create_reminder(&store, &c, &request(None)).await.unwrap();
        dismiss_reminder(&store, &c, reminder.id).await.unwrap();

        let edit = ReminderEdit {
            reminder_date: NaiveDate::from_ymd_opt(2025, 6, 9),
            ..Default::default()
        };
        let reopened = update_reminder(&store, &c, reminder.id, &edit).await.unwrap();
        assert_eq!(reopened.status, ReminderStatus::Pending);

        let stored = store
            .find_reminder(&ReminderFilter::by_id_for_tenant(c.tenant_id, reminder.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, ReminderStatus::Pending);
        assert_eq!(stored.reminder_date, NaiveDate::from_ymd_opt(2025, 6, 9).unwrap());
    }

    #[tokio::test]
    async fn test_other_tenant_cannot_touch_reminder() {
        let store = MemoryStore::new();
        let a = ctx(TenantId(Uuid::new_v4()));
        let b = ctx(TenantId(Uuid::new_v4()));
        let reminder = create_reminder(&store, &a, &request(None)).await.unwrap();

        assert!(matches!(
            complete_reminder(&store, &b, reminder.id).await,
            Err(CrmError::NotFound("Reminder"))
        ));
        let list = list_reminders(&store, &b, &ListRemindersRequest::default()).await.unwrap();
        assert_eq!(list.total, 0);
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_lead() {
        let store = MemoryStore::new();
        let c = ctx(TenantId(Uuid::new_v4()));
        let lead_id = lead_in(&store, c.tenant_id).await;
        let on_lead = create_reminder(&store, &c, &request(Some(lead_id))).await.unwrap();
        let loose = create_reminder(&store, &c, &request(None)).await.unwrap();
        complete_reminder(&store, &c, loose.id).await.unwrap();

        let pending = list_reminders(
            &store,
            &c,
            &ListRemindersRequest {
                status: Some(ReminderStatus::Pending),
                lead_id: None,
                list: ListRequest::default(),
            },
        )
        .await
        .unwrap();
        assert_eq!(pending.total, 1);
        assert_eq!(pending.items[0].id, on_lead.id);

        let for_lead = list_reminders(
            &store,
            &c,
            &ListRemindersRequest {
                status: None,
                lead_id: Some(lead_id),
                list: ListRequest::default(),
            },
        )
        .await
        .unwrap();
        assert_eq!(for_lead.total, 1);
    }
}
