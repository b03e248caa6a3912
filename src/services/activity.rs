//! Activity trail: best-effort appends and per-lead feeds

use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::{ActivityFilter, ActivityStore, LeadFilter, LeadStore, Store};
use crate::error::CrmError;
use crate::tenancy::TenantContext;
use crate::types::{Activity, ListRequest, ListResponse, NewActivity};

/// Append an activity. Failures are logged and never reach the caller:
/// the mutation that produced the activity has already happened.
pub async fn record_activity(store: &dyn Store, activity: NewActivity) {
    let activity = activity.into_activity();
    match store.append_activity(&activity).await {
        Ok(()) => debug!("Recorded {:?} activity {}", activity.activity_type, activity.id),
        Err(e) => warn!(
            "Failed to record {:?} activity for lead {:?}: {}",
            activity.activity_type, activity.lead_id, e
        ),
    }
}

/// Activity feed of one lead, newest first.
///
/// The lead must belong to the caller's tenant; otherwise the lead is
/// reported missing. Activities written before tenancy are included.
pub async fn list_lead_activities(
    store: &dyn Store,
    ctx: &TenantContext,
    lead_id: Uuid,
    list: &ListRequest,
) -> Result<ListResponse<Activity>, CrmError> {
    store
        .find_lead(&LeadFilter::by_id_for_tenant(ctx.tenant_id, lead_id))
        .await?
        .ok_or(CrmError::NotFound("Lead"))?;

    let page = list.normalized();
    let (items, total) = store
        .list_activities(&ActivityFilter::for_lead_in_tenant(ctx.tenant_id, lead_id), page)
        .await?;

    Ok(ListResponse::new(items, total, page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::tenancy::{Role, TenantId};
    use crate::types::{ActivityType, LeadInput};

    fn ctx(tenant: TenantId) -> TenantContext {
        TenantContext {
            tenant_id: tenant,
            user_id: tenant.as_uuid(),
            role: Role::Admin,
        }
    }

    async fn lead_in(store: &MemoryStore, tenant: TenantId) -> Uuid {
        let input = LeadInput {
            first_name: "Ada".into(),
            email: format!("{}@example.com", Uuid::new_v4()),
            ..Default::default()
        };
        store.upsert_lead(tenant, tenant.as_uuid(), &input).await.unwrap().0.id
    }

    #[tokio::test]
    async fn test_record_activity_swallows_failures() {
        let store = MemoryStore::new();
        store.faults.lock().activity_append = true;
        let t = TenantId(Uuid::new_v4());

        record_activity(&store, NewActivity::new(ActivityType::LeadCreated, t, Uuid::new_v4(), "x")).await;

        let (items, _) = store
            .list_activities(&ActivityFilter::for_tenant(t), Default::default())
            .await
            .unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_feed_includes_legacy_rows_newest_first() {
        let store = MemoryStore::new();
        let t = TenantId(Uuid::new_v4());
        let lead_id = lead_in(&store, t).await;

        let mut legacy = NewActivity::new(ActivityType::StatusChanged, t, Uuid::new_v4(), "old")
            .for_lead(lead_id)
            .into_activity();
        legacy.tenant_id = None;
        legacy.created_at = legacy.created_at - chrono::Duration::days(400);
        store.push_raw_activity(legacy);

        record_activity(
            &store,
            NewActivity::new(ActivityType::LeadAssigned, t, Uuid::new_v4(), "new").for_lead(lead_id),
        )
        .await;

        let feed = list_lead_activities(&store, &ctx(t), lead_id, &ListRequest::default())
            .await
            .unwrap();
        assert_eq!(feed.total, 2);
        assert_eq!(feed.items[0].details, "new");
        assert_eq!(feed.items[1].details, "old");
    }

    #[tokio::test]
    async fn test_feed_of_foreign_lead_is_not_found() {
        let store = MemoryStore::new();
        let a = TenantId(Uuid::new_v4());
        let b = TenantId(Uuid::new_v4());
        let lead_b = lead_in(&store, b).await;

        let result = list_lead_activities(&store, &ctx(a), lead_b, &ListRequest::default()).await;
        assert!(matches!(result, Err(CrmError::NotFound("Lead"))));
    }
}
