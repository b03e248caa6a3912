//! Lead queries and single-lead mutations

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::db::{LeadFilter, LeadStore, Store};
use crate::error::CrmError;
use crate::services::activity::record_activity;
use crate::tenancy::TenantContext;
use crate::types::{ActivityType, Lead, ListRequest, ListResponse, NewActivity};

/// Leads of the caller's tenant, newest first
pub async fn list_leads(
    store: &dyn Store,
    ctx: &TenantContext,
    list: &ListRequest,
) -> Result<ListResponse<Lead>, CrmError> {
    let page = list.normalized();
    let (items, total) = store.list_leads(&LeadFilter::for_tenant(ctx.tenant_id), page).await?;
    Ok(ListResponse::new(items, total, page))
}

pub async fn get_lead(store: &dyn Store, ctx: &TenantContext, id: Uuid) -> Result<Lead, CrmError> {
    store
        .find_lead(&LeadFilter::by_id_for_tenant(ctx.tenant_id, id))
        .await?
        .ok_or(CrmError::NotFound("Lead"))
}

/// Hand a lead to a user, or take it back with `None`.
///
/// Users live outside this service; the assignee id is stored as given.
pub async fn assign_lead(
    store: &dyn Store,
    ctx: &TenantContext,
    id: Uuid,
    assigned_to: Option<Uuid>,
) -> Result<Lead, CrmError> {
    let filter = LeadFilter::by_id_for_tenant(ctx.tenant_id, id);
    let previous = store.find_lead(&filter).await?.ok_or(CrmError::NotFound("Lead"))?;
    store.set_lead_assignee(&filter, assigned_to).await?;

    let details = match assigned_to {
        Some(user) => format!("Lead assigned to {}", user),
        None => "Lead unassigned".to_string(),
    };
    record_activity(
        store,
        NewActivity::new(ActivityType::LeadAssigned, ctx.tenant_id, ctx.user_id, details)
            .for_lead(id)
            .with_metadata(json!({
                "previousAssignee": previous.assigned_to,
                "assignedTo": assigned_to,
            })),
    )
    .await;

    store.find_lead(&filter).await?.ok_or(CrmError::NotFound("Lead"))
}

pub async fn delete_lead(store: &dyn Store, ctx: &TenantContext, id: Uuid) -> Result<(), CrmError> {
    let filter = LeadFilter::by_id_for_tenant(ctx.tenant_id, id);
    let lead = store.find_lead(&filter).await?.ok_or(CrmError::NotFound("Lead"))?;
    if store.delete_leads(&filter).await? == 0 {
        return Err(CrmError::NotFound("Lead"));
    }
    info!("Deleted lead {} ({})", id, lead.email);

    let name = format!("{} {}", lead.first_name, lead.last_name);
    // the lead is gone, so the activity is kept at tenant level
    record_activity(
        store,
        NewActivity::new(
            ActivityType::LeadDeleted,
            ctx.tenant_id,
            ctx.user_id,
            format!("Lead {} deleted", name.trim()),
        )
        .with_metadata(json!({ "leadId": id, "email": lead.email })),
    )
    .await;

    Ok(())
}
