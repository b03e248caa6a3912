//! Lead status changes and tenant status management

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{LeadFilter, LeadStore, StatusFilter, StatusStore, Store};
use crate::error::{CrmError, StoreError};
use crate::services::activity::record_activity;
use crate::services::status_cache::StatusNameCache;
use crate::tenancy::{TenantContext, TenantId};
use crate::types::{ActivityType, DeleteStatusResponse, Lead, LeadStatus, NewActivity, NEW_STATUS};

/// Map a status as given by a caller onto the stored value.
///
/// Accepts the built-in `new` in any case, the id of a tenant status or the
/// name of one (case-insensitive). Returns `None` when nothing matches.
pub async fn resolve_status_input(
    store: &dyn Store,
    tenant_id: TenantId,
    input: &str,
) -> Result<Option<String>, CrmError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    if input.eq_ignore_ascii_case(NEW_STATUS) {
        return Ok(Some(NEW_STATUS.to_string()));
    }

    let filter = match Uuid::parse_str(input) {
        Ok(id) => StatusFilter::by_id_for_tenant(tenant_id, id),
        Err(_) => StatusFilter::by_name_for_tenant(tenant_id, input),
    };
    Ok(store.find_status(&filter).await?.map(|s| s.id.to_string()))
}

/// Move a lead to another status and record the change
pub async fn change_lead_status(
    store: &dyn Store,
    cache: &StatusNameCache,
    ctx: &TenantContext,
    lead_id: Uuid,
    status: &str,
) -> Result<Lead, CrmError> {
    let filter = LeadFilter::by_id_for_tenant(ctx.tenant_id, lead_id);
    let lead = store.find_lead(&filter).await?.ok_or(CrmError::NotFound("Lead"))?;

    let new_status = resolve_status_input(store, ctx.tenant_id, status)
        .await?
        .ok_or_else(|| CrmError::Validation(format!("Unknown status '{}'", status.trim())))?;

    if store.set_lead_status(&filter, &new_status).await? == 0 {
        return Err(CrmError::NotFound("Lead"));
    }

    let old_status = lead.status.clone();
    let old_name = cache.resolve_name(store, ctx.tenant_id, &old_status).await;
    let new_name = cache.resolve_name(store, ctx.tenant_id, &new_status).await;

    info!("Lead {} status {} -> {}", lead_id, old_status, new_status);

    record_activity(
        store,
        NewActivity::new(
            ActivityType::StatusChanged,
            ctx.tenant_id,
            ctx.user_id,
            format!("Status changed from {} to {}", old_name, new_name),
        )
        .for_lead(lead_id)
        .with_metadata(json!({
            "oldStatus": old_status,
            "newStatus": new_status,
            "oldStatusName": old_name,
            "newStatusName": new_name,
        })),
    )
    .await;

    Ok(Lead {
        status: new_status,
        updated_at: Utc::now(),
        ..lead
    })
}

fn validate_status_name(name: &str) -> Result<&str, CrmError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CrmError::Validation("Status name is required".to_string()));
    }
    if name.eq_ignore_ascii_case(NEW_STATUS) {
        return Err(CrmError::Validation(format!("'{}' is a built-in status", name)));
    }
    if Uuid::parse_str(name).is_ok() {
        return Err(CrmError::Validation("Status name must not look like an id".to_string()));
    }
    Ok(name)
}

/// Statuses of the tenant, alphabetical
pub async fn list_statuses(store: &dyn Store, ctx: &TenantContext) -> Result<Vec<LeadStatus>, CrmError> {
    Ok(store.list_statuses(&StatusFilter::for_tenant(ctx.tenant_id)).await?)
}

pub async fn create_status(
    store: &dyn Store,
    cache: &StatusNameCache,
    ctx: &TenantContext,
    name: &str,
) -> Result<LeadStatus, CrmError> {
    let name = validate_status_name(name)?;
    let now = Utc::now();
    let status = LeadStatus {
        id: Uuid::new_v4(),
        tenant_id: ctx.tenant_id,
        name: name.to_string(),
        created_at: now,
        updated_at: now,
    };

    let status = store.insert_status(&status).await.map_err(|e| {
        let e = CrmError::from(e);
        if is_duplicate_name(&e) {
            debug!("Status '{}' already exists in tenant {}", name, ctx.tenant_id);
        }
        e
    })?;
    cache.insert(ctx.tenant_id, status.id, status.name.clone());
    info!("Created status '{}' ({}) for tenant {}", status.name, status.id, ctx.tenant_id);
    Ok(status)
}

pub async fn rename_status(
    store: &dyn Store,
    cache: &StatusNameCache,
    ctx: &TenantContext,
    id: Uuid,
    name: &str,
) -> Result<LeadStatus, CrmError> {
    let name = validate_status_name(name)?;
    let renamed = store
        .rename_status(&StatusFilter::by_id_for_tenant(ctx.tenant_id, id), name)
        .await?
        .ok_or(CrmError::NotFound("Status"))?;
    cache.invalidate(ctx.tenant_id, id);
    info!("Renamed status {} to '{}'", id, renamed.name);
    Ok(renamed)
}

/// Delete a status. Leads carrying it fall back to `NEW`.
pub async fn delete_status(
    store: &dyn Store,
    cache: &StatusNameCache,
    ctx: &TenantContext,
    id: Uuid,
) -> Result<DeleteStatusResponse, CrmError> {
    let filter = StatusFilter::by_id_for_tenant(ctx.tenant_id, id);
    store.find_status(&filter).await?.ok_or(CrmError::NotFound("Status"))?;

    let reset_leads = store
        .set_lead_status(&LeadFilter::with_status_for_tenant(ctx.tenant_id, id.to_string()), NEW_STATUS)
        .await?;
    let deleted = store.delete_status(&filter).await? > 0;
    cache.invalidate(ctx.tenant_id, id);

    debug!("Deleted status {}, {} leads reset to {}", id, reset_leads, NEW_STATUS);
    Ok(DeleteStatusResponse { deleted, reset_leads })
}

/// True for the error raised when a status name already exists
pub fn is_duplicate_name(err: &CrmError) -> bool {
    matches!(err, CrmError::Store(StoreError::Conflict(_)))
}
