//! Import batch bookkeeping
//!
//! A batch is created before the leads of a file are submitted and is
//! reconciled once with the final counts. Reconciliation is best-effort: by
//! the time it runs the leads are already stored.

use chrono::Utc;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::{ImportBatchFilter, ImportBatchStore, LeadFilter, LeadStore, Store};
use crate::error::CrmError;
use crate::services::activity::record_activity;
use crate::tenancy::TenantContext;
use crate::types::{
    ActivityType, CreateImportBatchRequest, DeleteImportResponse, ImportBatch,
    ListRequest, ListResponse, NewActivity,
};

/// Persist a new batch in the caller's tenant
pub async fn create_import_batch(
    store: &dyn Store,
    ctx: &TenantContext,
    request: &CreateImportBatchRequest,
) -> Result<ImportBatch, CrmError> {
    let file_name = request.file_name.trim();
    if file_name.is_empty() {
        return Err(CrmError::Validation("fileName is required".to_string()));
    }
    for (field, value) in [
        ("recordCount", Some(request.record_count)),
        ("successCount", request.success_count),
        ("failureCount", request.failure_count),
    ] {
        if value.is_some_and(|v| v < 0) {
            return Err(CrmError::Validation(format!("{} must not be negative", field)));
        }
    }

    let now = Utc::now();
    let batch = ImportBatch {
        id: Uuid::new_v4(),
        tenant_id: ctx.tenant_id,
        uploaded_by: ctx.user_id,
        file_name: file_name.to_string(),
        record_count: request.record_count,
        status: request.status.unwrap_or_default(),
        success_count: request.success_count.unwrap_or(0),
        failure_count: request.failure_count.unwrap_or(0),
        created_at: request.timestamp.unwrap_or(now),
        updated_at: now,
    };

    let batch = store.insert_import_batch(&batch).await?;
    info!(
        "Created import batch {} ({}, {} records) for tenant {}",
        batch.id, batch.file_name, batch.record_count, batch.tenant_id
    );
    Ok(batch)
}

/// Mark a batch completed with its final counts.
///
/// Never fails: a missing batch or a store error is logged and `None` is
/// returned.
pub async fn reconcile_import_batch(
    store: &dyn Store,
    ctx: &TenantContext,
    batch_id: Uuid,
    success_count: i32,
    failure_count: i32,
) -> Option<ImportBatch> {
    let filter = ImportBatchFilter::by_id_for_tenant(ctx.tenant_id, batch_id);
    match store.complete_import_batch(&filter, success_count, failure_count).await {
        Ok(Some(batch)) => {
            info!(
                "Import batch {} completed: {} succeeded, {} failed",
                batch_id, success_count, failure_count
            );
            Some(batch)
        }
        Ok(None) => {
            warn!("Import batch {} not found in tenant {}, counts not recorded", batch_id, ctx.tenant_id);
            None
        }
        Err(e) => {
            warn!("Failed to reconcile import batch {}: {}", batch_id, e);
            None
        }
    }
}

/// Batches of the tenant, newest first
pub async fn list_import_batches(
    store: &dyn Store,
    ctx: &TenantContext,
    list: &ListRequest,
) -> Result<ListResponse<ImportBatch>, CrmError> {
    let page = list.normalized();
    let (items, total) = store
        .list_import_batches(&ImportBatchFilter::for_tenant(ctx.tenant_id), page)
        .await?;
    Ok(ListResponse::new(items, total, page))
}

/// Delete one batch and its leads, or with no id every batch of the tenant
/// and every lead that came from an import.
pub async fn delete_import_batches(
    store: &dyn Store,
    ctx: &TenantContext,
    id: Option<Uuid>,
) -> Result<DeleteImportResponse, CrmError> {
    let (lead_filter, batch_filter) = match id {
        Some(id) => {
            let batch_filter = ImportBatchFilter::by_id_for_tenant(ctx.tenant_id, id);
            store
                .find_import_batch(&batch_filter)
                .await?
                .ok_or(CrmError::NotFound("Import"))?;
            (LeadFilter::by_import_for_tenant(ctx.tenant_id, id), batch_filter)
        }
        None => (
            LeadFilter::imported_for_tenant(ctx.tenant_id),
            ImportBatchFilter::for_tenant(ctx.tenant_id),
        ),
    };

    let deleted_leads = store.delete_leads(&lead_filter).await?;
    let deleted_batches = store.delete_import_batches(&batch_filter).await?;

    info!(
        "Deleted {} import batches and {} leads for tenant {}",
        deleted_batches, deleted_leads, ctx.tenant_id
    );

    let details = match id {
        Some(id) => format!("Import {} deleted with {} leads", id, deleted_leads),
        None => format!("All imports deleted ({} batches, {} leads)", deleted_batches, deleted_leads),
    };
    record_activity(
        store,
        NewActivity::new(ActivityType::ImportDeleted, ctx.tenant_id, ctx.user_id, details.clone()).with_metadata(
            json!({
                "importId": id,
                "deletedBatches": deleted_batches,
                "deletedLeads": deleted_leads,
            }),
        ),
    )
    .await;

    Ok(DeleteImportResponse {
        message: details,
        deleted_batches,
        deleted_leads,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::tenancy::{Role, TenantId};
    use crate::types::{ImportBatchStatus, LeadInput, Page};

    fn admin(tenant: TenantId) -> TenantContext {
        TenantContext {
            tenant_id: tenant,
            user_id: tenant.as_uuid(),
            role: Role::Admin,
        }
    }

    fn agent(tenant: TenantId) -> TenantContext {
        TenantContext {
            tenant_id: tenant,
            user_id: Uuid::new_v4(),
            role: Role::Agent,
        }
    }

    async fn imported_lead(store: &MemoryStore, ctx: &TenantContext, batch: Uuid, email: &str) {
        let input = LeadInput {
            first_name: "L".into(),
            email: email.into(),
            import_id: Some(batch),
            ..Default::default()
        };
        store.upsert_lead(ctx.tenant_id, ctx.user_id, &input).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_batch_defaults() {
        let store = MemoryStore::new();
        let t = TenantId(Uuid::new_v4());
        let ctx = agent(t);

        let batch = create_import_batch(&store, &ctx, &CreateImportBatchRequest::new("leads.csv", 2))
            .await
            .unwrap();
        assert_eq!(batch.status, ImportBatchStatus::New);
        assert_eq!(batch.success_count, 0);
        assert_eq!(batch.failure_count, 0);
        assert_eq!(batch.record_count, 2);
        // agents upload into their admin's tenant
        assert_eq!(batch.tenant_id, t);
        assert_eq!(batch.uploaded_by, ctx.user_id);
    }

    #[tokio::test]
    async fn test_create_batch_honours_explicit_fields() {
        let store = MemoryStore::new();
        let ctx = admin(TenantId(Uuid::new_v4()));
        let stamp = Utc::now() - chrono::Duration::hours(1);
        let request = CreateImportBatchRequest {
            status: Some(ImportBatchStatus::Completed),
            success_count: Some(5),
            failure_count: Some(1),
            timestamp: Some(stamp),
            ..CreateImportBatchRequest::new("old.xlsx", 6)
        };
        let batch = create_import_batch(&store, &ctx, &request).await.unwrap();
        assert_eq!(batch.status, ImportBatchStatus::Completed);
        assert_eq!(batch.success_count, 5);
        assert_eq!(batch.created_at, stamp);
    }

    #[tokio::test]
    async fn test_create_batch_validation() {
        let store = MemoryStore::new();
        let ctx = admin(TenantId(Uuid::new_v4()));
        let result = create_import_batch(&store, &ctx, &CreateImportBatchRequest::new("  ", 1)).await;
        assert!(matches!(result, Err(CrmError::Validation(_))));

        let result = create_import_batch(&store, &ctx, &CreateImportBatchRequest::new("a.csv", -1)).await;
        assert!(matches!(result, Err(CrmError::Validation(m)) if m.contains("recordCount")));
    }

    #[tokio::test]
    async fn test_create_batch_rejects_negative_counts() {
        let store = MemoryStore::new();
        let ctx = admin(TenantId(Uuid::new_v4()));

        let request = CreateImportBatchRequest {
            success_count: Some(-3),
            ..CreateImportBatchRequest::new("a.csv", 3)
        };
        let result = create_import_batch(&store, &ctx, &request).await;
        assert!(matches!(result, Err(CrmError::Validation(m)) if m.contains("successCount")));

        let request = CreateImportBatchRequest {
            failure_count: Some(-1),
            ..CreateImportBatchRequest::new("a.csv", 3)
        };
        let result = create_import_batch(&store, &ctx, &request).await;
        assert!(matches!(result, Err(CrmError::Validation(m)) if m.contains("failureCount")));

        let (batches, total) = store
            .list_import_batches(&ImportBatchFilter::for_tenant(ctx.tenant_id), Page::default())
            .await
            .unwrap();
        assert!(batches.is_empty());
        assert_eq!(total, 0);
    }

    #[tokio::test]
    async fn test_reconcile_swallows_failures_and_foreign_batches() {
        let store = MemoryStore::new();
        let a = admin(TenantId(Uuid::new_v4()));
        let b = admin(TenantId(Uuid::new_v4()));
        let batch = create_import_batch(&store, &a, &CreateImportBatchRequest::new("a.csv", 3))
            .await
            .unwrap();

        // other tenant cannot touch it
        assert!(reconcile_import_batch(&store, &b, batch.id, 3, 0).await.is_none());
        let untouched = store
            .find_import_batch(&ImportBatchFilter::by_id_for_tenant(a.tenant_id, batch.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.status, ImportBatchStatus::New);

        store.faults.lock().batch_update = true;
        assert!(reconcile_import_batch(&store, &a, batch.id, 3, 0).await.is_none());
        store.faults.lock().batch_update = false;

        let done = reconcile_import_batch(&store, &a, batch.id, 2, 1).await.unwrap();
        assert_eq!(done.status, ImportBatchStatus::Completed);
        assert_eq!((done.success_count, done.failure_count), (2, 1));
    }

    #[tokio::test]
    async fn test_list_is_tenant_scoped_newest_first() {
        let store = MemoryStore::new();
        let a = admin(TenantId(Uuid::new_v4()));
        let b = admin(TenantId(Uuid::new_v4()));
        let older = CreateImportBatchRequest {
            timestamp: Some(Utc::now() - chrono::Duration::days(1)),
            ..CreateImportBatchRequest::new("older.csv", 1)
        };
        create_import_batch(&store, &a, &older).await.unwrap();
        create_import_batch(&store, &a, &CreateImportBatchRequest::new("newer.csv", 1)).await.unwrap();
        create_import_batch(&store, &b, &CreateImportBatchRequest::new("other.csv", 1)).await.unwrap();

        let list = list_import_batches(&store, &a, &ListRequest::default()).await.unwrap();
        assert_eq!(list.total, 2);
        assert_eq!(list.items[0].file_name, "newer.csv");
        assert_eq!(list.items[1].file_name, "older.csv");
    }

    #[tokio::test]
    async fn test_delete_one_batch_removes_its_leads_only() {
        let store = MemoryStore::new();
        let ctx = admin(TenantId(Uuid::new_v4()));
        let first = create_import_batch(&store, &ctx, &CreateImportBatchRequest::new("1.csv", 2)).await.unwrap();
        let second = create_import_batch(&store, &ctx, &CreateImportBatchRequest::new("2.csv", 1)).await.unwrap();
        imported_lead(&store, &ctx, first.id, "a@x.io").await;
        imported_lead(&store, &ctx, first.id, "b@x.io").await;
        imported_lead(&store, &ctx, second.id, "c@x.io").await;

        let result = delete_import_batches(&store, &ctx, Some(first.id)).await.unwrap();
        assert_eq!(result.deleted_batches, 1);
        assert_eq!(result.deleted_leads, 2);

        let (_, remaining) = store
            .list_leads(&LeadFilter::for_tenant(ctx.tenant_id), Page::default())
            .await
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[tokio::test]
    async fn test_delete_foreign_batch_is_not_found() {
        let store = MemoryStore::new();
        let a = admin(TenantId(Uuid::new_v4()));
        let b = admin(TenantId(Uuid::new_v4()));
        let batch = create_import_batch(&store, &b, &CreateImportBatchRequest::new("b.csv", 1)).await.unwrap();
        imported_lead(&store, &b, batch.id, "b@x.io").await;

        let result = delete_import_batches(&store, &a, Some(batch.id)).await;
        assert!(matches!(result, Err(CrmError::NotFound("Import"))));

        let (_, remaining) = store
            .list_leads(&LeadFilter::for_tenant(b.tenant_id), Page::default())
            .await
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[tokio::test]
    async fn test_purge_all_keeps_manual_leads_and_other_tenants() {
        let store = MemoryStore::new();
        let a = admin(TenantId(Uuid::new_v4()));
        let b = admin(TenantId(Uuid::new_v4()));
        let batch_a = create_import_batch(&store, &a, &CreateImportBatchRequest::new("a.csv", 1)).await.unwrap();
        let batch_b = create_import_batch(&store, &b, &CreateImportBatchRequest::new("b.csv", 1)).await.unwrap();
        imported_lead(&store, &a, batch_a.id, "a@x.io").await;
        imported_lead(&store, &b, batch_b.id, "b@x.io").await;
        let manual = LeadInput {
            first_name: "M".into(),
            email: "manual@x.io".into(),
            ..Default::default()
        };
        store.upsert_lead(a.tenant_id, a.user_id, &manual).await.unwrap();

        let result = delete_import_batches(&store, &a, None).await.unwrap();
        assert_eq!(result.deleted_batches, 1);
        assert_eq!(result.deleted_leads, 1);

        let (leads_a, _) = store
            .list_leads(&LeadFilter::for_tenant(a.tenant_id), Page::default())
            .await
            .unwrap();
        assert_eq!(leads_a.len(), 1);
        assert_eq!(leads_a[0].email, "manual@x.io");

        let (_, total_b) = store
            .list_leads(&LeadFilter::for_tenant(b.tenant_id), Page::default())
            .await
            .unwrap();
        assert_eq!(total_b, 1);
    }
}
