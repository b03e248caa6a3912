//! Bulk lead upsert
//!
//! Every record is written on its own, keyed by tenant and lowercase email, so
//! importing the same source twice updates in place instead of duplicating.
//! One record failing never stops the others; it is only counted.
//!
//! Records that carry an `importId` are tallied per batch, and each batch is
//! reconciled once all records have been written.

use std::collections::{BTreeMap, HashMap};

use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::{ImportBatchFilter, ImportBatchStore, LeadStore, Store};
use crate::error::CrmError;
use crate::services::activity::record_activity;
use crate::services::import_tracker::reconcile_import_batch;
use crate::services::lead_status::resolve_status_input;
use crate::services::row_extractor::is_valid_email;
use crate::tenancy::TenantContext;
use crate::types::{ActivityType, LeadInput, NewActivity, UpsertOutcome, UpsertReport, NEW_STATUS};

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    inserted: i32,
    updated: i32,
    failed: i32,
}

impl Tally {
    fn record(&mut self, outcome: Option<UpsertOutcome>) {
        match outcome {
            Some(UpsertOutcome::Inserted) => self.inserted += 1,
            Some(UpsertOutcome::Updated) => self.updated += 1,
            None => self.failed += 1,
        }
    }
}

fn validate(lead: &LeadInput) -> Result<(), String> {
    if lead.first_name.trim().is_empty() {
        return Err("first name is required".to_string());
    }
    if !is_valid_email(lead.email.trim()) {
        return Err(format!("invalid email '{}'", lead.email));
    }
    Ok(())
}

/// Drop `importId`s that do not name a batch of the caller's tenant
async fn strip_foreign_imports(
    store: &dyn Store,
    ctx: &TenantContext,
    leads: &mut [LeadInput],
) -> Result<(), CrmError> {
    let mut known: HashMap<Uuid, bool> = HashMap::new();
    for lead in leads.iter_mut() {
        let Some(import_id) = lead.import_id else {
            continue;
        };
        let owned = match known.get(&import_id) {
            Some(owned) => *owned,
            None => {
                let owned = store
                    .find_import_batch(&ImportBatchFilter::by_id_for_tenant(ctx.tenant_id, import_id))
                    .await?
                    .is_some();
                if !owned {
                    warn!(
                        "Import {} is not a batch of tenant {}, dropping it from submitted leads",
                        import_id, ctx.tenant_id
                    );
                }
                known.insert(import_id, owned);
                owned
            }
        };
        if !owned {
            lead.import_id = None;
        }
    }
    Ok(())
}

/// Upsert a submission of leads into the caller's tenant
pub async fn upsert_leads(
    store: &dyn Store,
    ctx: &TenantContext,
    mut leads: Vec<LeadInput>,
) -> Result<UpsertReport, CrmError> {
    if leads.is_empty() {
        return Err(CrmError::Validation("No leads provided".to_string()));
    }

    strip_foreign_imports(store, ctx, &mut leads).await?;

    let total = leads.len() as i32;
    let single = leads.len() == 1;
    let mut overall = Tally::default();
    let mut per_batch: BTreeMap<Uuid, Tally> = BTreeMap::new();
    let mut resolved_statuses: HashMap<String, String> = HashMap::new();
    let mut created_lead: Option<Uuid> = None;

    for mut lead in leads {
        let outcome = match validate(&lead) {
            Err(reason) => {
                debug!("Rejecting lead: {}", reason);
                None
            }
            Ok(()) => {
                let raw_status = lead.status_or_default().to_string();
                let status = match resolved_statuses.get(&raw_status.to_lowercase()) {
                    Some(stored) => Some(stored.clone()),
                    None => match resolve_status_input(store, ctx.tenant_id, &raw_status).await {
                        Ok(found) => {
                            let stored = found.unwrap_or_else(|| {
                                debug!("Unknown status '{}', falling back to {}", raw_status, NEW_STATUS);
                                NEW_STATUS.to_string()
                            });
                            resolved_statuses.insert(raw_status.to_lowercase(), stored.clone());
                            Some(stored)
                        }
                        Err(e) => {
                            warn!("Status lookup failed for '{}': {}", raw_status, e);
                            None
                        }
                    },
                };

                match status {
                    None => None,
                    Some(status) => {
                        lead.status = Some(status);
                        match store.upsert_lead(ctx.tenant_id, ctx.user_id, &lead).await {
                            Ok((stored, outcome)) => {
                                if outcome == UpsertOutcome::Inserted {
                                    created_lead = Some(stored.id);
                                }
                                Some(outcome)
                            }
                            Err(e) => {
                                warn!("Failed to upsert lead {}: {}", lead.normalized_email(), e);
                                None
                            }
                        }
                    }
                }
            }
        };

        overall.record(outcome);
        if let Some(import_id) = lead.import_id {
            per_batch.entry(import_id).or_default().record(outcome);
        }
    }

    for (import_id, tally) in &per_batch {
        reconcile_import_batch(store, ctx, *import_id, tally.inserted + tally.updated, tally.failed).await;
        record_activity(
            store,
            NewActivity::new(
                ActivityType::LeadsImported,
                ctx.tenant_id,
                ctx.user_id,
                format!(
                    "Imported leads: {} new, {} updated, {} failed",
                    tally.inserted, tally.updated, tally.failed
                ),
            )
            .with_metadata(json!({
                "importId": import_id,
                "inserted": tally.inserted,
                "updated": tally.updated,
                "failed": tally.failed,
            })),
        )
        .await;
    }

    if single && per_batch.is_empty() {
        if let Some(lead_id) = created_lead {
            record_activity(
                store,
                NewActivity::new(ActivityType::LeadCreated, ctx.tenant_id, ctx.user_id, "Lead created")
                    .for_lead(lead_id),
            )
            .await;
        }
    }

    info!(
        "Upserted {} leads for tenant {}: {} inserted, {} updated, {} failed",
        total, ctx.tenant_id, overall.inserted, overall.updated, overall.failed
    );

    Ok(UpsertReport {
        message: format!(
            "{} leads processed: {} inserted, {} updated, {} failed",
            total, overall.inserted, overall.updated, overall.failed
        ),
        inserted: overall.inserted,
        duplicates: total - overall.inserted,
        updated: overall.updated,
        failed: overall.failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ActivityFilter, ActivityStore, LeadFilter, MemoryStore};
    use crate::services::import_tracker::create_import_batch;
    use crate::services::lead_status::create_status;
    use crate::services::status_cache::StatusNameCache;
    use crate::tenancy::{Role, TenantId};
    use crate::types::{CreateImportBatchRequest, ImportBatchStatus, Page};
    use std::time::Duration;

    fn ctx(tenant: TenantId) -> TenantContext {
        TenantContext {
            tenant_id: tenant,
            user_id: Uuid::new_v4(),
            role: Role::Agent,
        }
    }

    fn lead(first: &str, email: &str) -> LeadInput {
        LeadInput {
            first_name: first.to_string(),
            email: email.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_empty_submission_is_rejected() {
        let store = MemoryStore::new();
        let result = upsert_leads(&store, &ctx(TenantId(Uuid::new_v4())), vec![]).await;
        assert!(matches!(result, Err(CrmError::Validation(_))));
    }

    #[tokio::test]
    async fn test_second_submission_only_updates() {
        let store = MemoryStore::new();
        let c = ctx(TenantId(Uuid::new_v4()));
        let leads = vec![lead("Ada", "ada@x.io"), lead("Bo", "bo@x.io"), lead("Cy", "cy@x.io")];

        let first = upsert_leads(&store, &c, leads.clone()).await.unwrap();
        assert_eq!((first.inserted, first.duplicates, first.updated), (3, 0, 0));

        let second = upsert_leads(&store, &c, leads).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 3);
        assert_eq!(second.updated, 3);

        let (_, total) = store
            .list_leads(&LeadFilter::for_tenant(c.tenant_id), Page::default())
            .await
            .unwrap();
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_email_match_ignores_case_and_stays_in_tenant() {
        let store = MemoryStore::new();
        let a = ctx(TenantId(Uuid::new_v4()));
        let b = ctx(TenantId(Uuid::new_v4()));

        upsert_leads(&store, &a, vec![lead("Ada", "Ada@X.io")]).await.unwrap();
        let report = upsert_leads(&store, &b, vec![lead("Other", "ada@x.io")]).await.unwrap();
        assert_eq!(report.inserted, 1);

        let again = upsert_leads(&store, &a, vec![lead("Ada L", "ADA@x.io")]).await.unwrap();
        assert_eq!(again.updated, 1);

        let stored_a = store
            .find_lead(&LeadFilter::for_tenant(a.tenant_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored_a.first_name, "Ada L");
        let stored_b = store
            .find_lead(&LeadFilter::for_tenant(b.tenant_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored_b.first_name, "Other");
        assert_eq!(stored_b.created_by, b.user_id);
    }

    #[tokio::test]
    async fn test_duplicates_within_submission_collapse_to_last() {
        let store = MemoryStore::new();
        let c = ctx(TenantId(Uuid::new_v4()));
        let report = upsert_leads(&store, &c, vec![lead("First", "dup@x.io"), lead("Last", "dup@x.io")])
            .await
            .unwrap();
        assert_eq!(report.inserted, 1);
        assert_eq!(report.duplicates, 1);

        let (leads, total) = store
            .list_leads(&LeadFilter::for_tenant(c.tenant_id), Page::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(leads[0].first_name, "Last");
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_fatal() {
        let store = MemoryStore::new();
        let c = ctx(TenantId(Uuid::new_v4()));
        store.faults.lock().upsert_emails.push("broken@x.io".to_string());

        let report = upsert_leads(
            &store,
            &c,
            vec![
                lead("Ada", "ada@x.io"),
                lead("Broken", "broken@x.io"),
                lead("", "noname@x.io"),
                lead("Bad", "not-an-email"),
                lead("Bo", "bo@x.io"),
            ],
        )
        .await
        .unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(report.failed, 3);
        assert_eq!(report.duplicates, 3);
    }

    #[tokio::test]
    async fn test_batches_are_reconciled_with_their_own_counts() {
        let store = MemoryStore::new();
        let c = ctx(TenantId(Uuid::new_v4()));
        let first = create_import_batch(&store, &c, &CreateImportBatchRequest::new("1.csv", 2)).await.unwrap();
        let second = create_import_batch(&store, &c, &CreateImportBatchRequest::new("2.csv", 1)).await.unwrap();
        upsert_leads(&store, &c, vec![lead("Old", "old@x.io")]).await.unwrap();

        let with = |l: LeadInput, id: Uuid| LeadInput { import_id: Some(id), ..l };
        let report = upsert_leads(
            &store,
            &c,
            vec![
                with(lead("New", "new@x.io"), first.id),
                with(lead("Old", "old@x.io"), first.id),
                with(lead("", "x@x.io"), second.id),
            ],
        )
        .await
        .unwrap();
        assert_eq!((report.inserted, report.updated, report.failed), (1, 1, 1));

        let first = store
            .find_import_batch(&ImportBatchFilter::by_id_for_tenant(c.tenant_id, first.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.status, ImportBatchStatus::Completed);
        assert_eq!((first.success_count, first.failure_count), (2, 0));

        let second = store
            .find_import_batch(&ImportBatchFilter::by_id_for_tenant(c.tenant_id, second.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!((second.success_count, second.failure_count), (0, 1));

        let (activities, _) = store
            .list_activities(&ActivityFilter::for_tenant(c.tenant_id), Page::default())
            .await
            .unwrap();
        let imported = activities
            .iter()
            .filter(|a| a.activity_type == ActivityType::LeadsImported)
            .count();
        assert_eq!(imported, 2);
    }

    #[tokio::test]
    async fn test_foreign_import_id_is_dropped() {
        let store = MemoryStore::new();
        let a = ctx(TenantId(Uuid::new_v4()));
        let b = ctx(TenantId(Uuid::new_v4()));
        let foreign = create_import_batch(&store, &b, &CreateImportBatchRequest::new("b.csv", 1)).await.unwrap();

        let input = LeadInput {
            import_id: Some(foreign.id),
            ..lead("Ada", "ada@x.io")
        };
        let report = upsert_leads(&store, &a, vec![input]).await.unwrap();
        assert_eq!(report.inserted, 1);

        let stored = store.find_lead(&LeadFilter::for_tenant(a.tenant_id)).await.unwrap().unwrap();
        assert!(stored.import_id.is_none());
        let batch = store
            .find_import_batch(&ImportBatchFilter::by_id_for_tenant(b.tenant_id, foreign.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(batch.status, ImportBatchStatus::New);
    }

    #[tokio::test]
    async fn test_reconcile_failure_does_not_fail_submission() {
        let store = MemoryStore::new();
        let c = ctx(TenantId(Uuid::new_v4()));
        let batch = create_import_batch(&store, &c, &CreateImportBatchRequest::new("a.csv", 1)).await.unwrap();
        store.faults.lock().batch_update = true;
        store.faults.lock().activity_append = true;

        let input = LeadInput {
            import_id: Some(batch.id),
            ..lead("Ada", "ada@x.io")
        };
        let report = upsert_leads(&store, &c, vec![input]).await.unwrap();
        assert_eq!(report.inserted, 1);
    }

    #[tokio::test]
    async fn test_status_names_resolve_to_tenant_ids() {
        let store = MemoryStore::new();
        let cache = StatusNameCache::new(Duration::from_secs(60));
        let c = ctx(TenantId(Uuid::new_v4()));
        let hot = create_status(&store, &cache, &c, "Hot").await.unwrap();

        let named = LeadInput {
            status: Some("hot".to_string()),
            ..lead("Ada", "ada@x.io")
        };
        let unknown = LeadInput {
            status: Some("Lukewarm".to_string()),
            ..lead("Bo", "bo@x.io")
        };
        upsert_leads(&store, &c, vec![named, unknown]).await.unwrap();

        let (leads, _) = store
            .list_leads(&LeadFilter::for_tenant(c.tenant_id), Page::default())
            .await
            .unwrap();
        let status_of = |email: &str| leads.iter().find(|l| l.email == email).unwrap().status.clone();
        assert_eq!(status_of("ada@x.io"), hot.id.to_string());
        assert_eq!(status_of("bo@x.io"), NEW_STATUS);
    }

    #[tokio::test]
    async fn test_single_manual_lead_records_creation() {
        let store = MemoryStore::new();
        let c = ctx(TenantId(Uuid::new_v4()));
        upsert_leads(&store, &c, vec![lead("Ada", "ada@x.io")]).await.unwrap();
        upsert_leads(&store, &c, vec![lead("Ada", "ada@x.io")]).await.unwrap();

        let (activities, _) = store
            .list_activities(&ActivityFilter::for_tenant(c.tenant_id), Page::default())
            .await
            .unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].activity_type, ActivityType::LeadCreated);
    }
}
