//! Lead database queries

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::filters::LeadFilter;
use crate::error::StoreResult;
use crate::tenancy::TenantId;
use crate::types::{Lead, LeadInput, Page, UpsertOutcome};

#[derive(FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    lead: Lead,
    inserted: bool,
}

/// Insert or update by `(tenant_id, email)`.
///
/// `xmax = 0` holds only for a freshly inserted tuple, which tells the two
/// outcomes apart in one round trip.
pub async fn upsert_lead(
    pool: &PgPool,
    tenant_id: TenantId,
    created_by: Uuid,
    input: &LeadInput,
) -> StoreResult<(Lead, UpsertOutcome)> {
    let row = sqlx::query_as::<_, UpsertRow>(
        r#"
        INSERT INTO leads (
            id, tenant_id, created_by, first_name, last_name, email,
            phone, country, source, status, comments, import_id,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW(), NOW())
        ON CONFLICT (tenant_id, email) DO UPDATE SET
            first_name = EXCLUDED.first_name,
            last_name = EXCLUDED.last_name,
            phone = EXCLUDED.phone,
            country = EXCLUDED.country,
            source = EXCLUDED.source,
            status = EXCLUDED.status,
            comments = EXCLUDED.comments,
            import_id = COALESCE(EXCLUDED.import_id, leads.import_id),
            updated_at = NOW()
        RETURNING
            id, tenant_id, created_by, first_name, last_name, email,
            phone, country, source, status, comments, assigned_to, import_id,
            created_at, updated_at,
            (xmax = 0) AS inserted
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(tenant_id)
    .bind(created_by)
    .bind(&input.first_name)
    .bind(&input.last_name)
    .bind(input.normalized_email())
    .bind(&input.phone)
    .bind(&input.country)
    .bind(&input.source)
    .bind(input.status_or_default())
    .bind(&input.comments)
    .bind(input.import_id)
    .fetch_one(pool)
    .await?;

    let outcome = if row.inserted {
        UpsertOutcome::Inserted
    } else {
        UpsertOutcome::Updated
    };
    Ok((row.lead, outcome))
}

/// Find the first lead matching the filter
pub async fn find_lead(pool: &PgPool, filter: &LeadFilter) -> StoreResult<Option<Lead>> {
    let lead = sqlx::query_as::<_, Lead>(
        r#"
        SELECT
            id, tenant_id, created_by, first_name, last_name, email,
            phone, country, source, status, comments, assigned_to, import_id,
            created_at, updated_at
        FROM leads
        WHERE tenant_id = $1
          AND ($2::uuid IS NULL OR id = $2)
          AND ($3::uuid IS NULL OR import_id = $3)
          AND (NOT $4 OR import_id IS NOT NULL)
          AND ($5::text IS NULL OR status = $5)
        LIMIT 1
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .bind(filter.import_id())
    .bind(filter.only_imported())
    .bind(filter.status())
    .fetch_optional(pool)
    .await?;

    Ok(lead)
}

/// List leads, newest first
pub async fn list_leads(pool: &PgPool, filter: &LeadFilter, page: Page) -> StoreResult<(Vec<Lead>, i64)> {
    let leads = sqlx::query_as::<_, Lead>(
        r#"
        SELECT
            id, tenant_id, created_by, first_name, last_name, email,
            phone, country, source, status, comments, assigned_to, import_id,
            created_at, updated_at
        FROM leads
        WHERE tenant_id = $1
          AND ($2::uuid IS NULL OR id = $2)
          AND ($3::uuid IS NULL OR import_id = $3)
          AND (NOT $4 OR import_id IS NOT NULL)
          AND ($5::text IS NULL OR status = $5)
        ORDER BY created_at DESC, id
        LIMIT $6 OFFSET $7
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .bind(filter.import_id())
    .bind(filter.only_imported())
    .bind(filter.status())
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM leads
        WHERE tenant_id = $1
          AND ($2::uuid IS NULL OR id = $2)
          AND ($3::uuid IS NULL OR import_id = $3)
          AND (NOT $4 OR import_id IS NOT NULL)
          AND ($5::text IS NULL OR status = $5)
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .bind(filter.import_id())
    .bind(filter.only_imported())
    .bind(filter.status())
    .fetch_one(pool)
    .await?;

    Ok((leads, total.0))
}

/// Set the status of every matching lead
pub async fn set_lead_status(pool: &PgPool, filter: &LeadFilter, status: &str) -> StoreResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE leads SET status = $6, updated_at = NOW()
        WHERE tenant_id = $1
          AND ($2::uuid IS NULL OR id = $2)
          AND ($3::uuid IS NULL OR import_id = $3)
          AND (NOT $4 OR import_id IS NOT NULL)
          AND ($5::text IS NULL OR status = $5)
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .bind(filter.import_id())
    .bind(filter.only_imported())
    .bind(filter.status())
    .bind(status)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Assign (or unassign) every matching lead
pub async fn set_lead_assignee(
    pool: &PgPool,
    filter: &LeadFilter,
    assigned_to: Option<Uuid>,
) -> StoreResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE leads SET assigned_to = $6, updated_at = NOW()
        WHERE tenant_id = $1
          AND ($2::uuid IS NULL OR id = $2)
          AND ($3::uuid IS NULL OR import_id = $3)
          AND (NOT $4 OR import_id IS NOT NULL)
          AND ($5::text IS NULL OR status = $5)
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .bind(filter.import_id())
    .bind(filter.only_imported())
    .bind(filter.status())
    .bind(assigned_to)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Delete every matching lead
pub async fn delete_leads(pool: &PgPool, filter: &LeadFilter) -> StoreResult<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM leads
        WHERE tenant_id = $1
          AND ($2::uuid IS NULL OR id = $2)
          AND ($3::uuid IS NULL OR import_id = $3)
          AND (NOT $4 OR import_id IS NOT NULL)
          AND ($5::text IS NULL OR status = $5)
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .bind(filter.import_id())
    .bind(filter.only_imported())
    .bind(filter.status())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
