//! Lead status database queries

use sqlx::PgPool;

use crate::db::filters::StatusFilter;
use crate::error::StoreResult;
use crate::types::LeadStatus;

pub async fn insert_status(pool: &PgPool, status: &LeadStatus) -> StoreResult<LeadStatus> {
    let status = sqlx::query_as::<_, LeadStatus>(
        r#"
        INSERT INTO lead_statuses (id, tenant_id, name, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, tenant_id, name, created_at, updated_at
        "#,
    )
    .bind(status.id)
    .bind(status.tenant_id)
    .bind(&status.name)
    .bind(status.created_at)
    .bind(status.updated_at)
    .fetch_one(pool)
    .await?;

    Ok(status)
}

pub async fn find_status(pool: &PgPool, filter: &StatusFilter) -> StoreResult<Option<LeadStatus>> {
    let status = sqlx::query_as::<_, LeadStatus>(
        r#"
        SELECT id, tenant_id, name, created_at, updated_at
        FROM lead_statuses
        WHERE tenant_id = $1
          AND ($2::uuid IS NULL OR id = $2)
          AND ($3::text IS NULL OR LOWER(name) = $3)
        LIMIT 1
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .bind(filter.name())
    .fetch_optional(pool)
    .await?;

    Ok(status)
}

pub async fn list_statuses(pool: &PgPool, filter: &StatusFilter) -> StoreResult<Vec<LeadStatus>> {
    let statuses = sqlx::query_as::<_, LeadStatus>(
        r#"
        SELECT id, tenant_id, name, created_at, updated_at
        FROM lead_statuses
        WHERE tenant_id = $1
          AND ($2::uuid IS NULL OR id = $2)
          AND ($3::text IS NULL OR LOWER(name) = $3)
        ORDER BY LOWER(name)
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .bind(filter.name())
    .fetch_all(pool)
    .await?;

    Ok(statuses)
}

pub async fn rename_status(pool: &PgPool, filter: &StatusFilter, name: &str) -> StoreResult<Option<LeadStatus>> {
    let status = sqlx::query_as::<_, LeadStatus>(
        r#"
        UPDATE lead_statuses SET name = $4, updated_at = NOW()
        WHERE tenant_id = $1
          AND ($2::uuid IS NULL OR id = $2)
          AND ($3::text IS NULL OR LOWER(name) = $3)
        RETURNING id, tenant_id, name, created_at, updated_at
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .bind(filter.name())
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(status)
}

pub async fn delete_status(pool: &PgPool, filter: &StatusFilter) -> StoreResult<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM lead_statuses
        WHERE tenant_id = $1
          AND ($2::uuid IS NULL OR id = $2)
          AND ($3::text IS NULL OR LOWER(name) = $3)
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .bind(filter.name())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
