//! Import batch database queries

use sqlx::PgPool;

use crate::db::filters::ImportBatchFilter;
use crate::error::StoreResult;
use crate::types::{ImportBatch, Page};

/// Insert a batch as given (the service fills id, tenant and timestamps)
pub async fn insert_import_batch(pool: &PgPool, batch: &ImportBatch) -> StoreResult<ImportBatch> {
    let batch = sqlx::query_as::<_, ImportBatch>(
        r#"
        INSERT INTO import_batches (
            id, tenant_id, uploaded_by, file_name, record_count, status,
            success_count, failure_count, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING
            id, tenant_id, uploaded_by, file_name, record_count, status,
            success_count, failure_count, created_at, updated_at
        "#,
    )
    .bind(batch.id)
    .bind(batch.tenant_id)
    .bind(batch.uploaded_by)
    .bind(&batch.file_name)
    .bind(batch.record_count)
    .bind(batch.status)
    .bind(batch.success_count)
    .bind(batch.failure_count)
    .bind(batch.created_at)
    .bind(batch.updated_at)
    .fetch_one(pool)
    .await?;

    Ok(batch)
}

pub async fn find_import_batch(pool: &PgPool, filter: &ImportBatchFilter) -> StoreResult<Option<ImportBatch>> {
    let batch = sqlx::query_as::<_, ImportBatch>(
        r#"
        SELECT
            id, tenant_id, uploaded_by, file_name, record_count, status,
            success_count, failure_count, created_at, updated_at
        FROM import_batches
        WHERE tenant_id = $1 AND ($2::uuid IS NULL OR id = $2)
        LIMIT 1
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .fetch_optional(pool)
    .await?;

    Ok(batch)
}

/// List batches, newest first
pub async fn list_import_batches(
    pool: &PgPool,
    filter: &ImportBatchFilter,
    page: Page,
) -> StoreResult<(Vec<ImportBatch>, i64)> {
    let batches = sqlx::query_as::<_, ImportBatch>(
        r#"
        SELECT
            id, tenant_id, uploaded_by, file_name, record_count, status,
            success_count, failure_count, created_at, updated_at
        FROM import_batches
        WHERE tenant_id = $1 AND ($2::uuid IS NULL OR id = $2)
        ORDER BY created_at DESC, id
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM import_batches WHERE tenant_id = $1 AND ($2::uuid IS NULL OR id = $2)",
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .fetch_one(pool)
    .await?;

    Ok((batches, total.0))
}

/// Mark a batch completed with its final counts
pub async fn complete_import_batch(
    pool: &PgPool,
    filter: &ImportBatchFilter,
    success_count: i32,
    failure_count: i32,
) -> StoreResult<Option<ImportBatch>> {
    let batch = sqlx::query_as::<_, ImportBatch>(
        r#"
        UPDATE import_batches SET
            status = 'completed',
            success_count = $3,
            failure_count = $4,
            updated_at = NOW()
        WHERE tenant_id = $1 AND ($2::uuid IS NULL OR id = $2)
        RETURNING
            id, tenant_id, uploaded_by, file_name, record_count, status,
            success_count, failure_count, created_at, updated_at
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .bind(success_count)
    .bind(failure_count)
    .fetch_optional(pool)
    .await?;

    Ok(batch)
}

pub async fn delete_import_batches(pool: &PgPool, filter: &ImportBatchFilter) -> StoreResult<u64> {
    let result = sqlx::query(
        "DELETE FROM import_batches WHERE tenant_id = $1 AND ($2::uuid IS NULL OR id = $2)",
    )
    .bind(filter.tenant_id())
    .bind(filter.id())
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
