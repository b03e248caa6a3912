//! Activity database queries

use sqlx::PgPool;

use crate::db::filters::ActivityFilter;
use crate::error::StoreResult;
use crate::types::{Activity, Page};

pub async fn append_activity(pool: &PgPool, activity: &Activity) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO activities (
            id, activity_type, user_id, lead_id, tenant_id, details, metadata, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(activity.id)
    .bind(activity.activity_type)
    .bind(activity.user_id)
    .bind(activity.lead_id)
    .bind(activity.tenant_id)
    .bind(&activity.details)
    .bind(&activity.metadata)
    .bind(activity.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// List activities, newest first.
///
/// Rows without a tenant are included only when the filter asks for them
/// (per-lead feeds, after the lead was verified to be in the tenant).
pub async fn list_activities(
    pool: &PgPool,
    filter: &ActivityFilter,
    page: Page,
) -> StoreResult<(Vec<Activity>, i64)> {
    let activities = sqlx::query_as::<_, Activity>(
        r#"
        SELECT id, activity_type, user_id, lead_id, tenant_id, details, metadata, created_at
        FROM activities
        WHERE (tenant_id = $1 OR ($3 AND tenant_id IS NULL))
          AND ($2::uuid IS NULL OR lead_id = $2)
        ORDER BY created_at DESC, id
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.lead_id())
    .bind(filter.include_legacy())
    .bind(page.limit)
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM activities
        WHERE (tenant_id = $1 OR ($3 AND tenant_id IS NULL))
          AND ($2::uuid IS NULL OR lead_id = $2)
        "#,
    )
    .bind(filter.tenant_id())
    .bind(filter.lead_id())
    .bind(filter.include_legacy())
    .fetch_one(pool)
    .await?;

    Ok((activities, total.0))
}
