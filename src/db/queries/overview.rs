//! Cross-tenant aggregation for the platform overview

use sqlx::PgPool;

use crate::error::StoreResult;
use crate::types::TenantOverview;

pub async fn tenant_overview(pool: &PgPool) -> StoreResult<Vec<TenantOverview>> {
    let rows = sqlx::query_as::<_, TenantOverview>(
        r#"
        WITH tenants AS (
            SELECT tenant_id FROM leads
            UNION
            SELECT tenant_id FROM import_batches
            UNION
            SELECT tenant_id FROM activities WHERE tenant_id IS NOT NULL
        )
        SELECT
            t.tenant_id,
            (SELECT COUNT(*) FROM leads l WHERE l.tenant_id = t.tenant_id) AS lead_count,
            (SELECT COUNT(*) FROM import_batches b WHERE b.tenant_id = t.tenant_id) AS import_count,
            (SELECT COUNT(*) FROM activities a WHERE a.tenant_id = t.tenant_id) AS activity_count
        FROM tenants t
        ORDER BY lead_count DESC, t.tenant_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
