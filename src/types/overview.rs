//! Platform overview types (super admin only)

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::tenancy::TenantId;

/// Per-tenant counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TenantOverview {
    pub tenant_id: TenantId,
    pub lead_count: i64,
    pub import_count: i64,
    pub activity_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub tenants: Vec<TenantOverview>,
    pub total_leads: i64,
}
