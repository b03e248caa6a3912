//! Platform-wide counters for super admins

use crate::db::{OverviewStore, Store};
use crate::error::CrmError;
use crate::tenancy::{require_super_admin, Session};
use crate::types::OverviewResponse;

pub async fn platform_overview(store: &dyn Store, session: &Session) -> Result<OverviewResponse, CrmError> {
    require_super_admin(session)?;
    let tenants = store.tenant_overview().await?;
    let total_leads = tenants.iter().map(|t| t.lead_count).sum();
    Ok(OverviewResponse { tenants, total_leads })
}
