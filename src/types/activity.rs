//! Activity (audit trail) types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::tenancy::TenantId;

/// Domain event recorded on the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "activity_type", rename_all = "snake_case")]
pub enum ActivityType {
    LeadCreated,
    LeadsImported,
    StatusChanged,
    LeadAssigned,
    LeadDeleted,
    ImportDeleted,
    ReminderCreated,
    ReminderUpdated,
    ReminderCompleted,
    ReminderSnoozed,
    ReminderDismissed,
}

/// Activity entity. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub user_id: Uuid,
    pub lead_id: Option<Uuid>,
    /// None only on rows written before tenancy existed
    pub tenant_id: Option<TenantId>,
    pub details: String,
    pub metadata: serde_json::Value,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Activity about to be appended
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub activity_type: ActivityType,
    pub user_id: Uuid,
    pub lead_id: Option<Uuid>,
    pub tenant_id: TenantId,
    pub details: String,
    pub metadata: serde_json::Value,
}

impl NewActivity {
    pub fn new(
        activity_type: ActivityType,
        tenant_id: TenantId,
        user_id: Uuid,
        details: impl Into<String>,
    ) -> Self {
        Self {
            activity_type,
            user_id,
            lead_id: None,
            tenant_id,
            details: details.into(),
            metadata: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn for_lead(mut self, lead_id: Uuid) -> Self {
        self.lead_id = Some(lead_id);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn into_activity(self) -> Activity {
        Activity {
            id: Uuid::new_v4(),
            activity_type: self.activity_type,
            user_id: self.user_id,
            lead_id: self.lead_id,
            tenant_id: Some(self.tenant_id),
            details: self.details,
            metadata: self.metadata,
            created_at: Utc::now(),
        }
    }
}
