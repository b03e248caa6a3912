//! Lead types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::tenancy::TenantId;
use super::messages::ListRequest;

/// Built-in status every lead starts in. Never stored as a status row.
pub const NEW_STATUS: &str = "NEW";

/// Lead entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub created_by: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// Lowercased; unique per tenant
    pub email: String,
    pub phone: String,
    pub country: String,
    pub source: Option<String>,
    /// `NEW` or the id of a tenant status
    pub status: String,
    pub comments: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub import_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Candidate lead as submitted for upsert (from a parsed file or the API)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadInput {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
    #[serde(default)]
    pub import_id: Option<Uuid>,
}

impl LeadInput {
    /// Email as used for matching: trimmed and lowercased
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }

    pub fn status_or_default(&self) -> &str {
        match self.status.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => NEW_STATUS,
        }
    }
}

/// Body of `lead.upsert`: a single lead or an array of leads
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpsertLeadsPayload {
    Many(Vec<LeadInput>),
    One(LeadInput),
}

impl UpsertLeadsPayload {
    pub fn into_vec(self) -> Vec<LeadInput> {
        match self {
            UpsertLeadsPayload::Many(leads) => leads,
            UpsertLeadsPayload::One(lead) => vec![lead],
        }
    }
}

/// Outcome of one upsert against the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Result of a bulk upsert
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertReport {
    pub message: String,
    pub inserted: i32,
    /// Records that did not create a new lead (`total - inserted`)
    pub duplicates: i32,
    pub updated: i32,
    pub failed: i32,
}

/// Request carrying only a lead id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadIdRequest {
    pub id: Uuid,
}

/// Request to change a lead's status
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLeadStatusRequest {
    pub id: Uuid,
    pub status: String,
}

/// Request to (un)assign a lead to a user of the tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignLeadRequest {
    pub id: Uuid,
    pub assigned_to: Option<Uuid>,
}

/// Paginated activity feed of one lead
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadActivitiesRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub list: ListRequest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_payload_accepts_single_object() {
        let payload: UpsertLeadsPayload =
            serde_json::from_str(r#"{"firstName":"Ada","email":"ada@example.com"}"#).unwrap();
        let leads = payload.into_vec();
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].first_name, "Ada");
    }

    #[test]
    fn test_upsert_payload_accepts_array() {
        let payload: UpsertLeadsPayload = serde_json::from_str(
            r#"[{"firstName":"Ada","email":"a@x.io"},{"firstName":"Bo","email":"b@x.io","importId":"00000000-0000-0000-0000-000000000001"}]"#,
        )
        .unwrap();
        let leads = payload.into_vec();
        assert_eq!(leads.len(), 2);
        assert!(leads[0].import_id.is_none());
        assert!(leads[1].import_id.is_some());
    }

    #[test]
    fn test_status_defaults_to_new() {
        let mut lead = LeadInput::default();
        assert_eq!(lead.status_or_default(), NEW_STATUS);
        lead.status = Some("   ".to_string());
        assert_eq!(lead.status_or_default(), NEW_STATUS);
        lead.status = Some("Hot".to_string());
        assert_eq!(lead.status_or_default(), "Hot");
    }

    #[test]
    fn test_normalized_email() {
        let lead = LeadInput {
            email: "  Ada@Example.COM ".to_string(),
            ..Default::default()
        };
        assert_eq!(lead.normalized_email(), "ada@example.com");
    }

    #[test]
    fn test_activities_request_flattens_pagination() {
        let req: LeadActivitiesRequest = serde_json::from_str(
            r#"{"id":"00000000-0000-0000-0000-000000000001","page":2,"limit":5}"#,
        )
        .unwrap();
        assert_eq!(req.list.page, 2);
        assert_eq!(req.list.limit, 5);
    }
}
