//! Import batch types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::tenancy::TenantId;
use super::lead::UpsertReport;

/// Import batch lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "import_batch_status", rename_all = "snake_case")]
pub enum ImportBatchStatus {
    New,
    Completed,
}

impl Default for ImportBatchStatus {
    fn default() -> Self {
        ImportBatchStatus::New
    }
}

/// One uploaded file and the outcome of importing it
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatch {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub uploaded_by: Uuid,
    pub file_name: String,
    pub record_count: i32,
    pub status: ImportBatchStatus,
    pub success_count: i32,
    pub failure_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `import.create`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateImportBatchRequest {
    pub file_name: String,
    pub record_count: i32,
    pub status: Option<ImportBatchStatus>,
    pub success_count: Option<i32>,
    pub failure_count: Option<i32>,
    /// Client-side upload time; becomes `createdAt`
    pub timestamp: Option<DateTime<Utc>>,
}

impl CreateImportBatchRequest {
    pub fn new(file_name: impl Into<String>, record_count: i32) -> Self {
        Self {
            file_name: file_name.into(),
            record_count,
            status: None,
            success_count: None,
            failure_count: None,
            timestamp: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateImportBatchResponse {
    pub data: ImportBatch,
    pub message: String,
}

/// Body of `import.delete`. Without `id` every batch of the tenant is purged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImportRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImportResponse {
    pub message: String,
    pub deleted_batches: u64,
    pub deleted_leads: u64,
}

/// Body of `import.file`: the raw file, base64 encoded
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFileRequest {
    pub file_name: String,
    pub content: String,
}

/// Outcome of a server-side file import
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFileResponse {
    pub batch: ImportBatch,
    /// Rows rejected before upload (missing name, invalid email)
    pub skipped_rows: i32,
    pub report: UpsertReport,
}
