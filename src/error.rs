//! Error taxonomy and its mapping onto wire error codes

use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::services::header_mapper::CanonicalField;
use crate::tenancy::TenancyError;
use crate::types::{ErrorResponse, ReminderStatus};

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failures, independent of the backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
                StoreError::Unavailable(e.to_string())
            }
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// File-level import failures. Row-level problems are counted, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("Unsupported file type '{0}' (expected .xlsx, .xls, .csv or .txt)")]
    UnsupportedFormat(String),

    #[error("Failed to read file: {0}")]
    Read(String),

    #[error("Missing required columns: {}", join_fields(.0))]
    MissingHeaders(Vec<CanonicalField>),

    #[error("No valid leads found in file")]
    NoValidLeads,
}

fn join_fields(fields: &[CanonicalField]) -> String {
    fields.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReminderError {
    #[error("Cannot {action} a reminder that is {from:?}")]
    InvalidTransition {
        from: ReminderStatus,
        action: &'static str,
    },
}

/// Umbrella error returned by services and rendered by handlers
#[derive(Debug, Error)]
pub enum CrmError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Validation(String),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(#[from] TenancyError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Reminder(#[from] ReminderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CrmError {
    pub fn code(&self) -> &'static str {
        match self {
            CrmError::InvalidRequest(_) => "INVALID_REQUEST",
            CrmError::Validation(_) => "VALIDATION_ERROR",
            CrmError::Unauthorized => "UNAUTHORIZED",
            CrmError::Forbidden(_) => "FORBIDDEN",
            CrmError::NotFound(_) => "NOT_FOUND",
            CrmError::Import(ImportError::MissingHeaders(_)) => "MISSING_COLUMNS",
            CrmError::Import(ImportError::NoValidLeads) => "NO_VALID_LEADS",
            CrmError::Import(_) => "VALIDATION_ERROR",
            CrmError::Reminder(_) => "VALIDATION_ERROR",
            CrmError::Store(StoreError::Unavailable(_)) => "SERVICE_UNAVAILABLE",
            CrmError::Store(StoreError::Conflict(_)) => "CONFLICT",
            CrmError::Store(StoreError::Query(_)) => "DATABASE_ERROR",
        }
    }

    /// Message safe to send to the caller. Store details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            CrmError::Store(StoreError::Unavailable(_)) => "Service temporarily unavailable".to_string(),
            CrmError::Store(StoreError::Query(_)) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            CrmError::Import(ImportError::MissingHeaders(fields)) => Some(json!({
                "missingFields": fields.iter().map(|f| f.as_str()).collect::<Vec<_>>(),
            })),
            _ => None,
        }
    }

    pub fn to_response(&self, request_id: Uuid) -> ErrorResponse {
        ErrorResponse::new(request_id, self.code(), self.public_message()).with_details(self.details())
    }
}
