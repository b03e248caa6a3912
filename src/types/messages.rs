//! NATS message types

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Generic request wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request<T> {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub token: Option<String>,  // session token issued by the session provider
    pub payload: T,
}

/// Generic success response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse<T> {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub payload: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(request_id: Uuid, payload: T) -> Self {
        Self {
            id: request_id,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(request_id: Uuid, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: request_id,
            timestamp: Utc::now(),
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(mut self, details: Option<serde_json::Value>) -> Self {
        self.error.details = details;
        self
    }
}

/// Payload of requests that carry no parameters (`{}`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmptyPayload {}

/// Page-based list request (`page` is 1-based)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

const MAX_LIMIT: i64 = 100;

impl Default for ListRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl ListRequest {
    /// Page and limit clamped to sane bounds.
    pub fn normalized(&self) -> Page {
        let page = self.page.clamp(1, i64::MAX / MAX_LIMIT);
        let limit = self.limit.clamp(1, MAX_LIMIT);
        Page { page, limit }
    }
}

/// Normalized pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for Page {
    fn default() -> Self {
        ListRequest::default().normalized()
    }
}

/// List response with pagination info
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>, total: i64, page: Page) -> Self {
        let total_pages = if total == 0 { 0 } else { (total + page.limit - 1) / page.limit };
        Self {
            items,
            total,
            page: page.page,
            limit: page.limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_request_defaults() {
        let req: ListRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 10);
    }

    #[test]
    fn test_list_request_clamps_bounds() {
        let page = ListRequest { page: 0, limit: 5000 }.normalized();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 100);
        assert_eq!(page.offset(), 0);

        let page = ListRequest { page: 3, limit: 20 }.normalized();
        assert_eq!(page.offset(), 40);
    }

    #[test]
    fn test_huge_page_does_not_overflow_offset() {
        let page = ListRequest { page: i64::MAX, limit: 100 }.normalized();
        assert_eq!(page.page, i64::MAX / 100);
        assert!(page.offset() > 0);

        let page = Page { page: i64::MAX, limit: 100 };
        assert_eq!(page.offset(), i64::MAX);
    }

    #[test]
    fn test_list_response_total_pages() {
        let page = Page { page: 1, limit: 10 };
        assert_eq!(ListResponse::<u8>::new(vec![], 0, page).total_pages, 0);
        assert_eq!(ListResponse::<u8>::new(vec![], 10, page).total_pages, 1);
        assert_eq!(ListResponse::<u8>::new(vec![], 11, page).total_pages, 2);
    }

    #[test]
    fn test_error_response_serializes_details_only_when_present() {
        let plain = ErrorResponse::new(Uuid::nil(), "NOT_FOUND", "Lead not found");
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json["error"].get("details").is_none());

        let detailed = ErrorResponse::new(Uuid::nil(), "VALIDATION_ERROR", "Missing columns")
            .with_details(Some(serde_json::json!({ "missingFields": ["email"] })));
        let json = serde_json::to_value(&detailed).unwrap();
        assert_eq!(json["error"]["details"]["missingFields"][0], "email");
    }
}
