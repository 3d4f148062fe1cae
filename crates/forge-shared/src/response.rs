//! Standardized API response types (RFC 7807 compliant for errors).

use serde::{Deserialize, Serialize};

/// Standard successful API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Success without a payload.
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// RFC 7807 Problem Details for HTTP APIs.
///
/// See: https://datatracker.ietf.org/doc/html/rfc7807
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable problem kind (`about:blank` when generic).
    #[serde(rename = "type")]
    pub error_type: String,

    /// A short, human-readable summary of the problem type.
    pub title: String,

    /// The HTTP status code.
    pub status: u16,

    /// A human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// A URI reference that identifies the specific occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Error type reported by an upstream service, kept for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_type: Option<String>,
}

impl ErrorResponse {
    pub fn new(status: u16, title: impl Into<String>) -> Self {
        Self {
            error_type: "about:blank".to_string(),
            title: title.into(),
            status,
            detail: None,
            instance: None,
            upstream_type: None,
        }
    }

    pub fn with_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = error_type.into();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_upstream_type(mut self, upstream_type: Option<String>) -> Self {
        self.upstream_type = upstream_type;
        self
    }

    // Common error constructors
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(400, "Bad Request")
            .with_type("validation-error")
            .with_detail(detail)
    }

    pub fn unauthorized() -> Self {
        Self::new(401, "Unauthorized")
    }

    pub fn payment_required(detail: impl Into<String>) -> Self {
        Self::new(402, "Payment Required")
            .with_type("insufficient-credits")
            .with_detail(detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(404, "Not Found").with_detail(detail)
    }

    pub fn too_many_requests(detail: impl Into<String>) -> Self {
        Self::new(429, "Too Many Requests")
            .with_type("rate-limited")
            .with_detail(detail)
    }

    pub fn internal_error() -> Self {
        Self::new(500, "Internal Server Error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_serializes_type_and_skips_empty_fields() {
        let json = serde_json::to_value(ErrorResponse::payment_required("need 2 credits")).unwrap();

        assert_eq!(json["type"], "insufficient-credits");
        assert_eq!(json["status"], 402);
        assert_eq!(json["detail"], "need 2 credits");
        assert!(json.get("upstream_type").is_none());
    }

    #[test]
    fn test_message_only_response_has_no_data() {
        let json = serde_json::to_value(ApiResponse::<()>::message_only("Post deleted")).unwrap();

        assert_eq!(json["success"], true);
        assert!(json["data"].is_null());
        assert_eq!(json["message"], "Post deleted");
    }
}
