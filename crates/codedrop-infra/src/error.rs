//! HTTP error response body
//!
//! The IntoResponse implementation for AppError lives in codedrop-api: axum's
//! trait and the core error type are both foreign here, so the API crate wraps
//! the error in a local type and renders it with this body.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Standard error response format for HTTP APIs
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable message, safe to show to end users
    #[schema(example = "Code not found or expired")]
    pub error: String,
    /// Machine-readable error code for programmatic handling
    #[schema(example = "NOT_FOUND")]
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

impl ErrorResponse {
    /// Create a simple error response with default values
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            recoverable: false,
            suggested_action: None,
        }
    }
}
