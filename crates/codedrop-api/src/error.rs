//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Anything that converts
//! into `AppError` converts into `HttpAppError`, so `?` renders every failure the
//! same way (status, JSON body, log line).

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use codedrop_core::{AppError, ErrorMetadata, LogLevel};
use codedrop_infra::ErrorResponse;
use codedrop_storage::StorageError;

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from codedrop-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(AppError::from(err))
    }
}

/// Malformed multipart framing is the client's fault, an oversized body is a size error.
/// Parser output goes to the log only.
impl From<MultipartError> for HttpAppError {
    fn from(err: MultipartError) -> Self {
        let app = if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge("Upload exceeds the maximum request size".to_string())
        } else {
            tracing::debug!(error = %err.body_text(), "Malformed multipart body");
            AppError::InvalidInput("Malformed multipart body".to_string())
        };
        HttpAppError(app)
    }
}

/// Requests that are not `multipart/form-data` at all.
impl From<MultipartRejection> for HttpAppError {
    fn from(err: MultipartRejection) -> Self {
        tracing::debug!(error = %err.body_text(), "Upload is not a multipart request");
        HttpAppError(AppError::InvalidInput(
            "Upload must be a multipart/form-data request".to_string(),
        ))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Request failed");
        }
        LogLevel::Error => {
            tracing::error!(
                error = %error,
                error_type = error_type,
                details = %error.detailed_message(),
                "Request failed"
            );
        }
    }
}

/// Client-facing body for `error`. Internal detail stays in the logs.
pub fn error_body(error: &AppError) -> ErrorResponse {
    ErrorResponse {
        error: error.client_message(),
        code: error.error_code().to_string(),
        recoverable: error.is_recoverable(),
        suggested_action: error.suggested_action().map(String::from),
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        (status, Json(error_body(app_error))).into_response()
    }
}
