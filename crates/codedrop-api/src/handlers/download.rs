use crate::constants::DOWNLOAD_CACHE_CONTROL;
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::content_disposition;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, Response, StatusCode},
};
use codedrop_core::constants::DEFAULT_CONTENT_TYPE;
use codedrop_core::AppError;
use codedrop_infra::ErrorResponse;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/download/{code}",
    tag = "transfer",
    params(
        ("code" = String, Path, description = "6-digit code returned by the upload")
    ),
    responses(
        (status = 200, description = "The file, or a zip bundle for multi-file codes", content_type = "application/octet-stream"),
        (status = 400, description = "Malformed code", body = ErrorResponse),
        (status = 404, description = "Code not found or expired", body = ErrorResponse),
        (status = 500, description = "Failed to read the stored content", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "download"))]
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Response<Body>, HttpAppError> {
    let download = state.transfer.download(&code).await?;

    tracing::info!(
        code = %code,
        filename = %download.filename,
        content_length = ?download.content_length,
        "Serving download"
    );

    // Stored content types come from the uploader and may not be valid header values
    let content_type = HeaderValue::from_str(&download.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition::attachment(&download.filename),
        )
        .header(header::CACHE_CONTROL, DOWNLOAD_CACHE_CONTROL);

    if let Some(length) = download.content_length {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }

    let response = builder
        .body(Body::from_stream(download.body))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}
