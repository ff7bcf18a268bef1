use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use codedrop_core::models::CodeInfoResponse;
use codedrop_infra::ErrorResponse;
use std::sync::Arc;

/// Peek at a live code without consuming it.
#[utoipa::path(
    get,
    path = "/codes/{code}",
    tag = "transfer",
    params(
        ("code" = String, Path, description = "6-digit code returned by the upload")
    ),
    responses(
        (status = 200, description = "Files held under the code", body = CodeInfoResponse),
        (status = 400, description = "Malformed code", body = ErrorResponse),
        (status = 404, description = "Code not found or expired", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state), fields(operation = "inspect"))]
pub async fn get_code_info(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<CodeInfoResponse>, HttpAppError> {
    let info = state.transfer.inspect(&code).await?;
    Ok(Json(info))
}
