use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{multipart::{Field, MultipartRejection}, Multipart, State},
    Json,
};
use codedrop_core::constants::UPLOAD_FIELD_NAMES;
use codedrop_core::models::UploadResponse;
use codedrop_infra::ErrorResponse;
use codedrop_services::UploadBatch;
use futures::TryStreamExt;
use std::sync::Arc;
use tokio_util::io::StreamReader;

#[utoipa::path(
    post,
    path = "/upload",
    tag = "transfer",
    request_body(content = inline(Object), content_type = "multipart/form-data",
        description = "One or more parts named `file` (or `files`)"),
    responses(
        (status = 200, description = "Files stored under a fresh code", body = UploadResponse),
        (status = 400, description = "No file provided or malformed multipart body", body = ErrorResponse),
        (status = 413, description = "Upload exceeds the size limit", body = ErrorResponse),
        (status = 500, description = "Failed to write the upload", body = ErrorResponse),
        (status = 503, description = "No free code available", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state, multipart), fields(operation = "upload"))]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, HttpAppError> {
    let mut multipart = multipart?;
    let mut batch = state.transfer.begin_upload();

    if let Err(e) = collect_files(&mut batch, &mut multipart).await {
        batch.abort().await;
        return Err(e);
    }

    let files = batch.file_count();
    let response = batch.commit().await?;
    tracing::info!(
        code = %response.code,
        files = files,
        expires_in = response.expires_in,
        "Upload stored"
    );

    Ok(Json(response))
}

/// Stream every file part into the batch. Parts under other names are skipped.
async fn collect_files(
    batch: &mut UploadBatch,
    multipart: &mut Multipart,
) -> Result<(), HttpAppError> {
    while let Some(field) = multipart.next_field().await? {
        let is_file = field
            .name()
            .is_some_and(|name| UPLOAD_FIELD_NAMES.contains(&name));
        if !is_file {
            tracing::debug!(field = ?field.name(), "Ignoring non-file multipart field");
            continue;
        }

        store_field(batch, field).await?;
    }
    Ok(())
}

async fn store_field(batch: &mut UploadBatch, field: Field<'_>) -> Result<(), HttpAppError> {
    let filename = field.file_name().map(str::to_owned);
    let content_type = field.content_type().map(str::to_owned);

    let chunks = field.map_err(|e| std::io::Error::other(e.body_text()));
    let reader = StreamReader::new(chunks);
    tokio::pin!(reader);

    batch
        .add_file(filename.as_deref(), content_type.as_deref(), &mut reader)
        .await?;
    Ok(())
}
