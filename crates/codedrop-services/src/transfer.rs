//! Upload and download orchestration on top of the [`Store`] and the content area.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use codedrop_core::constants::{ARCHIVE_CONTENT_TYPE, DEFAULT_CONTENT_TYPE};
use codedrop_core::models::{CodeFileInfo, CodeInfoResponse, UploadResponse};
use codedrop_core::{AppError, Code, CodeEntry, ObjectRecord};
use codedrop_storage::{ByteStream, Storage, StorageError};
use futures::Stream;
use tokio::io::AsyncRead;

use crate::archive::create_zip_archive;
use crate::store::Store;

const FALLBACK_FILENAME: &str = "file";

/// Per-request upload limits
#[derive(Debug, Clone, Copy)]
pub struct TransferLimits {
    /// Total bytes accepted across every file of one upload
    pub max_upload_bytes: u64,
    pub max_files: usize,
}

/// A resolved download, ready to be written to the client.
pub struct Download {
    pub filename: String,
    pub content_type: String,
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Orchestrates both directions of a transfer.
#[derive(Clone)]
pub struct TransferService {
    store: Arc<Store>,
    storage: Arc<dyn Storage>,
    limits: TransferLimits,
}

impl TransferService {
    pub fn new(store: Arc<Store>, storage: Arc<dyn Storage>, limits: TransferLimits) -> Self {
        Self {
            store,
            storage,
            limits,
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Start collecting the files of one upload request.
    pub fn begin_upload(&self) -> UploadBatch {
        UploadBatch {
            store: self.store.clone(),
            storage: self.storage.clone(),
            limits: self.limits,
            remaining_bytes: self.limits.max_upload_bytes,
            records: Vec::new(),
        }
    }

    /// Consume `raw_code` and return its content.
    ///
    /// The code stops resolving the moment this is called. Its content is
    /// released once the returned body has been fully read, has failed or has
    /// been dropped.
    #[tracing::instrument(skip(self), fields(transfer.operation = "download"))]
    pub async fn download(&self, raw_code: &str) -> Result<Download, AppError> {
        let code: Code = raw_code.parse()?;
        let entry = self
            .store
            .take(&code)
            .await
            .ok_or_else(|| AppError::NotFound(code.to_string()))?;
        let guard = ReleaseGuard::new(self.store.clone(), entry);

        let single = match guard.entry().records() {
            [record] => Some(record.clone()),
            _ => None,
        };

        if let Some(record) = single {
            let inner = self
                .storage
                .download_stream(record.content_location())
                .await
                .map_err(|e| content_error(&code, e))?;

            tracing::info!(
                code = %code,
                size_bytes = record.byte_size(),
                "Streaming single file"
            );

            return Ok(Download {
                filename: record.original_name().to_string(),
                content_type: record.mime_type().to_string(),
                content_length: Some(record.byte_size()),
                body: Box::pin(ReleasingStream { inner, _guard: guard }),
            });
        }

        let archive = create_zip_archive(self.storage.as_ref(), guard.entry().records())
            .await
            .map_err(|e| {
                tracing::error!(code = %code, error = %e, "Failed to build archive");
                AppError::from(e)
            })?;

        tracing::info!(
            code = %code,
            files = guard.entry().records().len(),
            archive_bytes = archive.len(),
            "Streaming archive"
        );

        let length = archive.len() as u64;
        let inner: ByteStream = Box::pin(futures::stream::once(async move {
            Ok::<_, StorageError>(Bytes::from(archive))
        }));

        Ok(Download {
            filename: format!("codedrop-{}.zip", code),
            content_type: ARCHIVE_CONTENT_TYPE.to_string(),
            content_length: Some(length),
            body: Box::pin(ReleasingStream { inner, _guard: guard }),
        })
    }

    /// Describe a live code without consuming it.
    #[tracing::instrument(skip(self), fields(transfer.operation = "inspect"))]
    pub async fn inspect(&self, raw_code: &str) -> Result<CodeInfoResponse, AppError> {
        let code: Code = raw_code.parse()?;
        let entry = self
            .store
            .get(&code)
            .await
            .ok_or_else(|| AppError::NotFound(code.to_string()))?;

        Ok(CodeInfoResponse {
            code: code.to_string(),
            expires_in: entry.remaining_secs(chrono::Utc::now()),
            files: entry
                .records()
                .iter()
                .map(|record| CodeFileInfo {
                    name: record.original_name().to_string(),
                    mime_type: record.mime_type().to_string(),
                    size: record.byte_size(),
                })
                .collect(),
        })
    }
}

fn content_error(code: &Code, err: StorageError) -> AppError {
    tracing::error!(code = %code, error = %err, "Stored content unavailable");
    match err {
        // The code resolved, so missing bytes are a server-side fault
        StorageError::NotFound(key) => AppError::Storage(format!("Missing content: {}", key)),
        other => other.into(),
    }
}

/// Name shown to the receiver: the last path segment of what the sender
/// supplied, without control characters.
pub fn display_name(raw: Option<&str>) -> String {
    let raw = raw.unwrap_or_default();
    let last = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = last.chars().filter(|c| !c.is_control()).collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Files written so far for one upload request.
///
/// Nothing is registered until [`UploadBatch::commit`]. A batch that is aborted or
/// dropped before committing deletes every file it wrote.
pub struct UploadBatch {
    store: Arc<Store>,
    storage: Arc<dyn Storage>,
    limits: TransferLimits,
    remaining_bytes: u64,
    records: Vec<ObjectRecord>,
}

impl UploadBatch {
    /// Persist one file of the upload.
    pub async fn add_file(
        &mut self,
        name: Option<&str>,
        content_type: Option<&str>,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<(), AppError> {
        if self.records.len() >= self.limits.max_files {
            return Err(AppError::InvalidInput(format!(
                "Too many files: at most {} per upload",
                self.limits.max_files
            )));
        }

        let name = display_name(name);
        let content_type = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let stored = self
            .storage
            .upload_stream(&name, self.remaining_bytes, reader)
            .await
            .map_err(|e| match e {
                StorageError::SizeLimitExceeded { .. } => AppError::PayloadTooLarge(format!(
                    "Upload exceeds the limit of {} bytes",
                    self.limits.max_upload_bytes
                )),
                other => other.into(),
            })?;

        self.remaining_bytes = self.remaining_bytes.saturating_sub(stored.size_bytes);
        tracing::debug!(
            name = %name,
            size_bytes = stored.size_bytes,
            remaining_bytes = self.remaining_bytes,
            "Upload file stored"
        );
        self.records.push(ObjectRecord::new(
            stored.key,
            name,
            content_type,
            stored.size_bytes,
        ));
        Ok(())
    }

    pub fn file_count(&self) -> usize {
        self.records.len()
    }

    /// Register every stored file under a fresh code.
    #[tracing::instrument(skip(self), fields(transfer.operation = "upload"))]
    pub async fn commit(mut self) -> Result<UploadResponse, AppError> {
        if self.records.is_empty() {
            return Err(AppError::NoFileProvided);
        }

        let records = self.records.clone();
        match self.store.put(records).await {
            Ok(entry) => {
                // Ownership of the content moved to the store
                self.records.clear();
                Ok(UploadResponse {
                    code: entry.code().to_string(),
                    expires_in: self.store.ttl_secs(),
                })
            }
            Err(e) => {
                self.abort().await;
                Err(e)
            }
        }
    }

    /// Delete every file written so far.
    pub async fn abort(mut self) {
        let records = std::mem::take(&mut self.records);
        delete_records(self.storage.as_ref(), &records).await;
    }
}

impl Drop for UploadBatch {
    fn drop(&mut self) {
        if self.records.is_empty() {
            return;
        }
        let records = std::mem::take(&mut self.records);
        let files = records.len();
        let storage = self.storage.clone();
        let spawned = self.store.spawn_cleanup(async move {
            delete_records(storage.as_ref(), &records).await;
        });
        if !spawned {
            tracing::warn!(
                files = files,
                "No runtime available to delete abandoned upload files"
            );
        }
    }
}

async fn delete_records(storage: &dyn Storage, records: &[ObjectRecord]) {
    for record in records {
        if let Err(e) = storage.delete(record.content_location()).await {
            tracing::error!(
                error = %e,
                storage_key = %record.content_location(),
                "Failed to delete abandoned upload file"
            );
        }
    }
    if !records.is_empty() {
        tracing::info!(files = records.len(), "Abandoned upload cleaned up");
    }
}

/// Owns a taken entry and releases its content when dropped.
struct ReleaseGuard {
    store: Arc<Store>,
    entry: CodeEntry,
}

impl ReleaseGuard {
    fn new(store: Arc<Store>, entry: CodeEntry) -> Self {
        Self { store, entry }
    }

    fn entry(&self) -> &CodeEntry {
        &self.entry
    }
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        let entry = self.entry.clone();
        let store = self.store.clone();
        let spawned = self.store.spawn_cleanup(async move {
            store.release(entry).await;
        });
        if !spawned {
            tracing::warn!(
                code = %self.entry.code(),
                "No runtime available to release consumed content"
            );
        }
    }
}

/// Body stream that keeps the taken entry alive until the body is finished.
struct ReleasingStream {
    inner: ByteStream,
    _guard: ReleaseGuard,
}

impl Stream for ReleasingStream {
    type Item = Result<Bytes, StorageError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
