//! Storage abstraction trait
//!
//! This module defines the Storage trait that every content-area backend implements.

use async_trait::async_trait;
use bytes::Bytes;
use codedrop_core::AppError;
use futures::Stream;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// The incoming byte source failed while being copied (client disconnect,
    /// malformed multipart body).
    #[error("Upload source failed: {0}")]
    SourceFailed(String),

    #[error("Upload exceeds the limit of {limit} bytes")]
    SizeLimitExceeded { limit: u64 },

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Stream of object bytes returned by [`Storage::download_stream`]
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// An object written by [`Storage::upload_stream`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub size_bytes: u64,
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::SizeLimitExceeded { limit } => {
                AppError::PayloadTooLarge(format!("Upload exceeds the limit of {} bytes", limit))
            }
            StorageError::SourceFailed(msg) => {
                tracing::debug!(error = %msg, "Upload source failed");
                AppError::InvalidInput("Failed to read upload body".to_string())
            }
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::UploadFailed(msg) => AppError::Storage(msg),
            StorageError::DownloadFailed(msg) => AppError::Storage(msg),
            StorageError::DeleteFailed(msg) => AppError::Storage(msg),
            StorageError::IoError(err) => AppError::Storage(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        }
    }
}

/// Storage abstraction trait
///
/// The content area is write-once: objects are created by [`Storage::upload_stream`],
/// read back any number of times and removed by [`Storage::delete`]. Metadata such
/// as the original filename lives with the caller, not in the backend.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Copy `reader` to EOF into a new object derived from `filename`.
    ///
    /// At most `max_bytes` are accepted. When the source yields more, the partial
    /// object is removed and [`StorageError::SizeLimitExceeded`] is returned. Any
    /// other failure also leaves nothing behind.
    async fn upload_stream(
        &self,
        filename: &str,
        max_bytes: u64,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<StoredObject>;

    /// Download a whole object into memory
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Download an object as a stream of chunks
    async fn download_stream(&self, storage_key: &str) -> StorageResult<ByteStream>;

    /// Delete an object. Deleting a missing object succeeds.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Remove every object in the content area and return how many were removed.
    async fn clear(&self) -> StorageResult<u64>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use codedrop_core::ErrorMetadata;

    #[test]
    fn test_source_failure_hides_parser_text() {
        let err = AppError::from(StorageError::SourceFailed(
            "multer: incomplete field data at byte 4096".to_string(),
        ));
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(err.client_message(), "Failed to read upload body");
    }

    #[test]
    fn test_size_limit_maps_to_payload_too_large() {
        let err = AppError::from(StorageError::SizeLimitExceeded { limit: 10 });
        assert_eq!(err.http_status_code(), 413);
    }
}
