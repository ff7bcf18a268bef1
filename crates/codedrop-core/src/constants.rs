//! Domain constants shared across crates.

/// Number of digits in a transfer code.
pub const CODE_LENGTH: usize = 6;

/// Smallest issuable code (no leading zero, so every code has exactly six digits).
pub const CODE_MIN: u32 = 100_000;

/// Largest issuable code.
pub const CODE_MAX: u32 = 999_999;

/// Content type used when the uploader did not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type of multi-file bundles.
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// Multipart field names accepted as file parts on upload.
pub const UPLOAD_FIELD_NAMES: [&str; 2] = ["file", "files"];
