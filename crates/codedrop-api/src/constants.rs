//! Route paths and HTTP-level constants.

/// Upload endpoint (multipart)
pub const UPLOAD_PATH: &str = "/upload";

/// Consuming download endpoint
pub const DOWNLOAD_PATH: &str = "/download/{code}";

/// Short alias of [`DOWNLOAD_PATH`] for links typed by hand
pub const DOWNLOAD_SHORT_PATH: &str = "/d/{code}";

/// Non-consuming peek at a code
pub const CODE_INFO_PATH: &str = "/codes/{code}";

pub const HEALTH_LIVE_PATH: &str = "/health/live";
pub const HEALTH_READY_PATH: &str = "/health/ready";

pub const OPENAPI_JSON_PATH: &str = "/api/openapi.json";
pub const DOCS_PATH: &str = "/docs";

/// Allowance on top of the upload byte budget for multipart boundaries and part headers.
pub const MULTIPART_FRAMING_SLACK_BYTES: u64 = 1024 * 1024;

/// Downloads are single-use, so intermediaries must never cache them.
pub const DOWNLOAD_CACHE_CONTROL: &str = "no-store";
