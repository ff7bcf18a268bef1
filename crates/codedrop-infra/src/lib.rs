//! CodeDrop Infrastructure Library
//!
//! Shared infrastructure used by the CodeDrop server:
//! - Middleware (request ID, security headers)
//! - Telemetry initialization
//! - The JSON error body returned by every failing endpoint

#[cfg(feature = "middleware")]
pub mod middleware;

#[cfg(feature = "observability-basic")]
pub mod telemetry;

pub mod error;

// Re-export commonly used types
#[cfg(feature = "middleware")]
pub use middleware::{
    request_id_middleware, security_headers_middleware, RequestId,
    SecurityHeaders,
};

#[cfg(feature = "observability-basic")]
pub use telemetry::{init_telemetry, LogFormat};

pub use error::ErrorResponse;
