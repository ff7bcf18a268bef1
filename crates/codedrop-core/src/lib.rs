//! CodeDrop Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! every CodeDrop component: the content-area storage, the code store and the HTTP API.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, Config, TransferConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{Code, CodeEntry, CodeParseError, ObjectRecord};
