//! Data models for the application
//!
//! - `code`: the six-digit transfer code
//! - `record`: stored-file metadata and the TTL-bound code entry grouping it
//! - `transfer`: request/response bodies of the HTTP surface

mod code;
mod record;
mod transfer;

pub use code::*;
pub use record::*;
pub use transfer::*;
