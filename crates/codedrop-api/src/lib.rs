//! CodeDrop API Library
//!
//! This crate provides the HTTP handlers, error mapping and application setup
//! for the CodeDrop server.

mod api_doc;
pub mod constants;
mod handlers;
mod utils;

pub mod error;
pub mod setup;
pub mod state;

pub use api_doc::ApiDoc;
pub use error::HttpAppError;
pub use state::AppState;
