//! CodeDrop Storage Library
//!
//! This crate provides the content area: the place where raw uploaded bytes live
//! between upload and download. It exposes the [`Storage`] trait and a local
//! filesystem implementation.
//!
//! # Storage key format
//!
//! Every object is stored under `objects/{uuid}-{sanitized filename}`. The uuid
//! prefix makes keys unique even when two uploads carry the same name, and the
//! sanitized name keeps the content directory readable when debugging.
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module so every caller produces the same layout.

pub mod factory;
pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use local::LocalStorage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult, StoredObject};
