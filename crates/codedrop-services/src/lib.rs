//! CodeDrop Services Layer
//!
//! This crate is the **business service layer**: the code generator, the code
//! store with its background sweep, zip bundling and the transfer service that
//! ties uploads and downloads to the content area. Keep business logic and
//! coordination here; keep thin HTTP handling in codedrop-api.

pub mod archive;
pub mod cleanup;
pub mod code;
pub mod store;
pub mod transfer;

pub use archive::create_zip_archive;
pub use cleanup::SweepService;
pub use code::{CodeGenerator, CodeSource, RandomCodeSource, MAX_GENERATION_ATTEMPTS};
pub use codedrop_storage::{create_storage, LocalStorage, Storage, StorageError, StorageResult};
pub use store::Store;
pub use transfer::{Download, TransferLimits, TransferService, UploadBatch};
