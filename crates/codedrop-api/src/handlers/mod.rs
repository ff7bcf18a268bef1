pub mod code_info;
pub mod download;
pub mod upload;
