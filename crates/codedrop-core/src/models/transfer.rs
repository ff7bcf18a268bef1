use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Successful upload: the code to relay and how long it stays valid.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Six-digit code for the receiver
    #[schema(example = "482913")]
    pub code: String,
    /// Seconds until the code expires
    #[schema(example = 600)]
    pub expires_in: u64,
}

/// One file behind a code, as shown by the non-consuming peek.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeFileInfo {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

/// Peek at a live code without consuming it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CodeInfoResponse {
    pub code: String,
    pub expires_in: u64,
    pub files: Vec<CodeFileInfo>,
}
