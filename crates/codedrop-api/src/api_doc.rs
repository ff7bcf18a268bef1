//! OpenAPI documentation, served at `/api/openapi.json` and rendered by RapiDoc at `/docs`.

use utoipa::OpenApi;

use crate::handlers;
use codedrop_core::models;
use codedrop_infra::ErrorResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CodeDrop API",
        version = "0.1.0",
        description = "Ephemeral file drop. Upload one or more files, relay the six-digit code, and the receiver downloads them once before the code expires."
    ),
    paths(
        handlers::upload::upload,
        handlers::download::download,
        handlers::code_info::get_code_info,
    ),
    components(
        schemas(
            models::UploadResponse,
            models::CodeInfoResponse,
            models::CodeFileInfo,
            ErrorResponse,
        )
    ),
    tags(
        (name = "transfer", description = "Upload files under a code and redeem the code for them")
    )
)]
pub struct ApiDoc;
