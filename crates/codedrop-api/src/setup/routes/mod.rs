//! Route configuration and setup.
//!
//! Transfer endpoints, health probes in [health](health) and the API docs.

mod health;

use crate::api_doc::ApiDoc;
use crate::constants::{
    CODE_INFO_PATH, DOCS_PATH, DOWNLOAD_PATH, DOWNLOAD_SHORT_PATH, HEALTH_LIVE_PATH,
    HEALTH_READY_PATH, MULTIPART_FRAMING_SLACK_BYTES, OPENAPI_JSON_PATH, UPLOAD_PATH,
};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use codedrop_core::Config;
use codedrop_infra::{request_id_middleware, security_headers_middleware, SecurityHeaders};
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    // The transfer service enforces the exact byte budget while streaming. The
    // transport limit only has to stop bodies that could never fit it.
    let body_limit = config
        .max_upload_size_bytes()
        .saturating_add(MULTIPART_FRAMING_SLACK_BYTES);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    let http_concurrency_limit = config.http_concurrency_limit();
    tracing::info!(
        http_concurrency_limit = http_concurrency_limit,
        body_limit_bytes = body_limit,
        "HTTP limits configured"
    );

    let app = transfer_routes()
        .merge(health_routes())
        .route(OPENAPI_JSON_PATH, get(openapi_json))
        .merge(utoipa_rapidoc::RapiDoc::new(OPENAPI_JSON_PATH).path(DOCS_PATH))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::disable())
        .layer(axum::middleware::from_fn_with_state(
            SecurityHeaders::new(config.is_production()),
            security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    Ok(app)
}

fn transfer_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(UPLOAD_PATH, post(handlers::upload::upload))
        .route(DOWNLOAD_PATH, get(handlers::download::download))
        .route(DOWNLOAD_SHORT_PATH, get(handlers::download::download))
        .route(CODE_INFO_PATH, get(handlers::code_info::get_code_info))
}

fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(HEALTH_LIVE_PATH, get(health::liveness_check))
        .route(HEALTH_READY_PATH, get(health::readiness_check))
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [Method::GET, Method::POST, Method::OPTIONS];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|_| anyhow::anyhow!("Invalid CORS origin: {}", o))
            })
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}
