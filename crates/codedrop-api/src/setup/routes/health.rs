//! Health check handlers.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Key that never exists; probing it exercises the content area without touching real objects.
const PROBE_KEY: &str = "objects/health-check-probe";

#[derive(Serialize)]
pub(super) struct ReadinessResponse {
    pub status: &'static str,
    pub storage: String,
    pub live_codes: usize,
}

/// Liveness probe - process is running.
pub async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "alive" })),
    )
}

/// Readiness probe - the content area answers and the store is reachable.
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let storage = match tokio::time::timeout(CHECK_TIMEOUT, state.storage.exists(PROBE_KEY)).await
    {
        Ok(Ok(_)) => "ready".to_string(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Content area readiness check failed");
            "not_ready".to_string()
        }
        Err(_) => {
            tracing::error!("Content area readiness check timed out");
            "timeout".to_string()
        }
    };

    let ready = storage == "ready";
    let response = ReadinessResponse {
        status: if ready { "ready" } else { "not_ready" },
        storage,
        live_codes: state.store().live_len().await,
    };

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}
