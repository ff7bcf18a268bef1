//! Application setup and initialization
//!
//! Everything `main` needs is built here so integration tests can assemble the
//! same state and router without binding a socket.

pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use codedrop_core::Config;
use codedrop_infra::{init_telemetry, LogFormat};
use codedrop_services::{create_storage, Store, SweepService, TransferLimits, TransferService};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// A fully wired server: shared state, the router and the background sweep.
pub struct Application {
    pub state: Arc<AppState>,
    pub router: axum::Router,
    sweep_task: JoinHandle<()>,
}

impl Application {
    /// Stop the sweep and purge every code still held.
    pub async fn shutdown(self) {
        self.sweep_task.abort();
        let purged = self.state.store().clear().await;
        tracing::info!(purged = purged, "Store cleared on shutdown");
    }
}

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<Application> {
    let log_format = if config.is_production() {
        LogFormat::Json
    } else {
        config
            .log_format()
            .parse::<LogFormat>()
            .map_err(|e| anyhow::anyhow!(e))?
    };
    init_telemetry(log_format)
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    config
        .validate()
        .context("Configuration validation failed")?;
    tracing::info!(
        environment = %config.environment(),
        "Configuration loaded and validated successfully"
    );

    let state = build_state(&config).await?;

    let sweep = Arc::new(SweepService::new(
        state.store().clone(),
        Duration::from_secs(config.sweep_interval_secs()),
    ));
    let sweep_task = sweep.start();

    let router = routes::setup_routes(&config, state.clone())?;

    Ok(Application {
        state,
        router,
        sweep_task,
    })
}

/// Build the content area, the code store and the transfer service.
pub async fn build_state(config: &Config) -> Result<Arc<AppState>> {
    let storage = create_storage(config)
        .await
        .context("Failed to initialize content area")?;
    tracing::info!(content_dir = %config.content_dir().display(), "Content area ready");

    let store = Arc::new(Store::new(
        storage.clone(),
        Duration::from_secs(config.code_ttl_secs()),
    ));

    let limits = TransferLimits {
        max_upload_bytes: config.max_upload_size_bytes(),
        max_files: config.max_files_per_upload(),
    };
    let transfer = TransferService::new(store, storage.clone(), limits);

    Ok(Arc::new(AppState::new(config.clone(), transfer, storage)))
}
