//! Application state shared by every handler.

use codedrop_core::Config;
use codedrop_services::{Storage, Store, TransferService};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub transfer: TransferService,
    /// Content area, also probed by the readiness check
    pub storage: Arc<dyn Storage>,
}

impl AppState {
    pub fn new(config: Config, transfer: TransferService, storage: Arc<dyn Storage>) -> Self {
        Self {
            config,
            transfer,
            storage,
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        self.transfer.store()
    }
}
