use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};

use crate::store::Store;

/// Background task that periodically removes expired codes from the [`Store`].
#[derive(Clone)]
pub struct SweepService {
    store: Arc<Store>,
    period: Duration,
}

impl SweepService {
    pub fn new(store: Arc<Store>, period: Duration) -> Self {
        // tokio intervals reject a zero period
        let period = period.max(Duration::from_millis(1));
        Self { store, period }
    }

    /// Start the background sweep task.
    /// Returns a JoinHandle for graceful shutdown.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(self.period);
            sweep_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            tracing::info!(
                interval_secs = self.period.as_secs(),
                "Expired code sweep started"
            );

            loop {
                sweep_interval.tick().await;
                self.run_once().await;
            }
        })
    }

    /// Run a single sweep pass and return the number of codes removed.
    #[tracing::instrument(skip(self), fields(cleanup.operation = "expire_codes"))]
    pub async fn run_once(&self) -> usize {
        let removed = self.store.sweep().await;
        tracing::debug!(removed = removed, "Sweep pass finished");
        removed
    }
}
