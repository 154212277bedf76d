//! Background service that prunes expired job records.

use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, info};

use rmix_worker::JobRegistry;

use crate::metrics;

/// Periodically drops terminal registry records past their retention window.
pub struct RegistrySweeper {
    registry: JobRegistry,
    interval: Duration,
}

impl RegistrySweeper {
    pub fn new(registry: JobRegistry, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Start the sweep loop.
    ///
    /// This function runs indefinitely and should be spawned as a background task.
    pub async fn run(&self) {
        info!(
            "Starting job registry sweeper (interval: {:?}, retention: {:?})",
            self.interval,
            self.registry.retention()
        );

        let mut ticker = interval(self.interval);
        loop {
            ticker.tick().await;
            self.sweep_once().await;
        }
    }

    /// Run a single sweep; returns the number of records removed.
    pub async fn sweep_once(&self) -> usize {
        let pruned = self.registry.prune_expired().await;
        let tracked = self.registry.len().await;
        metrics::record_registry_sweep(tracked, pruned);

        if pruned > 0 {
            info!(pruned, tracked, "Pruned expired job records");
        } else {
            debug!(tracked, "Registry sweep found nothing to prune");
        }
        pruned
    }
}
