//! Periodic refresh loop
//!
//! Owns the recurring refresh of the engine. The loop stops when the handle's
//! stop signal flips; a cycle already in progress is allowed to finish.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::engine::RevenueEngine;

/// Handle to a running refresh loop
pub struct SchedulerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl SchedulerHandle {
    /// Signal the loop to stop and wait for it; returns the number of cycles run
    pub async fn shutdown(self) -> u64 {
        let _ = self.stop.send(true);
        match self.task.await {
            Ok(cycles) => cycles,
            Err(err) => {
                warn!(error = %err, "Refresh loop task failed");
                0
            }
        }
    }
}

/// Spawn the refresh loop. The first cycle runs immediately.
pub fn spawn(engine: Arc<RevenueEngine>, interval: Duration) -> SchedulerHandle {
    let (stop, stop_rx) = watch::channel(false);
    let task = tokio::spawn(run(engine, interval, stop_rx));
    SchedulerHandle { stop, task }
}

async fn run(engine: Arc<RevenueEngine>, interval: Duration, mut stop: watch::Receiver<bool>) -> u64 {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut cycles = 0u64;

    info!(interval_secs = interval.as_secs_f64(), "Refresh loop started");

    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                engine.refresh(Utc::now()).await;
                cycles += 1;
            }
        }
    }

    info!(cycles, "Refresh loop stopped");
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::MetricSource;
    use crate::config::EngineConfig;
    use async_trait::async_trait;
    use types::errors::{Unavailable, UnavailableReason};
    use types::ids::PlatformId;
    use types::metrics::RawMetrics;

    struct Offline;

    #[async_trait]
    impl MetricSource for Offline {
        async fn fetch(&self, platform: &PlatformId) -> Result<RawMetrics, Unavailable> {
            Err(Unavailable::new(platform.clone(), UnavailableReason::NoEndpoint))
        }
    }

    async fn engine() -> Arc<RevenueEngine> {
        let config = EngineConfig {
            rng_seed: Some(1),
            ..EngineConfig::default()
        };
        Arc::new(RevenueEngine::bootstrap(&config, Arc::new(Offline)).await)
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_on_interval_and_stops() {
        let handle = spawn(engine().await, Duration::from_secs(30));

        // Immediate first tick plus two more intervals
        tokio::time::sleep(Duration::from_secs(61)).await;
        let cycles = handle.shutdown().await;

        assert_eq!(cycles, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_before_second_tick() {
        let handle = spawn(engine().await, Duration::from_secs(300));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(handle.shutdown().await, 1);
    }
}
