//! Refresh orchestration
//!
//! One cycle fans out a fetch per platform, falls back to the growth simulator
//! for every platform that came back `Unavailable`, then merges the whole set
//! into the ledger in a single critical section. Network calls and simulation
//! run without holding the ledger lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};
use types::errors::{Unavailable, UnavailableReason};
use types::ids::PlatformId;
use types::metrics::{ConsolidatedTotals, RawMetrics};

use crate::adapter::MetricSource;
use crate::ledger::{Ledger, RefreshUpdate};
use crate::simulator::{GrowthSimulator, ViralBoost};

/// Outcome of one refresh cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshReport {
    pub totals: ConsolidatedTotals,
    /// Platforms refreshed from their own endpoint
    pub live: Vec<PlatformId>,
    /// Platforms advanced by the simulator
    pub simulated: Vec<PlatformId>,
    pub viral_boosts: Vec<ViralBoost>,
    #[serde(skip)]
    pub failures: Vec<Unavailable>,
}

pub struct Aggregator {
    ledger: Arc<Ledger>,
    source: Arc<dyn MetricSource>,
    simulator: GrowthSimulator,
    rng: Mutex<ChaCha8Rng>,
    /// Held for a whole cycle so overlapping refreshes run one after another
    cycle: Mutex<()>,
}

impl Aggregator {
    pub fn new(
        ledger: Arc<Ledger>,
        source: Arc<dyn MetricSource>,
        simulator: GrowthSimulator,
        rng: ChaCha8Rng,
    ) -> Self {
        Self {
            ledger,
            source,
            simulator,
            rng: Mutex::new(rng),
            cycle: Mutex::new(()),
        }
    }

    /// Refresh every platform and return the recomputed totals
    pub async fn refresh_all(&self, now: DateTime<Utc>) -> ConsolidatedTotals {
        self.refresh_all_with_report(now).await.totals
    }

    /// One full cycle. Cycles never overlap; the ledger lock is only taken to
    /// snapshot and to apply, never across the fetches.
    pub async fn refresh_all_with_report(&self, now: DateTime<Utc>) -> RefreshReport {
        let _cycle = self.cycle.lock().await;
        let before = self.ledger.versioned_snapshot().await;

        let fetches = before.keys().map(|id| {
            let source = Arc::clone(&self.source);
            async move { (id.clone(), fetch_validated(source.as_ref(), id).await) }
        });
        let results = join_all(fetches).await;

        let mut updates = Vec::with_capacity(results.len());
        let mut live = Vec::new();
        let mut simulated = Vec::new();
        let mut viral_boosts = Vec::new();
        let mut failures = Vec::new();

        {
            let mut rng = self.rng.lock().await;
            for (platform, result) in results {
                let entry = match before.get(&platform) {
                    Some(entry) => entry,
                    None => continue,
                };

                match result {
                    Ok(raw) => {
                        updates.push(RefreshUpdate::Live {
                            platform: platform.clone(),
                            metrics: entry.metrics.with_live(&raw, now),
                        });
                        live.push(platform);
                    }
                    Err(unavailable) => {
                        debug!(
                            platform = %platform,
                            reason = %unavailable.reason,
                            "Falling back to simulated growth"
                        );
                        let step = self
                            .simulator
                            .simulate(&platform, &entry.metrics, now, &mut *rng);
                        if let Some(boost) = step.viral_boost {
                            viral_boosts.push(boost);
                        }
                        updates.push(RefreshUpdate::Simulated {
                            platform: platform.clone(),
                            base: entry.metrics.clone(),
                            base_revision: entry.revision,
                            next: step.metrics,
                        });
                        simulated.push(platform);
                        failures.push(unavailable);
                    }
                }
            }
        }

        let totals = self.ledger.apply_refresh(updates).await;

        info!(
            live = live.len(),
            simulated = simulated.len(),
            viral_boosts = viral_boosts.len(),
            total_revenue = totals.total_revenue,
            healthy_platforms = totals.healthy_platforms,
            "Refresh cycle complete"
        );

        RefreshReport {
            totals,
            live,
            simulated,
            viral_boosts,
            failures,
        }
    }
}

async fn fetch_validated(source: &dyn MetricSource, platform: &PlatformId) -> Result<RawMetrics, Unavailable> {
    let raw = source.fetch(platform).await?;
    raw.validate()
        .map_err(|reason| Unavailable::new(platform.clone(), UnavailableReason::Malformed(reason)))?;
    Ok(raw)
}
