//! Growth simulator
//!
//! Produces a plausible next state for a platform whose endpoint could not be
//! read: compound growth over the elapsed hours, non-negative noise, bounded
//! engagement increments and the occasional viral boost.
//!
//! The random source is always passed in, so a seeded `ChaCha8Rng` yields a
//! reproducible sequence of states.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;
use types::ids::PlatformId;
use types::metrics::PlatformMetrics;

use crate::config::SimulationConfig;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// One-time revenue and engagement spike injected by the simulator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViralBoost {
    pub platform: PlatformId,
    pub revenue: f64,
    pub views: u64,
    pub at: DateTime<Utc>,
}

/// Result of one simulation step
#[derive(Debug, Clone, PartialEq)]
pub struct Simulated {
    pub metrics: PlatformMetrics,
    pub viral_boost: Option<ViralBoost>,
}

#[derive(Debug, Clone)]
pub struct GrowthSimulator {
    config: SimulationConfig,
}

impl GrowthSimulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Advance `previous` to `now`.
    ///
    /// Revenue never decreases: growth is compounded at a non-negative rate and
    /// noise is drawn from `[0, revenue_noise_max)`. A clock that moved
    /// backwards counts as zero elapsed time.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        platform: &PlatformId,
        previous: &PlatformMetrics,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Simulated {
        let elapsed_ms = (now - previous.last_updated).num_milliseconds().max(0);
        let hours = elapsed_ms as f64 / MILLIS_PER_HOUR;

        let rate = previous.growth_rate.max(0.0);
        let growth = (1.0 + rate / 24.0).powf(hours);

        let mut revenue = previous.revenue.max(0.0) * growth + self.noise(rng);
        let mut views = previous.views.saturating_add(rng.gen_range(0..=self.config.views_step_max));
        let downloads = previous
            .downloads
            .saturating_add(rng.gen_range(0..=self.config.downloads_step_max));
        let items_generated = previous
            .items_generated
            .saturating_add(rng.gen_range(0..=self.config.items_step_max));

        let viral_boost = if rng.gen_bool(self.config.viral_probability) {
            let lump = self.viral_lump(rng);
            let extra_views = (lump * self.config.viral_views_per_unit).round() as u64;
            revenue += lump;
            views = views.saturating_add(extra_views);

            info!(
                event = "viral_boost",
                platform = %platform,
                revenue = lump,
                views = extra_views,
                "Viral boost injected"
            );

            Some(ViralBoost {
                platform: platform.clone(),
                revenue: lump,
                views: extra_views,
                at: now,
            })
        } else {
            None
        };

        let metrics = PlatformMetrics {
            revenue,
            daily_revenue: revenue * rate,
            views,
            downloads,
            automations_active: previous.automations_active,
            items_generated,
            status: previous.status,
            is_live: false,
            last_updated: now.max(previous.last_updated),
            growth_rate: previous.growth_rate,
        };

        Simulated {
            metrics,
            viral_boost,
        }
    }

    fn noise<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.config.revenue_noise_max > 0.0 {
            rng.gen_range(0.0..self.config.revenue_noise_max)
        } else {
            0.0
        }
    }

    fn viral_lump<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let (min, max) = (self.config.viral_revenue_min, self.config.viral_revenue_max);
        if max > min {
            rng.gen_range(min..max)
        } else {
            min
        }
    }
}
