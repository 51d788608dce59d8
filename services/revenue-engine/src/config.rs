//! Engine configuration
//!
//! Defaults carry the production constants. `EngineConfig::load` layers an
//! optional JSON file (`REVENUE_ENGINE_CONFIG`) and scalar environment
//! overrides on top of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use types::fee::FeeSchedule;
use types::ids::PlatformId;
use types::metrics::{PlatformMetrics, PlatformStatus};

pub const ENV_CONFIG_PATH: &str = "REVENUE_ENGINE_CONFIG";
pub const ENV_BIND: &str = "REVENUE_ENGINE_BIND";
pub const ENV_REFRESH_SECS: &str = "REVENUE_ENGINE_REFRESH_SECS";
pub const ENV_FETCH_TIMEOUT_MS: &str = "REVENUE_ENGINE_FETCH_TIMEOUT_MS";
pub const ENV_FEE_RATE: &str = "REVENUE_ENGINE_FEE_RATE";
pub const ENV_SNAPSHOT: &str = "REVENUE_ENGINE_SNAPSHOT";
pub const ENV_SEED: &str = "REVENUE_ENGINE_SEED";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Seeded starting values for a platform with no persisted state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Baseline {
    pub revenue: f64,
    pub daily_revenue: f64,
    pub views: u64,
    pub downloads: u64,
    pub automations_active: u64,
    pub items_generated: u64,
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            revenue: 0.0,
            daily_revenue: 0.0,
            views: 0,
            downloads: 0,
            automations_active: 0,
            items_generated: 0,
        }
    }
}

/// One tracked platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    pub id: PlatformId,
    /// Base URL of the platform's analytics endpoint; `None` means always simulated
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub baseline: Baseline,
    /// Daily compounding rate used by the growth simulator
    pub growth_rate: f64,
}

impl PlatformConfig {
    /// Ledger entry seeded from the baseline
    pub fn seed(&self, now: DateTime<Utc>) -> PlatformMetrics {
        PlatformMetrics {
            revenue: self.baseline.revenue.max(0.0),
            daily_revenue: self.baseline.daily_revenue,
            views: self.baseline.views,
            downloads: self.baseline.downloads,
            automations_active: self.baseline.automations_active,
            items_generated: self.baseline.items_generated,
            status: PlatformStatus::Active,
            is_live: false,
            last_updated: now,
            growth_rate: self.growth_rate,
        }
    }
}

/// Growth simulator tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfig {
    /// Upper bound of the absolute revenue noise added per cycle
    pub revenue_noise_max: f64,
    pub views_step_max: u64,
    pub downloads_step_max: u64,
    pub items_step_max: u64,
    /// Chance per simulated cycle of a viral boost
    pub viral_probability: f64,
    pub viral_revenue_min: f64,
    pub viral_revenue_max: f64,
    /// Extra views credited per unit of viral revenue
    pub viral_views_per_unit: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            revenue_noise_max: 5.0,
            views_step_max: 50,
            downloads_step_max: 10,
            items_step_max: 3,
            viral_probability: 0.05,
            viral_revenue_min: 50.0,
            viral_revenue_max: 500.0,
            viral_views_per_unit: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub bind_addr: String,
    pub platforms: Vec<PlatformConfig>,
    pub fetch_timeout_ms: u64,
    pub refresh_interval_secs: u64,
    pub fees: FeeSchedule,
    pub simulation: SimulationConfig,
    pub snapshot_path: Option<PathBuf>,
    /// Fixed RNG seed; entropy-seeded when absent
    pub rng_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            platforms: default_platforms(),
            fetch_timeout_ms: 3_000,
            refresh_interval_secs: 30,
            fees: FeeSchedule::default(),
            simulation: SimulationConfig::default(),
            snapshot_path: None,
            rng_seed: None,
        }
    }
}

fn platform(
    id: &str,
    port: u16,
    growth_rate: f64,
    revenue: f64,
    views: u64,
    downloads: u64,
    automations_active: u64,
) -> PlatformConfig {
    PlatformConfig {
        id: PlatformId::new(id),
        endpoint: Some(format!("http://127.0.0.1:{}", port)),
        baseline: Baseline {
            revenue,
            daily_revenue: revenue * growth_rate,
            views,
            downloads,
            automations_active,
            items_generated: downloads / 2,
        },
        growth_rate,
    }
}

/// The six platforms tracked out of the box
pub fn default_platforms() -> Vec<PlatformConfig> {
    vec![
        platform("content-studio", 3001, 0.045, 12_480.0, 184_200, 3_120, 14),
        platform("asset-marketplace", 3002, 0.038, 8_925.5, 96_400, 5_870, 6),
        platform("course-academy", 3003, 0.052, 15_310.0, 61_750, 1_240, 9),
        platform("automation-hub", 3004, 0.061, 6_740.25, 22_300, 880, 42),
        platform("mobile-app", 3005, 0.029, 4_118.75, 310_900, 12_460, 3),
        platform("api-gateway", 3006, 0.033, 9_602.0, 48_100, 2_015, 18),
    ]
}

impl EngineConfig {
    /// Load defaults, an optional JSON file, then environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) => Self::from_file(PathBuf::from(path))?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Apply scalar overrides from a variable lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup(ENV_BIND) {
            self.bind_addr = bind;
        }
        if let Some(secs) = lookup(ENV_REFRESH_SECS) {
            self.refresh_interval_secs = parse_var(ENV_REFRESH_SECS, &secs)?;
        }
        if let Some(ms) = lookup(ENV_FETCH_TIMEOUT_MS) {
            self.fetch_timeout_ms = parse_var(ENV_FETCH_TIMEOUT_MS, &ms)?;
        }
        if let Some(rate) = lookup(ENV_FEE_RATE) {
            self.fees.fee_rate = parse_var(ENV_FEE_RATE, &rate)?;
        }
        if let Some(path) = lookup(ENV_SNAPSHOT) {
            self.snapshot_path = if path.is_empty() { None } else { Some(PathBuf::from(path)) };
        }
        if let Some(seed) = lookup(ENV_SEED) {
            self.rng_seed = Some(parse_var(ENV_SEED, &seed)?);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.platforms.is_empty() {
            return Err(ConfigError::Invalid("at least one platform is required".into()));
        }
        let mut seen = HashSet::new();
        for p in &self.platforms {
            if p.id.as_str().trim().is_empty() {
                return Err(ConfigError::Invalid("platform id must not be empty".into()));
            }
            if !seen.insert(p.id.clone()) {
                return Err(ConfigError::Invalid(format!("duplicate platform id {}", p.id)));
            }
            if !p.growth_rate.is_finite() || p.growth_rate < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "growth rate for {} must be non-negative, got {}",
                    p.id, p.growth_rate
                )));
            }
        }
        if !(0.0..1.0).contains(&self.fees.fee_rate) {
            return Err(ConfigError::Invalid(format!(
                "fee rate must be in [0, 1), got {}",
                self.fees.fee_rate
            )));
        }
        if !(self.fees.max_transfer_ratio > 0.0 && self.fees.max_transfer_ratio <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "max transfer ratio must be in (0, 1], got {}",
                self.fees.max_transfer_ratio
            )));
        }
        if self.fetch_timeout_ms == 0 || self.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid("timeouts and intervals must be non-zero".into()));
        }

        let sim = &self.simulation;
        if !(0.0..=1.0).contains(&sim.viral_probability) {
            return Err(ConfigError::Invalid(format!(
                "viral probability must be in [0, 1], got {}",
                sim.viral_probability
            )));
        }
        if sim.revenue_noise_max < 0.0
            || sim.viral_revenue_min < 0.0
            || sim.viral_revenue_min > sim.viral_revenue_max
            || sim.viral_views_per_unit < 0.0
        {
            return Err(ConfigError::Invalid("simulation bounds must be non-negative and ordered".into()));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

fn parse_var<T: std::str::FromStr>(var: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
    })
}
