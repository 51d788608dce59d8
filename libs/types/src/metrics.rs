//! Platform metrics and consolidated totals
//!
//! `PlatformMetrics` is the ledger entry for one platform. `RawMetrics` is the
//! shape reported by a platform's analytics endpoint. `ConsolidatedTotals` is
//! always derived from a set of entries and never stored on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operational status reported for a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformStatus {
    #[serde(alias = "healthy", alias = "ok", alias = "online")]
    Active,
    Degraded,
}

impl PlatformStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, PlatformStatus::Active)
    }
}

/// Current metrics snapshot for a single platform
///
/// Invariant: `revenue >= 0` and finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMetrics {
    pub revenue: f64,
    pub daily_revenue: f64,
    pub views: u64,
    pub downloads: u64,
    pub automations_active: u64,
    pub items_generated: u64,
    pub status: PlatformStatus,
    /// True iff the last refresh came from the platform itself rather than the simulator
    pub is_live: bool,
    pub last_updated: DateTime<Utc>,
    /// Daily compounding rate, fixed at initialization
    pub growth_rate: f64,
}

impl PlatformMetrics {
    /// Check the non-negative revenue invariant
    pub fn check_invariant(&self) -> bool {
        self.revenue.is_finite() && self.revenue >= 0.0
    }

    /// Apply a freshly fetched reading on top of this entry.
    ///
    /// Fields the endpoint does not report (`daily_revenue` when absent,
    /// `growth_rate`) are carried over from the current entry.
    pub fn with_live(&self, raw: &RawMetrics, now: DateTime<Utc>) -> Self {
        Self {
            revenue: raw.revenue,
            daily_revenue: raw.daily_revenue.unwrap_or(self.daily_revenue),
            views: raw.views,
            downloads: raw.downloads,
            automations_active: raw.automations_active,
            items_generated: raw.items_generated,
            status: raw.status,
            is_live: true,
            last_updated: now,
            growth_rate: self.growth_rate,
        }
    }
}

/// Metrics as reported by a platform analytics endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetrics {
    pub revenue: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_revenue: Option<f64>,
    pub views: u64,
    pub downloads: u64,
    pub automations_active: u64,
    pub items_generated: u64,
    pub status: PlatformStatus,
}

impl RawMetrics {
    /// Reject readings that would break ledger invariants
    pub fn validate(&self) -> Result<(), String> {
        if !self.revenue.is_finite() || self.revenue < 0.0 {
            return Err(format!("revenue must be finite and non-negative, got {}", self.revenue));
        }
        if let Some(daily) = self.daily_revenue {
            if !daily.is_finite() {
                return Err(format!("dailyRevenue must be finite, got {}", daily));
            }
        }
        Ok(())
    }
}

/// Totals derived from every ledger entry
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedTotals {
    pub total_revenue: f64,
    pub daily_earnings: f64,
    pub total_views: u64,
    pub total_downloads: u64,
    pub active_automations: u64,
    pub healthy_platforms: usize,
}

impl ConsolidatedTotals {
    /// Sum a set of platform entries
    pub fn from_metrics<'a>(entries: impl IntoIterator<Item = &'a PlatformMetrics>) -> Self {
        entries.into_iter().fold(Self::default(), |mut acc, m| {
            acc.total_revenue += m.revenue;
            acc.daily_earnings += m.daily_revenue;
            acc.total_views = acc.total_views.saturating_add(m.views);
            acc.total_downloads = acc.total_downloads.saturating_add(m.downloads);
            acc.active_automations = acc.active_automations.saturating_add(m.automations_active);
            if m.status.is_active() {
                acc.healthy_platforms += 1;
            }
            acc
        })
    }
}
