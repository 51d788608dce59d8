//! Platform ledger
//!
//! Single authoritative owner of every platform's current metrics. All
//! mutations go through one `RwLock` write section, so a reader never sees a
//! refresh cycle or a proportional debit half applied.
//!
//! Each entry carries a revision counter bumped on every mutation. Refresh
//! cycles compute simulated states outside the lock from a versioned snapshot;
//! `apply_refresh` uses the revision to detect an entry debited in between and
//! rebases the simulated growth onto it instead of overwriting the debit.

use std::collections::BTreeMap;
use std::convert::Infallible;

use tokio::sync::RwLock;
use tracing::{debug, warn};
use types::errors::LedgerError;
use types::ids::PlatformId;
use types::metrics::{ConsolidatedTotals, PlatformMetrics};

/// A ledger entry together with its mutation counter
#[derive(Debug, Clone, PartialEq)]
pub struct VersionedEntry {
    pub metrics: PlatformMetrics,
    pub revision: u64,
}

/// Pending change for one platform produced by a refresh cycle
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshUpdate {
    /// Fresh reading from the platform itself; replaces the entry
    Live {
        platform: PlatformId,
        metrics: PlatformMetrics,
    },
    /// Simulated successor of `base`, computed at `base_revision`
    Simulated {
        platform: PlatformId,
        base: PlatformMetrics,
        base_revision: u64,
        next: PlatformMetrics,
    },
}

#[derive(Debug, Default)]
struct LedgerState {
    entries: BTreeMap<PlatformId, VersionedEntry>,
}

impl LedgerState {
    fn totals(&self) -> ConsolidatedTotals {
        ConsolidatedTotals::from_metrics(self.entries.values().map(|e| &e.metrics))
    }

    fn total_revenue(&self) -> f64 {
        self.entries.values().map(|e| e.metrics.revenue).sum()
    }

    fn replace(&mut self, platform: &PlatformId, mut metrics: PlatformMetrics) -> Result<(), LedgerError> {
        let entry = self
            .entries
            .get_mut(platform)
            .ok_or_else(|| LedgerError::UnknownPlatform(platform.clone()))?;
        sanitize(platform, &mut metrics);
        entry.metrics = metrics;
        entry.revision += 1;
        Ok(())
    }

    /// Debit `amount` across every entry by its share of the current total.
    fn debit_proportional(&mut self, amount: f64) -> BTreeMap<PlatformId, f64> {
        let total = self.total_revenue();
        let mut debits = BTreeMap::new();

        for (id, entry) in self.entries.iter_mut() {
            let revenue = entry.metrics.revenue;
            let debit = if total > 0.0 && amount > 0.0 {
                (amount * (revenue / total)).clamp(0.0, revenue)
            } else {
                0.0
            };

            if debit > 0.0 {
                entry.metrics.revenue = (revenue - debit).max(0.0);
                entry.revision += 1;
            }
            debits.insert(id.clone(), debit);
        }

        debits
    }
}

/// Clamp a metrics value back inside the ledger invariants
fn sanitize(platform: &PlatformId, metrics: &mut PlatformMetrics) {
    if !metrics.check_invariant() {
        warn!(
            platform = %platform,
            revenue = metrics.revenue,
            "Clamping invalid revenue to zero"
        );
        metrics.revenue = 0.0;
    }
}

/// Apply the simulated growth `next - base` onto `current`.
fn rebase(current: &PlatformMetrics, base: &PlatformMetrics, next: &PlatformMetrics) -> PlatformMetrics {
    PlatformMetrics {
        revenue: (current.revenue + (next.revenue - base.revenue).max(0.0)).max(0.0),
        daily_revenue: next.daily_revenue,
        views: current.views.saturating_add(next.views.saturating_sub(base.views)),
        downloads: current
            .downloads
            .saturating_add(next.downloads.saturating_sub(base.downloads)),
        automations_active: current.automations_active,
        items_generated: current
            .items_generated
            .saturating_add(next.items_generated.saturating_sub(base.items_generated)),
        status: current.status,
        is_live: false,
        last_updated: next.last_updated,
        growth_rate: current.growth_rate,
    }
}

/// The consolidated in-memory ledger
pub struct Ledger {
    state: RwLock<LedgerState>,
}

impl Ledger {
    /// Create a ledger holding exactly the given platforms
    pub fn new(initial: BTreeMap<PlatformId, PlatformMetrics>) -> Self {
        let entries = initial
            .into_iter()
            .map(|(id, mut metrics)| {
                sanitize(&id, &mut metrics);
                (id, VersionedEntry { metrics, revision: 0 })
            })
            .collect();

        Self {
            state: RwLock::new(LedgerState { entries }),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    pub async fn platform_ids(&self) -> Vec<PlatformId> {
        self.state.read().await.entries.keys().cloned().collect()
    }

    /// Owned copy of every entry
    pub async fn snapshot(&self) -> BTreeMap<PlatformId, PlatformMetrics> {
        let state = self.state.read().await;
        state
            .entries
            .iter()
            .map(|(id, e)| (id.clone(), e.metrics.clone()))
            .collect()
    }

    /// Owned copy of every entry with its revision
    pub async fn versioned_snapshot(&self) -> BTreeMap<PlatformId, VersionedEntry> {
        self.state.read().await.entries.clone()
    }

    /// Entries and the totals derived from them, read under one lock
    pub async fn view(&self) -> (BTreeMap<PlatformId, PlatformMetrics>, ConsolidatedTotals) {
        let state = self.state.read().await;
        let entries = state
            .entries
            .iter()
            .map(|(id, e)| (id.clone(), e.metrics.clone()))
            .collect();
        (entries, state.totals())
    }

    pub async fn get(&self, platform: &PlatformId) -> Option<PlatformMetrics> {
        self.state
            .read()
            .await
            .entries
            .get(platform)
            .map(|e| e.metrics.clone())
    }

    pub async fn totals(&self) -> ConsolidatedTotals {
        self.state.read().await.totals()
    }

    /// Atomically replace one entry
    pub async fn merge(&self, platform: &PlatformId, metrics: PlatformMetrics) -> Result<(), LedgerError> {
        self.state.write().await.replace(platform, metrics)
    }

    /// Apply a whole refresh cycle in one critical section and return the new totals.
    ///
    /// Updates for platforms the ledger does not know are dropped.
    pub async fn apply_refresh(&self, updates: Vec<RefreshUpdate>) -> ConsolidatedTotals {
        let mut state = self.state.write().await;

        for update in updates {
            let (platform, metrics) = match update {
                RefreshUpdate::Live { platform, metrics } => (platform, metrics),
                RefreshUpdate::Simulated {
                    platform,
                    base,
                    base_revision,
                    next,
                } => {
                    let current = match state.entries.get(&platform) {
                        Some(entry) => entry,
                        None => {
                            warn!(platform = %platform, "Dropping refresh for unknown platform");
                            continue;
                        }
                    };
                    if current.revision == base_revision {
                        (platform, next)
                    } else {
                        debug!(
                            platform = %platform,
                            base_revision,
                            current_revision = current.revision,
                            "Entry changed during refresh; rebasing simulated growth"
                        );
                        let rebased = rebase(&current.metrics, &base, &next);
                        (platform, rebased)
                    }
                }
            };

            if let Err(err) = state.replace(&platform, metrics) {
                warn!(error = %err, "Dropping refresh for unknown platform");
            }
        }

        state.totals()
    }

    /// Remove `amount` from the ledger in proportion to each platform's revenue share.
    ///
    /// Returns the amount taken from each platform. No entry goes below zero.
    pub async fn debit_proportional(&self, amount: f64) -> BTreeMap<PlatformId, f64> {
        match self.debit_checked(|_| Ok::<f64, Infallible>(amount)).await {
            Ok(debits) => debits,
            Err(never) => match never {},
        }
    }

    /// Validate against the current total and debit, all in one critical section.
    ///
    /// `plan` receives the total revenue at request time and returns the amount
    /// to debit, or an error that leaves the ledger untouched.
    pub async fn debit_checked<F, E>(&self, plan: F) -> Result<BTreeMap<PlatformId, f64>, E>
    where
        F: FnOnce(f64) -> Result<f64, E>,
    {
        let mut state = self.state.write().await;
        let total = state.total_revenue();
        let amount = plan(total)?;
        Ok(state.debit_proportional(amount))
    }
}
