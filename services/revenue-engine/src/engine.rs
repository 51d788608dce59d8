//! Engine assembly
//!
//! Builds the ledger once, restores the last snapshot when one exists, and
//! hands the same ledger to the aggregator and the transfer engine. Snapshots
//! are written after every refresh cycle and every accepted transfer.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use types::errors::TransferError;
use types::ids::PlatformId;
use types::metrics::{ConsolidatedTotals, PlatformMetrics};
use types::transfer::TransferRecord;

use crate::adapter::MetricSource;
use crate::aggregator::{Aggregator, RefreshReport};
use crate::config::EngineConfig;
use crate::ledger::Ledger;
use crate::persistence::{PersistedState, PersistenceError, Snapshot, SnapshotStore};
use crate::simulator::GrowthSimulator;
use crate::transfer::TransferEngine;

/// Totals plus the per-platform entries they were derived from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub totals: ConsolidatedTotals,
    pub platforms: BTreeMap<PlatformId, PlatformMetrics>,
    pub generated_at: DateTime<Utc>,
}

pub struct RevenueEngine {
    ledger: Arc<Ledger>,
    aggregator: Aggregator,
    transfers: TransferEngine,
    store: Option<SnapshotStore>,
    persist_lock: Mutex<()>,
}

impl RevenueEngine {
    /// Build the engine from configuration, restoring persisted state if present.
    pub async fn bootstrap(config: &EngineConfig, source: Arc<dyn MetricSource>) -> Self {
        let now = Utc::now();
        let store = config.snapshot_path.clone().map(SnapshotStore::new);

        let mut entries: BTreeMap<PlatformId, PlatformMetrics> = config
            .platforms
            .iter()
            .map(|p| (p.id.clone(), p.seed(now)))
            .collect();
        let mut history = Vec::new();

        if let Some(store) = &store {
            match load_blocking(store.clone()).await {
                Ok(Some(snapshot)) => {
                    info!(
                        path = %store.path().display(),
                        platforms = snapshot.state.platforms.len(),
                        transfers = snapshot.state.transfers.len(),
                        saved_at = %snapshot.saved_at,
                        "Restored ledger snapshot"
                    );
                    entries.extend(snapshot.state.platforms);
                    history = snapshot.state.transfers;
                }
                Ok(None) => {
                    info!(path = %store.path().display(), "No snapshot found; seeding baseline");
                }
                Err(err) => {
                    warn!(
                        path = %store.path().display(),
                        error = %err,
                        "Snapshot load failed; seeding baseline"
                    );
                }
            }
        }

        let mut master = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let sim_rng = ChaCha8Rng::seed_from_u64(master.gen());
        let id_rng = ChaCha8Rng::seed_from_u64(master.gen());

        let ledger = Arc::new(Ledger::new(entries));
        let aggregator = Aggregator::new(
            Arc::clone(&ledger),
            source,
            GrowthSimulator::new(config.simulation.clone()),
            sim_rng,
        );
        let transfers = TransferEngine::new(Arc::clone(&ledger), config.fees, id_rng);
        if !history.is_empty() {
            transfers.restore_history(history).await;
        }

        info!(
            platforms = ledger.len().await,
            fee_rate = config.fees.fee_rate,
            max_transfer_ratio = config.fees.max_transfer_ratio,
            persistence = store.is_some(),
            "Revenue engine initialized"
        );

        Self {
            ledger,
            aggregator,
            transfers,
            store,
            persist_lock: Mutex::new(()),
        }
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn transfers(&self) -> &TransferEngine {
        &self.transfers
    }

    /// Run one refresh cycle and snapshot the result
    pub async fn refresh(&self, now: DateTime<Utc>) -> RefreshReport {
        let report = self.aggregator.refresh_all_with_report(now).await;
        self.persist().await;
        report
    }

    /// Execute a transfer and snapshot on success
    pub async fn transfer(&self, amount: f64) -> Result<TransferRecord, TransferError> {
        let record = self.transfers.request_transfer(amount).await?;
        self.persist().await;
        Ok(record)
    }

    pub async fn history(&self, limit: Option<usize>) -> Vec<TransferRecord> {
        self.transfers.history(limit).await
    }

    pub async fn dashboard(&self) -> Dashboard {
        let (platforms, totals) = self.ledger.view().await;
        Dashboard {
            totals,
            platforms,
            generated_at: Utc::now(),
        }
    }

    /// Best-effort snapshot; failures are logged and swallowed
    pub async fn persist(&self) {
        let store = match &self.store {
            Some(store) => store.clone(),
            None => return,
        };

        let _guard = self.persist_lock.lock().await;
        let (platforms, transfers) = self.transfers.ledger_with_history().await;
        let state = PersistedState { platforms, transfers };

        let path = store.path().to_path_buf();
        let result = tokio::task::spawn_blocking(move || -> Result<(), PersistenceError> {
            let snapshot = Snapshot::new(state, Utc::now())?;
            store.save(&snapshot)
        })
        .await;

        match result {
            Ok(Ok(())) => debug!(path = %path.display(), "Snapshot written"),
            Ok(Err(err)) => warn!(path = %path.display(), error = %err, "Snapshot write failed"),
            Err(err) => warn!(error = %err, "Snapshot task panicked"),
        }
    }
}

async fn load_blocking(store: SnapshotStore) -> Result<Option<Snapshot>, PersistenceError> {
    match tokio::task::spawn_blocking(move || store.load()).await {
        Ok(result) => result,
        Err(err) => Err(PersistenceError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            err.to_string(),
        ))),
    }
}
