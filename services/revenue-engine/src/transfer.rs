//! Transfer engine
//!
//! Validates a withdrawal against the ledger total, debits every platform by
//! its revenue share inside the same ledger critical section, and records the
//! transfer at the head of the history.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::Mutex;
use tracing::{info, warn};
use types::errors::TransferError;
use types::fee::FeeSchedule;
use types::ids::{PlatformId, TransferId};
use types::metrics::PlatformMetrics;
use types::transfer::{TransferRecord, TransferStatus};

use crate::ledger::Ledger;

/// Mints `tr_` identifiers whose millisecond component strictly increases
struct IdMinter {
    last_millis: u64,
    rng: ChaCha8Rng,
}

impl IdMinter {
    fn mint(&mut self, now: DateTime<Utc>) -> TransferId {
        let now_millis = now.timestamp_millis().max(0) as u64;
        let millis = now_millis.max(self.last_millis + 1);
        self.last_millis = millis;
        TransferId::from_parts(millis, self.rng.gen())
    }
}

pub struct TransferEngine {
    ledger: Arc<Ledger>,
    fees: FeeSchedule,
    /// Newest first
    history: Mutex<VecDeque<TransferRecord>>,
    minter: Mutex<IdMinter>,
}

impl TransferEngine {
    pub fn new(ledger: Arc<Ledger>, fees: FeeSchedule, rng: ChaCha8Rng) -> Self {
        Self {
            ledger,
            fees,
            history: Mutex::new(VecDeque::new()),
            minter: Mutex::new(IdMinter { last_millis: 0, rng }),
        }
    }

    /// Restore a newest-first history, e.g. from a snapshot
    pub async fn restore_history(&self, records: Vec<TransferRecord>) {
        let newest = records
            .iter()
            .filter_map(|r| u64::try_from(r.created_at.timestamp_millis()).ok())
            .max()
            .unwrap_or(0);

        *self.history.lock().await = records.into();
        let mut minter = self.minter.lock().await;
        minter.last_millis = minter.last_millis.max(newest);
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    pub async fn request_transfer(&self, amount: f64) -> Result<TransferRecord, TransferError> {
        self.request_transfer_at(amount, Utc::now()).await
    }

    pub async fn request_transfer_at(
        &self,
        amount: f64,
        now: DateTime<Utc>,
    ) -> Result<TransferRecord, TransferError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(TransferError::InvalidAmount(amount));
        }

        // Held across the debit so history order matches debit order
        let mut history = self.history.lock().await;

        let fees = self.fees;
        let debits = self
            .ledger
            .debit_checked(|total| {
                let limit = fees.limit(total);
                if amount > limit {
                    Err(TransferError::ExceedsLimit {
                        requested: amount,
                        limit,
                    })
                } else {
                    Ok(amount)
                }
            })
            .await
            .map_err(|err| {
                warn!(amount, error = %err, "Transfer rejected");
                err
            })?;

        let id = self.minter.lock().await.mint(now);
        let fee = fees.fee(amount);
        let record = TransferRecord {
            id,
            amount,
            fee,
            net_amount: amount - fee,
            created_at: now,
            status: TransferStatus::Processing,
            debits,
        };

        info!(
            transfer_id = %record.id,
            amount = record.amount,
            fee = record.fee,
            net_amount = record.net_amount,
            platforms = record.debits.len(),
            "Transfer debited"
        );

        history.push_front(record.clone());
        Ok(record)
    }

    /// Ledger entries and history read together.
    ///
    /// The history lock is held while the ledger is copied, the same order a
    /// transfer takes them, so every recorded transfer is reflected in the
    /// entries and no debit is missing its record.
    pub async fn ledger_with_history(&self) -> (BTreeMap<PlatformId, PlatformMetrics>, Vec<TransferRecord>) {
        let history = self.history.lock().await;
        let entries = self.ledger.snapshot().await;
        (entries, history.iter().cloned().collect())
    }

    /// Past transfers, newest first
    pub async fn history(&self, limit: Option<usize>) -> Vec<TransferRecord> {
        let history = self.history.lock().await;
        let take = limit.unwrap_or(history.len());
        history.iter().take(take).cloned().collect()
    }
}
