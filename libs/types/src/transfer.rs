//! Transfer record types
//!
//! A `TransferRecord` is immutable once created and appended to the
//! newest-first transfer history.

use crate::ids::{PlatformId, TransferId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Transfer lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Debited from the ledger, awaiting external settlement
    Processing,
    Settled,
    Failed,
}

/// A withdrawal executed against the consolidated ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRecord {
    pub id: TransferId,
    /// Gross amount removed from the ledger
    pub amount: f64,
    pub fee: f64,
    /// `amount - fee`
    pub net_amount: f64,
    pub created_at: DateTime<Utc>,
    pub status: TransferStatus,
    /// Amount removed from each platform
    #[serde(default)]
    pub debits: BTreeMap<PlatformId, f64>,
}

impl TransferRecord {
    /// Sum of the per-platform debits
    pub fn total_debited(&self) -> f64 {
        self.debits.values().sum()
    }
}
