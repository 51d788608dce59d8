//! Transfer fee and withdrawal ceiling

use serde::{Deserialize, Serialize};

/// Default fee charged on every transfer (2.5%)
pub const DEFAULT_FEE_RATE: f64 = 0.025;

/// Default ceiling: no single transfer may remove more than 90% of the ledger
pub const DEFAULT_MAX_TRANSFER_RATIO: f64 = 0.9;

/// Fee rate and single-transfer ceiling
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    pub fee_rate: f64,
    pub max_transfer_ratio: f64,
}

impl FeeSchedule {
    /// Fee owed on a gross amount
    pub fn fee(&self, amount: f64) -> f64 {
        amount * self.fee_rate
    }

    /// Amount paid out after the fee
    pub fn net(&self, amount: f64) -> f64 {
        amount - self.fee(amount)
    }

    /// Largest amount a single transfer may request given the ledger total
    pub fn limit(&self, total_revenue: f64) -> f64 {
        (total_revenue * self.max_transfer_ratio).max(0.0)
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            fee_rate: DEFAULT_FEE_RATE,
            max_transfer_ratio: DEFAULT_MAX_TRANSFER_RATIO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_calculation() {
        let schedule = FeeSchedule::default();
        assert!((schedule.fee(50.0) - 1.25).abs() < 1e-12);
        assert!((schedule.net(50.0) - 48.75).abs() < 1e-12);
    }

    #[test]
    fn test_limit() {
        let schedule = FeeSchedule::default();
        assert!((schedule.limit(1000.0) - 900.0).abs() < 1e-9);
        assert_eq!(schedule.limit(0.0), 0.0);
    }

    #[test]
    fn test_zero_fee() {
        let schedule = FeeSchedule {
            fee_rate: 0.0,
            max_transfer_ratio: 1.0,
        };
        assert_eq!(schedule.fee(100.0), 0.0);
        assert_eq!(schedule.net(100.0), 100.0);
        assert_eq!(schedule.limit(100.0), 100.0);
    }
}
