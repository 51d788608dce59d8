//! Error types for the revenue engine
//!
//! Error taxonomy using thiserror. `Unavailable` is transient and expected;
//! `TransferError` is surfaced verbatim to callers.

use crate::ids::PlatformId;
use thiserror::Error;

/// Why a platform's metrics could not be read this cycle
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnavailableReason {
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("no endpoint configured")]
    NoEndpoint,
}

/// A platform's metrics source could not be read
#[derive(Error, Debug, Clone, PartialEq)]
#[error("platform {platform} unavailable: {reason}")]
pub struct Unavailable {
    pub platform: PlatformId,
    pub reason: UnavailableReason,
}

impl Unavailable {
    pub fn new(platform: PlatformId, reason: UnavailableReason) -> Self {
        Self { platform, reason }
    }
}

/// Transfer validation failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    #[error("Transfer of {requested} exceeds limit of {limit}")]
    ExceedsLimit { requested: f64, limit: f64 },

    #[error("Invalid transfer amount: {0}")]
    InvalidAmount(f64),
}

/// Identifier construction failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IdError {
    #[error("Platform id must not be empty")]
    EmptyPlatformId,
}

/// Ledger lookup failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Unknown platform: {0}")]
    UnknownPlatform(PlatformId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_display() {
        let err = Unavailable::new(
            PlatformId::new("studio"),
            UnavailableReason::Timeout { timeout_ms: 3000 },
        );
        assert_eq!(
            err.to_string(),
            "platform studio unavailable: request timed out after 3000ms"
        );
    }

    #[test]
    fn test_exceeds_limit_display() {
        let err = TransferError::ExceedsLimit {
            requested: 95.0,
            limit: 90.0,
        };
        assert_eq!(err.to_string(), "Transfer of 95 exceeds limit of 90");
    }

    #[test]
    fn test_unknown_platform_display() {
        let err = LedgerError::UnknownPlatform(PlatformId::new("ghost"));
        assert_eq!(err.to_string(), "Unknown platform: ghost");
    }
}
