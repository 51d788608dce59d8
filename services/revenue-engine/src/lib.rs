//! Revenue Aggregation & Distribution Engine
//!
//! Polls a fixed set of platform services for operational and financial
//! metrics, keeps a consolidated in-memory ledger (falling back to simulated
//! growth when a platform is unreachable), and executes transfers that debit
//! the ledger proportionally across platforms.
//!
//! # Architecture
//!
//! ```text
//!   Scheduler tick                 POST /v1/transfers
//!        │                                │
//!   ┌────▼──────┐                  ┌──────▼─────┐
//!   │Aggregator │                  │ Transfer   │
//!   └──┬─────┬──┘                  │ Engine     │
//!      │     │ Unavailable         └──────┬─────┘
//! ┌────▼──┐ ┌▼─────────┐                  │ debit_checked
//! │Adapter│ │Simulator │                  │
//! └────┬──┘ └┬─────────┘                  │
//!      │     │  apply_refresh             │
//!   ┌──▼─────▼────────────────────────────▼──┐
//!   │       Ledger (single RwLock)           │
//!   └──────────────────┬─────────────────────┘
//!                      │ best effort
//!                 ┌────▼─────┐
//!                 │ Snapshot │
//!                 └──────────┘
//! ```

pub mod adapter;
pub mod aggregator;
pub mod api;
pub mod config;
pub mod engine;
pub mod ledger;
pub mod persistence;
pub mod scheduler;
pub mod simulator;
pub mod transfer;

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
