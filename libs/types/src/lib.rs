//! Types library for the revenue aggregation engine
//!
//! This library provides the data model shared by the engine and its HTTP
//! surface: platform metrics, consolidated totals, transfer records, the fee
//! schedule and the error taxonomy.
//!
//! # Modules
//! - `ids`: Identifiers (PlatformId, TransferId)
//! - `metrics`: Per-platform metrics and consolidated totals
//! - `transfer`: Transfer records and their lifecycle status
//! - `fee`: Fee rate and single-transfer ceiling
//! - `errors`: Error taxonomy

// Public modules
pub mod ids;
pub mod metrics;
pub mod transfer;
pub mod fee;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::metrics::*;
    pub use crate::transfer::*;
    pub use crate::fee::*;
    pub use crate::errors::*;
}
