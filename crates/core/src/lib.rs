//! Ledgerfolio Core - brokerage transaction replay, valuation and
//! performance measurement.
//!
//! A closed transaction export is normalized into a chronological log,
//! replayed into point-in-time ledgers, priced through a substitutable
//! price/FX oracle and measured with the Modified Dietz method. Price
//! retrieval, file access and presentation are left to the caller.

pub mod constants;
pub mod errors;
pub mod fx;
pub mod market_data;
pub mod portfolio;
pub mod reference;
pub mod settings;
pub mod transactions;
pub mod utils;

pub use portfolio::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
