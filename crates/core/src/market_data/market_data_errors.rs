//! Oracle error types.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors returned by a price/FX oracle.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// The oracle knows the instrument but has nothing for this date
    /// (market holiday, missing quote).
    #[error("No data: {0}")]
    NoData(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("No data for {key} within {days} day(s) on or before {date}")]
    RetriesExhausted {
        key: String,
        date: NaiveDate,
        days: u32,
    },
}

impl MarketDataError {
    /// Returns true if stepping the lookup date back may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MarketDataError::NoData(_) | MarketDataError::ProviderUnavailable(_)
        )
    }

    /// Returns true if this error is terminal (retrying won't help).
    pub fn is_terminal(&self) -> bool {
        !self.is_retryable()
    }
}
