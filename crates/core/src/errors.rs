//! Core error types for the ledger replay engine.
//!
//! Normalization and replay errors are all-or-nothing: they abort the whole
//! reconstruction. Valuation and performance errors are scoped to the
//! snapshot or window that produced them.

use chrono::{DateTime, NaiveDate, ParseError as ChronoParseError, Utc};
use thiserror::Error;

use crate::market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the ledger application.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Normalization failed: {0}")]
    Normalization(#[from] NormalizationError),

    #[error("Ledger replay failed: {0}")]
    Calculation(#[from] CalculatorError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Valuation failed: {0}")]
    Valuation(#[from] ValuationError),

    #[error("Performance calculation failed: {0}")]
    Performance(#[from] PerformanceError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),
}

/// Errors raised while cleaning raw export rows.
#[derive(Error, Debug)]
pub enum NormalizationError {
    /// A reference table has no row for a key the normalizer must resolve.
    #[error("No match for '{key}' in {table} table (transaction {transaction_id})")]
    LookupMiss {
        table: String,
        key: String,
        transaction_id: String,
    },

    #[error("Row {transaction_id} has no symbol but action {action} requires one")]
    MissingSymbol {
        action: String,
        transaction_id: String,
    },
}

/// Errors that occur while replaying transactions into a ledger.
#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("Unclassified activity '{activity_type}' / action '{action}' in transaction {transaction_id} on {date}")]
    UnclassifiedActivity {
        activity_type: String,
        action: String,
        transaction_id: String,
        date: DateTime<Utc>,
    },

    #[error("Position {symbol} not found for transaction {transaction_id} on {date}")]
    MissingPosition {
        symbol: String,
        transaction_id: String,
        date: DateTime<Utc>,
    },

    #[error("Transaction {transaction_id} ({activity_type} / {action}) requires a symbol")]
    MissingSymbol {
        activity_type: String,
        action: String,
        transaction_id: String,
    },

    #[error("No split multiplier for {date} (transaction {transaction_id})")]
    SplitMultiplierMissing {
        date: NaiveDate,
        transaction_id: String,
    },

    #[error("No paired adjustment row on {date} with quantity {quantity} for transaction {transaction_id}")]
    UnpairedAdjustment {
        date: DateTime<Utc>,
        quantity: rust_decimal::Decimal,
        transaction_id: String,
    },

    #[error("Cannot parse option description '{description}' in transaction {transaction_id}: {reason}")]
    InvalidOptionDescription {
        description: String,
        transaction_id: String,
        reason: String,
    },

    #[error("Position {symbol} is not an option (transaction {transaction_id})")]
    PositionKindMismatch {
        symbol: String,
        transaction_id: String,
    },

    #[error("Transaction {transaction_id} at {date} precedes the previous transaction at {previous}")]
    UnsortedLog {
        transaction_id: String,
        date: DateTime<Utc>,
        previous: DateTime<Utc>,
    },

    #[error("Transaction {transaction_id}: {source}")]
    Oracle {
        transaction_id: String,
        #[source]
        source: MarketDataError,
    },
}

/// Errors scoped to one valuation pass.
#[derive(Error, Debug)]
pub enum ValuationError {
    #[error("No price for {symbol}: {source}")]
    Price {
        symbol: String,
        #[source]
        source: MarketDataError,
    },

    #[error("No exchange rate {from}->{to}: {source}")]
    Fx {
        from: String,
        to: String,
        #[source]
        source: MarketDataError,
    },
}

/// Errors scoped to one lookback window.
#[derive(Error, Debug)]
pub enum PerformanceError {
    #[error("Window '{0}' has a non-positive duration")]
    EmptyWindow(String),

    #[error("Window '{0}' has a zero Modified Dietz denominator")]
    ZeroDenominator(String),

    #[error("Window '{label}' has no starting valuation: {reason}")]
    MissingStartValuation { label: String, reason: String },
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number '{value}' in field '{field}' of row {row}")]
    DecimalParse {
        field: String,
        value: String,
        row: usize,
    },

    #[error("Failed to parse date/time '{value}' in field '{field}' of row {row}")]
    DateTimeParse {
        field: String,
        value: String,
        row: usize,
    },

    #[error("Failed to read export: {0}")]
    Export(#[from] csv::Error),
}

// === From implementations for common error types ===

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidConfigValue(err.to_string())
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::InvalidInput(err.to_string()))
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Validation(ValidationError::Export(err))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
