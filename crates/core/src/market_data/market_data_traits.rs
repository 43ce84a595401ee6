use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::market_data_errors::MarketDataError;
use super::market_data_model::PricePoint;

/// Read-only price and FX oracle.
///
/// Implementations must be pure with respect to their inputs: the same
/// question always gets the same answer, so replays stay deterministic.
/// Historical lookups answer for the exact date only; stepping back over
/// gaps is done by the caller (see [`super::retry`]).
pub trait MarketDataOracleTrait: Send + Sync {
    /// Closing price of `symbol` on `date`, in the symbol's listing currency.
    fn get_historical_price(&self, symbol: &str, date: NaiveDate)
        -> Result<Decimal, MarketDataError>;

    /// Most recent price of `symbol`.
    fn get_latest_price(&self, symbol: &str) -> Result<PricePoint, MarketDataError>;

    /// Units of `to` bought by one unit of `from` on `date`.
    fn get_historical_fx(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<Decimal, MarketDataError>;

    fn get_latest_fx(&self, from: &str, to: &str) -> Result<Decimal, MarketDataError>;
}
