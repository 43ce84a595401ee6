//! Bounded date-step-back retry for oracle lookups.
//!
//! A market holiday or a missing quote must not abort a replay, so lookups
//! walk back one calendar day at a time until the oracle answers or the
//! step-back budget is spent. Terminal errors are returned immediately.

use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;

use super::market_data_errors::MarketDataError;
use super::market_data_model::PricePoint;
use super::market_data_traits::MarketDataOracleTrait;
use crate::utils::time_utils::previous_day;

/// Calls `fetch` for `date`, then up to `max_step_back_days` earlier dates
/// while the oracle reports a retryable gap.
pub fn with_step_back<F>(
    key: &str,
    date: NaiveDate,
    max_step_back_days: u32,
    mut fetch: F,
) -> Result<PricePoint, MarketDataError>
where
    F: FnMut(NaiveDate) -> Result<Decimal, MarketDataError>,
{
    let mut lookup_date = date;
    for attempt in 0..=max_step_back_days {
        match fetch(lookup_date) {
            Ok(value) => {
                if attempt > 0 {
                    debug!(
                        "{} on {} resolved from {} after stepping back {} day(s)",
                        key, date, lookup_date, attempt
                    );
                }
                return Ok(PricePoint::new(lookup_date, value));
            }
            Err(e) if e.is_retryable() => {
                debug!("{} has no data on {}: {}", key, lookup_date, e);
                match previous_day(lookup_date) {
                    Some(prev) => lookup_date = prev,
                    None => break,
                }
            }
            Err(e) => return Err(e),
        }
    }

    warn!(
        "Giving up on {} after stepping back {} day(s) from {}",
        key, max_step_back_days, date
    );
    Err(MarketDataError::RetriesExhausted {
        key: key.to_string(),
        date,
        days: max_step_back_days,
    })
}

pub fn historical_price_with_step_back(
    oracle: &dyn MarketDataOracleTrait,
    symbol: &str,
    date: NaiveDate,
    max_step_back_days: u32,
) -> Result<PricePoint, MarketDataError> {
    with_step_back(symbol, date, max_step_back_days, |d| {
        oracle.get_historical_price(symbol, d)
    })
}

/// Same-currency pairs resolve to one without asking the oracle.
pub fn historical_fx_with_step_back(
    oracle: &dyn MarketDataOracleTrait,
    from: &str,
    to: &str,
    date: NaiveDate,
    max_step_back_days: u32,
) -> Result<PricePoint, MarketDataError> {
    if from == to {
        return Ok(PricePoint::new(date, Decimal::ONE));
    }
    let key = format!("{}{}", from, to);
    with_step_back(&key, date, max_step_back_days, |d| {
        oracle.get_historical_fx(from, to, d)
    })
}
