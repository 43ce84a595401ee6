//! In-memory oracle backed by fixed price series and an FX graph.
//!
//! Used for deterministic tests and for offline runs where the caller has
//! already downloaded the quotes it needs.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::market_data_errors::MarketDataError;
use super::market_data_model::PricePoint;
use super::market_data_traits::MarketDataOracleTrait;
use crate::fx::{CurrencyConverter, ExchangeRate};

#[derive(Debug, Default, Clone)]
pub struct StaticMarketData {
    prices: HashMap<String, BTreeMap<NaiveDate, Decimal>>,
    fx: CurrencyConverter,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, symbol: &str, date: NaiveDate, price: Decimal) -> Self {
        self.add_price(symbol, date, price);
        self
    }

    pub fn with_fx_rate(mut self, from: &str, to: &str, date: NaiveDate, rate: Decimal) -> Self {
        self.add_fx_rate(from, to, date, rate);
        self
    }

    pub fn add_price(&mut self, symbol: &str, date: NaiveDate, price: Decimal) {
        self.prices
            .entry(symbol.to_string())
            .or_default()
            .insert(date, price);
    }

    pub fn add_fx_rate(&mut self, from: &str, to: &str, date: NaiveDate, rate: Decimal) {
        self.fx
            .add_historical_rates(vec![ExchangeRate::new(from, to, date, rate)]);
    }

    fn series(&self, symbol: &str) -> Result<&BTreeMap<NaiveDate, Decimal>, MarketDataError> {
        self.prices
            .get(symbol)
            .ok_or_else(|| MarketDataError::NotFound(format!("no quotes for {}", symbol)))
    }
}

impl MarketDataOracleTrait for StaticMarketData {
    fn get_historical_price(
        &self,
        symbol: &str,
        date: NaiveDate,
    ) -> Result<Decimal, MarketDataError> {
        self.series(symbol)?
            .get(&date)
            .copied()
            .ok_or_else(|| MarketDataError::NoData(format!("no {} quote on {}", symbol, date)))
    }

    fn get_latest_price(&self, symbol: &str) -> Result<PricePoint, MarketDataError> {
        self.series(symbol)?
            .iter()
            .next_back()
            .map(|(date, price)| PricePoint::new(*date, *price))
            .ok_or_else(|| MarketDataError::NoData(format!("empty series for {}", symbol)))
    }

    fn get_historical_fx(
        &self,
        from: &str,
        to: &str,
        date: NaiveDate,
    ) -> Result<Decimal, MarketDataError> {
        self.fx.get_rate(from, to, date)
    }

    fn get_latest_fx(&self, from: &str, to: &str) -> Result<Decimal, MarketDataError> {
        self.fx.get_latest_rate(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_unknown_symbol_is_terminal_and_gap_is_retryable() {
        let d = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
        let oracle = StaticMarketData::new().with_price("SPY", d, dec!(368.79));

        assert_eq!(oracle.get_historical_price("SPY", d).unwrap(), dec!(368.79));
        assert!(oracle
            .get_historical_price("SPY", d.succ_opt().unwrap())
            .unwrap_err()
            .is_retryable());
        assert!(oracle
            .get_historical_price("QQQ", d)
            .unwrap_err()
            .is_terminal());
    }
}
