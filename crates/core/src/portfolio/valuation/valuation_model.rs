//! Portfolio valuation domain models.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::transactions::OptionType;

/// When a snapshot is priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "date")]
pub enum ValuationPoint {
    /// Latest quotes, looked up through each symbol's quote venue.
    Latest,
    /// Closing prices and rates for a date, stepping back over gaps.
    Historical(NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HoldingKind {
    Equity,
    Option,
    Cash,
}

/// Contract detail carried by option rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionValuation {
    pub option_type: OptionType,
    pub underlying_symbol: String,
    pub underlying_price: Decimal,
    pub underlying_price_date: NaiveDate,
    pub expiration: NaiveDate,
    pub strike: Decimal,
    pub multiplier: Decimal,
}

/// One row of the priced holdings table. Prices and book cost are per unit;
/// `*_base` fields are converted into the valuation's base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedHolding {
    pub symbol: String,
    pub currency: String,
    pub kind: HoldingKind,
    /// Classification label such as `ETF`; `None` when unclassified.
    pub instrument: Option<String>,
    pub asset_class: Option<String>,
    pub region: Option<String>,
    pub quantity: Decimal,
    pub market_price: Decimal,
    pub price_date: NaiveDate,
    pub book_cost: Decimal,
    pub fx_rate_to_base: Decimal,
    pub market_price_base: Decimal,
    pub book_cost_base: Decimal,
    pub market_value_base: Decimal,
    pub pnl_base: Decimal,
    /// `None` when book cost is zero.
    pub pct_return: Option<Decimal>,
    /// `None` when the portfolio's total value is zero.
    pub pct_portfolio: Option<Decimal>,
    pub option: Option<OptionValuation>,
}

/// A snapshot priced in one base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuedSnapshot {
    pub asof: DateTime<Utc>,
    pub valuation_date: NaiveDate,
    pub base_currency: String,
    pub total_market_value: Decimal,
    /// Position rows sorted by symbol, followed by cash rows sorted by currency.
    pub holdings: Vec<PricedHolding>,
}

impl ValuedSnapshot {
    pub fn positions(&self) -> impl Iterator<Item = &PricedHolding> {
        self.holdings
            .iter()
            .filter(|holding| holding.kind != HoldingKind::Cash)
    }

    pub fn cash(&self) -> impl Iterator<Item = &PricedHolding> {
        self.holdings
            .iter()
            .filter(|holding| holding.kind == HoldingKind::Cash)
    }

    pub fn holding(&self, symbol: &str) -> Option<&PricedHolding> {
        self.positions().find(|holding| holding.symbol == symbol)
    }

    pub fn cash_value_base(&self) -> Decimal {
        self.cash().map(|holding| holding.market_value_base).sum()
    }
}
