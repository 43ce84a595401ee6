use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One observed exchange rate: one unit of `from_currency` buys `rate`
/// units of `to_currency` on `date`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: Decimal,
    pub date: NaiveDate,
}

impl ExchangeRate {
    pub fn new(from_currency: &str, to_currency: &str, date: NaiveDate, rate: Decimal) -> Self {
        ExchangeRate {
            from_currency: from_currency.to_string(),
            to_currency: to_currency.to_string(),
            rate,
            date,
        }
    }
}
