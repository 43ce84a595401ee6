use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price or rate together with the date it was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub date: NaiveDate,
    pub value: Decimal,
}

impl PricePoint {
    pub fn new(date: NaiveDate, value: Decimal) -> Self {
        PricePoint { date, value }
    }
}
